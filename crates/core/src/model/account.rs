use thiserror::Error;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CredentialsError {
    #[error("email address is invalid")]
    InvalidEmail,

    #[error("password cannot be empty")]
    EmptyPassword,

    #[error("name cannot be empty")]
    EmptyName,

    #[error("password must be at least {MIN_PASSWORD_CHARS} characters")]
    PasswordTooShort,

    #[error("passwords do not match")]
    PasswordMismatch,
}

/// Email/password pair used to sign in.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Validates and normalizes sign-in credentials. The email is lowercased.
    ///
    /// # Errors
    ///
    /// Returns `CredentialsError` for a malformed email or empty password.
    pub fn new(email: &str, password: impl Into<String>) -> Result<Self, CredentialsError> {
        let email = normalize_email(email)?;
        let password = password.into();
        if password.is_empty() {
            return Err(CredentialsError::EmptyPassword);
        }
        Ok(Self { email, password })
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

// Never print the password.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Raw sign-up form input.
#[derive(Clone, Default)]
pub struct SignUpDraft {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Validated sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUp {
    name: String,
    credentials: Credentials,
}

impl SignUpDraft {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns the first failing `CredentialsError`.
    pub fn validate(self) -> Result<SignUp, CredentialsError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(CredentialsError::EmptyName);
        }
        let credentials = Credentials::new(&self.email, self.password.clone())?;
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(CredentialsError::PasswordTooShort);
        }
        if self.password != self.confirm_password {
            return Err(CredentialsError::PasswordMismatch);
        }
        Ok(SignUp { name, credentials })
    }
}

impl SignUp {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// An authenticated session handed back by the auth collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    email: String,
    token: String,
}

impl Session {
    #[must_use]
    pub fn new(email: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            token: token.into(),
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

fn normalize_email(raw: &str) -> Result<String, CredentialsError> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email
        .split_once('@')
        .ok_or(CredentialsError::InvalidEmail)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || email.contains(' ') {
        return Err(CredentialsError::InvalidEmail);
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> SignUpDraft {
        SignUpDraft {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
        }
    }

    #[test]
    fn credentials_lowercase_email() {
        let creds = Credentials::new("  Ada@Example.COM ", "pw").unwrap();
        assert_eq!(creds.email(), "ada@example.com");
    }

    #[test]
    fn credentials_reject_bad_email() {
        for bad in ["", "ada", "@example.com", "ada@", "a@b@c", "a b@c.d"] {
            assert_eq!(
                Credentials::new(bad, "pw").unwrap_err(),
                CredentialsError::InvalidEmail,
                "{bad}"
            );
        }
    }

    #[test]
    fn credentials_reject_empty_password() {
        assert_eq!(
            Credentials::new("a@b.c", "").unwrap_err(),
            CredentialsError::EmptyPassword
        );
    }

    #[test]
    fn debug_hides_password() {
        let creds = Credentials::new("a@b.c", "hunter22").unwrap();
        assert!(!format!("{creds:?}").contains("hunter22"));
    }

    #[test]
    fn sign_up_happy_path() {
        let sign_up = draft().validate().unwrap();
        assert_eq!(sign_up.name(), "Ada");
        assert_eq!(sign_up.credentials().email(), "ada@example.com");
    }

    #[test]
    fn sign_up_checks_name_length_and_match() {
        let mut d = draft();
        d.name = " ".into();
        assert_eq!(d.validate().unwrap_err(), CredentialsError::EmptyName);

        let mut d = draft();
        d.password = "abc".into();
        d.confirm_password = "abc".into();
        assert_eq!(d.validate().unwrap_err(), CredentialsError::PasswordTooShort);

        let mut d = draft();
        d.confirm_password = "secret2".into();
        assert_eq!(d.validate().unwrap_err(), CredentialsError::PasswordMismatch);
    }
}
