//! Sign-in / sign-up against an external auth collaborator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use storage::remote::RemoteConfig;
use taskboard_core::model::{Credentials, Session, SignUp, SignUpDraft};

use crate::error::AuthError;

/// The auth collaborator. Implementations verify credentials and register
/// accounts; session bookkeeping stays in [`AuthService`].
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a wrong email/password.
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// # Errors
    ///
    /// Returns `AuthError::EmailInUse` if the email is already registered.
    async fn register(&self, sign_up: &SignUp) -> Result<(), AuthError>;
}

struct LocalAccount {
    name: String,
    password: String,
}

/// In-process stub backend. Accounts live for the lifetime of the value.
#[derive(Default)]
pub struct LocalAuthBackend {
    accounts: Mutex<HashMap<String, LocalAccount>>,
    issued: AtomicU64,
    accept_unregistered: bool,
}

impl LocalAuthBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stub that signs in any well-formed credentials for unknown emails.
    /// Registered accounts still need their password.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            accept_unregistered: true,
            ..Self::default()
        }
    }

    /// Display name of a registered account.
    #[must_use]
    pub fn account_name(&self, email: &str) -> Option<String> {
        let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        accounts
            .get(&email.trim().to_lowercase())
            .map(|a| a.name.clone())
    }
}

#[async_trait]
impl AuthBackend for LocalAuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        let accepted = match accounts.get(credentials.email()) {
            Some(account) => account.password == credentials.password(),
            None => self.accept_unregistered,
        };
        if !accepted {
            return Err(AuthError::InvalidCredentials);
        }
        let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Session::new(credentials.email(), format!("local-{n}")))
    }

    async fn register(&self, sign_up: &SignUp) -> Result<(), AuthError> {
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        let email = sign_up.credentials().email();
        if accounts.contains_key(email) {
            return Err(AuthError::EmailInUse);
        }
        accounts.insert(
            email.to_owned(),
            LocalAccount {
                name: sign_up.name().to_owned(),
                password: sign_up.credentials().password().to_owned(),
            },
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(alias = "accessToken")]
    token: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: String,
}

/// `POST /auth/login` and `POST /auth/register` on the REST service.
#[derive(Clone)]
pub struct RemoteAuthBackend {
    client: Client,
    config: RemoteConfig,
}

impl RemoteAuthBackend {
    #[must_use]
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl AuthBackend for RemoteAuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let payload = LoginRequest {
            email: credentials.email(),
            password: credentials.password(),
        };
        let response = self
            .client
            .post(self.config.endpoint(&["auth", "login"]))
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let body: LoginResponse = response.json().await?;
                let email = body.email.unwrap_or_else(|| credentials.email().to_owned());
                Ok(Session::new(email, body.token))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::InvalidCredentials),
            status => Err(AuthError::HttpStatus(status)),
        }
    }

    async fn register(&self, sign_up: &SignUp) -> Result<(), AuthError> {
        let payload = RegisterRequest {
            name: sign_up.name(),
            email: sign_up.credentials().email(),
            password: sign_up.credentials().password(),
        };
        let response = self
            .client
            .post(self.config.endpoint(&["auth", "register"]))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::BAD_REQUEST || status == StatusCode::CONFLICT {
            let body: MessageResponse = response.json().await.unwrap_or_default();
            return Err(classify_rejection(status, body.message));
        }
        Err(AuthError::HttpStatus(status))
    }
}

fn classify_rejection(status: StatusCode, message: String) -> AuthError {
    if status == StatusCode::CONFLICT || message.to_lowercase().contains("already in use") {
        AuthError::EmailInUse
    } else {
        AuthError::Rejected(message)
    }
}

/// Holds the current session on top of an [`AuthBackend`].
#[derive(Clone)]
pub struct AuthService {
    backend: Arc<dyn AuthBackend>,
    session: Arc<RwLock<Option<Session>>>,
}

impl AuthService {
    #[must_use]
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            backend,
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Validate the form and sign in, replacing any previous session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Credentials` for malformed input, otherwise
    /// whatever the backend reports.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let credentials = Credentials::new(email, password)?;
        let session = self.backend.login(&credentials).await.inspect_err(|e| {
            tracing::warn!(email = credentials.email(), error = %e, "login failed");
        })?;
        tracing::info!(email = session.email(), "signed in");
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(session)
    }

    /// Validate the sign-up form and register the account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Credentials` for invalid form input and
    /// `AuthError::EmailInUse` for duplicate accounts.
    pub async fn register(&self, draft: SignUpDraft) -> Result<(), AuthError> {
        let sign_up = draft.validate()?;
        self.backend.register(&sign_up).await?;
        tracing::info!(email = sign_up.credentials().email(), "account registered");
        Ok(())
    }

    /// Drop the current session, returning it if there was one.
    pub fn logout(&self) -> Option<Session> {
        let ended = self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = &ended {
            tracing::info!(email = session.email(), "signed out");
        }
        ended
    }

    #[must_use]
    pub fn current_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reinstate a session persisted elsewhere (for example by the CLI).
    pub fn restore(&self, session: Session) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_core::model::CredentialsError;

    fn draft(email: &str, password: &str, confirm: &str) -> SignUpDraft {
        SignUpDraft {
            name: "Ada".into(),
            email: email.into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    fn service() -> AuthService {
        AuthService::new(Arc::new(LocalAuthBackend::new()))
    }

    #[tokio::test]
    async fn register_then_login_then_logout() {
        let auth = service();
        auth.register(draft("ada@example.com", "secret1", "secret1"))
            .await
            .unwrap();
        assert!(auth.current_session().is_none());

        let session = auth.login("ADA@example.com", "secret1").await.unwrap();
        assert_eq!(session.email(), "ada@example.com");
        assert_eq!(auth.current_session(), Some(session.clone()));

        assert_eq!(auth.logout(), Some(session));
        assert!(auth.current_session().is_none());
        assert!(auth.logout().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let auth = service();
        auth.register(draft("ada@example.com", "secret1", "secret1"))
            .await
            .unwrap();
        let err = auth
            .register(draft("ada@example.com", "other12", "other12"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailInUse));
    }

    #[tokio::test]
    async fn wrong_password_keeps_signed_out() {
        let auth = service();
        auth.register(draft("ada@example.com", "secret1", "secret1"))
            .await
            .unwrap();
        let err = auth.login("ada@example.com", "nope").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(auth.current_session().is_none());
    }

    #[tokio::test]
    async fn form_errors_surface_before_the_backend() {
        let auth = service();
        let err = auth
            .register(draft("ada@example.com", "secret1", "secret2"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::Credentials(CredentialsError::PasswordMismatch)
        ));
        let err = auth.login("not-an-email", "x").await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Credentials(CredentialsError::InvalidEmail)
        ));
    }

    #[tokio::test]
    async fn local_backend_remembers_display_name() {
        let backend = Arc::new(LocalAuthBackend::new());
        let auth = AuthService::new(backend.clone());
        auth.register(draft("Ada@Example.com", "secret1", "secret1"))
            .await
            .unwrap();
        assert_eq!(backend.account_name("ada@example.com").as_deref(), Some("Ada"));
        assert_eq!(backend.account_name("bob@example.com"), None);
    }

    #[tokio::test]
    async fn permissive_stub_only_checks_known_accounts() {
        let auth = AuthService::new(Arc::new(LocalAuthBackend::permissive()));
        assert!(auth.login("new@example.com", "anything").await.is_ok());

        auth.register(draft("ada@example.com", "secret1", "secret1"))
            .await
            .unwrap();
        assert!(matches!(
            auth.login("ada@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn rejection_messages_are_classified() {
        assert!(matches!(
            classify_rejection(StatusCode::BAD_REQUEST, "Error: Email is already in use!".into()),
            AuthError::EmailInUse
        ));
        assert!(matches!(
            classify_rejection(StatusCode::BAD_REQUEST, "bad".into()),
            AuthError::Rejected(_)
        ));
    }
}
