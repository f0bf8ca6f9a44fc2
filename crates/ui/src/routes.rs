use std::fmt;

/// Pages of the app. Rendering and navigation belong to the shell; the
/// controller only says where to go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    SignIn,
    SignUp,
    Projects,
}

impl Route {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::SignIn => "/signin",
            Self::SignUp => "/signup",
            Self::Projects => "/projects",
        }
    }

    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Self::Home),
            "/signin" => Some(Self::SignIn),
            "/signup" => Some(Self::SignUp),
            "/projects" => Some(Self::Projects),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_round_trip() {
        for route in [Route::Home, Route::SignIn, Route::SignUp, Route::Projects] {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(Route::from_path("/projects/"), Some(Route::Projects));
        assert_eq!(Route::from_path("/nope"), None);
    }
}
