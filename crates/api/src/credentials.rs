use std::env;
use std::fmt;

/// Supplies the bearer token attached to backend requests.
///
/// Injected into `HttpGateway` so token storage and refresh stay outside
/// this crate. Returning `None` sends requests unauthenticated.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Fixed-token provider for CLI use and tests.
#[derive(Clone, Default)]
pub struct StaticToken {
    token: Option<String>,
}

impl StaticToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: if token.trim().is_empty() {
                None
            } else {
                Some(token)
            },
        }
    }

    /// A provider that never authenticates.
    #[must_use]
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    /// Read the token from an environment variable; blank means anonymous.
    #[must_use]
    pub fn from_env(var: &str) -> Self {
        env::var(var).map_or_else(|_| Self::anonymous(), Self::new)
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token {
            Some(_) => write!(f, "StaticToken(<redacted>)"),
            None => write!(f, "StaticToken(anonymous)"),
        }
    }
}
