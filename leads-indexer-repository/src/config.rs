//! Connection settings for a search-engine cluster.

/// Connection settings for one cluster.
///
/// Built once at process start and handed to [`crate::OpenSearchProvider::new`]; no
/// provider reads the environment on its own.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Base URL of the cluster (e.g. "http://localhost:9200").
    pub url: String,
    /// Basic auth user name.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
}

impl ConnectionConfig {
    /// Create an unauthenticated connection config.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
        }
    }

    /// Attach basic auth credentials.
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Credentials to send, if any.
    ///
    /// A user name without a password is sent with an empty password.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username
            .as_deref()
            .map(|user| (user, self.password.as_deref().unwrap_or_default()))
    }
}

// Keep passwords out of logs.
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}
