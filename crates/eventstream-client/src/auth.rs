//! HTTP Basic authentication (RFC 7617)

use std::fmt;

use base64::Engine;

/// Username/password pair sent with every (re)connect attempt
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// `Authorization` header value for these credentials
    pub fn header_value(&self) -> String {
        basic_auth_header(&self.username, &self.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Build a `Basic` authorization header value.
///
/// The UTF-8 bytes of `username:password` are encoded with the standard
/// base64 alphabet, padded and without line wrapping.
pub fn basic_auth_header(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
    format!("Basic {}", encoded)
}
