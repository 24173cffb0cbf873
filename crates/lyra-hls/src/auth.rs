//! Authorization configuration for encrypted-playlist access.

use url::Url;

/// Authorization parameters carried on playlist and key requests.
///
/// The token doubles as the tenant component of the playlist cache key, so
/// content fetched under one token is never served to another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    pub encrypt_token: String,
}

impl AuthConfig {
    pub fn new(encrypt_token: impl Into<String>) -> Self {
        AuthConfig {
            encrypt_token: encrypt_token.into(),
        }
    }

    /// Query-string fragment carrying the authorization parameters.
    pub fn auth_params(&self) -> String {
        format!("encrypt_token={}", self.encrypt_token)
    }

    /// Append the authorization parameters to a request URL.
    pub fn apply_to(&self, url: &mut Url) {
        url.query_pairs_mut()
            .append_pair("encrypt_token", &self.encrypt_token);
    }
}
