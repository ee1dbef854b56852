//! Access token verification.
//!
//! Only the signature, algorithm and issuer are checked here. Expiry is
//! judged against the stored session row with the injected clock, so the
//! decoder never reads wall-clock time.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use pawhaven_core::config::AuthConfig;

use crate::error::{AuthError, AuthResult};

use super::claims::Claims;

/// Verifies HS256 access tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation.set_issuer(&[config.jwt_issuer.as_str()]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes a token string. Any malformed, forged or foreign token is
    /// reported as [`AuthError::TokenInvalid`].
    pub fn decode(&self, token: &str) -> AuthResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token rejected");
                AuthError::TokenInvalid
            })
    }
}
