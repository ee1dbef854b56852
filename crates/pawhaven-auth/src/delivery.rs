//! Hand-off of one-time secrets to whatever sends them to the account holder.

use async_trait::async_trait;
use tracing::info;

use pawhaven_core::error::AppError;
use pawhaven_entity::account::PublicAccount;

use crate::policy::IssuedSecret;

/// Sends verification codes and reset tokens (email, SMS, ...).
///
/// The raw secret is available only through this call; it is never
/// persisted in the clear.
#[async_trait]
pub trait SecretDelivery: Send + Sync + std::fmt::Debug {
    /// Delivers an email verification code.
    async fn deliver_verification_code(
        &self,
        account: &PublicAccount,
        code: &IssuedSecret,
    ) -> Result<(), AppError>;

    /// Delivers a password-reset token.
    async fn deliver_reset_token(
        &self,
        account: &PublicAccount,
        token: &IssuedSecret,
    ) -> Result<(), AppError>;
}

/// Records that a secret was issued without sending it anywhere.
#[derive(Debug, Clone, Default)]
pub struct LoggingDelivery;

#[async_trait]
impl SecretDelivery for LoggingDelivery {
    async fn deliver_verification_code(
        &self,
        account: &PublicAccount,
        code: &IssuedSecret,
    ) -> Result<(), AppError> {
        info!(
            user_id = %account.id,
            expires_at = %code.expires_at,
            "Verification code issued"
        );
        Ok(())
    }

    async fn deliver_reset_token(
        &self,
        account: &PublicAccount,
        token: &IssuedSecret,
    ) -> Result<(), AppError> {
        info!(
            user_id = %account.id,
            expires_at = %token.expires_at,
            "Password reset token issued"
        );
        Ok(())
    }
}
