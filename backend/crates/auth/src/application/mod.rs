//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod current_user;
pub mod email_verification;
pub mod federated;
pub mod identity;
pub mod magic_link;
pub mod sign_in;
pub mod sign_up;
pub mod token_codec;

// Re-exports
pub use config::{AuthConfig, AuthRateLimits, RuntimeMode};
pub use current_user::CurrentUserUseCase;
pub use email_verification::{SendVerificationCodeUseCase, VerifyCodeInput, VerifyCodeUseCase};
pub use federated::{FederatedCredential, FederatedSignInOutput, FederatedSignInUseCase};
pub use identity::IdentityResolver;
pub use magic_link::{
    SendMagicLinkOutput, SendMagicLinkUseCase, VerifyMagicLinkOutput, VerifyMagicLinkUseCase,
};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
pub use token_codec::{TokenCodec, TokenIssuer, TokenPair, TokenPayload};
