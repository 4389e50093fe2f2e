pub mod flow;
pub mod password;
pub mod tokens;
pub mod verify_key;

pub use flow::AuthFlowError;
pub use password::PasswordError;
pub use tokens::{AccessClaims, IssuedAccessToken, TokenError, TokenSettings};
pub use verify_key::{VerifyKeyCipher, VerifyKeyError};
