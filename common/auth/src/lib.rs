pub mod claims;
pub mod config;
pub mod error;
pub mod extractors;
pub mod gate;
pub mod roles;
pub mod signer;
pub mod verifier;

pub use claims::Claims;
pub use config::{JwtConfig, DEFAULT_ACCESS_TTL_SECONDS};
pub use error::{AuthError, AuthResult, FORBIDDEN_MESSAGE, UNAUTHORIZED_MESSAGE};
pub use extractors::{authenticate, AuthContext};
pub use gate::require_identity;
pub use roles::{authorize, AccountRole, Grants, RoleRequirement, UnknownRole};
pub use signer::{IssuedToken, TokenSigner};
pub use verifier::JwtVerifier;
