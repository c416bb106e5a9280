//! Authentication and authorization
//!
//! Bearer tokens are signed with a shared secret and carry the caller's
//! email. Roles are never taken from the token; the role gates read them
//! from the store.

pub mod jwt;
pub mod middleware;

pub use jwt::{
    issue_access_token, validate_access_token, Claims, IdentityClaims, JwtConfig, JwtError,
};
pub use middleware::{require_admin, require_agent, require_auth, AuthError, AuthenticatedUser};
