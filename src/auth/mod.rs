/// Authentication module
///
/// Password hashing, JWT issuing/verification and the refresh token
/// allow-list.

mod claims;
mod jwt;
mod password;
mod refresh_token;

pub use claims::{AuthenticatedUser, Claims};
pub use jwt::{TokenIssuer, ACCESS_TOKEN_TTL_SECONDS, REFRESH_TOKEN_TTL_SECONDS};
pub use password::PasswordHasher;
pub use refresh_token::{InMemoryRefreshTokenRegistry, RefreshTokenRegistry};
