/// Middleware module
///
/// Bearer-token authentication for protected resources.

mod jwt_middleware;

pub use jwt_middleware::JwtMiddleware;
