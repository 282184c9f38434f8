pub mod extractors;
pub mod jwt;
pub mod middleware;

pub use extractors::AuthRequired;
pub use jwt::{Claims, JwtKeys};
