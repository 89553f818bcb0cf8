//! Storage-backed provider implementations.
//!
//! - **Rate limiters**: `PostgreSQL` (default) and `Redis`
//! - **Identity**: token verification against the BaaS auth endpoint
//! - **Profiles**: role and subscription lookups in `PostgreSQL`

pub mod baas_identity;
pub mod postgres_profile;
pub mod rate_limiter_postgres;
pub mod rate_limiter_redis;

pub use baas_identity::BaasIdentityProvider;
pub use postgres_profile::PostgresProfileDirectory;
pub use rate_limiter_postgres::PostgresRateLimiter;
pub use rate_limiter_redis::RedisRateLimiter;
