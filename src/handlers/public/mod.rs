// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Login is rate limited separately from the general /api limiter; only
// failed attempts count against it.

pub mod auth;
pub mod health;

pub use auth::login;
pub use health::health;
