// handlers/mod.rs - HTTP handlers grouped by access tier
//
// public:    no authentication (login, health)
// protected: bearer token required, center-scoped by caller role
// admin:     bearer token plus admin role

pub mod admin;
pub mod common;
pub mod populate;
pub mod protected;
pub mod public;
