// handlers/admin/mod.rs - Admin-only handlers
//
// Mounted behind both the bearer-token layer and the admin gate.

pub mod export;
pub mod stats;
pub mod users;
