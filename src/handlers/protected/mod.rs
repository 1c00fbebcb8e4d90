// handlers/protected/mod.rs - Handlers behind the bearer-token layer
//
// Every handler here receives the caller as an explicit `CallerContext`
// extension and applies center scoping through it.

pub mod attendance;
pub mod auth;
pub mod dashboard;
pub mod families;
pub mod students;
pub mod test_scores;
pub mod women;
