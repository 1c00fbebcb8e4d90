pub mod migrate;
pub mod seed;
pub mod user;
