pub mod health;
pub mod query;
pub mod sessions;
pub mod vectors;
