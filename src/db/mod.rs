pub mod connection;
pub mod models;
pub mod service;

pub use connection::{DbPool, get_connection};
pub use models::*;
