#![doc = "The `studytasks` library crate."]
#![doc = ""]
#![doc = "Authentication (bcrypt passwords, HS256 bearer tokens, an optional pre-shared"]
#![doc = "key gate), owner-scoped study-task management, storage backends, routing"]
#![doc = "configuration, and error handling. The binary (`main.rs`) only reads the"]
#![doc = "configuration, connects storage, and serves `AppState::configure`."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;
pub mod tasks;

pub use error::AppError;
pub use state::AppState;
