pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

pub use error::{FleetError, Result};
pub use state::AppContext;
