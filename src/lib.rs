// src/lib.rs

pub mod api;
pub mod cli;
pub mod config;
pub mod controllers;
pub mod error;
pub mod media;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::AppError;
pub use state::AppState;
