//! DevSecOps demo application
//!
//! A small HTTP server whose routes each pass a raw request parameter straight
//! into a sensitive sink. Intended as practice material for scanners and
//! security reviews, never for deployment.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod store;
pub mod utils;

pub use error::AppError;
