pub mod cache;
pub mod config;
pub mod error;
pub mod extractor;
pub mod handlers;
pub mod models;
pub mod preview;
pub mod routes;
pub mod state;
