//! Host loop for systems of simple ECS.

pub use app::init;

pub mod app;
pub mod config;
pub mod error;
