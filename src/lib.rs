pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod model;
pub mod observer;
pub mod policy;
pub mod resource;
pub mod services;
pub mod store;

pub use app::app;
