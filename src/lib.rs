pub mod api;
pub mod config;
pub mod context;
pub mod db;
pub mod domain;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
