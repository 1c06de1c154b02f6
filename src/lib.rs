// src/lib.rs
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod nav;
pub mod reference;
pub mod series;
pub mod snapshot;
