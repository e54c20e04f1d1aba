pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod events;
pub mod global;
pub mod notify;
pub mod sentiment;
pub mod session;
