pub mod config;
pub mod history;
pub mod message;
pub mod paths;
pub mod persistence;
pub mod providers;
pub mod session;
