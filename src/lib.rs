//! Kodeka is a line-oriented chat client for local and hosted language models.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the configuration and history stores, the provider
//!   registry and the per-turn session controller.
//! - [`api`] defines the request/response payloads of the chat backends.
//! - [`commands`] classifies chat-loop input into local commands and turns.
//! - [`ui`] runs the blocking read-eval loop over any reader/writer pair.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod logging;
pub mod ui;
pub mod utils;
