//! HTTP server module.
//!
//! Plain HTTP listener for the status endpoint, meant to sit behind a load
//! balancer or be scraped in-cluster. Provides graceful shutdown on
//! SIGTERM/SIGINT, which also stops the background poller.

mod server;
mod shutdown;

pub use server::{start_server, ServerError};
