//! Tasker HTTP server connector

mod client;

pub use client::TaskerClient;
