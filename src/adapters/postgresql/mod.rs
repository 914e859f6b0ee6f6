//! PostgreSQL connectivity for the host database
//!
//! Record and parameter access build on [`PostgreSQLClient`].

pub mod client;

pub use client::PostgreSQLClient;
