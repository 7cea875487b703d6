//! taskbuddy - personal task tracking library
//!
//! This library provides the core functionality behind the `tb` CLI:
//! accounts, a logged-in session and per-user task lists persisted as JSON
//! collections in a data directory.
//!
//! # Core Concepts
//!
//! - **Storage**: Named JSON collections behind a pluggable blob backend
//! - **Identity**: Registered users with hashed credentials
//! - **Session**: The one logged-in user whose tasks are in scope
//! - **Tasks**: Per-user records with priority, status, due date and tags
//! - **Stats / Search**: Pure views computed over a user's task list
//!
//! # Module Organization
//!
//! - `app`: Application context tying storage, stores and session together
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `taskbuddy.toml`
//! - `error`: Error types and result aliases
//! - `export`: Portable per-user export document
//! - `lock`: File locking and atomic writes for concurrency safety
//! - `output`: Human and JSON output for commands
//! - `search`: Text search and field filters
//! - `session`: The logged-in user slot
//! - `stats`: Aggregate counts over a task list
//! - `storage`: Blob backends and typed collection access
//! - `task`: Task model and store
//! - `user`: User model, credential hashing and identity store

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod lock;
pub mod output;
pub mod search;
pub mod session;
pub mod stats;
pub mod storage;
pub mod task;
pub mod user;

pub use error::{Error, Result};
