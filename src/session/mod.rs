//! Session driver
//!
//! Resolves a [`SessionConfig`] into a live connection, runs the pump over
//! it, and reports statistics until the session quits.

pub mod config;
pub mod report;
pub mod runner;

pub use config::{Role, SessionConfig, parse_duration};
pub use report::{Reporter, render_report};
pub use runner::{Connection, Session};
