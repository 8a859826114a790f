//! kifulog server library.
//!
//! This library exposes the server components for testing.

pub mod config;
pub mod health;
pub mod http;
pub mod node;
