//! chatgate - minimal HTTP gateway for LLM chat completions
//!
//! This library provides the core functionality for the chatgate server:
//! environment configuration, strict request decoding, and the
//! forward-and-relay handler.

pub mod config;
pub mod error;
pub mod proxy;

pub use config::Config;
pub use error::Error;
