//! Core domain + application logic for the media archive bot.
//!
//! This crate is intentionally framework-agnostic. The Bot API adapter and the
//! MTProto user-session transport live behind ports (traits) implemented in
//! other crates.

pub mod archive;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod store;
pub mod user_session;
pub mod utils;

pub use errors::{Error, Result, UserSessionError};
