//! Marquee event API library.
//!
//! This crate primarily ships a `marquee-api` binary, but we expose a small
//! library surface to enable integration testing and reuse.

pub mod api;
pub mod config;
pub mod db;
pub mod jobs;
pub mod lifecycle;
pub mod scoping;
pub mod state;
pub mod visibility;
