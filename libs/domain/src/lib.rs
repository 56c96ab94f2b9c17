//! # marquee-domain
//!
//! Core domain types and collaborator ports for the Marquee event platform.
//!
//! ## Design Principles
//!
//! - Domain decisions are pure: validation and planning functions take values
//!   and return values, with no I/O of their own
//! - Storage and task queues sit behind narrow async ports so the engine can
//!   run against Postgres in production and in-memory fakes in tests
//! - Errors carry the field or parameter they relate to; infrastructure
//!   failures travel on a separate channel from client-facing errors
//!
//! ## Modules
//!
//! - Event entity, publication state, and the tri-state update patch
//! - Caller identity, capability flags, and event roles
//! - Sub-resource kinds and owner-resolution outcomes
//! - Background task kinds
//! - Collaborator ports (owner directory, role directory, job submitter,
//!   export artifacts)

mod actor;
mod error;
mod event;
mod jobs;
mod ports;
mod resource;

pub use actor::*;
pub use error::{DomainError, StoreError};
pub use event::*;
pub use jobs::*;
pub use ports::*;
pub use resource::*;
