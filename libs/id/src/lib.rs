//! # marquee-id
//!
//! Typed, prefixed IDs for every Marquee resource.
//!
//! Every ID is a ULID behind a short resource prefix, e.g.
//! `evt_01HV4Z2WQXKJNM8GPQY6VBKC3D` for an event or
//! `usr_01HV4Z3MXNKPQR9HSTZ7WCLD4E` for a user. The prefix makes an ID
//! self-describing in logs and URLs and stops one resource's ID from being
//! handed to a lookup that wants another's; the ULID keeps IDs unique and
//! sortable by creation time.
//!
//! Parsing is strict: the prefix must match the type and the remainder must
//! be a valid ULID. IDs serialize as their canonical string form.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use macros::parse_prefixed;
pub use types::*;

/// Re-exported for consumers that need raw ULID operations.
pub use ulid::Ulid;
