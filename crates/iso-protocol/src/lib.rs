//! Wire types for the isoAutomate broker protocol.
//!
//! This crate contains the serde-serializable types exchanged with remote
//! browser workers through the broker store, plus the key-space naming that
//! both sides agree on. These types represent the "protocol layer" - the
//! shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization/deserialization
//! - **Field-stable**: Names match what workers expect on the wire
//! - **Schema-free where the catalog is**: action args and result payloads
//!   are open-ended string-keyed maps because the action catalog is large
//!   and owned by the worker side
//!
//! Higher-level ergonomic APIs are built on top of these types in `iso-rs`.

pub mod keys;
pub mod session;
pub mod task;

pub use keys::*;
pub use session::*;
pub use task::*;
