//! isoAutomate runtime - broker store access, acquisition, and transport.
//!
//! This crate provides the infrastructure layer for driving pooled remote
//! browsers through a shared broker store:
//!
//! - **Store adapter**: the handful of atomic set/list primitives the
//!   protocol needs, behind the [`BrokerStore`] trait (Redis and in-memory
//!   implementations)
//! - **Acquisition**: the race-free claim of one free browser instance from
//!   a randomized worker scan
//! - **Transport**: request/response correlation over a queue push and a
//!   blocking pop, with bounded retry and a per-call deadline
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   iso-rs    │  Client, session lifecycle, action forwarders
//! └──────┬──────┘
//! ┌──────▼──────┐
//! │ iso-runtime │  This crate
//! │  ┌────────┐ │
//! │  │Acquire │ │  randomized scan + atomic claim
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Trans  │ │  push / correlated blocking pop
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Store  │ │  BrokerStore (Redis / memory)
//! │  └────────┘ │
//! └─────────────┘
//! ```
//!
//! Correctness across concurrent callers in different processes rests
//! entirely on the store's atomic claim primitive; this crate holds no local
//! locks around pool state and never caches pool membership.

pub mod acquire;
pub mod error;
pub mod retry;
pub mod store;
pub mod transport;

pub use acquire::claim_instance;
pub use error::{Error, Result};
pub use retry::with_retry;
pub use store::{BrokerStore, MemoryStore, RedisStore};
pub use transport::{Session, Transport};
