// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0

//! iso: client SDK for driving pooled remote browsers through a broker store.
//!
//! A client never talks to a browser directly. It claims one free instance
//! from a pool of worker machines through a shared broker store (Redis),
//! then drives it with commands pushed onto the owning worker's task queue,
//! each answered on a single-use result key.
//!
//! # Example
//!
//! ```ignore
//! use iso::{AcquireOptions, Client, Config};
//!
//! #[tokio::main]
//! async fn main() -> iso::Result<()> {
//!     let mut client = Client::connect(Config::new("redis://localhost:6379")).await?;
//!
//!     let receipt = client.acquire(AcquireOptions::default()).await?;
//!     println!("acquired {} on {}", receipt.browser_id, receipt.worker_name);
//!
//!     client.open_url("https://example.com").await?;
//!     let title = client.get_title().await?;
//!     println!("title: {:?}", title.str_field("value"));
//!
//!     client.release().await?;
//!     Ok(())
//! }
//! ```

mod actions;
mod client;
mod config;

pub use client::{AcquireOptions, AcquireReceipt, Client};
pub use config::Config;

// Protocol and runtime types callers interact with directly.
pub use iso_protocol::{
    Args, DEFAULT_RPC_TIMEOUT, KeySpace, SOLVE_CAPTCHA_TIMEOUT, STOP_RECORD_TIMEOUT,
    STOP_VIDEO_TIMEOUT, SessionBinding, TaskPayload, TaskResult,
};
pub use iso_runtime::{BrokerStore, Error, MemoryStore, RedisStore, Result, Session};
