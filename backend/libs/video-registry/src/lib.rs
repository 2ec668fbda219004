//! # Deep-Link Video Registry
//!
//! Persistence core behind a chat-relay bot: a video posted in a monitored
//! group is registered under a random 10-digit payload id, the bot replies
//! with a deep link, and opening that link resolves the id back to the video
//! so the bot can re-send it. Every successful resolution is recorded in an
//! append-only access log.
//!
//! ## Architecture
//!
//! ```text
//! transport ── register(ref) ──▶ Registry ──▶ IdAllocator ──▶ VideoStore.exists
//!                                   │                            (probe)
//!                                   └────────▶ VideoStore.insert
//!                                              (unique key, retry on conflict)
//!
//! transport ── resolve(id, who) ─▶ Registry ──▶ VideoStore.lookup
//!                                   └── hit ──▶ AccessLog.append (best effort)
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use video_registry::{connect, DeepLinkBuilder, RegistryConfig, Resolution};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RegistryConfig::from_env()?;
//! let registry = connect(&config).await?;
//!
//! let payload_id = registry.register("BAACAgUAAxkBAA...").await?;
//! let link = DeepLinkBuilder::for_bot("VideoRelayBot").link(payload_id);
//! println!("Share this link: {}", link);
//!
//! match registry.resolve(payload_id, 42).await? {
//!     Resolution::Found(resource_ref) => println!("send video {}", resource_ref),
//!     Resolution::NotFound => println!("This video is not available."),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency Safety
//!
//! The allocator's existence probe is only an optimisation. Two registrations
//! that draw the same candidate race on the store's insert, which is atomic
//! (`ON CONFLICT DO NOTHING` / `INSERT OR IGNORE` / map entry); the loser gets
//! `DuplicateKey` and retries with a fresh candidate, up to a bounded number
//! of attempts.

pub mod allocator;
pub mod config;
pub mod db;
pub mod deep_link;
mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod registry;
pub mod store;

pub use allocator::{CandidateSource, IdAllocator, UniformDigits};
pub use config::{Backend, RegistryConfig};
pub use db::connect;
pub use deep_link::{parse_start_payload, DeepLinkBuilder};
pub use error::{RegistryError, RegistryResult, StoreError, StoreResult};
pub use models::{AccessLogEntry, NewAccessLogEntry, PayloadId, Resolution, VideoRecord};
pub use registry::Registry;
pub use store::{AccessLog, MemoryStore, PostgresStore, SqliteStore, VideoStore};
