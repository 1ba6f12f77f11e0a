//! DriveSense - driver behavior monitoring service and dataset tools.
//!
//! This library backs a single binary with two jobs: an HTTP service for
//! session-authenticated account management plus behavior/severity
//! prediction, and an offline corpus builder that merges raw per-session
//! sensor CSV logs into one labeled training dataset.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         DriveSense                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌───────────┐   ┌─────────────────────┐     │
//! │  │  Server   │──▶│   Store   │   │       Sampler       │     │
//! │  │  (axum)   │   │ (SQLite)  │   │ classify ▶ decimate │     │
//! │  └───────────┘   └───────────┘   │  ▶ merge ▶ shuffle  │     │
//! │        │                         └─────────────────────┘     │
//! │        ▼                                                     │
//! │  ┌───────────┐                                               │
//! │  │  Models   │  behavior + severity bundles, loaded once     │
//! │  └───────────┘                                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use drivesense::config::SamplerSettings;
//! use drivesense::sampler::build_corpus;
//!
//! let settings = SamplerSettings::default();
//! let report = build_corpus(&settings).expect("corpus build failed");
//! println!("{} rows written", report.total_rows);
//! ```

pub mod config;
pub mod model;
pub mod sampler;
pub mod server;
pub mod store;

// Re-export key types at crate root for convenience
pub use config::{Config, ModelPaths, SamplerSettings, ServerSettings};
pub use model::{BehaviorBundle, BehaviorClass, ModelRegistry, SeverityModel};
pub use sampler::{build_corpus, BehaviorLabel, CorpusError, CorpusReport};
pub use server::{run, AppState, ServerConfig};
pub use store::{UserStore, StoreError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
