//! Offline sensor-log sampling and merging.
//!
//! This module turns a tree of per-session sensor CSV logs into a single
//! labeled training corpus:
//! - classify each session folder's files by sensor (filename substring)
//! - decimate each log by a fixed row stride
//! - align the sensors positionally and truncate to the shortest required
//!   log
//! - concatenate all sessions and apply one seeded global shuffle
//!
//! Alignment is purely positional. Row i of the accelerometer is paired
//! with row i of the gyroscope, with no timestamp resampling; logs
//! captured at different rates will silently misalign.

pub mod classify;
pub mod corpus;
pub mod session;
pub mod table;

// Re-export commonly used types
pub use classify::{classify_sensor_files, SensorFiles, SensorKind};
pub use corpus::{build_corpus, CorpusError, CorpusReport};
pub use session::{merge_session, BehaviorLabel, SessionSkip, SessionTable};
pub use table::{Table, TableError};
