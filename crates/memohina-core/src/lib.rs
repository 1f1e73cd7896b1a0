//! Memohina core
//!
//! Captures per-user reasoning traces into a rotated local log and exports
//! them incrementally as immutable snapshots. The pieces:
//!
//! - [`store::RecordStore`]: append-only per-user log with sequence numbers
//! - [`cursor::CursorCache`]: bounded cache of export cursors
//! - [`export::IncrementalExporter`]: delta since cursor to remote snapshot
//! - [`cooldown::CooldownGuard`]: per-user, per-command rate limiting
//! - [`scheduler::ActivityScheduler`]: per-user flush loops with idle retirement
//! - [`commands::ThoughtCommands`]: the `/think` and `/memohina` surface
//!
//! [`app::ArchiveApp`] wires them together from an [`config::ArchiveConfig`].

pub mod app;
pub mod commands;
pub mod config;
pub mod cooldown;
pub mod cursor;
pub mod error;
pub mod export;
pub mod render;
pub mod scheduler;
pub mod store;
pub mod types;

pub use app::{ArchiveApp, ArchiveAppBuilder};
pub use commands::{CommandKind, CommandOutput, ExportReply, ThinkReply, ThoughtCommands};
pub use config::{ArchiveConfig, ConfigHandle, ConfigLoader, ConfigWatcher};
pub use cooldown::{Admission, CooldownGuard};
pub use cursor::CursorCache;
pub use error::{HinaError, HinaResult, UnifiedError};
pub use export::{ExportOutcome, IncrementalExporter, RemoteArchive, Snapshot};
pub use render::{QrRenderer, QrStyle};
pub use scheduler::{ActivityScheduler, FlushTarget};
pub use store::RecordStore;
pub use types::{ExportCursor, NewThought, ThoughtRecord, UserKey};
