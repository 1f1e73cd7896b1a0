//! Memohina
//!
//! Per-user reasoning trace capture with incremental, immutable snapshot
//! export. The implementation lives in `memohina-core`; the `memohina` binary
//! is built from `memohina-cli`.

pub use memohina_core::*;
