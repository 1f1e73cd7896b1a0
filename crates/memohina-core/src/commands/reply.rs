//! Command results handed back to the host

use crate::types::SequenceNo;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of `/think`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ThinkReply {
    Latest {
        sequence_no: SequenceNo,
        text: String,
        /// `text` was cut to `max_think_length` characters
        truncated: bool,
        /// Local copy of the full record
        full_export: Option<PathBuf>,
    },
    /// No record for this user yet
    Empty,
    /// Rate limited; the host sends nothing
    CooldownDenied,
}

/// Result of `/memohina`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportReply {
    Exported {
        url: String,
        record_count: usize,
        from_seq: SequenceNo,
        to_seq: SequenceNo,
        /// Rendered QR code of `url`, when a renderer is installed
        #[serde(skip)]
        qr_image: Option<Vec<u8>>,
    },
    NothingToExport,
    Failed {
        reason: String,
    },
    /// Rate limited; the host sends nothing
    CooldownDenied,
}

/// Reply of a command resolved by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandOutput {
    Think(ThinkReply),
    Memohina(ExportReply),
}

impl CommandOutput {
    /// Whether the host should stay silent
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            Self::Think(ThinkReply::CooldownDenied) | Self::Memohina(ExportReply::CooldownDenied)
        )
    }
}
