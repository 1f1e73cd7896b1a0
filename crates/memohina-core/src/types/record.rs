//! Trace records

use super::SequenceNo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One captured exchange: the model's reasoning plus its visible response.
///
/// Immutable once written. `sequence_no` is the only ordering key; timestamps
/// may collide or go backwards across clock adjustments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThoughtRecord {
    pub user_id: String,
    pub session_id: String,
    pub sequence_no: SequenceNo,
    pub timestamp: DateTime<Utc>,
    pub reasoning_text: String,
    pub response_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
}

/// A trace that has not been assigned a sequence number yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewThought {
    pub user_id: String,
    pub session_id: String,
    pub reasoning_text: String,
    pub response_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    /// Capture time; the store stamps `now` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewThought {
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        reasoning_text: impl Into<String>,
        response_text: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            reasoning_text: reasoning_text.into(),
            response_text: response_text.into(),
            user_message: None,
            timestamp: None,
        }
    }

    pub fn with_user_message(mut self, message: impl Into<String>) -> Self {
        self.user_message = Some(message.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Stamp the record with its sequence number
    pub(crate) fn into_record(self, sequence_no: SequenceNo) -> ThoughtRecord {
        ThoughtRecord {
            user_id: self.user_id,
            session_id: self.session_id,
            sequence_no,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            reasoning_text: self.reasoning_text,
            response_text: self.response_text,
            user_message: self.user_message,
        }
    }
}
