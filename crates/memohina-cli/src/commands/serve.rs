//! `memohina serve`: NDJSON event loop
//!
//! Each stdin line is one event:
//!
//! ```json
//! {"event":"thought","user_id":"alice","session_id":"s1","reasoning_text":"...","response_text":"..."}
//! {"event":"command","user_id":"alice","name":"/memohina"}
//! ```
//!
//! Each handled event produces at most one stdout line. Rate-limited commands
//! and unknown command names produce nothing.

use super::Context;
use memohina_core::config::{ArchiveConfig, ConfigHandle, ConfigWatcher};
use memohina_core::error::HinaResult;
use memohina_core::types::SequenceNo;
use memohina_core::{ArchiveApp, CommandOutput, NewThought};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum InboundEvent {
    Thought(NewThought),
    Command { user_id: String, name: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum OutboundEvent {
    Recorded {
        user_id: String,
        sequence_no: SequenceNo,
    },
    Reply {
        user_id: String,
        output: CommandOutput,
    },
    Error {
        message: String,
    },
}

pub async fn run(context: &Context, config: ArchiveConfig, watch: bool) -> HinaResult<()> {
    let handle = ConfigHandle::new(config);
    let app = ArchiveApp::builder(handle.clone())
        .background_flush(true)
        .build()?;

    let _watcher = if watch && context.config_file.exists() {
        match ConfigWatcher::spawn(handle, &context.config_file, context.overrides.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("configuration reload disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    info!("serving NDJSON events on stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        };
        let Some(line) = line? else {
            debug!("stdin closed");
            break;
        };

        if let Some(event) = handle_line(&app, &line).await {
            let mut encoded = serde_json::to_string(&event)?;
            encoded.push('\n');
            stdout.write_all(encoded.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    app.shutdown().await;
    Ok(())
}

async fn handle_line(app: &ArchiveApp, line: &str) -> Option<OutboundEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let event = match serde_json::from_str::<InboundEvent>(line) {
        Ok(event) => event,
        Err(e) => {
            return Some(OutboundEvent::Error {
                message: format!("malformed event: {}", e),
            });
        }
    };

    match event {
        InboundEvent::Thought(thought) => {
            let user_id = thought.user_id.clone();
            match app.commands().record_thought(thought).await {
                Ok(record) => Some(OutboundEvent::Recorded {
                    user_id,
                    sequence_no: record.sequence_no,
                }),
                Err(e) => Some(OutboundEvent::Error {
                    message: e.to_string(),
                }),
            }
        }
        InboundEvent::Command { user_id, name } => {
            let output = app.commands().invoke(&user_id, &name).await?;
            if output.is_silent() {
                return None;
            }
            Some(OutboundEvent::Reply { user_id, output })
        }
    }
}
