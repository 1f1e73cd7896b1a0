//! `memohina think`

use super::Context;
use memohina_core::config::ArchiveConfig;
use memohina_core::error::HinaResult;
use memohina_core::ThinkReply;

pub async fn run(context: &Context, config: ArchiveConfig, user: &str) -> HinaResult<()> {
    let app = context.build_app(config)?;
    let reply = app.commands().show_latest(user, chrono::Utc::now()).await;
    app.shutdown().await;

    let console = &context.console;
    match reply {
        ThinkReply::Latest {
            sequence_no,
            text,
            truncated,
            full_export,
        } => {
            console.print_header(&format!("Reasoning #{}", sequence_no));
            console.print_block(&text);
            if truncated {
                console.warn("Reasoning was truncated");
            }
            if let Some(path) = full_export {
                console.print_field("Full record", &path.display().to_string());
            }
        }
        ThinkReply::Empty => console.warn(&format!("No reasoning recorded for {}", user)),
        ThinkReply::CooldownDenied => console.warn("Command is cooling down"),
    }
    Ok(())
}
