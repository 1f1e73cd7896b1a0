//! `memohina export`

use super::Context;
use memohina_core::config::ArchiveConfig;
use memohina_core::error::{HinaError, HinaResult};
use memohina_core::ExportReply;

pub async fn run(
    context: &Context,
    config: ArchiveConfig,
    user: &str,
    max_records: Option<usize>,
) -> HinaResult<()> {
    let app = context.build_app(config)?;
    if let Some(max) = max_records {
        app.config()
            .update(|c| c.export.memohina_export_record_count = max)?;
    }

    let reply = app.commands().export_incremental(user, chrono::Utc::now()).await;
    app.shutdown().await;

    let console = &context.console;
    match reply {
        ExportReply::Exported {
            url,
            record_count,
            from_seq,
            to_seq,
            ..
        } => {
            console.success(&format!("Exported {} records", record_count));
            console.print_field("Range", &format!("({}, {}]", from_seq, to_seq));
            console.print_field("URL", &url);
            Ok(())
        }
        ExportReply::NothingToExport => {
            console.warn("Nothing new to export");
            Ok(())
        }
        ExportReply::CooldownDenied => {
            console.warn("Command is cooling down");
            Ok(())
        }
        ExportReply::Failed { reason } => {
            console.error(&format!("Export failed: {}", reason));
            Err(HinaError::other(reason))
        }
    }
}
