//! `memohina record`

use super::Context;
use memohina_core::config::ArchiveConfig;
use memohina_core::error::HinaResult;
use memohina_core::NewThought;

pub struct RecordArgs {
    pub user: String,
    pub session: String,
    pub reasoning: String,
    pub response: String,
    pub message: Option<String>,
}

pub async fn run(context: &Context, config: ArchiveConfig, args: RecordArgs) -> HinaResult<()> {
    let app = context.build_app(config)?;

    let mut thought = NewThought::new(args.user, args.session, args.reasoning, args.response);
    if let Some(message) = args.message {
        thought = thought.with_user_message(message);
    }

    let result = app.commands().record_thought(thought).await;
    app.shutdown().await;

    let record = result?;
    context
        .console
        .success(&format!("Recorded trace #{}", record.sequence_no));
    context.console.info(&format!("Session: {}", record.session_id));
    Ok(())
}
