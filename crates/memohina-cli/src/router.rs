//! Command routing logic for CLI

use crate::args::{Cli, Commands, ConfigAction};
use crate::commands::{self, Context};
use crate::logging;
use memohina_core::config::LoggingConfig;
use memohina_core::error::HinaResult;

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli) -> HinaResult<()> {
    let context = Context::from_cli(&cli);

    // Configuration utilities must work with a broken config file.
    if let Commands::Config { action } = &cli.command {
        logging::init(&LoggingConfig::default(), cli.verbose);
        return match action {
            ConfigAction::Show => commands::config::show(&context).await,
            ConfigAction::Validate => commands::config::validate(&context).await,
            ConfigAction::Init { force } => commands::config::init(&context, *force).await,
        };
    }

    let config = context.load_config()?;
    logging::init(&config.logging, cli.verbose);

    match cli.command {
        Commands::Record {
            user,
            session,
            reasoning,
            response,
            message,
        } => {
            commands::record::run(
                &context,
                config,
                commands::record::RecordArgs {
                    user,
                    session,
                    reasoning,
                    response,
                    message,
                },
            )
            .await
        }
        Commands::Think { user } => commands::think::run(&context, config, &user).await,
        Commands::Export { user, max_records } => {
            commands::export::run(&context, config, &user, max_records).await
        }
        Commands::Serve { no_watch } => commands::serve::run(&context, config, !no_watch).await,
        Commands::Config { .. } => Ok(()),
    }
}
