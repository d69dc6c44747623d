//! Subcommand handlers.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use autoengage_config::{Config, ConfigValidator};
use autoengage_core::{InteractionOptions, RunGate, StoryOptions};

use crate::app::App;
use crate::cli::{CampaignArgs, Commands, StoriesArgs};

/// Print a report as pretty JSON on stdout.
fn emit<T: Serialize>(report: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Log warnings and fail on any validation error.
pub(crate) fn check_config(config: &Config) -> anyhow::Result<()> {
    let result = ConfigValidator::validate(config)?;
    for warning in &result.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    result.ensure_valid()?;
    Ok(())
}

/// Token cancelled on Ctrl-C. The engine stops at the next candidate boundary.
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current item");
            trigger.cancel();
        }
    });
    token
}

fn load_options(path: Option<&Path>) -> anyhow::Result<InteractionOptions> {
    let Some(path) = path else {
        return Ok(InteractionOptions::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read options file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid options file {}", path.display()))
}

pub(crate) async fn run(command: Commands, config: Config, gate: &RunGate) -> anyhow::Result<()> {
    check_config(&config)?;
    if let Commands::Validate = command {
        info!("Configuration is valid");
        return Ok(());
    }

    let Some(_permit) = gate.try_acquire() else {
        warn!("Another run is active, skipping");
        return Ok(());
    };

    let run_id = Uuid::new_v4();
    let span = info_span!("run", id = %run_id);
    async move {
        let mut app = App::start(&config).await?;
        let outcome = dispatch(command, &mut app).await;
        app.shutdown().await;
        outcome
    }
    .instrument(span)
    .await
}

async fn dispatch(command: Commands, app: &mut App) -> anyhow::Result<()> {
    match command {
        Commands::Campaign(args) => campaign(args, app).await,
        Commands::Stories(args) => stories(args, app).await,
        Commands::Inbox { max } => {
            let report = app.session.monitor_inbox(max).await?;
            emit(&report)
        }
        Commands::Followers { account, max } => {
            let followers = app.session.scrape_followers(&account, max).await?;
            info!(account = %account, count = followers.len(), "Followers collected");
            emit(&followers)
        }
        Commands::Dm { message, usernames } => {
            let results = app.session.send_direct_messages(&usernames, &message).await;
            let sent = results.iter().filter(|r| r.sent).count();
            info!(sent, total = results.len(), "Direct messages done");
            emit(&results)
        }
        Commands::Validate => Ok(()),
    }
}

async fn campaign(args: CampaignArgs, app: &mut App) -> anyhow::Result<()> {
    let options = args.apply(load_options(args.options_file.as_deref())?);
    let cancel = interrupt_token();
    let report = app
        .session
        .interact_with_posts(args.target.as_deref(), args.max_posts, &options, &cancel)
        .await;
    emit(&report)
}

async fn stories(args: StoriesArgs, app: &mut App) -> anyhow::Result<()> {
    let options = args.story.apply(StoryOptions::default());
    let cancel = interrupt_token();
    let report = app
        .session
        .walk_stories(args.username.as_deref(), &options, &cancel)
        .await?;
    emit(&report)
}
