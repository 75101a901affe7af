//! Bot command — connects to Slack and serves until interrupted.
//!
//! Startup sequence:
//! 1. Load config, check tokens
//! 2. Build the response model
//! 3. Create the dispatcher and spawn its single worker
//! 4. Run the Socket Mode listener; Ctrl+C shuts down cleanly

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{info, warn};

use docent_core::config::load_config;
use docent_models::build_model;
use docent_slack::{Dispatcher, SlackApi, SocketListener};

pub async fn run() -> Result<()> {
    let config = load_config(None);

    if config.slack.bot_token.is_empty() {
        bail!("slack.botToken is not set (or SLACK_BOT_TOKEN)");
    }
    if config.slack.app_token.is_empty() {
        bail!("slack.appToken is not set (or SLACK_APP_TOKEN, required for Socket Mode)");
    }

    let model = build_model(&config.model)?;
    let api = SlackApi::new(&config.slack.bot_token);

    // Not load-bearing, but surfaces a bad bot token before we connect.
    match api.auth_test().await {
        Ok(bot_user_id) => info!(bot_user_id = %bot_user_id, "bot identity resolved"),
        Err(e) => warn!(error = %e, "auth.test failed (check the bot token)"),
    }

    let dispatcher = Arc::new(Dispatcher::new(
        api.clone(),
        model,
        &config.slack.reset_command,
        config.slack.queue_capacity,
    ));
    dispatcher.spawn_worker();

    let listener = Arc::new(SocketListener::new(
        api,
        &config.slack.app_token,
        dispatcher,
    ));

    info!("listening for requests...");
    let mut run_handle = {
        let listener = listener.clone();
        tokio::spawn(async move { listener.run().await })
    };

    tokio::select! {
        result = &mut run_handle => result??,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            listener.signal_shutdown();
            let _ = run_handle.await;
        }
    }

    Ok(())
}
