//! Replay entry point for the practice-rooms bot.
//!
//! Reads newline-delimited JSON from stdin.  The first line is a
//! [`SimulatedGuild`] snapshot; every following line is a [`GatewayEvent`].
//! Each event is dispatched against the simulated platform and the platform
//! commands it issued are written to stdout, one JSON object per line.
//!
//! # Startup sequence
//!
//! 1. Load [`BotConfig`] from disk (default on first run).
//! 2. Initialise logging with the configured default filter.
//! 3. Create the [`tokio`] runtime.
//! 4. Open the JSON guild store and practice log.
//! 5. Seed the simulator and replay events until stdin closes.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use practice_rooms::{
    config::BotConfig,
    orchestrator::{GatewayEvent, RoomOrchestrator},
    platform::{SimulatedGuild, SimulatedPlatform},
    store::{JsonGuildStore, JsonPracticeLog},
};

fn main() -> Result<()> {
    // 1. Config
    let (config, config_error) = match BotConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (BotConfig::default(), Some(e)),
    };

    // 2. Logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.default_filter.as_str()),
    )
    .init();
    if let Some(e) = config_error {
        log::warn!("Failed to load config ({e:#}); using defaults");
    }
    log::info!("practice-rooms replay starting up");

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(replay(config))
}

async fn replay(config: BotConfig) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // 4. Seed guild
    let Some(seed) = lines.next_line().await? else {
        log::warn!("replay: empty input, nothing to do");
        return Ok(());
    };
    let guild: SimulatedGuild =
        serde_json::from_str(&seed).context("first line must be a guild snapshot")?;
    log::info!(
        "replay: seeded guild {} with {} voice rooms",
        guild.guild_id,
        guild.voice_rooms.len()
    );

    let platform = Arc::new(SimulatedPlatform::new(config.rooms.low_bitrate).with_guild(guild));
    let orchestrator = RoomOrchestrator::new(
        config.rooms.clone(),
        platform.clone(),
        platform.clone(),
        Arc::new(JsonGuildStore::open(&config.storage.guilds_file)),
        Arc::new(JsonPracticeLog::open(&config.storage.practice_log_file)),
    );

    // 5. Events
    let mut stdout = std::io::stdout().lock();
    let mut line_no = 1usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let event: GatewayEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("replay: skipping line {line_no}: {e}");
                continue;
            }
        };

        match orchestrator.dispatch(event).await {
            Ok(report) => log::debug!("replay: line {line_no}: {report:?}"),
            Err(e) => log::error!("replay: line {line_no} failed: {e}"),
        }

        for call in platform.take_calls() {
            serde_json::to_writer(&mut stdout, &call)?;
            writeln!(stdout)?;
        }
    }

    let live = orchestrator
        .session_book()
        .lock()
        .map(|book| book.live_count())
        .unwrap_or_default();
    log::info!("replay: input exhausted, {live} sessions still open");
    Ok(())
}
