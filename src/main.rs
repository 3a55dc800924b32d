mod bot;
mod config;
mod suno;

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{error, info};

use bot::{Command, GenerationSettings, HELP_TEXT, PrefStore, TelegramClient, run_generation};
use config::Config;
use suno::SunoClient;

struct BotState {
    config: Config,
    suno: SunoClient,
    prefs: PrefStore,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    info!("🚀 Starting sunogram...");
    info!("Provider base URL: {}", config.suno_base_url);
    info!(
        "Poll every {}s, give up after {}s",
        config.poll_interval_sec, config.generation_timeout_sec
    );

    let bot = Bot::new(config.telegram_bot_token.clone());
    let suno = SunoClient::new(
        config.suno_api_key.clone(),
        config.suno_base_url.clone(),
        config.failed_statuses.clone(),
    );
    let state = Arc::new(BotState { config, suno, prefs: PrefStore::new() });

    let handler = dptree::entry()
        .branch(Update::filter_message().filter_command::<Command>().endpoint(handle_command))
        .branch(Update::filter_message().endpoint(handle_text));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, HELP_TEXT).parse_mode(ParseMode::Markdown).await?;
        }
        Command::Balance => match state.suno.balance().await {
            Ok(credits) => {
                bot.send_message(msg.chat.id, format!("💰 Credits remaining: *{credits}*"))
                    .parse_mode(ParseMode::Markdown)
                    .await?;
            }
            Err(e) => {
                error!("Balance check failed: {e}");
                bot.send_message(msg.chat.id, format!("❌ Error: {e}")).await?;
            }
        },
        Command::Instrumental => {
            let user_id = sender_id(&msg);
            let enabled = state.prefs.toggle_instrumental(user_id).await;
            let mode = if enabled { "on (no vocals)" } else { "off (with vocals)" };
            bot.send_message(msg.chat.id, format!("🎹 Instrumental mode: *{mode}*"))
                .parse_mode(ParseMode::Markdown)
                .await?;
        }
    }

    Ok(())
}

async fn handle_text(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let text = match msg.text() {
        Some(t) => t,
        None => return Ok(()),
    };

    // Unrecognized /commands are ignored rather than treated as descriptions.
    if text.starts_with('/') {
        return Ok(());
    }

    let user_id = sender_id(&msg);
    let instrumental = state.prefs.instrumental(user_id).await;
    let preview: String = text.chars().take(100).collect();
    info!("🎼 Request from {user_id}: \"{preview}\" (instrumental={instrumental})");

    let messenger = TelegramClient::new(bot);
    let settings = GenerationSettings {
        poll_interval_sec: state.config.poll_interval_sec,
        timeout_sec: state.config.generation_timeout_sec,
    };

    run_generation(&state.suno, &messenger, msg.chat.id.0, text, instrumental, &settings).await;

    Ok(())
}

fn sender_id(msg: &Message) -> UserId {
    msg.from.as_ref().map(|u| u.id).unwrap_or(UserId(0))
}
