mod config;
mod menu;
mod openai;
mod weather;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use teloxide::prelude::*;
use teloxide::types::ChatAction;
use teloxide::utils::command::BotCommands;
use tracing::{error, info};
use tracing_subscriber::prelude::*;

use config::Config;
use menu::{Action, ConversationState};
use openai::Client as OpenAiClient;
use weather::WeatherClient;

struct BotState {
    config: Config,
    openai: OpenAiClient,
    weather: WeatherClient,
    /// Menu position per chat. A chat without an entry has no live session.
    sessions: Mutex<HashMap<ChatId, ConversationState>>,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
enum Command {
    #[command(description = "открыть главное меню")]
    Start,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    info!("🚀 Starting domovoy...");
    if config.allowed_user_ids.is_empty() {
        info!("Allow-list is empty, bot is open to everyone");
    } else {
        info!("Allow-list: {} user(s)", config.allowed_user_ids.len());
    }
    if config.weatherapi_key.is_none() {
        info!("WEATHERAPI_KEY not set, weather replies use the static fallback");
    }

    let bot = Bot::new(&config.telegram_bot_token);

    let state = Arc::new(BotState {
        openai: OpenAiClient::new(config.openai_api_key.clone()),
        weather: WeatherClient::new(config.weatherapi_key.clone()),
        config,
        sessions: Mutex::new(HashMap::new()),
    });

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(Update::filter_message().endpoint(handle_message));

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
        Command::Start => handle_start(bot, msg, state).await,
    }
}

/// `/start` opens (or re-opens) the main menu from any state.
async fn handle_start(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(ref user) = msg.from else {
        return Ok(());
    };
    let username = user.username.as_deref().unwrap_or(&user.first_name);

    if !state.config.is_allowed(user.id) {
        info!("Denied /start from {} ({})", username, user.id);
        state.sessions.lock().await.remove(&msg.chat.id);
        bot.send_message(msg.chat.id, menu::NOT_AUTHORIZED).await?;
        return Ok(());
    }

    info!("📨 /start from {} ({})", username, user.id);
    state
        .sessions
        .lock()
        .await
        .insert(msg.chat.id, ConversationState::MainMenu);
    bot.send_message(msg.chat.id, menu::WELCOME)
        .reply_markup(menu::main_keyboard())
        .await?;
    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(ref user) = msg.from else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    // Commands are handled by their own branch
    if text.starts_with('/') {
        return Ok(());
    }

    let chat_id = msg.chat.id;
    let current = match state.sessions.lock().await.get(&chat_id).copied() {
        Some(current) => current,
        // No session was started for this chat, stay silent
        None => return Ok(()),
    };

    let username = user.username.as_deref().unwrap_or(&user.first_name);

    if !state.config.is_allowed(user.id) {
        info!("Denied message from {} ({})", username, user.id);
        state.sessions.lock().await.remove(&chat_id);
        bot.send_message(chat_id, menu::NOT_AUTHORIZED).await?;
        return Ok(());
    }

    let (action, next) = menu::dispatch(current, text);
    state.sessions.lock().await.insert(chat_id, next);

    match action {
        Action::ShowMenu => {
            bot.send_message(chat_id, menu::WELCOME)
                .reply_markup(menu::main_keyboard())
                .await?;
        }
        Action::EnterAssistant => {
            info!("Assistant mode entered by {} ({})", username, user.id);
            bot.send_message(chat_id, menu::ASSISTANT_MODE)
                .reply_markup(menu::assistant_keyboard())
                .await?;
        }
        Action::LeaveAssistant => {
            bot.send_message(chat_id, menu::BACK_TO_MENU)
                .reply_markup(menu::main_keyboard())
                .await?;
        }
        Action::ShowWeather => {
            info!("Weather request from {} ({})", username, user.id);
            bot.send_chat_action(chat_id, ChatAction::Typing).await.ok();
            let reply = menu::weather_reply(state.weather.report().await);
            bot.send_message(chat_id, reply).await?;
        }
        Action::Ask(question) => {
            let preview: String = question.chars().take(100).collect();
            info!("Assistant request from {} ({}): \"{preview}\"", username, user.id);
            bot.send_chat_action(chat_id, ChatAction::Typing).await.ok();
            let reply = menu::assistant_reply(state.openai.complete(&question).await);
            bot.send_message(chat_id, reply).await?;
        }
    }

    Ok(())
}
