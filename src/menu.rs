//! Menu conversation flow: states, button commands and reply texts.

use teloxide::types::{KeyboardButton, KeyboardMarkup};
use tracing::warn;

use crate::{openai, weather};

pub const ASSISTANT_BUTTON: &str = "🤖 ChatGPT";
pub const WEATHER_BUTTON: &str = "🌤️ Погода в Пхукете";
pub const BACK_BUTTON: &str = "🔙 Назад в меню";

pub const NOT_AUTHORIZED: &str = "Извините, у вас нет доступа к этому боту.";

pub const WELCOME: &str = "Привет! 👋 Я ваш персональный помощник.\n\n\
    Выберите, что вы хотите сделать:";

pub const ASSISTANT_MODE: &str = "🤖 Режим ChatGPT активирован!\n\n\
    Теперь просто напишите мне любой вопрос, и я отвечу с помощью ChatGPT.\n\n\
    Примеры:\n\
    • Расскажи анекдот\n\
    • Как приготовить борщ?\n\
    • Объясни что такое искусственный интеллект\n\
    • Помоги написать письмо\n\n\
    Для возврата в главное меню нажмите кнопку \"Назад в меню\".";

pub const ASSISTANT_ERROR: &str =
    "Извините, произошла ошибка при обработке вашего запроса. Попробуйте еще раз через минуту.";

pub const WEATHER_ERROR: &str =
    "Извините, не удалось получить данные о погоде. Попробуйте позже.";

pub const BACK_TO_MENU: &str = "Возвращаемся в главное меню. Выберите действие:";

/// Where a chat currently is in the menu flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    MainMenu,
    AssistantMode,
}

/// Recognized menu buttons, decoupled from their display labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuButton {
    Assistant,
    Weather,
    Back,
}

impl MenuButton {
    fn parse(text: &str) -> Option<Self> {
        match text {
            ASSISTANT_BUTTON => Some(Self::Assistant),
            WEATHER_BUTTON => Some(Self::Weather),
            BACK_BUTTON => Some(Self::Back),
            _ => None,
        }
    }
}

/// What the handler has to do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Re-show the welcome text with the main menu keyboard.
    ShowMenu,
    /// Announce assistant mode with its keyboard.
    EnterAssistant,
    /// Fetch and send the weather summary.
    ShowWeather,
    /// Announce the return to the main menu.
    LeaveAssistant,
    /// Forward the text to the completion provider.
    Ask(String),
}

/// Decide what to do with an incoming text and which state the chat moves to.
/// Pure: all I/O stays with the caller.
pub fn dispatch(state: ConversationState, text: &str) -> (Action, ConversationState) {
    match state {
        ConversationState::MainMenu => match MenuButton::parse(text) {
            Some(MenuButton::Assistant) => (Action::EnterAssistant, ConversationState::AssistantMode),
            Some(MenuButton::Weather) => (Action::ShowWeather, ConversationState::MainMenu),
            // Back has no meaning here, treat it like any other text
            _ => (Action::ShowMenu, ConversationState::MainMenu),
        },
        ConversationState::AssistantMode => match MenuButton::parse(text) {
            Some(MenuButton::Back) => (Action::LeaveAssistant, ConversationState::MainMenu),
            // Everything else, menu labels included, is a question for the model
            _ => (Action::Ask(text.to_string()), ConversationState::AssistantMode),
        },
    }
}

pub fn main_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(ASSISTANT_BUTTON)],
        vec![KeyboardButton::new(WEATHER_BUTTON)],
    ])
    .resize_keyboard()
}

pub fn assistant_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(BACK_BUTTON)]]).resize_keyboard()
}

/// Map a completion result to the text shown to the user. Failures are logged
/// and replaced with the generic error message.
pub fn assistant_reply(result: Result<String, openai::Error>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => {
            warn!("Completion request failed: {e}");
            ASSISTANT_ERROR.to_string()
        }
    }
}

/// Same mapping for the weather summary.
pub fn weather_reply(result: Result<String, weather::Error>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => {
            warn!("Weather request failed: {e}");
            WEATHER_ERROR.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_button_enters_assistant_mode() {
        let (action, next) = dispatch(ConversationState::MainMenu, ASSISTANT_BUTTON);
        assert_eq!(action, Action::EnterAssistant);
        assert_eq!(next, ConversationState::AssistantMode);
    }

    #[test]
    fn test_weather_button_stays_in_main_menu() {
        let (action, next) = dispatch(ConversationState::MainMenu, WEATHER_BUTTON);
        assert_eq!(action, Action::ShowWeather);
        assert_eq!(next, ConversationState::MainMenu);
    }

    #[test]
    fn test_unknown_text_reshows_menu() {
        let (action, next) = dispatch(ConversationState::MainMenu, "что ты умеешь?");
        assert_eq!(action, Action::ShowMenu);
        assert_eq!(next, ConversationState::MainMenu);
    }

    #[test]
    fn test_back_button_in_main_menu_is_plain_text() {
        let (action, next) = dispatch(ConversationState::MainMenu, BACK_BUTTON);
        assert_eq!(action, Action::ShowMenu);
        assert_eq!(next, ConversationState::MainMenu);
    }

    #[test]
    fn test_back_button_leaves_assistant_mode() {
        let (action, next) = dispatch(ConversationState::AssistantMode, BACK_BUTTON);
        assert_eq!(action, Action::LeaveAssistant);
        assert_eq!(next, ConversationState::MainMenu);
    }

    #[test]
    fn test_assistant_mode_forwards_text_verbatim() {
        let (action, next) = dispatch(ConversationState::AssistantMode, "Расскажи анекдот");
        assert_eq!(action, Action::Ask("Расскажи анекдот".to_string()));
        assert_eq!(next, ConversationState::AssistantMode);
    }

    #[test]
    fn test_assistant_mode_treats_menu_buttons_as_questions() {
        let (action, next) = dispatch(ConversationState::AssistantMode, WEATHER_BUTTON);
        assert_eq!(action, Action::Ask(WEATHER_BUTTON.to_string()));
        assert_eq!(next, ConversationState::AssistantMode);
    }

    #[test]
    fn test_assistant_reply_passes_text_through() {
        let reply = assistant_reply(Ok("Привет!".to_string()));
        assert_eq!(reply, "Привет!");
    }

    #[test]
    fn test_assistant_reply_hides_errors() {
        let reply = assistant_reply(Err(openai::Error::Http("connection refused".to_string())));
        assert_eq!(reply, ASSISTANT_ERROR);
    }

    #[test]
    fn test_weather_reply_hides_errors() {
        let reply = weather_reply(Err(weather::Error::Parse("missing field".to_string())));
        assert_eq!(reply, WEATHER_ERROR);
    }

    #[test]
    fn test_keyboards_have_expected_buttons() {
        let main = main_keyboard();
        assert_eq!(main.keyboard.len(), 2);
        let assistant = assistant_keyboard();
        assert_eq!(assistant.keyboard.len(), 1);
    }
}
