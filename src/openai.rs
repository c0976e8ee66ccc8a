//! OpenAI chat-completion client.

use serde::{Deserialize, Serialize};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const MODEL: &str = "gpt-3.5-turbo";
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;
const SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Respond in Russian in a friendly and conversational manner.";

pub struct Client {
    api_key: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct ApiRequest {
    model: &'static str,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl Client {
    pub fn new(api_key: String) -> Self {
        // The provider can be slow on long answers; bound the wait instead of
        // hanging the conversation forever.
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self { api_key, http }
    }

    /// Send a single user message and return the model's reply.
    /// Each call is independent, no history is kept.
    pub async fn complete(&self, user_text: &str) -> Result<String, Error> {
        let request = ApiRequest {
            model: MODEL,
            messages: vec![
                ApiMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ApiMessage {
                    role: "user",
                    content: user_text.to_string(),
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .http
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        extract_reply(api_response)
    }
}

fn extract_reply(response: ApiResponse) -> Result<String, Error> {
    response
        .choices
        .first()
        .map(|c| c.message.content.trim().to_string())
        .ok_or(Error::Empty)
}

#[derive(Debug)]
pub enum Error {
    Http(String),
    Api(String),
    Parse(String),
    Empty,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Api(e) => write!(f, "API error: {e}"),
            Error::Parse(e) => write!(f, "Parse error: {e}"),
            Error::Empty => write!(f, "Empty response"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_reply_takes_first_choice_trimmed() {
        let response = ApiResponse {
            choices: vec![
                Choice {
                    message: ChoiceMessage {
                        content: "  Привет! Чем могу помочь?\n".to_string(),
                    },
                },
                Choice {
                    message: ChoiceMessage {
                        content: "second".to_string(),
                    },
                },
            ],
        };
        assert_eq!(extract_reply(response).unwrap(), "Привет! Чем могу помочь?");
    }

    #[test]
    fn test_extract_reply_empty_choices() {
        let response = ApiResponse { choices: vec![] };
        assert!(matches!(extract_reply(response), Err(Error::Empty)));
    }
}
