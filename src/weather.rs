//! WeatherAPI.com client for current conditions in Phuket.

use chrono::Local;
use serde::Deserialize;
use tracing::debug;

const API_URL: &str = "http://api.weatherapi.com/v1/current.json";
const LOCATION: &str = "Phuket,Thailand";

pub struct WeatherClient {
    api_key: Option<String>,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct ApiResponse {
    location: ApiLocation,
    current: ApiCurrent,
}

#[derive(Deserialize)]
struct ApiLocation {
    name: String,
    country: String,
}

#[derive(Deserialize)]
struct ApiCurrent {
    temp_c: f64,
    feelslike_c: f64,
    humidity: i64,
    condition: ApiCondition,
    wind_kph: f64,
    uv: f64,
}

#[derive(Deserialize)]
struct ApiCondition {
    text: String,
}

/// Current conditions, already rounded for display.
pub struct WeatherReport {
    pub city: String,
    pub country: String,
    pub condition: String,
    pub temp_c: i32,
    pub feels_like_c: i32,
    pub humidity: i64,
    pub wind_ms: f64,
    pub uv: f64,
    /// Local HH:MM the report was fetched at.
    pub updated: String,
}

impl WeatherReport {
    fn from_api(data: ApiResponse, updated: String) -> Self {
        Self {
            city: data.location.name,
            country: data.location.country,
            condition: data.current.condition.text,
            temp_c: data.current.temp_c.round() as i32,
            feels_like_c: data.current.feelslike_c.round() as i32,
            humidity: data.current.humidity,
            wind_ms: kph_to_ms(data.current.wind_kph),
            uv: data.current.uv,
            updated,
        }
    }

    pub fn format(&self) -> String {
        format!(
            "🌴 {city}, {country}\n\n\
             {emoji} {condition}\n\
             🌡️ Температура: {temp}°C (ощущается как {feels}°C)\n\
             💧 Влажность: {humidity}%\n\
             💨 Ветер: {wind:.1} м/с\n\
             ☀️ УФ-индекс: {uv}\n\n\
             🕐 Обновлено: {updated}",
            city = self.city,
            country = self.country,
            emoji = condition_emoji(&self.condition),
            condition = self.condition,
            temp = self.temp_c,
            feels = self.feels_like_c,
            humidity = self.humidity,
            wind = self.wind_ms,
            uv = self.uv,
            updated = self.updated,
        )
    }
}

impl WeatherClient {
    pub fn new(api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self { api_key, http }
    }

    /// Build the weather summary text. Without an API key this returns a
    /// static fallback and never touches the network.
    pub async fn report(&self) -> Result<String, Error> {
        let Some(ref key) = self.api_key else {
            return Ok(FALLBACK_REPORT.to_string());
        };

        let response = self
            .http
            .get(API_URL)
            .query(&[("key", key.as_str()), ("q", LOCATION), ("lang", "ru")])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        debug!("WeatherAPI response status: {status}");

        if !status.is_success() {
            return Err(Error::Api(format!("{status}: {body}")));
        }

        let data: ApiResponse =
            serde_json::from_str(&body).map_err(|e| Error::Parse(e.to_string()))?;

        let updated = Local::now().format("%H:%M").to_string();
        Ok(WeatherReport::from_api(data, updated).format())
    }
}

fn kph_to_ms(kph: f64) -> f64 {
    (kph / 3.6 * 10.0).round() / 10.0
}

/// Pick an emoji for a WeatherAPI condition text. Checked in order, first
/// match wins: "partly cloudy" must be recognized before the generic "cloudy".
pub fn condition_emoji(condition_text: &str) -> &'static str {
    let condition = condition_text.to_lowercase();

    if condition.contains("sunny") || condition.contains("clear") {
        "☀️"
    } else if condition.contains("partly cloudy") {
        "⛅"
    } else if condition.contains("cloudy") || condition.contains("overcast") {
        "☁️"
    } else if condition.contains("rain") || condition.contains("drizzle") {
        "🌧️"
    } else if condition.contains("thunder") || condition.contains("storm") {
        "⛈️"
    } else if condition.contains("snow") {
        "❄️"
    } else if condition.contains("mist") || condition.contains("fog") {
        "🌫️"
    } else {
        "🌤️"
    }
}

const FALLBACK_REPORT: &str = "🌴 Пхукет, Таиланд\n\n\
    ⚠️ Для получения актуальной погоды нужен API ключ WeatherAPI.com\n\n\
    Обычная погода в Пхукете:\n\
    🌡️ Температура: 28-32°C\n\
    💧 Влажность: 70-80%\n\
    🌴 Тропический климат круглый год";

#[derive(Debug)]
pub enum Error {
    Http(String),
    Api(String),
    Parse(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Api(e) => write!(f, "API error: {e}"),
            Error::Parse(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emoji_partly_cloudy_before_cloudy() {
        assert_eq!(condition_emoji("Partly cloudy"), "⛅");
    }

    #[test]
    fn test_emoji_known_conditions() {
        assert_eq!(condition_emoji("Clear"), "☀️");
        assert_eq!(condition_emoji("Heavy rain"), "🌧️");
        assert_eq!(condition_emoji("Overcast"), "☁️");
        assert_eq!(condition_emoji("Thundery outbreaks possible"), "⛈️");
        assert_eq!(condition_emoji("Patchy snow"), "❄️");
        assert_eq!(condition_emoji("Freezing fog"), "🌫️");
    }

    #[test]
    fn test_emoji_unknown_condition_defaults() {
        assert_eq!(condition_emoji("Unknown condition"), "🌤️");
    }

    #[test]
    fn test_kph_to_ms() {
        assert_eq!(kph_to_ms(36.0), 10.0);
        assert_eq!(kph_to_ms(15.1), 4.2);
        assert_eq!(kph_to_ms(0.0), 0.0);
    }

    #[test]
    fn test_report_format() {
        let report = WeatherReport {
            city: "Пхукет".to_string(),
            country: "Таиланд".to_string(),
            condition: "Солнечно".to_string(),
            temp_c: 31,
            feels_like_c: 36,
            humidity: 70,
            wind_ms: 4.2,
            uv: 8.0,
            updated: "14:05".to_string(),
        };

        let text = report.format();
        assert!(text.starts_with("🌴 Пхукет, Таиланд\n\n"));
        assert!(text.contains("🌡️ Температура: 31°C (ощущается как 36°C)"));
        assert!(text.contains("💧 Влажность: 70%"));
        assert!(text.contains("💨 Ветер: 4.2 м/с"));
        assert!(text.contains("☀️ УФ-индекс: 8"));
        assert!(text.ends_with("🕐 Обновлено: 14:05"));
    }

    #[tokio::test]
    async fn test_report_without_key_is_static_fallback() {
        let client = WeatherClient::new(None);
        let text = client.report().await.expect("fallback never fails");
        assert!(text.contains("нужен API ключ WeatherAPI.com"));
        assert!(text.contains("Тропический климат"));
    }
}
