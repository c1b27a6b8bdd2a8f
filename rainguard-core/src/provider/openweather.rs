use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::model::{Coordinate, CurrentConditions, Forecast, ForecastPoint};

use super::{FetchError, FetchResult, WeatherProvider};

const BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Per-request bound; a slow provider costs at most this much of a tick.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    language: String,
    http: Client,
}

// Keep the credential out of Debug output.
impl std::fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("api_key", &"[REDACTED]")
            .field("language", &self.language)
            .finish()
    }
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, language: String) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { api_key, language, http })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        at: &Coordinate,
    ) -> FetchResult<T> {
        let url = format!("{BASE_URL}/{endpoint}");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
                ("lang", self.language.clone()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status { status, body: truncate_body(&body) });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_conditions(&self, at: &Coordinate) -> FetchResult<CurrentConditions> {
        let parsed: OwCurrentResponse = self.get_json("weather", at).await?;
        Ok(parsed.into())
    }

    async fn forecast(&self, at: &Coordinate) -> FetchResult<Forecast> {
        let parsed: OwForecastResponse = self.get_json("forecast", at).await?;
        Ok(parsed.into())
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

impl From<OwCurrentResponse> for CurrentConditions {
    fn from(parsed: OwCurrentResponse) -> Self {
        let description = parsed
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_else(|| "unknown".to_string());

        CurrentConditions {
            location_name: parsed.name,
            country: parsed.sys.country.unwrap_or_default(),
            temperature_c: parsed.main.temp,
            humidity_pct: parsed.main.humidity,
            description,
            wind_speed_mps: parsed.wind.speed,
            pressure_hpa: parsed.main.pressure,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwRain {
    #[serde(rename = "3h", default)]
    three_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastWeather {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    #[serde(default)]
    rain: Option<OwRain>,
    weather: Vec<OwForecastWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

impl From<OwForecastResponse> for Forecast {
    fn from(parsed: OwForecastResponse) -> Self {
        let points = parsed
            .list
            .into_iter()
            .map(|entry| ForecastPoint {
                timestamp: unix_to_utc(entry.dt).unwrap_or_else(Utc::now),
                rain_3h_mm: entry.rain.and_then(|r| r.three_hour),
                condition_code: entry.weather.first().map(|w| w.id).unwrap_or(0),
            })
            .collect();

        Forecast::new(points)
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        // Back off to a char boundary so multibyte text cannot panic.
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
