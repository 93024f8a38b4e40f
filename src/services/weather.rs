//! HTTP client for the OpenWeatherMap API.
//!
//! Uses the `data/2.5/weather` and `data/2.5/forecast` endpoints with metric
//! units. An unknown city is reported as [`ServiceError::NotFound`].

use log::{debug, info};
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;

use crate::services::{ServiceError, check_status};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Condition {
    /// OpenWeatherMap condition code, `800` is a clear sky
    pub id: u32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Measurements {
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Wind {
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Country {
    #[serde(default)]
    pub country: String,
}

/// Current weather of a city.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentWeather {
    pub name: String,
    pub sys: Country,
    pub weather: Vec<Condition>,
    pub main: Measurements,
    pub wind: Wind,
}

/// One three-hourly step of a forecast.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastStep {
    /// `YYYY-MM-DD HH:MM:SS`, UTC
    pub dt_txt: String,
    pub main: Measurements,
    pub weather: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct City {
    pub name: String,
    #[serde(default)]
    pub country: String,
}

/// Five day forecast of a city.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Forecast {
    pub city: City,
    pub list: Vec<ForecastStep>,
}

/// Trait for fetching weather data.
#[automock]
pub trait WeatherRequester {
    async fn get_weather(&self, city: &str) -> Result<CurrentWeather, ServiceError>;
    async fn get_forecast(&self, city: &str) -> Result<Forecast, ServiceError>;
}

pub struct OpenWeatherMapRequester {
    url: String,
    api_key: String,
    lang: String,
    client: Client,
}

impl OpenWeatherMapRequester {
    /// Create a new [OpenWeatherMapRequester].
    ///
    /// # Arguments
    ///
    /// * `url` - Base url, `https://api.openweathermap.org` in production
    /// * `api_key` - OpenWeatherMap API key
    /// * `lang` - Language of the condition descriptions
    pub fn new(url: &str, api_key: &str, lang: &str) -> Self {
        OpenWeatherMapRequester {
            url: url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            lang: lang.to_owned(),
            client: Client::new(),
        }
    }

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        city: &str,
    ) -> Result<T, ServiceError> {
        let url = format!("{}/data/2.5/{}", self.url, endpoint);
        debug!("request {url}?q={city}");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lang", self.lang.as_str()),
            ])
            .send()
            .await?;

        Ok(check_status(response)?.json().await?)
    }
}

impl WeatherRequester for OpenWeatherMapRequester {
    async fn get_weather(&self, city: &str) -> Result<CurrentWeather, ServiceError> {
        info!("request weather of {city}");
        self.request("weather", city).await
    }

    async fn get_forecast(&self, city: &str) -> Result<Forecast, ServiceError> {
        info!("request forecast of {city}");
        self.request("forecast", city).await
    }
}
