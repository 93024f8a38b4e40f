//! HTTP client for the BambooHR time-off API.

use chrono::NaiveDate;
use log::{debug, info};
use mockall::automock;
use reqwest::{Client, header::ACCEPT};
use serde::Deserialize;

use crate::services::{ServiceError, check_status};

/// Entry of the "who's out" calendar.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimeOff {
    pub name: String,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

#[automock]
pub trait TimeOffRequester {
    /// Fetches who is out on `date`.
    async fn whos_out(&self, date: NaiveDate) -> Result<Vec<TimeOff>, ServiceError>;
}

pub struct BambooHrRequester {
    url: String,
    api_key: String,
    company_domain: String,
    client: Client,
}

impl BambooHrRequester {
    /// Create a new [BambooHrRequester].
    ///
    /// # Arguments
    ///
    /// * `url` - Base url, `https://api.bamboohr.com` in production
    /// * `api_key` - BambooHR API key, sent as basic auth user
    /// * `company_domain` - Subdomain of the company on BambooHR
    pub fn new(url: &str, api_key: &str, company_domain: &str) -> Self {
        BambooHrRequester {
            url: url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            company_domain: company_domain.to_owned(),
            client: Client::new(),
        }
    }
}

impl TimeOffRequester for BambooHrRequester {
    async fn whos_out(&self, date: NaiveDate) -> Result<Vec<TimeOff>, ServiceError> {
        let url = format!(
            "{}/api/gateway.php/{}/v1/time_off/whos_out/",
            self.url, self.company_domain
        );
        let date = date.format("%Y-%m-%d").to_string();
        info!("request who is out on {date}");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.api_key, Some("x"))
            .header(ACCEPT, "application/json")
            .query(&[("start", date.as_str()), ("end", date.as_str())])
            .send()
            .await?;
        let entries: Vec<TimeOff> = check_status(response)?.json().await?;

        debug!("{} people out on {date}", entries.len());
        Ok(entries)
    }
}
