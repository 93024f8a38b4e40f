//! HTTP client for absence.io.
//!
//! absence.io authenticates requests with Hawk: every request carries an
//! `Authorization` header holding an HMAC-SHA256 over the method, the path,
//! the host, a timestamp and a random nonce.

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use log::{debug, info};
use mockall::automock;
use rand::{Rng, distributions::Alphanumeric};
use reqwest::{Client, Url, header::AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use crate::services::{ServiceError, check_status};

type HmacSha256 = Hmac<Sha256>;

/// Absences fetched per request.
const ABSENCE_LIMIT: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Absence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct AbsencesResponse {
    data: Vec<Absence>,
}

#[automock]
pub trait AbsenceRequester {
    async fn get_absences(&self) -> Result<Vec<Absence>, ServiceError>;
}

/// Hawk credentials.
#[derive(Debug, Clone)]
pub struct HawkCredentials {
    pub id: String,
    pub key: String,
}

/// Parts of a request covered by the Hawk MAC.
#[derive(Debug, Clone)]
struct HawkRequest<'a> {
    method: &'a str,
    /// Path and query
    resource: &'a str,
    host: &'a str,
    port: u16,
    timestamp: i64,
    nonce: &'a str,
    ext: Option<&'a str>,
}

impl HawkRequest<'_> {
    fn normalized(&self) -> String {
        format!(
            "hawk.1.header\n{}\n{}\n{}\n{}\n{}\n{}\n\n{}\n",
            self.timestamp,
            self.nonce,
            self.method.to_uppercase(),
            self.resource,
            self.host.to_lowercase(),
            self.port,
            self.ext.unwrap_or_default(),
        )
    }

    fn mac(&self, key: &str) -> Result<String, ServiceError> {
        let mut mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| ServiceError::Api(format!("invalid hawk key: {e}")))?;
        mac.update(self.normalized().as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    fn header(&self, credentials: &HawkCredentials) -> Result<String, ServiceError> {
        let ext = match self.ext {
            Some(ext) => format!(", ext=\"{ext}\""),
            None => String::new(),
        };
        Ok(format!(
            "Hawk id=\"{}\", ts=\"{}\", nonce=\"{}\"{ext}, mac=\"{}\"",
            credentials.id,
            self.timestamp,
            self.nonce,
            self.mac(&credentials.key)?
        ))
    }
}

fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect()
}

pub struct AbsenceIoRequester {
    url: String,
    credentials: HawkCredentials,
    client: Client,
}

impl AbsenceIoRequester {
    /// Create a new [AbsenceIoRequester].
    ///
    /// # Arguments
    ///
    /// * `url` - Base url, `https://app.absence.io` in production
    /// * `credentials` - API key id and key from the absence.io profile
    pub fn new(url: &str, credentials: HawkCredentials) -> Self {
        AbsenceIoRequester {
            url: url.trim_end_matches('/').to_owned(),
            credentials,
            client: Client::new(),
        }
    }

    fn authorization(&self, method: &str, url: &Url) -> Result<String, ServiceError> {
        let host = url
            .host_str()
            .ok_or_else(|| ServiceError::Api(format!("no host in {url}")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ServiceError::Api(format!("no port for {url}")))?;
        let resource = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_owned(),
        };
        let nonce = nonce();

        HawkRequest {
            method,
            resource: &resource,
            host,
            port,
            timestamp: Utc::now().timestamp(),
            nonce: &nonce,
            ext: None,
        }
        .header(&self.credentials)
    }
}

impl AbsenceRequester for AbsenceIoRequester {
    async fn get_absences(&self) -> Result<Vec<Absence>, ServiceError> {
        let url = Url::parse(&format!("{}/api/v2/absences", self.url))
            .map_err(|e| ServiceError::Api(format!("invalid absence.io url: {e}")))?;
        info!("request absences");

        let response = self
            .client
            .post(url.clone())
            .header(AUTHORIZATION, self.authorization("POST", &url)?)
            .json(&json!({ "skip": 0, "limit": ABSENCE_LIMIT }))
            .send()
            .await?;
        let response: AbsencesResponse = check_status(response)?.json().await?;

        debug!("got {} absences", response.data.len());
        Ok(response.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_hawk_header() {
        let credentials = HawkCredentials {
            id: "dh37fgj492je".to_owned(),
            key: "werxhqb98rpaxn39848xrunpaw3489ruxnpa98w4rxn".to_owned(),
        };
        let request = HawkRequest {
            method: "GET",
            resource: "/resource/1?b=1&a=2",
            host: "example.com",
            port: 8000,
            timestamp: 1353832234,
            nonce: "j4h3g2",
            ext: Some("some-app-ext-data"),
        };

        assert_eq!(
            request.header(&credentials).unwrap(),
            "Hawk id=\"dh37fgj492je\", ts=\"1353832234\", nonce=\"j4h3g2\", ext=\"some-app-ext-data\", mac=\"6R4rV5iE+NPoym+WwjeHzjAGXUtLNIxmo1vpMofpLAE=\""
        );
    }

    #[test]
    fn test_hawk_mac_without_ext() {
        let request = HawkRequest {
            method: "post",
            resource: "/api/v2/absences",
            host: "APP.absence.io",
            port: 443,
            timestamp: 1353832234,
            nonce: "j4h3g2",
            ext: None,
        };
        assert_eq!(
            request.mac("secret").unwrap(),
            "lGR97vKhKZux+dimUKc2cMaCvyqmJj350vWAsim0xPw="
        );
    }

    #[test]
    fn test_nonce() {
        let first = nonce();
        assert_eq!(first.len(), 6);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn test_get_absences() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v2/absences")
            .match_header(
                "authorization",
                Matcher::Regex(r#"^Hawk id="key-id", ts="\d+", nonce="\w{6}", mac=".+"$"#.to_owned()),
            )
            .match_body(Matcher::PartialJsonString(r#"{"skip": 0, "limit": 50}"#.to_owned()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"skip": 0, "limit": 50, "count": 2, "data": [
                    {"_id": "1", "start": "2024-05-06T00:00:00.000Z", "end": "2024-05-08T00:00:00.000Z"},
                    {"_id": "2", "start": "2024-04-01T00:00:00.000Z", "end": "2024-04-02T00:00:00.000Z"}
                ]}"#,
            )
            .create_async()
            .await;

        let credentials = HawkCredentials {
            id: "key-id".to_owned(),
            key: "secret".to_owned(),
        };
        let absences = AbsenceIoRequester::new(&server.url(), credentials)
            .get_absences()
            .await
            .unwrap();

        assert_eq!(absences.len(), 2);
        assert_eq!(
            absences[0].start,
            "2024-05-06T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_get_absences_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v2/absences")
            .with_status(401)
            .create_async()
            .await;

        let credentials = HawkCredentials {
            id: "key-id".to_owned(),
            key: "wrong".to_owned(),
        };
        let result = AbsenceIoRequester::new(&server.url(), credentials)
            .get_absences()
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::Status(reqwest::StatusCode::UNAUTHORIZED))
        ));
    }
}
