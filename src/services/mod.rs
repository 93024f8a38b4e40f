//! REST clients of the third-party services the bots relay.
//!
//! Each service sits behind a requester trait annotated with
//! [`mockall::automock`] so the bots can be tested without network access.
//! The concrete requesters use [`reqwest`] and are tested against
//! [`mockito`](https://docs.rs/mockito) servers.
//!
//! - [`xkcd`] - comics from xkcd.com
//! - [`weather`] - current weather and forecasts from OpenWeatherMap
//! - [`libraries_io`] - package search on libraries.io
//! - [`imgflip`] - meme templates and captions from Imgflip
//! - [`absence_io`] - absences from absence.io (Hawk authentication)
//! - [`bamboohr`] - time-off from BambooHR
//! - [`report`] - hate speech reports

pub mod absence_io;
pub mod bamboohr;
pub mod imgflip;
pub mod libraries_io;
pub mod report;
pub mod weather;
pub mod xkcd;

use reqwest::{Response, StatusCode};
use thiserror::Error;

use crate::sink::ImageContent;

/// Failure of an external service call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request could not be sent or its body could not be decoded
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The service answered with an unexpected status
    #[error("unexpected status {0}")]
    Status(StatusCode),
    /// The service answered but reported a failure
    #[error("service error: {0}")]
    Api(String),
    /// The requested resource does not exist
    #[error("not found")]
    NotFound,
}

/// Maps error statuses of `response` to a [`ServiceError`].
pub(crate) fn check_status(response: Response) -> Result<Response, ServiceError> {
    match response.status() {
        StatusCode::NOT_FOUND => Err(ServiceError::NotFound),
        status if !status.is_success() => Err(ServiceError::Status(status)),
        _ => Ok(response),
    }
}

/// Downloads an image with `client`.
///
/// The file name is the last path segment of `url`.
pub(crate) async fn download_image(
    client: &reqwest::Client,
    url: &str,
) -> Result<ImageContent, ServiceError> {
    let response = check_status(client.get(url).send().await?)?;
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let data = response.bytes().await?.to_vec();

    let name = url
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("image");

    Ok(ImageContent::from_download(
        name,
        content_type.as_deref(),
        data,
    ))
}
