//! HTTP client for the xkcd JSON API.
//!
//! xkcd exposes `/info.0.json` for the latest comic and `/{n}/info.0.json`
//! for a given comic. The comic image is downloaded from the `img` field.

use log::{debug, info};
use mockall::automock;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    services::{ServiceError, check_status, download_image},
    sink::ImageContent,
};

/// Comic metadata as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct ComicInfo {
    pub num: u32,
    pub title: String,
    pub alt: String,
    pub img: String,
}

/// A comic with its image.
#[derive(Debug, Clone, PartialEq)]
pub struct Comic {
    pub number: u32,
    pub title: String,
    /// Alt text of the comic
    pub comment: String,
    pub image: ImageContent,
}

/// Trait for fetching comics.
#[automock]
pub trait ComicRequester {
    /// Fetches the latest comic.
    async fn get_latest(&self) -> Result<Comic, ServiceError>;
    /// Fetches comic number `number`, [`ServiceError::NotFound`] if it does not exist.
    async fn get_comic(&self, number: u32) -> Result<Comic, ServiceError>;
    /// Fetches a comic picked uniformly between the first and the latest one.
    async fn get_random(&self) -> Result<Comic, ServiceError>;
}

/// xkcd.com answers this comic with a real HTTP 404.
const MISSING_COMIC: u32 = 404;

/// Picks a comic uniformly in `1..=latest`, skipping the missing one.
fn random_comic_number<R: Rng + ?Sized>(rng: &mut R, latest: u32) -> u32 {
    if latest <= MISSING_COMIC {
        return rng.gen_range(1..=latest.clamp(1, MISSING_COMIC - 1));
    }

    let number = rng.gen_range(1..latest);
    if number >= MISSING_COMIC { number + 1 } else { number }
}

/// Requester talking to xkcd.com.
pub struct XkcdRequester {
    /// Base url, `https://xkcd.com` in production
    url: String,
    client: Client,
}

impl XkcdRequester {
    pub fn new(url: &str) -> Self {
        XkcdRequester {
            url: url.trim_end_matches('/').to_owned(),
            client: Client::new(),
        }
    }

    async fn get_info(&self, number: Option<u32>) -> Result<ComicInfo, ServiceError> {
        let url = match number {
            Some(number) => format!("{}/{}/info.0.json", self.url, number),
            None => format!("{}/info.0.json", self.url),
        };
        debug!("request {url}");

        let comic_info: ComicInfo = check_status(self.client.get(&url).send().await?)?
            .json()
            .await?;

        debug!("response from {} -> {:?}", url, comic_info);
        Ok(comic_info)
    }

    async fn with_image(&self, comic_info: ComicInfo) -> Result<Comic, ServiceError> {
        let image = download_image(&self.client, &comic_info.img).await?;
        Ok(Comic {
            number: comic_info.num,
            title: comic_info.title,
            comment: comic_info.alt,
            image,
        })
    }
}

impl ComicRequester for XkcdRequester {
    async fn get_latest(&self) -> Result<Comic, ServiceError> {
        info!("request latest comic");
        let comic_info = self.get_info(None).await?;
        self.with_image(comic_info).await
    }

    async fn get_comic(&self, number: u32) -> Result<Comic, ServiceError> {
        info!("request comic {number}");
        let comic_info = self.get_info(Some(number)).await?;
        self.with_image(comic_info).await
    }

    async fn get_random(&self) -> Result<Comic, ServiceError> {
        let latest = self.get_info(None).await?;
        let number = random_comic_number(&mut rand::thread_rng(), latest.num);
        info!("request random comic {number}");

        let comic_info = self.get_info(Some(number)).await?;
        self.with_image(comic_info).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn info_body(server_url: &str, num: u32) -> String {
        format!(
            r#"{{"month": "1", "num": {num}, "link": "", "year": "2024", "news": "", "safe_title": "Comic {num}", "transcript": "", "alt": "Alt text {num}", "img": "{server_url}/comics/{num}.png", "title": "Comic {num}", "day": "1"}}"#
        )
    }

    async fn mock_image(server: &mut mockito::ServerGuard, num: u32) -> mockito::Mock {
        server
            .mock("GET", format!("/comics/{num}.png").as_str())
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body([137, 80, 78, 71])
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_get_latest() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("GET", "/info.0.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(info_body(&url, 3000))
            .create_async()
            .await;
        mock_image(&mut server, 3000).await;

        let comic = XkcdRequester::new(&url).get_latest().await.unwrap();
        assert_eq!(comic.number, 3000);
        assert_eq!(comic.title, "Comic 3000");
        assert_eq!(comic.comment, "Alt text 3000");
        assert_eq!(comic.image.name, "3000.png");
        assert_eq!(comic.image.mime, mime::IMAGE_PNG);
        assert_eq!(comic.image.data, vec![137, 80, 78, 71]);
    }

    #[tokio::test]
    async fn test_get_comic() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("GET", "/42/info.0.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(info_body(&url, 42))
            .create_async()
            .await;
        mock_image(&mut server, 42).await;

        let comic = XkcdRequester::new(&format!("{url}/")).get_comic(42).await.unwrap();
        assert_eq!(comic.number, 42);
        assert_eq!(comic.comment, "Alt text 42");
    }

    #[tokio::test]
    async fn test_get_comic_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/99999/info.0.json")
            .with_status(404)
            .create_async()
            .await;

        let result = XkcdRequester::new(&server.url()).get_comic(99999).await;
        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_get_random_stays_in_range() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("GET", "/info.0.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(info_body(&url, 1))
            .create_async()
            .await;
        server
            .mock("GET", "/1/info.0.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(info_body(&url, 1))
            .create_async()
            .await;
        mock_image(&mut server, 1).await;

        let comic = XkcdRequester::new(&url).get_random().await.unwrap();
        assert_eq!(comic.number, 1);
    }

    #[tokio::test]
    async fn test_get_latest_invalid_json() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/info.0.json")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let result = XkcdRequester::new(&server.url()).get_latest().await;
        assert!(matches!(result, Err(ServiceError::Request(_))));
    }

    #[test]
    fn test_random_comic_number_skips_missing_comic() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen_last = false;
        for _ in 0..20_000 {
            let number = random_comic_number(&mut rng, 410);
            assert!((1..=410).contains(&number));
            assert_ne!(number, MISSING_COMIC);
            seen_last |= number == 410;
        }
        assert!(seen_last);
    }

    #[test]
    fn test_random_comic_number_small_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(random_comic_number(&mut rng, 0), 1);
        assert_eq!(random_comic_number(&mut rng, 1), 1);
        for _ in 0..1_000 {
            let number = random_comic_number(&mut rng, MISSING_COMIC);
            assert!((1..MISSING_COMIC).contains(&number));
        }
    }
}
