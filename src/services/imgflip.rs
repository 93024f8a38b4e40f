//! HTTP client for the Imgflip API.
//!
//! `get_memes` lists the popular templates, `caption_image` renders a
//! template with two texts. Both answer with a `success` flag and an
//! `error_message` on failure.

use futures::future::try_join_all;
use log::{debug, info};
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    services::{ServiceError, check_status, download_image},
    sink::ImageContent,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Meme {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    pub box_count: u32,
}

/// A meme template with its downloaded image.
#[derive(Debug, Clone, PartialEq)]
pub struct MemeImage {
    pub meme: Meme,
    pub image: ImageContent,
}

/// Template and texts of a meme to create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caption {
    pub template_id: String,
    pub top_text: String,
    pub bottom_text: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error_message: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, ServiceError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(ServiceError::Api(
                self.error_message
                    .unwrap_or_else(|| "unknown imgflip error".to_owned()),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MemesData {
    memes: Vec<Meme>,
}

#[derive(Debug, Deserialize)]
struct CaptionData {
    url: String,
}

#[automock]
pub trait MemeRequester {
    /// Fetches the `count` most popular templates with their images.
    async fn top_memes(&self, count: usize) -> Result<Vec<MemeImage>, ServiceError>;
    /// Creates a meme and downloads it.
    async fn caption_image(&self, caption: &Caption) -> Result<ImageContent, ServiceError>;
}

pub struct ImgflipRequester {
    url: String,
    username: String,
    password: String,
    client: Client,
}

impl ImgflipRequester {
    /// Create a new [ImgflipRequester].
    ///
    /// # Arguments
    ///
    /// * `url` - Base url, `https://api.imgflip.com` in production
    /// * `username` - Imgflip account used to caption images
    /// * `password` - Password of the account
    pub fn new(url: &str, username: &str, password: &str) -> Self {
        ImgflipRequester {
            url: url.trim_end_matches('/').to_owned(),
            username: username.to_owned(),
            password: password.to_owned(),
            client: Client::new(),
        }
    }

    async fn get_memes(&self) -> Result<Vec<Meme>, ServiceError> {
        let url = format!("{}/get_memes", self.url);
        debug!("request {url}");

        let response: ApiResponse<MemesData> = check_status(self.client.get(&url).send().await?)?
            .json()
            .await?;
        let memes = response.into_result()?.memes;

        info!("got {} memes from imgflip", memes.len());
        Ok(memes)
    }
}

impl MemeRequester for ImgflipRequester {
    async fn top_memes(&self, count: usize) -> Result<Vec<MemeImage>, ServiceError> {
        let memes = self.get_memes().await?;

        let downloads = memes.into_iter().take(count).map(|meme| async move {
            let image = download_image(&self.client, &meme.url).await?;
            Ok::<_, ServiceError>(MemeImage { meme, image })
        });
        try_join_all(downloads).await
    }

    async fn caption_image(&self, caption: &Caption) -> Result<ImageContent, ServiceError> {
        let url = format!("{}/caption_image", self.url);
        info!("caption template {}", caption.template_id);

        let response = self
            .client
            .post(&url)
            .form(&[
                ("template_id", caption.template_id.as_str()),
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
                ("text0", caption.top_text.as_str()),
                ("text1", caption.bottom_text.as_str()),
            ])
            .send()
            .await?;
        let response: ApiResponse<CaptionData> = check_status(response)?.json().await?;
        let data = response.into_result()?;

        debug!("created meme {}", data.url);
        download_image(&self.client, &data.url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn memes_body(server_url: &str) -> String {
        format!(
            r#"{{"success": true, "data": {{"memes": [
                {{"id": "181913649", "name": "Drake Hotline Bling", "url": "{server_url}/drake.jpg", "width": 1200, "height": 1200, "box_count": 2}},
                {{"id": "87743020", "name": "Two Buttons", "url": "{server_url}/buttons.jpg", "width": 600, "height": 908, "box_count": 3}},
                {{"id": "112126428", "name": "Distracted Boyfriend", "url": "{server_url}/boyfriend.jpg", "width": 1200, "height": 800, "box_count": 3}}
            ]}}}}"#
        )
    }

    async fn mock_image(server: &mut mockito::ServerGuard, path: &str) -> mockito::Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body([0xff, 0xd8])
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_top_memes() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();
        server
            .mock("GET", "/get_memes")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(memes_body(&url))
            .create_async()
            .await;
        mock_image(&mut server, "/drake.jpg").await;
        let buttons = mock_image(&mut server, "/buttons.jpg").await;
        let boyfriend = server
            .mock("GET", "/boyfriend.jpg")
            .expect(0)
            .create_async()
            .await;

        let requester = ImgflipRequester::new(&url, "user", "secret");
        let memes = requester.top_memes(2).await.unwrap();

        assert_eq!(memes.len(), 2);
        assert_eq!(memes[0].meme.name, "Drake Hotline Bling");
        assert_eq!(memes[0].image.name, "drake.jpg");
        assert_eq!(memes[1].meme.box_count, 3);
        buttons.assert_async().await;
        boyfriend.assert_async().await;
    }

    #[tokio::test]
    async fn test_top_memes_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/get_memes")
            .with_status(200)
            .with_body(r#"{"success": false, "error_message": "Rate limited"}"#)
            .create_async()
            .await;

        let requester = ImgflipRequester::new(&server.url(), "user", "secret");
        let result = requester.top_memes(1).await;
        assert!(matches!(result, Err(ServiceError::Api(message)) if message == "Rate limited"));
    }

    #[tokio::test]
    async fn test_caption_image() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();
        server
            .mock("POST", "/caption_image")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("template_id".to_owned(), "61579".to_owned()),
                Matcher::UrlEncoded("username".to_owned(), "user".to_owned()),
                Matcher::UrlEncoded("password".to_owned(), "secret".to_owned()),
                Matcher::UrlEncoded("text0".to_owned(), "One does not simply".to_owned()),
                Matcher::UrlEncoded("text1".to_owned(), "write a bot".to_owned()),
            ]))
            .with_status(200)
            .with_body(format!(
                r#"{{"success": true, "data": {{"url": "{url}/abc123.jpg", "page_url": "https://imgflip.com/i/abc123"}}}}"#
            ))
            .create_async()
            .await;
        mock_image(&mut server, "/abc123.jpg").await;

        let caption = Caption {
            template_id: "61579".to_owned(),
            top_text: "One does not simply".to_owned(),
            bottom_text: "write a bot".to_owned(),
        };
        let image = ImgflipRequester::new(&url, "user", "secret")
            .caption_image(&caption)
            .await
            .unwrap();

        assert_eq!(image.name, "abc123.jpg");
        assert_eq!(image.mime, mime::IMAGE_JPEG);
    }

    #[tokio::test]
    async fn test_caption_image_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/caption_image")
            .with_status(200)
            .with_body(r#"{"success": false, "error_message": "No texts specified."}"#)
            .create_async()
            .await;

        let result = ImgflipRequester::new(&server.url(), "user", "secret")
            .caption_image(&Caption::default())
            .await;
        assert!(matches!(result, Err(ServiceError::Api(_))));
    }
}
