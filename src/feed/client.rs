// Feed HTTP client.
// Issues the GET request and validates status and content type before the body is used.

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT},
};
use serde_json::Value;
use tracing::debug;

use crate::error::{FeedError, Result};

/// The only content type accepted from the feed endpoint.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP client for the remote feed.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    /// Create a client with default headers.
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("jobfeed/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { client })
    }

    /// Fetch `url` and return the decoded JSON body.
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let response = check_response(response)?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Check status and declared content type.
fn check_response(response: Response) -> Result<Response> {
    if response.status() != StatusCode::OK {
        return Err(FeedError::Status(response.status().as_u16()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let media_type = media_type(content_type);
    if media_type != JSON_CONTENT_TYPE {
        return Err(FeedError::ContentType(media_type.to_string()));
    }

    Ok(response)
}

/// The media type of a Content-Type header, without parameters.
pub fn media_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
}
