//! Unit loader that fetches page images over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::try_join_all;
use reqwest::Client;
use tracing::debug;

use smartocr_core::config::LoaderConfig;
use smartocr_core::{JobDescriptor, LoadError, Unit, UnitLoader};

/// Fetches `image_url` or every entry of `page_urls` with a GET request,
/// or decodes an inline `image_base64` image.
///
/// Pages are fetched concurrently and returned in page order.
pub struct HttpUnitLoader {
    client: Client,
}

impl HttpUnitLoader {
    pub fn new(config: &LoaderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let fetch_error = |e: reqwest::Error| LoadError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(fetch_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(fetch_error)?;
        if body.is_empty() {
            return Err(LoadError::Fetch {
                url: url.to_string(),
                reason: "empty response body".to_string(),
            });
        }
        debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body.to_vec())
    }
}

/// Decodes inline image data. Accepts a `data:<mime>;base64,` prefix.
fn decode_inline(data: &str) -> Result<Vec<u8>, LoadError> {
    let payload = match data.split_once(";base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => data,
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| LoadError::Decode(e.to_string()))?;
    if bytes.is_empty() {
        return Err(LoadError::Decode("no image bytes".to_string()));
    }
    Ok(bytes)
}

#[async_trait]
impl UnitLoader for HttpUnitLoader {
    async fn load(&self, job: &JobDescriptor) -> Result<Vec<Unit>, LoadError> {
        job.validate()?;

        if let Some(url) = &job.image_url {
            return Ok(vec![Unit::image(self.fetch(url).await?)]);
        }
        if let Some(data) = &job.image_base64 {
            return Ok(vec![Unit::image(decode_inline(data)?)]);
        }

        let pages = try_join_all(job.page_urls.iter().map(|url| self.fetch(url))).await?;
        Ok(pages
            .into_iter()
            .enumerate()
            .map(|(index, data)| Unit::page(index, data))
            .collect())
    }
}
