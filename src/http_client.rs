use anyhow::{bail, Context, Result};
use reqwest::{Client, Response};

const ERROR_BODY_PREVIEW_CHARS: usize = 200;

async fn get_checked(http: &Client, url: &str) -> Result<Response> {
    let response = http
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request failed for {url}"))?;

    let status = response.status();
    if !status.is_success() {
        // THREDDS puts the reason for a rejected subset request in the body.
        let body = response.text().await.unwrap_or_default();
        let preview: String = body.trim().chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
        if preview.is_empty() {
            bail!("Request failed ({status}) for {url}");
        }
        bail!("Request failed ({status}) for {url}: {preview}");
    }

    Ok(response)
}

pub async fn fetch_bytes(http: &Client, url: &str) -> Result<Vec<u8>> {
    let bytes = get_checked(http, url)
        .await?
        .bytes()
        .await
        .with_context(|| format!("Failed to read body for {url}"))?;
    Ok(bytes.to_vec())
}

pub async fn fetch_text(http: &Client, url: &str) -> Result<String> {
    get_checked(http, url)
        .await?
        .text()
        .await
        .with_context(|| format!("Failed to read text body for {url}"))
}
