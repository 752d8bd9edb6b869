use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::message::Message;

/// POST `message` to a Slack incoming webhook. Single attempt; anything but
/// `200 OK` is an error.
pub async fn post_webhook(webhook_url: &str, message: &Message) -> Result<()> {
    let body = serde_json::to_vec(message)?;
    debug!(bytes = body.len(), "posting notification");

    let res = reqwest::Client::new()
        .post(webhook_url)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await?;

    let status = res.status();
    info!(%status, "webhook responded");
    if status != StatusCode::OK {
        let body = res.text().await.unwrap_or_default();
        return Err(Error::Status { status, body });
    }
    Ok(())
}
