//! Reads the desired wallpaper from the remote endpoint.
//!
//! The endpoint serves a plain text body of the form `<image_url>,<timestamp>`.

use crate::error::{SyncError, SyncResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteState {
    pub image_url: String,
    pub timestamp: String,
}

/// Split a state body into its two fields.
pub fn parse_state(body: &str) -> SyncResult<RemoteState> {
    let fields: Vec<&str> = body.split(',').collect();
    let [image_url, timestamp] = fields.as_slice() else {
        return Err(SyncError::Format {
            fields: fields.len(),
        });
    };

    Ok(RemoteState {
        image_url: image_url.trim().to_string(),
        timestamp: timestamp.trim().to_string(),
    })
}

pub async fn fetch_desired_state(
    client: &reqwest::Client,
    endpoint: &str,
) -> SyncResult<RemoteState> {
    let response = client.get(endpoint).send().await?;

    if !response.status().is_success() {
        return Err(SyncError::Status {
            url: endpoint.to_string(),
            status: response.status(),
        });
    }

    let body = response.text().await?;
    parse_state(&body)
}
