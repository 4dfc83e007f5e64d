use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{SyncError, SyncResult};

/// File extension for an image content type, empty when unknown.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match media_type.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        _ => "",
    }
}

fn unique_file_name(extension: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    if extension.is_empty() {
        id
    } else {
        format!("{}.{}", id, extension)
    }
}

/// Download `url` into `dir`, returning the path of the new file.
pub async fn download(client: &reqwest::Client, url: &str, dir: &Path) -> SyncResult<PathBuf> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(SyncError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let extension = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(extension_for_content_type)
        .unwrap_or_default();

    let file_path = dir.join(unique_file_name(extension));
    let mut file = fs::File::create(&file_path)
        .await
        .map_err(|e| SyncError::file_system("creating", &file_path, e))?;

    if let Err(e) = write_body(response, &mut file, &file_path).await {
        drop(file);
        let _ = fs::remove_file(&file_path).await;
        return Err(e);
    }

    Ok(file_path)
}

async fn write_body(
    response: reqwest::Response,
    file: &mut fs::File,
    file_path: &Path,
) -> SyncResult<()> {
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| SyncError::file_system("writing", file_path, e))?;
    }
    file.flush()
        .await
        .map_err(|e| SyncError::file_system("writing", file_path, e))?;
    Ok(())
}
