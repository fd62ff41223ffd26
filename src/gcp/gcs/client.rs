//! # GCS API Client Logic

use anyhow::{Context, Result, bail};
use reqwest::Url;

use crate::client::CLIENT;
use crate::gcp::gcs::types::ObjectItem;
use crate::gcp::get_access_token;

/// Builds the simple ("media") upload URL. The object name travels as a
/// query parameter, so slashes need no special handling.
fn upload_url(bucket: &str, name: &str) -> Result<Url> {
    let mut url = Url::parse(&format!(
        "https://storage.googleapis.com/upload/storage/v1/b/{}/o",
        bucket
    ))?;
    {
        let mut qp = url.query_pairs_mut();
        qp.append_pair("uploadType", "media");
        qp.append_pair("name", name);
    }
    Ok(url)
}

/// Uploads data as a new object to a GCS bucket.
///
/// # Arguments
/// * `bucket` - The destination bucket name.
/// * `name` - The full path and name for the new object.
/// * `data` - The raw byte data to upload.
/// * `content_type` - The MIME type of the data (e.g., "text/plain").
///
/// # Returns
/// An `ObjectItem` containing the metadata of the newly created object.
pub async fn upload_object(
    bucket: &str,
    name: &str,
    data: &[u8],
    content_type: &str,
) -> Result<ObjectItem> {
    let token = get_access_token()
        .await
        .context("Failed to get access token")?;
    let url = upload_url(bucket, name)?;

    let res = CLIENT
        .post(url)
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", content_type)
        .body(data.to_vec())
        .send()
        .await
        .context("Failed to call GCS upload API")?;

    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        bail!("GCS upload to gs://{}/{} failed ({}): {}", bucket, name, status, body);
    }

    let item: ObjectItem = res.json().await.context("Invalid GCS upload response")?;
    Ok(item)
}
