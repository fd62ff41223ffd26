use anyhow::{Context, Result, bail};
use reqwest::Url;

use crate::client::CLIENT;
use crate::gcp::gce::types::InstanceList;
use crate::gcp::get_access_token;

const GCE_API_BASE: &str = "https://compute.googleapis.com/compute/v1";

fn instances_url(project_id: &str, zone: &str, page_token: Option<&str>) -> Result<Url> {
    let mut url = Url::parse(&format!(
        "{}/projects/{}/zones/{}/instances",
        GCE_API_BASE, project_id, zone
    ))?;
    if let Some(token) = page_token {
        url.query_pairs_mut().append_pair("pageToken", token);
    }
    Ok(url)
}

/// Fetches one page of `instances.list` for `project_id` / `zone`.
///
/// Pass the previous page's `next_page_token` to continue a listing.
pub async fn list_instances(
    project_id: &str,
    zone: &str,
    page_token: Option<&str>,
) -> Result<InstanceList> {
    let token = get_access_token()
        .await
        .context("Failed to get access token")?;
    let url = instances_url(project_id, zone, page_token)?;

    let res = CLIENT
        .get(url)
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .context("Failed to call GCE list instances API")?;

    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        bail!(
            "Failed to list instances in {}/{} (status {}): {}",
            project_id,
            zone,
            status,
            body
        );
    }

    res.json().await.context("Failed to parse response JSON")
}
