//! Registered device listing.

use super::ApiClient;
use crate::error::Result;
use crate::transport::HttpTransport;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Device {
    pub id: String,
}

/// Fetch the resource ids of every registered device, across all pages.
pub async fn list_ids<T: HttpTransport>(client: &ApiClient<T>, token: &str) -> Result<Vec<String>> {
    let url = client.url("/v1/devices?limit=200");
    let devices: Vec<Device> = client.get_all(token, url).await?;
    Ok(devices.into_iter().map(|d| d.id).collect())
}
