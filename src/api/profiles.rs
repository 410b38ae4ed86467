//! Provisioning profile resources: creation, listing per bundle id, deletion.

use super::{ApiClient, Document};
use crate::config::ProfileType;
use crate::error::Result;
use crate::transport::HttpTransport;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct Profile {
    pub id: String,
    pub attributes: ProfileAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAttributes {
    pub name: Option<String>,
    /// base64-encoded profile payload
    pub profile_content: Option<String>,
    pub uuid: Option<String>,
    pub platform: Option<String>,
    pub profile_state: Option<String>,
    pub profile_type: Option<String>,
    pub created_date: Option<String>,
    pub expiration_date: Option<String>,
}

/// Create a profile binding one bundle id, one certificate, and the given
/// device set.
pub async fn create<T: HttpTransport>(
    client: &ApiClient<T>,
    token: &str,
    name: &str,
    bundle_resource_id: &str,
    certificate_id: &str,
    device_ids: &[String],
    profile_type: ProfileType,
) -> Result<Profile> {
    let devices: Vec<serde_json::Value> = device_ids
        .iter()
        .map(|id| json!({"type": "devices", "id": id}))
        .collect();

    let body = json!({
        "data": {
            "type": "profiles",
            "attributes": {
                "name": name,
                "profileType": profile_type.to_api_string(),
            },
            "relationships": {
                "bundleId": {
                    "data": {"type": "bundleIds", "id": bundle_resource_id}
                },
                "certificates": {
                    "data": [{"type": "certificates", "id": certificate_id}]
                },
                "devices": {
                    "data": devices
                }
            }
        }
    });

    let document: Document<Profile> = client.post(token, "/v1/profiles", body).await?;
    Ok(document.data)
}

/// Fetch every profile owned by a bundle id, across all pages.
pub async fn list_for_bundle_id<T: HttpTransport>(
    client: &ApiClient<T>,
    token: &str,
    bundle_resource_id: &str,
) -> Result<Vec<Profile>> {
    let url = client.url(&format!("/v1/bundleIds/{bundle_resource_id}/profiles"));
    client.get_all(token, url).await
}

/// Delete one profile by resource id.
pub async fn delete<T: HttpTransport>(
    client: &ApiClient<T>,
    token: &str,
    profile_id: &str,
) -> Result<()> {
    client
        .delete(token, &format!("/v1/profiles/{profile_id}"))
        .await
}
