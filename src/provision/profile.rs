//! Provisioning profile create and delete workflows.

use crate::api::{ApiClient, profiles};
use crate::config::ProfileType;
use crate::error::{ProvisionError, Result};
use crate::transport::HttpTransport;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct CreatedProfile {
    pub id: String,
    pub uuid: String,
    pub name: String,
    /// Where the decoded profile was written
    /// (`<output_dir>/<uuid>.mobileprovision`).
    pub path: PathBuf,
}

pub struct ProfileManager<'a, T: HttpTransport> {
    client: &'a ApiClient<T>,
}

impl<'a, T: HttpTransport> ProfileManager<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// Create a profile referencing one certificate and the full current
    /// device set, then write the decoded payload to
    /// `<output_dir>/<uuid>.mobileprovision`. The extension and uuid naming
    /// are part of the output contract.
    pub async fn create(
        &self,
        token: &str,
        name: &str,
        bundle_resource_id: &str,
        certificate_id: &str,
        device_ids: &[String],
        profile_type: ProfileType,
        output_dir: &Path,
    ) -> Result<CreatedProfile> {
        let profile = profiles::create(
            self.client,
            token,
            name,
            bundle_resource_id,
            certificate_id,
            device_ids,
            profile_type,
        )
        .await?;

        let display = profile
            .attributes
            .name
            .clone()
            .unwrap_or_else(|| profile.id.clone());

        let content = profile.attributes.profile_content.as_deref().ok_or_else(|| {
            ProvisionError::Base64Profile {
                name: display.clone(),
            }
        })?;
        let payload = STANDARD
            .decode(content)
            .map_err(|_| ProvisionError::Base64Profile {
                name: display.clone(),
            })?;

        let uuid = profile
            .attributes
            .uuid
            .clone()
            .unwrap_or_else(|| profile.id.clone());

        tokio::fs::create_dir_all(output_dir).await?;
        let path = output_dir.join(format!("{uuid}.mobileprovision"));
        tokio::fs::write(&path, &payload).await?;

        Ok(CreatedProfile {
            id: profile.id,
            uuid,
            name: display,
            path,
        })
    }

    /// Delete every profile of the given type owned by the bundle id.
    ///
    /// Deletions run strictly sequentially and the first failure aborts the
    /// remainder; the API's own response decides what deleting an absent id
    /// means. Returns how many profiles were deleted.
    pub async fn delete_all_matching(
        &self,
        token: &str,
        bundle_resource_id: &str,
        profile_type: ProfileType,
    ) -> Result<usize> {
        let all = profiles::list_for_bundle_id(self.client, token, bundle_resource_id).await?;
        let wanted = profile_type.to_api_string();

        let mut deleted = 0;
        for profile in all
            .iter()
            .filter(|p| p.attributes.profile_type.as_deref() == Some(wanted))
        {
            profiles::delete(self.client, token, &profile.id).await?;
            deleted += 1;
        }

        Ok(deleted)
    }
}
