//! App Store Connect API client: authenticated requests and pagination.

pub mod bundle_ids;
pub mod certificates;
pub mod devices;
pub mod profiles;

use crate::error::{ProvisionError, Result};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};
use serde::Deserialize;
use serde::de::DeserializeOwned;

pub const API_BASE: &str = "https://api.appstoreconnect.apple.com";

/// Collection envelope: a `data` array plus continuation links.
#[derive(Debug, Deserialize)]
pub struct PagedDocument<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Default, Deserialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub this: Option<String>,
    /// Fully-qualified URL of the next page, absent on the last page.
    pub next: Option<String>,
}

/// Single-resource envelope returned by creation endpoints.
#[derive(Debug, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

// API error envelope, decoded into diagnostics when a request fails.
#[derive(Deserialize)]
struct ErrorEnvelope {
    errors: Vec<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    code: String,
    title: String,
    detail: Option<String>,
}

pub struct ApiClient<T: HttpTransport> {
    transport: T,
    base_url: String,
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            base_url: API_BASE.to_string(),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch every page of a collection, following `links.next` verbatim
    /// until absent. The same token authorizes every follow-up request.
    pub async fn get_all<E: DeserializeOwned>(
        &self,
        token: &str,
        first_url: String,
    ) -> Result<Vec<E>> {
        let mut entities = Vec::new();
        let mut next_url = Some(first_url);

        while let Some(url) = next_url.take() {
            let body = self.execute_checked(token, ApiRequest::get(url)).await?;
            let page: PagedDocument<E> =
                serde_json::from_slice(&body).map_err(ProvisionError::Decode)?;
            entities.extend(page.data);
            next_url = page.links.next;
        }

        Ok(entities)
    }

    pub async fn post<D: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        body: serde_json::Value,
    ) -> Result<D> {
        let url = self.url(path);
        let response = self
            .execute_checked(token, ApiRequest::post(url, body))
            .await?;
        serde_json::from_slice(&response).map_err(ProvisionError::Decode)
    }

    pub async fn delete(&self, token: &str, path: &str) -> Result<()> {
        let url = self.url(path);
        self.execute_checked(token, ApiRequest::delete(url)).await?;
        Ok(())
    }

    async fn execute_checked(&self, token: &str, request: ApiRequest) -> Result<Vec<u8>> {
        let response = self.transport.execute(token, request).await?;
        Self::check(response)
    }

    /// Convert a non-2xx response into a transport error, surfacing the
    /// API's own error envelope when the body carries one.
    fn check(response: ApiResponse) -> Result<Vec<u8>> {
        if response.is_success() {
            return Ok(response.body);
        }

        let raw = String::from_utf8_lossy(&response.body).into_owned();
        let body = match serde_json::from_str::<ErrorEnvelope>(&raw) {
            Ok(envelope) => match envelope.errors.first() {
                Some(err) => format!(
                    "{} ({}): {}",
                    err.title,
                    err.code,
                    err.detail.as_deref().unwrap_or("no detail")
                ),
                None => raw,
            },
            Err(_) => raw,
        };

        Err(ProvisionError::Transport {
            status: response.status,
            body,
        })
    }
}
