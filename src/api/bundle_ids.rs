//! Bundle identifier resolution.

use super::ApiClient;
use crate::error::{ProvisionError, Result};
use crate::transport::HttpTransport;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BundleId {
    pub id: String,
    pub attributes: BundleIdAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleIdAttributes {
    pub identifier: String,
    pub name: Option<String>,
}

/// Map a human bundle identifier (plus optional disambiguating name) to the
/// API's opaque resource id.
///
/// When no name is given the first entry returned wins. That is an
/// intentional simplification: the API does not guarantee ordering, so two
/// invocations could in principle pick different entries when several bundle
/// ids share an identifier.
pub async fn resolve<T: HttpTransport>(
    client: &ApiClient<T>,
    token: &str,
    identifier: &str,
    name: Option<&str>,
) -> Result<String> {
    let url = client.url(&format!("/v1/bundleIds?filter[identifier]={identifier}"));
    let entries: Vec<BundleId> = client.get_all(token, url).await?;

    let mut entries = entries.into_iter();
    let first = entries.next().ok_or_else(|| ProvisionError::BundleIdNotFound {
        identifier: identifier.to_string(),
    })?;

    match name {
        Some(wanted) => std::iter::once(first)
            .chain(entries)
            .find(|entry| entry.attributes.name.as_deref() == Some(wanted))
            .map(|entry| entry.id)
            .ok_or_else(|| ProvisionError::NoMatchingBundleId {
                name: wanted.to_string(),
            }),
        None => Ok(first.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::MockTransport;
    use crate::api::API_BASE;
    use crate::transport::Method;
    use serde_json::json;

    fn query_url(identifier: &str) -> String {
        format!("{API_BASE}/v1/bundleIds?filter[identifier]={identifier}")
    }

    #[tokio::test]
    async fn resolves_lone_entry_by_name() {
        let url = query_url("com.example.app");
        let transport = MockTransport::new().on(
            Method::Get,
            &url,
            200,
            json!({"data": [
                {"id": "B1", "attributes": {"identifier": "com.example.app", "name": "Other"}},
                {"id": "B2", "attributes": {"identifier": "com.example.app", "name": "Example"}}
            ], "links": {}}),
        );
        let client = ApiClient::new(transport);

        let id = resolve(&client, "tok", "com.example.app", Some("Example"))
            .await
            .expect("resolve by name");
        assert_eq!(id, "B2");
    }

    #[tokio::test]
    async fn first_entry_wins_without_a_name() {
        let url = query_url("com.example.app");
        let transport = MockTransport::new().on(
            Method::Get,
            &url,
            200,
            json!({"data": [
                {"id": "B1", "attributes": {"identifier": "com.example.app", "name": "First"}},
                {"id": "B2", "attributes": {"identifier": "com.example.app", "name": "Second"}}
            ], "links": {}}),
        );
        let client = ApiClient::new(transport);

        let id = resolve(&client, "tok", "com.example.app", None)
            .await
            .expect("first match");
        assert_eq!(id, "B1");
    }

    #[tokio::test]
    async fn zero_entries_fails() {
        let url = query_url("com.missing.app");
        let transport =
            MockTransport::new().on(Method::Get, &url, 200, json!({"data": [], "links": {}}));
        let client = ApiClient::new(transport);

        let err = resolve(&client, "tok", "com.missing.app", None)
            .await
            .expect_err("zero entries must fail");
        assert!(matches!(err, ProvisionError::BundleIdNotFound { .. }));
    }

    #[tokio::test]
    async fn unmatched_name_fails() {
        let url = query_url("com.example.app");
        let transport = MockTransport::new().on(
            Method::Get,
            &url,
            200,
            json!({"data": [
                {"id": "B1", "attributes": {"identifier": "com.example.app", "name": "Example"}}
            ], "links": {}}),
        );
        let client = ApiClient::new(transport);

        let err = resolve(&client, "tok", "com.example.app", Some("Nope"))
            .await
            .expect_err("unmatched name must fail");
        assert!(matches!(err, ProvisionError::NoMatchingBundleId { .. }));
    }
}
