//! Certificate resources: listing by type and minting from a CSR.

use super::{ApiClient, Document};
use crate::config::CertificateType;
use crate::error::Result;
use crate::transport::HttpTransport;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct Certificate {
    pub id: String,
    pub attributes: CertificateAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateAttributes {
    /// base64-encoded DER
    pub certificate_content: String,
    pub display_name: Option<String>,
    pub certificate_type: Option<String>,
    pub expiration_date: Option<String>,
}

impl Certificate {
    /// Name used in diagnostics; falls back to the resource id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.attributes.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// Fetch every certificate of the requested type, across all pages.
pub async fn list_by_type<T: HttpTransport>(
    client: &ApiClient<T>,
    token: &str,
    certificate_type: CertificateType,
) -> Result<Vec<Certificate>> {
    let url = client.url(&format!(
        "/v1/certificates?filter[certificateType]={}",
        certificate_type.to_api_string()
    ));
    client.get_all(token, url).await
}

/// Submit a CSR to mint a new certificate of the given type.
pub async fn create<T: HttpTransport>(
    client: &ApiClient<T>,
    token: &str,
    csr_pem: &str,
    certificate_type: CertificateType,
) -> Result<Certificate> {
    let body = json!({
        "data": {
            "type": "certificates",
            "attributes": {
                "certificateType": certificate_type.to_api_string(),
                "csrContent": csr_pem,
            }
        }
    });

    let document: Document<Certificate> = client.post(token, "/v1/certificates", body).await?;
    Ok(document.data)
}
