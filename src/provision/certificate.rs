//! Certificate reuse-or-create decision logic.

use crate::api::{ApiClient, certificates};
use crate::config::CertificateType;
use crate::error::{ProvisionError, Result};
use crate::openssl::OpensslTool;
use crate::process::CommandRunner;
use crate::transport::HttpTransport;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::{Path, PathBuf};

/// Which branch of the reuse-or-create decision ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Reused,
    Created,
}

#[derive(Debug)]
pub struct ResolvedCertificate {
    pub id: String,
    pub der: Vec<u8>,
    pub provenance: Provenance,
    /// Where the DER bytes were persisted (`<output_dir>/<id>.cer`).
    pub path: PathBuf,
}

/// Reuses an existing certificate whose public key matches the local
/// private key, or mints a new one from a freshly generated CSR.
///
/// Vendor accounts cap the number of valid certificates per type, so reuse
/// is attempted first. At most one certificate should correspond to a given
/// private key, which is why the first fingerprint match wins.
pub struct CertificateResolver<'a, T: HttpTransport, R: CommandRunner> {
    client: &'a ApiClient<T>,
    openssl: &'a OpensslTool<R>,
}

impl<'a, T: HttpTransport, R: CommandRunner> CertificateResolver<'a, T, R> {
    pub fn new(client: &'a ApiClient<T>, openssl: &'a OpensslTool<R>) -> Self {
        Self { client, openssl }
    }

    pub async fn resolve_or_create(
        &self,
        token: &str,
        certificate_type: CertificateType,
        private_key: &Path,
        csr_subject: &str,
        output_dir: &Path,
    ) -> Result<ResolvedCertificate> {
        let candidates = certificates::list_by_type(self.client, token, certificate_type).await?;
        let local_public_key = self.openssl.public_key_from_private_key(private_key).await?;

        let scratch = tempfile::tempdir()?;
        for candidate in candidates {
            let der = STANDARD
                .decode(&candidate.attributes.certificate_content)
                .map_err(|_| ProvisionError::Base64Certificate {
                    display_name: candidate.display_name().to_string(),
                })?;

            let der_path = scratch.path().join(format!("{}.cer", candidate.id));
            tokio::fs::write(&der_path, &der).await?;

            let candidate_public_key =
                self.openssl.public_key_from_certificate(&der_path).await?;
            if candidate_public_key.trim() == local_public_key.trim() {
                let path = persist(output_dir, &candidate.id, &der).await?;
                return Ok(ResolvedCertificate {
                    id: candidate.id,
                    der,
                    provenance: Provenance::Reused,
                    path,
                });
            }
        }

        // No candidate corresponds to the local key; mint a new certificate.
        let csr_pem = self.openssl.create_csr(private_key, csr_subject).await?;
        let created =
            certificates::create(self.client, token, &csr_pem, certificate_type).await?;

        let der = STANDARD
            .decode(&created.attributes.certificate_content)
            .map_err(|_| ProvisionError::Base64Certificate {
                display_name: created.display_name().to_string(),
            })?;

        let path = persist(output_dir, &created.id, &der).await?;
        Ok(ResolvedCertificate {
            id: created.id,
            der,
            provenance: Provenance::Created,
            path,
        })
    }
}

async fn persist(output_dir: &Path, certificate_id: &str, der: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(format!("{certificate_id}.cer"));
    tokio::fs::write(&path, der).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::MockTransport;
    use crate::api::API_BASE;
    use crate::openssl::test_support::ScriptedRunner;
    use crate::transport::Method;
    use serde_json::json;

    const LOCAL_PUB: &str = "-----BEGIN PUBLIC KEY-----\nLOCAL\n-----END PUBLIC KEY-----\n";
    const OTHER_PUB: &str = "-----BEGIN PUBLIC KEY-----\nOTHER\n-----END PUBLIC KEY-----\n";

    fn b64(data: &str) -> String {
        STANDARD.encode(data.as_bytes())
    }

    fn list_url() -> String {
        format!("{API_BASE}/v1/certificates?filter[certificateType]=IOS_DISTRIBUTION")
    }

    #[tokio::test]
    async fn reuses_first_candidate_with_matching_public_key() {
        let transport = MockTransport::new().on(
            Method::Get,
            &list_url(),
            200,
            json!({"data": [
                {"id": "C1", "attributes": {
                    "certificateContent": b64("der-one"),
                    "displayName": "One"
                }},
                {"id": "C2", "attributes": {
                    "certificateContent": b64("der-two"),
                    "displayName": "Two"
                }}
            ], "links": {}}),
        );
        let client = ApiClient::new(transport);

        // Call order: local pubkey, candidate C1 pubkey, candidate C2 pubkey
        let runner = ScriptedRunner::new(vec![
            ScriptedRunner::ok(LOCAL_PUB),
            ScriptedRunner::ok(OTHER_PUB),
            ScriptedRunner::ok(LOCAL_PUB),
        ]);
        let openssl = OpensslTool::new(runner);

        let out = tempfile::tempdir().expect("tempdir");
        let resolver = CertificateResolver::new(&client, &openssl);
        let resolved = resolver
            .resolve_or_create(
                "tok",
                CertificateType::IosDistribution,
                &out.path().join("key.pem"),
                "/CN=Example",
                out.path(),
            )
            .await
            .expect("reuse");

        assert_eq!(resolved.id, "C2");
        assert_eq!(resolved.provenance, Provenance::Reused);
        assert_eq!(resolved.der, b"der-two");

        let written = std::fs::read(out.path().join("C2.cer")).expect("persisted cer");
        assert_eq!(written, b"der-two");

        // No creation request was issued
        let post_url = format!("{API_BASE}/v1/certificates");
        assert_eq!(client.transport().call_count(Method::Post, &post_url), 0);
    }

    #[tokio::test]
    async fn creates_when_no_candidate_matches() {
        let post_url = format!("{API_BASE}/v1/certificates");
        let transport = MockTransport::new()
            .on(
                Method::Get,
                &list_url(),
                200,
                json!({"data": [
                    {"id": "C1", "attributes": {
                        "certificateContent": b64("der-one"),
                        "displayName": "One"
                    }}
                ], "links": {}}),
            )
            .on(
                Method::Post,
                &post_url,
                201,
                json!({"data": {"id": "C9", "attributes": {
                    "certificateContent": b64("der-new"),
                    "displayName": "Fresh"
                }}}),
            );
        let client = ApiClient::new(transport);

        // Call order: local pubkey, candidate C1 pubkey, CSR generation
        let runner = ScriptedRunner::new(vec![
            ScriptedRunner::ok(LOCAL_PUB),
            ScriptedRunner::ok(OTHER_PUB),
            ScriptedRunner::ok("-----BEGIN CERTIFICATE REQUEST-----\ncsr\n-----END CERTIFICATE REQUEST-----\n"),
        ]);
        let openssl = OpensslTool::new(runner);

        let out = tempfile::tempdir().expect("tempdir");
        let resolver = CertificateResolver::new(&client, &openssl);
        let resolved = resolver
            .resolve_or_create(
                "tok",
                CertificateType::IosDistribution,
                &out.path().join("key.pem"),
                "/CN=Example",
                out.path(),
            )
            .await
            .expect("create");

        assert_eq!(resolved.id, "C9");
        assert_eq!(resolved.provenance, Provenance::Created);
        assert_eq!(resolved.der, b"der-new");
        assert!(out.path().join("C9.cer").exists());

        // Creation request carries the CSR content
        assert_eq!(client.transport().call_count(Method::Post, &post_url), 1);
        let calls = client.transport().calls.lock().expect("calls");
        let (_, _, body) = calls
            .iter()
            .find(|(m, u, _)| *m == Method::Post && u == &post_url)
            .expect("post call");
        let body = body.as_ref().expect("post body");
        assert_eq!(body["data"]["type"], "certificates");
        assert_eq!(
            body["data"]["attributes"]["certificateType"],
            "IOS_DISTRIBUTION"
        );
        assert!(
            body["data"]["attributes"]["csrContent"]
                .as_str()
                .expect("csrContent")
                .contains("BEGIN CERTIFICATE REQUEST")
        );
    }

    #[tokio::test]
    async fn malformed_candidate_content_names_the_certificate() {
        let transport = MockTransport::new().on(
            Method::Get,
            &list_url(),
            200,
            json!({"data": [
                {"id": "C1", "attributes": {
                    "certificateContent": "!!! not base64 !!!",
                    "displayName": "Broken Cert"
                }}
            ], "links": {}}),
        );
        let client = ApiClient::new(transport);
        let runner = ScriptedRunner::new(vec![ScriptedRunner::ok(LOCAL_PUB)]);
        let openssl = OpensslTool::new(runner);

        let out = tempfile::tempdir().expect("tempdir");
        let resolver = CertificateResolver::new(&client, &openssl);
        let err = resolver
            .resolve_or_create(
                "tok",
                CertificateType::IosDistribution,
                &out.path().join("key.pem"),
                "/CN=Example",
                out.path(),
            )
            .await
            .expect_err("must fail");

        match err {
            ProvisionError::Base64Certificate { display_name } => {
                assert_eq!(display_name, "Broken Cert");
            }
            other => panic!("expected base64 certificate error, got {other:?}"),
        }
    }
}
