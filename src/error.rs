//! Error types for provisioning workflows.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProvisionError>;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Invalid API credentials: {0}")]
    InvalidCredentials(String),

    #[error("Private key is not usable for token signing: {0}")]
    InvalidKeyMaterial(#[source] jsonwebtoken::errors::Error),

    #[error("App Store Connect API returned {status}: {body}")]
    Transport { status: u16, body: String },

    #[error("Failed to decode API response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("No bundle id registered for identifier '{identifier}'")]
    BundleIdNotFound { identifier: String },

    #[error("No bundle id named '{name}' among entries for the identifier")]
    NoMatchingBundleId { name: String },

    #[error("Certificate '{display_name}' content is not valid base64")]
    Base64Certificate { display_name: String },

    #[error("Profile '{name}' content is not valid base64")]
    Base64Profile { name: String },

    #[error("CSR generation failed: {}", toolchain_output(stdout, stderr))]
    CsrGeneration { stdout: String, stderr: String },

    #[error("Certificate DER to PEM conversion failed: {}", toolchain_output(stdout, stderr))]
    PemConversion { stdout: String, stderr: String },

    #[error("PKCS12 identity packaging failed: {}", toolchain_output(stdout, stderr))]
    P12Identity { stdout: String, stderr: String },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JWT signing failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

// openssl occasionally reports diagnostics on stdout; keep both streams.
fn toolchain_output(stdout: &str, stderr: &str) -> String {
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (true, _) => stderr.to_string(),
        (false, true) => stdout.to_string(),
        (false, false) => format!("{stderr} (stdout: {stdout})"),
    }
}
