//! App Store Connect provisioning automation: signing certificates and
//! provisioning profiles without the developer portal web console.

#[macro_use]
pub mod output;

pub mod api;
pub mod config;
pub mod error;
pub mod openssl;
pub mod process;
pub mod token;
pub mod transport;

pub mod provision;

// Re-export common types
pub use config::{CertificateType, Credentials, ProfileType};
pub use error::{ProvisionError, Result};
pub use provision::{CertificateResolver, CreatedProfile, ProfileManager, Provenance};
pub use token::{SystemClock, TokenService};
