//! Orchestration workflows: certificate reuse-or-create and profile
//! lifecycle management.

pub mod certificate;
pub mod profile;

pub use certificate::{CertificateResolver, Provenance, ResolvedCertificate};
pub use profile::{CreatedProfile, ProfileManager};
