use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use asc_provision::api::{ApiClient, bundle_ids, devices};
use asc_provision::config::{CertificateType, Credentials, FileConfig, ProfileType};
use asc_provision::openssl::OpensslTool;
use asc_provision::process::SystemRunner;
use asc_provision::provision::{CertificateResolver, ProfileManager, Provenance};
use asc_provision::token::{SystemClock, TokenService};
use asc_provision::transport::ReqwestTransport;
use asc_provision::success;

#[derive(Parser)]
#[command(name = "asc-provision")]
#[command(version, about = "Provision App Store Connect certificates and profiles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a provisioning profile, reusing or creating a signing certificate
    Create(CreateArgs),
    /// Delete all provisioning profiles of a given type for a bundle identifier
    Delete(DeleteArgs),
}

#[derive(Args)]
struct AuthArgs {
    /// TOML config file with key_id, issuer_id, private_key_path, output_dir
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// App Store Connect API key ID (10 characters)
    #[arg(long, required_unless_present = "config")]
    key_id: Option<String>,

    /// App Store Connect issuer ID (UUID)
    #[arg(long, required_unless_present = "config")]
    issuer_id: Option<String>,

    /// Path to the .p8 private key used for API token signing
    #[arg(long, required_unless_present = "config")]
    private_key: Option<PathBuf>,

    /// Directory for certificate and profile output files
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Args)]
struct CreateArgs {
    #[command(flatten)]
    auth: AuthArgs,

    /// Bundle identifier of the app (e.g. com.example.app)
    #[arg(long)]
    bundle_id: String,

    /// Display name to disambiguate when several bundle ids share an identifier
    #[arg(long)]
    bundle_id_name: Option<String>,

    /// Profile type to create
    #[arg(long, value_enum)]
    profile_type: ProfileType,

    /// Certificate type to reuse or create
    #[arg(long, value_enum)]
    certificate_type: CertificateType,

    /// Path to the local signing private key matched against existing
    /// certificates and used for CSR generation
    #[arg(long)]
    signing_key: PathBuf,

    /// Subject string for the certificate signing request
    #[arg(long, default_value = "/CN=App Store Connect Provisioning")]
    csr_subject: String,

    /// Name for the created profile (defaults to "<bundle id> <profile type>")
    #[arg(long)]
    profile_name: Option<String>,

    /// Also package the certificate and signing key into a PKCS12 identity
    /// protected by this password
    #[arg(long)]
    p12_password: Option<String>,
}

#[derive(Args)]
struct DeleteArgs {
    #[command(flatten)]
    auth: AuthArgs,

    /// Bundle identifier of the app (e.g. com.example.app)
    #[arg(long)]
    bundle_id: String,

    /// Display name to disambiguate when several bundle ids share an identifier
    #[arg(long)]
    bundle_id_name: Option<String>,

    /// Profile type whose profiles are deleted
    #[arg(long, value_enum)]
    profile_type: ProfileType,
}

/// Credentials plus output directory, from flags or the config file.
/// Explicit flags win over config file values.
async fn resolve_auth(auth: &AuthArgs) -> Result<(Credentials, PathBuf)> {
    let file = match &auth.config {
        Some(path) => Some(FileConfig::read(path).await?),
        None => None,
    };

    let key_id = auth
        .key_id
        .clone()
        .or_else(|| file.as_ref().map(|f| f.key_id.clone()))
        .ok_or_else(|| anyhow::anyhow!("--key-id or --config is required"))?;
    let issuer_id = auth
        .issuer_id
        .clone()
        .or_else(|| file.as_ref().map(|f| f.issuer_id.clone()))
        .ok_or_else(|| anyhow::anyhow!("--issuer-id or --config is required"))?;
    let key_path = auth
        .private_key
        .clone()
        .or_else(|| file.as_ref().map(|f| f.private_key_path.clone()))
        .ok_or_else(|| anyhow::anyhow!("--private-key or --config is required"))?;
    let output_dir = auth
        .output_dir
        .clone()
        .or_else(|| file.as_ref().map(|f| f.output_dir.clone()))
        .unwrap_or_else(|| PathBuf::from("."));

    let credentials = Credentials::load(&key_id, &issuer_id, &key_path).await?;
    Ok((credentials, output_dir))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Create(args) => run_create(args).await,
        Commands::Delete(args) => run_delete(args).await,
    };

    if let Err(err) = outcome {
        asc_provision::error!("{err:#}");
        std::process::exit(1);
    }
}

async fn run_create(args: CreateArgs) -> Result<()> {
    let (credentials, output_dir) = resolve_auth(&args.auth).await?;
    let token = TokenService::new(SystemClock).create_token(&credentials)?;
    let client = ApiClient::new(ReqwestTransport::new()?);

    let bundle_resource_id = bundle_ids::resolve(
        &client,
        &token,
        &args.bundle_id,
        args.bundle_id_name.as_deref(),
    )
    .await?;
    success!("Resolved bundle id '{}' -> {bundle_resource_id}", args.bundle_id);

    let openssl = OpensslTool::new(SystemRunner);
    let resolver = CertificateResolver::new(&client, &openssl);
    let certificate = resolver
        .resolve_or_create(
            &token,
            args.certificate_type,
            &args.signing_key,
            &args.csr_subject,
            &output_dir,
        )
        .await?;
    match certificate.provenance {
        Provenance::Reused => success!(
            "Reusing {} certificate {}",
            args.certificate_type.display_name(),
            certificate.id
        ),
        Provenance::Created => success!(
            "Created {} certificate {}",
            args.certificate_type.display_name(),
            certificate.id
        ),
    }

    let device_ids = devices::list_ids(&client, &token).await?;
    success!("Fetched {} registered device(s)", device_ids.len());

    let profile_name = args.profile_name.clone().unwrap_or_else(|| {
        format!("{} {}", args.bundle_id, args.profile_type.display_name())
    });

    let manager = ProfileManager::new(&client);
    let profile = manager
        .create(
            &token,
            &profile_name,
            &bundle_resource_id,
            &certificate.id,
            &device_ids,
            args.profile_type,
            &output_dir,
        )
        .await?;
    success!("Profile '{}' written to {}", profile.name, profile.path.display());

    if let Some(password) = &args.p12_password {
        package_identity(&openssl, &certificate.path, &args.signing_key, password, &output_dir, &certificate.id)
            .await?;
    }

    Ok(())
}

async fn package_identity(
    openssl: &OpensslTool<SystemRunner>,
    cert_der_path: &Path,
    signing_key: &Path,
    password: &str,
    output_dir: &Path,
    certificate_id: &str,
) -> Result<()> {
    let pem = openssl.der_to_pem(cert_der_path).await?;

    let scratch = tempfile::tempdir()?;
    let pem_path = scratch.path().join("cert.pem");
    tokio::fs::write(&pem_path, pem).await?;

    let p12_path = output_dir.join(format!("{certificate_id}.p12"));
    openssl
        .package_p12(&pem_path, signing_key, password, &p12_path)
        .await?;
    success!("PKCS12 identity written to {}", p12_path.display());

    Ok(())
}

async fn run_delete(args: DeleteArgs) -> Result<()> {
    let (credentials, _output_dir) = resolve_auth(&args.auth).await?;
    let token = TokenService::new(SystemClock).create_token(&credentials)?;
    let client = ApiClient::new(ReqwestTransport::new()?);

    let bundle_resource_id = bundle_ids::resolve(
        &client,
        &token,
        &args.bundle_id,
        args.bundle_id_name.as_deref(),
    )
    .await?;
    success!("Resolved bundle id '{}' -> {bundle_resource_id}", args.bundle_id);

    let manager = ProfileManager::new(&client);
    let deleted = manager
        .delete_all_matching(&token, &bundle_resource_id, args.profile_type)
        .await?;

    if deleted == 0 {
        asc_provision::warn!(
            "No {} profiles found for '{}'",
            args.profile_type.display_name(),
            args.bundle_id
        );
    } else {
        success!(
            "Deleted {deleted} {} profile(s) for '{}'",
            args.profile_type.display_name(),
            args.bundle_id
        );
    }

    Ok(())
}
