//! openssl toolchain invocations: CSR generation, format conversion,
//! public-key extraction, and PKCS12 identity packaging.
//!
//! The argument sequences live here; callers only see typed inputs and
//! outputs (key path + subject -> CSR PEM, DER -> PEM, and so on).

use crate::error::{ProvisionError, Result};
use crate::process::{CommandOutput, CommandRunner};
use std::io;
use std::path::Path;

pub struct OpensslTool<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> OpensslTool<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn run(&self, args: &[&str]) -> io::Result<CommandOutput> {
        self.runner.run("openssl", args).await
    }

    /// Generate a certificate signing request from a private key and a
    /// subject string (e.g. `/CN=Example Corp/O=Example`). Returns CSR PEM.
    pub async fn create_csr(&self, private_key: &Path, subject: &str) -> Result<String> {
        let key = path_str(private_key)?;
        let output = self
            .run(&["req", "-new", "-key", key, "-subj", subject])
            .await?;

        if !output.success {
            return Err(ProvisionError::CsrGeneration {
                stdout: output.stdout_utf8(),
                stderr: output.stderr_utf8(),
            });
        }

        Ok(output.stdout_utf8())
    }

    /// Convert a DER-encoded certificate to PEM.
    pub async fn der_to_pem(&self, der_path: &Path) -> Result<String> {
        let der = path_str(der_path)?;
        let output = self
            .run(&["x509", "-inform", "der", "-in", der])
            .await?;

        if !output.success {
            return Err(ProvisionError::PemConversion {
                stdout: output.stdout_utf8(),
                stderr: output.stderr_utf8(),
            });
        }

        Ok(output.stdout_utf8())
    }

    /// Package a PEM certificate and its private key into a
    /// password-protected PKCS12 identity at `out_path`.
    pub async fn package_p12(
        &self,
        cert_pem: &Path,
        private_key: &Path,
        password: &str,
        out_path: &Path,
    ) -> Result<()> {
        let pass = format!("pass:{password}");
        let output = self
            .run(&[
                "pkcs12",
                "-export",
                "-inkey",
                path_str(private_key)?,
                "-in",
                path_str(cert_pem)?,
                "-out",
                path_str(out_path)?,
                "-passout",
                &pass,
            ])
            .await?;

        if !output.success {
            return Err(ProvisionError::P12Identity {
                stdout: output.stdout_utf8(),
                stderr: output.stderr_utf8(),
            });
        }

        Ok(())
    }

    /// Extract the public key (PEM) from a DER-encoded certificate.
    pub async fn public_key_from_certificate(&self, der_path: &Path) -> Result<String> {
        let der = path_str(der_path)?;
        let output = self
            .run(&["x509", "-inform", "der", "-in", der, "-pubkey", "-noout"])
            .await?;

        if !output.success {
            return Err(ProvisionError::PemConversion {
                stdout: output.stdout_utf8(),
                stderr: output.stderr_utf8(),
            });
        }

        Ok(output.stdout_utf8())
    }

    /// Extract the public key (PEM) from a private key file.
    pub async fn public_key_from_private_key(&self, private_key: &Path) -> Result<String> {
        let key = path_str(private_key)?;
        let output = self.run(&["pkey", "-in", key, "-pubout"]).await?;

        if !output.success {
            return Err(ProvisionError::PemConversion {
                stdout: output.stdout_utf8(),
                stderr: output.stderr_utf8(),
            });
        }

        Ok(output.stdout_utf8())
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        ProvisionError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path is not valid UTF-8: {}", path.display()),
        ))
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Runner fixture returning queued outputs in order; records every call.
    pub struct ScriptedRunner {
        outputs: Mutex<VecDeque<CommandOutput>>,
        pub calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        pub fn new(outputs: Vec<CommandOutput>) -> Self {
            Self {
                outputs: Mutex::new(outputs.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn ok(stdout: &str) -> CommandOutput {
            CommandOutput {
                success: true,
                stdout: stdout.as_bytes().to_vec(),
                stderr: Vec::new(),
            }
        }

        pub fn fail(stderr: &str) -> CommandOutput {
            CommandOutput {
                success: false,
                stdout: Vec::new(),
                stderr: stderr.as_bytes().to_vec(),
            }
        }
    }

    impl CommandRunner for ScriptedRunner {
        async fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
            let mut call = vec![program.to_string()];
            call.extend(args.iter().map(|a| a.to_string()));
            self.calls.lock().expect("calls lock").push(call);

            self.outputs
                .lock()
                .expect("outputs lock")
                .pop_front()
                .ok_or_else(|| io::Error::other("no scripted output left"))
        }
    }
}
