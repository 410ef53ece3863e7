//! Bot token handling

use std::fmt;
use std::path::Path;

use tracing::debug;
use zeroize::Zeroizing;

use crate::config::CredentialSource;
use crate::{Error, Result};

/// Bot token that zeroizes on drop
pub struct Credential(Zeroizing<String>);

impl Credential {
    /// Wrap a token, rejecting empty values
    pub fn new(token: String) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(Error::CredentialEmpty);
        }
        Ok(Self(Zeroizing::new(token)))
    }

    /// Read the token from an environment variable
    pub fn from_env(var: &str) -> Result<Self> {
        let token =
            std::env::var(var).map_err(|_| Error::CredentialMissing(var.to_string()))?;
        debug!("Loaded credential from environment variable {}", var);
        Self::new(token)
    }

    /// Read the token from a file, stripping the trailing newline
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = Zeroizing::new(std::fs::read_to_string(path)?);
        debug!("Loaded credential from file {}", path.display());
        Self::new(contents.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Load the token from the configured source
    pub fn load(source: &CredentialSource) -> Result<Self> {
        match source {
            CredentialSource::Env { var } => Self::from_env(var),
            CredentialSource::File { path } => Self::from_file(path),
        }
    }

    /// Get the raw token for the client builder
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
