//! Application configuration management with security considerations.
//!
//! All values are read once at startup from environment variables and turned
//! into an immutable [`EndpointSettings`] that is handed to the request
//! handlers. Nothing under `webhook/` reads the environment by itself.
//!
//! # Security Notes
//! - Sensitive fields are clearly marked and should never be logged
//! - Production environments should use secure secret management systems

use crate::webhook::flows::{handler::EndpointSettings, keys::PrivateKeyMaterial};
use envconfig::Envconfig;

/// Environment variables used to configure the endpoint.
#[derive(Envconfig, Clone)]
pub struct AppConfig {
    /// Environment name to deploy the app (NON-SENSITIVE)
    /// Values: "local", "dev", "prod"
    #[envconfig(default = "local")]
    pub env: String,

    /// Host address for web server binding (NON-SENSITIVE)
    #[envconfig(default = "0.0.0.0")]
    pub host: String,

    /// Port for web server binding (NON-SENSITIVE)
    #[envconfig(default = "3000")]
    pub port: u16,

    /// 🔒 SENSITIVE: RSA private key (PEM) whose public half is uploaded to WhatsApp
    /// Literal `\n` sequences are accepted so the key fits in a single env line
    pub private_key: Option<String>,

    /// 🔒 SENSITIVE: Passphrase protecting `private_key`, empty for unencrypted keys
    pub passphrase: Option<String>,

    /// 🔒 SENSITIVE: Meta app secret used to check `x-hub-signature-256`
    /// Signature checks are skipped when unset (local development only)
    pub app_secret: Option<String>,

    /// 🔒 SENSITIVE: Logfire write token, logs stay on the console when unset
    pub logfire_token: Option<String>,

    /// Path to the TLS certificate served in prod (NON-SENSITIVE)
    pub tls_certificate_path: Option<String>,

    /// Path to the TLS private key served in prod (SENSITIVE PATH)
    pub tls_private_key_path: Option<String>,
}

impl AppConfig {
    /// Checks if running in production environment
    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }

    /// Private key material, if a non-empty key was configured
    pub fn private_key_material(&self) -> Option<PrivateKeyMaterial> {
        let pem = self
            .private_key
            .as_deref()
            .map(|pem| pem.trim().replace("\\n", "\n"))
            .filter(|pem| !pem.is_empty())?;

        Some(PrivateKeyMaterial::new(pem, self.passphrase.clone()))
    }

    /// Builds the immutable settings shared by every request
    pub fn endpoint_settings(&self) -> EndpointSettings {
        EndpointSettings {
            private_key: self.private_key_material(),
            app_secret: self
                .app_secret
                .clone()
                .filter(|secret| !secret.trim().is_empty()),
        }
    }
}
