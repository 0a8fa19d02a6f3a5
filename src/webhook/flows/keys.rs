//! RSA operations with the endpoint private key
//!
//! WhatsApp wraps a fresh AES key per request with our public key using
//! RSA-OAEP (SHA-256). The same private key signs liveness challenges with
//! PKCS#1 v1.5 padding.

use super::{
    errors::FlowError,
    schemas::{EncryptedEnvelope, SymmetricMaterial},
};
use base64::{Engine, prelude::BASE64_STANDARD};
use openssl::{
    encrypt::Decrypter,
    error::ErrorStack,
    hash::MessageDigest,
    pkey::{PKey, Private},
    rsa::Padding,
    sign::Signer,
};
use zeroize::Zeroizing;

const ACCEPTED_AES_KEY_LENGTHS: [usize; 3] = [16, 24, 32];

/// 🔒 SENSITIVE: PEM encoded private key and its optional passphrase.
///
/// Loaded once at startup and never mutated. `Debug` does not print the key.
#[derive(Clone)]
pub struct PrivateKeyMaterial {
    pem: Zeroizing<String>,
    passphrase: Option<Zeroizing<String>>,
}

impl PrivateKeyMaterial {
    pub fn new(pem: String, passphrase: Option<String>) -> Self {
        Self {
            pem: Zeroizing::new(pem),
            passphrase: passphrase
                .filter(|passphrase| !passphrase.is_empty())
                .map(Zeroizing::new),
        }
    }

    pub fn pem(&self) -> &str {
        &self.pem
    }

    /// Parses the PEM, decrypting it with the passphrase when there is one.
    ///
    /// Never prompts on the terminal: an encrypted PEM without a passphrase
    /// fails to load.
    pub fn load(&self) -> Result<PKey<Private>, ErrorStack> {
        match &self.passphrase {
            Some(passphrase) => {
                PKey::private_key_from_pem_passphrase(self.pem.as_bytes(), passphrase.as_bytes())
            }
            None => PKey::private_key_from_pem_callback(self.pem.as_bytes(), |_| Ok(0)),
        }
    }
}

impl std::fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeyMaterial")
            .field("pem", &"<redacted>")
            .field("has_passphrase", &self.passphrase.is_some())
            .finish()
    }
}

/// Recovers the AES key and IV of a request.
///
/// Every failure while opening the wrapped key is reported as
/// [`FlowError::AsymmetricUnwrapFailure`] so WhatsApp re-downloads our public key.
pub fn unwrap_symmetric_material(
    envelope: &EncryptedEnvelope,
    private_key: &PrivateKeyMaterial,
) -> Result<SymmetricMaterial, FlowError> {
    let wrapped_key = BASE64_STANDARD
        .decode(envelope.encrypted_aes_key.as_bytes())
        .map_err(|e| FlowError::AsymmetricUnwrapFailure(format!("encrypted_aes_key: {e}")))?;

    let key = rsa_oaep_decrypt(&wrapped_key, private_key)
        .map_err(|e| FlowError::AsymmetricUnwrapFailure(e.to_string()))?;

    if !ACCEPTED_AES_KEY_LENGTHS.contains(&key.len()) {
        return Err(FlowError::AsymmetricUnwrapFailure(format!(
            "unexpected aes key length {}",
            key.len()
        )));
    }

    let iv = BASE64_STANDARD
        .decode(envelope.initial_vector.as_bytes())
        .map_err(|e| FlowError::SymmetricDecryptFailure(format!("initial_vector: {e}")))?;

    Ok(SymmetricMaterial {
        key,
        iv: Zeroizing::new(iv),
    })
}

fn rsa_oaep_decrypt(
    data: &[u8],
    private_key: &PrivateKeyMaterial,
) -> Result<Zeroizing<Vec<u8>>, ErrorStack> {
    let pkey = private_key.load()?;

    let mut decrypter = Decrypter::new(&pkey)?;
    decrypter.set_rsa_padding(Padding::PKCS1_OAEP)?;
    decrypter.set_rsa_oaep_md(MessageDigest::sha256())?;
    decrypter.set_rsa_mgf1_md(MessageDigest::sha256())?;

    let mut decrypted = Zeroizing::new(vec![0; decrypter.decrypt_len(data)?]);
    let decrypted_len = decrypter.decrypt(data, &mut decrypted)?;
    decrypted.truncate(decrypted_len);

    Ok(decrypted)
}

/// Signs a liveness challenge, returns the base64 signature.
///
/// RSA with SHA-256 and PKCS#1 v1.5 padding, not the OAEP padding used to
/// unwrap AES keys.
pub fn sign_challenge(
    challenge: &str,
    private_key: Option<&PrivateKeyMaterial>,
) -> Result<String, FlowError> {
    let private_key = private_key.ok_or_else(|| {
        FlowError::SigningFailure(
            "private key is empty, check the PRIVATE_KEY env variable".to_string(),
        )
    })?;

    let signature = rsa_pkcs1_sign(challenge.as_bytes(), private_key)
        .map_err(|e| FlowError::SigningFailure(e.to_string()))?;

    Ok(BASE64_STANDARD.encode(signature))
}

fn rsa_pkcs1_sign(data: &[u8], private_key: &PrivateKeyMaterial) -> Result<Vec<u8>, ErrorStack> {
    let pkey = private_key.load()?;

    let mut signer = Signer::new(MessageDigest::sha256(), &pkey)?;
    signer.set_rsa_padding(Padding::PKCS1)?;
    signer.update(data)?;
    signer.sign_to_vec()
}
