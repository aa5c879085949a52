use super::cipher::{AesGcmCipher, CipherError, SecretCipher};
use base64::{engine::general_purpose, Engine as _};
use keyring::Entry;
use std::sync::OnceLock;

const KEYRING_SERVICE: &str = "app.clawx.desktop";
pub const KEYRING_USER_MASTER_KEY: &str = "provider-keys-master";

/// Encrypts provider keys with a master key held by the OS keychain or
/// secret service. The master key is created on first use.
pub struct KeyringCipher {
    entry: keyring::Result<Entry>,
    inner: OnceLock<Option<AesGcmCipher>>,
}

impl KeyringCipher {
    pub fn new(user: &str) -> Self {
        Self::with_entry(Entry::new(KEYRING_SERVICE, user))
    }

    fn with_entry(entry: keyring::Result<Entry>) -> Self {
        Self {
            entry,
            inner: OnceLock::new(),
        }
    }

    /// Resolved once; an unreachable keyring stays unavailable for the
    /// rest of the session.
    fn cipher(&self) -> Option<&AesGcmCipher> {
        self.inner
            .get_or_init(|| {
                let loaded = self
                    .entry
                    .as_ref()
                    .map_err(|e| CipherError::Unavailable(e.to_string()))
                    .and_then(load_or_create);
                match loaded {
                    Ok(cipher) => Some(cipher),
                    Err(e) => {
                        tracing::warn!("OS keyring unavailable: {e}");
                        None
                    }
                }
            })
            .as_ref()
    }
}

fn load_or_create(entry: &Entry) -> Result<AesGcmCipher, CipherError> {
    match entry.get_password() {
        Ok(encoded) => {
            let bytes = general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| CipherError::Malformed(e.to_string()))?;
            let key: [u8; 32] = bytes
                .try_into()
                .map_err(|_| CipherError::Malformed("master key has wrong length".to_string()))?;
            Ok(AesGcmCipher::new(key))
        }
        Err(keyring::Error::NoEntry) => {
            let key = AesGcmCipher::generate_key();
            entry
                .set_password(&general_purpose::STANDARD.encode(key))
                .map_err(|e| CipherError::Unavailable(e.to_string()))?;
            tracing::info!("created provider key master secret in OS keyring");
            Ok(AesGcmCipher::new(key))
        }
        Err(e) => Err(CipherError::Unavailable(e.to_string())),
    }
}

impl SecretCipher for KeyringCipher {
    fn is_encryption_available(&self) -> bool {
        self.cipher().is_some()
    }

    fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, CipherError> {
        self.cipher()
            .ok_or_else(|| CipherError::Unavailable("OS keyring".to_string()))?
            .encrypt(plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<String, CipherError> {
        self.cipher()
            .ok_or_else(|| CipherError::Unavailable("OS keyring".to_string()))?
            .decrypt(ciphertext)
    }
}
