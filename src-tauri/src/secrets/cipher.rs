use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

const NONCE_LEN: usize = 12;
const ENCRYPTED_PREFIX: &str = "enc:v1:";
const UNENCRYPTED_PREFIX: &str = "plain:";

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("platform encryption is unavailable: {0}")]
    Unavailable(String),
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed")]
    Decrypt,
    #[error("stored key is malformed: {0}")]
    Malformed(String),
}

/// Platform secret-encryption primitive.
pub trait SecretCipher: Send + Sync {
    fn is_encryption_available(&self) -> bool;
    fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, CipherError>;
    fn decrypt(&self, ciphertext: &[u8]) -> Result<String, CipherError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncryptionMode {
    Encrypted,
    /// Keys are only base64-encoded on disk.
    UnencryptedFallback,
}

/// AES-256-GCM with a random nonce prepended to every ciphertext.
#[derive(Clone)]
pub struct AesGcmCipher {
    key: [u8; 32],
}

impl AesGcmCipher {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    pub fn generate_key() -> [u8; 32] {
        let generated = Aes256Gcm::generate_key(OsRng);
        let mut key = [0u8; 32];
        key.copy_from_slice(&generated);
        key
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key))
    }
}

impl SecretCipher for AesGcmCipher {
    fn is_encryption_available(&self) -> bool {
        true
    }

    fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher()
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<String, CipherError> {
        if ciphertext.len() <= NONCE_LEN {
            return Err(CipherError::Decrypt);
        }
        let (nonce, body) = ciphertext.split_at(NONCE_LEN);
        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|_| CipherError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::Decrypt)
    }
}

/// Stand-in for hosts without any platform secret storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableCipher;

impl SecretCipher for UnavailableCipher {
    fn is_encryption_available(&self) -> bool {
        false
    }

    fn encrypt(&self, _plaintext: &str) -> Result<Vec<u8>, CipherError> {
        Err(CipherError::Unavailable("no platform cipher".to_string()))
    }

    fn decrypt(&self, _ciphertext: &[u8]) -> Result<String, CipherError> {
        Err(CipherError::Unavailable("no platform cipher".to_string()))
    }
}

/// On-disk form of a provider key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SealedKey {
    Encrypted(Vec<u8>),
    Unencrypted(String),
}

impl SealedKey {
    pub fn seal(cipher: &dyn SecretCipher, plaintext: &str) -> Result<Self, CipherError> {
        if cipher.is_encryption_available() {
            cipher.encrypt(plaintext).map(Self::Encrypted)
        } else {
            Ok(Self::Unencrypted(plaintext.to_string()))
        }
    }

    pub fn mode(&self) -> EncryptionMode {
        match self {
            Self::Encrypted(_) => EncryptionMode::Encrypted,
            Self::Unencrypted(_) => EncryptionMode::UnencryptedFallback,
        }
    }

    pub fn open(&self, cipher: &dyn SecretCipher) -> Result<String, CipherError> {
        match self {
            Self::Encrypted(bytes) => cipher.decrypt(bytes),
            Self::Unencrypted(plaintext) => Ok(plaintext.clone()),
        }
    }

    pub fn to_stored(&self) -> String {
        match self {
            Self::Encrypted(bytes) => {
                format!("{ENCRYPTED_PREFIX}{}", general_purpose::STANDARD.encode(bytes))
            }
            Self::Unencrypted(plaintext) => format!(
                "{UNENCRYPTED_PREFIX}{}",
                general_purpose::STANDARD.encode(plaintext.as_bytes())
            ),
        }
    }

    /// Untagged values predate the prefixes; they are read as ciphertext when
    /// a cipher is available and as base64 plaintext otherwise.
    pub fn from_stored(value: &str, cipher: &dyn SecretCipher) -> Result<Self, CipherError> {
        let decode = |s: &str| {
            general_purpose::STANDARD
                .decode(s.trim())
                .map_err(|e| CipherError::Malformed(e.to_string()))
        };

        if let Some(rest) = value.strip_prefix(ENCRYPTED_PREFIX) {
            return decode(rest).map(Self::Encrypted);
        }
        if let Some(rest) = value.strip_prefix(UNENCRYPTED_PREFIX) {
            return utf8(decode(rest)?).map(Self::Unencrypted);
        }

        let bytes = decode(value)?;
        if cipher.is_encryption_available() {
            Ok(Self::Encrypted(bytes))
        } else {
            utf8(bytes).map(Self::Unencrypted)
        }
    }
}

fn utf8(bytes: Vec<u8>) -> Result<String, CipherError> {
    String::from_utf8(bytes).map_err(|e| CipherError::Malformed(e.to_string()))
}
