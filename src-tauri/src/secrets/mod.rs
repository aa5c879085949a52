mod cipher;
mod credential_store;
#[cfg(feature = "desktop")]
mod keyring_cipher;

pub use cipher::{
    AesGcmCipher, CipherError, EncryptionMode, SealedKey, SecretCipher, UnavailableCipher,
};
pub use credential_store::{
    describe_store_error, CredentialStore, KEYS_STORE_FILE, PROVIDERS_STORE_FILE,
};
#[cfg(feature = "desktop")]
pub use keyring_cipher::{KeyringCipher, KEYRING_USER_MASTER_KEY};
