use super::cipher::{EncryptionMode, SealedKey, SecretCipher};
use crate::redact::{mask_key, redact_secrets};
use crate::store::{JsonStore, StoreError};
use crate::types::{now_iso, ProviderConfig, ProviderWithKeyInfo};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

pub const KEYS_STORE_FILE: &str = "clawx-secure-keys.json";
pub const PROVIDERS_STORE_FILE: &str = "clawx-providers.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeysDocument {
    #[serde(default)]
    encrypted_keys: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProvidersDocument {
    #[serde(default)]
    providers: BTreeMap<String, ProviderConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_provider: Option<String>,
}

/// Ids are compared without surrounding whitespace so a config and its key
/// always share one entry.
fn normalize_id(id: &str) -> &str {
    id.trim()
}

/// Provider configs and their API keys.
///
/// Failures never reach the caller as errors: they are logged and surface as
/// `false` / `None`.
pub struct CredentialStore {
    keys: JsonStore<KeysDocument>,
    providers: JsonStore<ProvidersDocument>,
    cipher: Arc<dyn SecretCipher>,
}

impl CredentialStore {
    pub async fn open(dir: &Path, cipher: Arc<dyn SecretCipher>) -> Result<Self, StoreError> {
        let keys = JsonStore::open(dir.join(KEYS_STORE_FILE)).await?;
        let providers = JsonStore::open(dir.join(PROVIDERS_STORE_FILE)).await?;
        let store = Self {
            keys,
            providers,
            cipher,
        };
        store.log_mode();
        Ok(store)
    }

    pub fn in_memory(cipher: Arc<dyn SecretCipher>) -> Self {
        let store = Self {
            keys: JsonStore::in_memory(),
            providers: JsonStore::in_memory(),
            cipher,
        };
        store.log_mode();
        store
    }

    pub async fn close(self) -> Result<(), StoreError> {
        self.keys.close().await?;
        self.providers.close().await
    }

    fn log_mode(&self) {
        if self.encryption_mode() == EncryptionMode::UnencryptedFallback {
            tracing::warn!("platform encryption unavailable; API keys will be stored unencrypted");
        }
    }

    pub fn encryption_mode(&self) -> EncryptionMode {
        if self.cipher.is_encryption_available() {
            EncryptionMode::Encrypted
        } else {
            EncryptionMode::UnencryptedFallback
        }
    }

    pub async fn store_key(&self, provider_id: &str, plaintext: &str) -> bool {
        let provider_id = normalize_id(provider_id);
        if provider_id.is_empty() || plaintext.is_empty() {
            tracing::error!("refusing to store an empty API key or provider id");
            return false;
        }

        let sealed = match SealedKey::seal(self.cipher.as_ref(), plaintext) {
            Ok(sealed) => sealed,
            Err(e) => {
                tracing::error!(provider_id, "failed to encrypt API key: {e}");
                return false;
            }
        };
        if sealed.mode() == EncryptionMode::UnencryptedFallback {
            tracing::warn!(provider_id, "storing API key without encryption");
        }

        let stored = sealed.to_stored();
        match self
            .keys
            .update(|doc| doc.encrypted_keys.insert(provider_id.to_string(), stored))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(provider_id, "failed to store API key: {e}");
                false
            }
        }
    }

    pub async fn get_key(&self, provider_id: &str) -> Option<String> {
        let provider_id = normalize_id(provider_id);
        let stored = self
            .keys
            .read(|doc| doc.encrypted_keys.get(provider_id).cloned())
            .await?;

        let opened = SealedKey::from_stored(&stored, self.cipher.as_ref())
            .and_then(|sealed| sealed.open(self.cipher.as_ref()));
        match opened {
            Ok(plaintext) => Some(plaintext),
            Err(e) => {
                tracing::error!(provider_id, "failed to decrypt API key: {e}");
                None
            }
        }
    }

    pub async fn delete_key(&self, provider_id: &str) -> bool {
        let provider_id = normalize_id(provider_id);
        let present = self
            .keys
            .read(|doc| doc.encrypted_keys.contains_key(provider_id))
            .await;
        if !present {
            return true;
        }

        match self
            .keys
            .update(|doc| doc.encrypted_keys.remove(provider_id))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(provider_id, "failed to delete API key: {e}");
                false
            }
        }
    }

    pub async fn has_key(&self, provider_id: &str) -> bool {
        let provider_id = normalize_id(provider_id);
        self.keys
            .read(|doc| doc.encrypted_keys.contains_key(provider_id))
            .await
    }

    pub async fn list_key_ids(&self) -> BTreeSet<String> {
        self.keys
            .read(|doc| doc.encrypted_keys.keys().cloned().collect())
            .await
    }

    pub async fn save_provider_config(&self, mut config: ProviderConfig) -> bool {
        config.id = normalize_id(&config.id).to_string();
        if config.id.is_empty() {
            tracing::error!("refusing to save a provider config without an id");
            return false;
        }

        let now = now_iso();
        let id = config.id.clone();
        let result = self
            .providers
            .update(|doc| {
                match doc.providers.get(&config.id) {
                    Some(existing) if !existing.created_at.is_empty() => {
                        config.created_at = existing.created_at.clone();
                    }
                    _ if config.created_at.is_empty() => config.created_at = now.clone(),
                    _ => {}
                }
                config.updated_at = now;
                doc.providers.insert(config.id.clone(), config);
            })
            .await;

        match result {
            Ok(()) => {
                tracing::info!(provider_id = %id, "saved provider config");
                true
            }
            Err(e) => {
                tracing::error!(provider_id = %id, "failed to save provider config: {e}");
                false
            }
        }
    }

    pub async fn get_provider_config(&self, id: &str) -> Option<ProviderConfig> {
        let id = normalize_id(id);
        self.providers.read(|doc| doc.providers.get(id).cloned()).await
    }

    pub async fn list_provider_configs(&self) -> Vec<ProviderConfig> {
        let mut configs: Vec<ProviderConfig> = self
            .providers
            .read(|doc| doc.providers.values().cloned().collect())
            .await;
        configs.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        configs
    }

    /// Removes the key before the config so a failure can only leave a
    /// config without a key, never an orphaned secret.
    pub async fn delete_provider_config(&self, id: &str) -> bool {
        let id = normalize_id(id);
        if !self.delete_key(id).await {
            return false;
        }

        let result = self
            .providers
            .update(|doc| {
                doc.providers.remove(id);
                if doc.default_provider.as_deref() == Some(id) {
                    doc.default_provider = None;
                }
            })
            .await;

        match result {
            Ok(()) => {
                tracing::info!(provider_id = id, "deleted provider config");
                true
            }
            Err(e) => {
                tracing::error!(provider_id = id, "failed to delete provider config: {e}");
                false
            }
        }
    }

    pub async fn set_default_provider(&self, id: &str) -> bool {
        let id = normalize_id(id);
        match self
            .providers
            .update(|doc| doc.default_provider = Some(id.to_string()))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(provider_id = id, "failed to set default provider: {e}");
                false
            }
        }
    }

    pub async fn get_default_provider(&self) -> Option<String> {
        self.providers.read(|doc| doc.default_provider.clone()).await
    }

    pub async fn get_provider_with_key_info(&self, id: &str) -> Option<ProviderWithKeyInfo> {
        let id = normalize_id(id);
        let config = self.get_provider_config(id).await?;
        Some(self.with_key_info(config).await)
    }

    pub async fn list_providers_with_key_info(&self) -> Vec<ProviderWithKeyInfo> {
        let mut out = Vec::new();
        for config in self.list_provider_configs().await {
            out.push(self.with_key_info(config).await);
        }
        out
    }

    async fn with_key_info(&self, config: ProviderConfig) -> ProviderWithKeyInfo {
        let key = self.get_key(&config.id).await;
        ProviderWithKeyInfo {
            has_key: self.has_key(&config.id).await,
            key_masked: key.as_deref().map(mask_key),
            config,
        }
    }
}

/// Error text safe to hand to the UI.
pub fn describe_store_error(e: &StoreError) -> String {
    redact_secrets(&e.to_string()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::cipher::{AesGcmCipher, UnavailableCipher};
    use crate::types::ProviderType;

    fn encrypted_store() -> CredentialStore {
        CredentialStore::in_memory(Arc::new(AesGcmCipher::new([3u8; 32])))
    }

    fn fallback_store() -> CredentialStore {
        CredentialStore::in_memory(Arc::new(UnavailableCipher))
    }

    fn provider(id: &str) -> ProviderConfig {
        ProviderConfig {
            id: id.to_string(),
            name: "Anthropic".to_string(),
            provider_type: ProviderType::Anthropic,
            base_url: None,
            model: None,
            enabled: true,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[tokio::test]
    async fn keys_round_trip_in_both_modes() {
        for store in [encrypted_store(), fallback_store()] {
            for (id, key) in [("anthropic-1", "sk-ant-xyz"), ("openai", "  spaced key  ")] {
                assert!(store.store_key(id, key).await);
                assert_eq!(store.get_key(id).await.as_deref(), Some(key));
            }
        }
    }

    #[tokio::test]
    async fn encryption_mode_reflects_the_cipher() {
        assert_eq!(encrypted_store().encryption_mode(), EncryptionMode::Encrypted);
        assert_eq!(
            fallback_store().encryption_mode(),
            EncryptionMode::UnencryptedFallback
        );
    }

    #[tokio::test]
    async fn store_key_overwrites_previous_value() {
        let store = encrypted_store();
        assert!(store.store_key("p", "first-key").await);
        assert!(store.store_key("p", "second-key").await);
        assert_eq!(store.get_key("p").await.as_deref(), Some("second-key"));
        assert_eq!(store.list_key_ids().await.len(), 1);
    }

    #[tokio::test]
    async fn store_key_rejects_empty_input() {
        let store = encrypted_store();
        assert!(!store.store_key("p", "").await);
        assert!(!store.store_key("  ", "sk-x").await);
        assert!(store.list_key_ids().await.is_empty());
    }

    #[tokio::test]
    async fn missing_and_undecryptable_keys_are_absent() {
        let store = encrypted_store();
        assert_eq!(store.get_key("nope").await, None);

        store
            .keys
            .update(|doc| {
                doc.encrypted_keys
                    .insert("broken".to_string(), "enc:v1:AAAAAAAAAAAAAAAAAAAAAAAA".to_string())
            })
            .await
            .unwrap();
        assert!(store.has_key("broken").await);
        assert_eq!(store.get_key("broken").await, None);
    }

    #[tokio::test]
    async fn delete_key_is_idempotent() {
        let store = encrypted_store();
        assert!(store.store_key("p", "sk-abc").await);
        assert!(store.delete_key("p").await);
        assert!(store.delete_key("p").await);
        assert!(!store.has_key("p").await);
        assert!(store.delete_key("never-stored").await);
    }

    #[tokio::test]
    async fn list_key_ids_returns_every_stored_id() {
        let store = fallback_store();
        store.store_key("b", "key-b").await;
        store.store_key("a", "key-a").await;
        let ids: Vec<String> = store.list_key_ids().await.into_iter().collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn save_provider_config_preserves_created_at() {
        let store = encrypted_store();
        let mut config = provider("p");
        config.created_at = "2026-01-01T00:00:00Z".to_string();
        assert!(store.save_provider_config(config).await);

        let mut edited = provider("p");
        edited.enabled = false;
        edited.created_at = "2030-01-01T00:00:00Z".to_string();
        assert!(store.save_provider_config(edited).await);

        let saved = store.get_provider_config("p").await.unwrap();
        assert_eq!(saved.created_at, "2026-01-01T00:00:00Z");
        assert!(!saved.enabled);
        assert!(!saved.updated_at.is_empty());
    }

    #[tokio::test]
    async fn list_provider_configs_orders_by_creation() {
        let store = encrypted_store();
        let mut late = provider("late");
        late.created_at = "2026-02-01T00:00:00Z".to_string();
        let mut early = provider("early");
        early.created_at = "2026-01-01T00:00:00Z".to_string();
        store.save_provider_config(late).await;
        store.save_provider_config(early).await;

        let ids: Vec<String> = store
            .list_provider_configs()
            .await
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["early".to_string(), "late".to_string()]);
    }

    #[tokio::test]
    async fn deleting_provider_removes_key_and_default_pointer() {
        let store = encrypted_store();
        store.save_provider_config(provider("p")).await;
        store.store_key("p", "sk-test-1234567890").await;
        assert!(store.set_default_provider("p").await);

        assert!(store.delete_provider_config("p").await);
        assert!(!store.has_key("p").await);
        assert_eq!(store.get_default_provider().await, None);
        assert_eq!(store.get_provider_config("p").await, None);
    }

    #[tokio::test]
    async fn deleting_other_provider_keeps_default() {
        let store = encrypted_store();
        store.save_provider_config(provider("a")).await;
        store.save_provider_config(provider("b")).await;
        store.set_default_provider("a").await;

        assert!(store.delete_provider_config("b").await);
        assert_eq!(store.get_default_provider().await.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn provider_with_key_info_masks_the_key() {
        let store = encrypted_store();
        store.save_provider_config(provider("anthropic-1")).await;
        store.store_key("anthropic-1", "sk-test-1234567890").await;

        let info = store.get_provider_with_key_info("anthropic-1").await.unwrap();
        assert!(info.has_key);
        assert_eq!(info.key_masked.as_deref(), Some("sk-t**********7890"));

        store.save_provider_config(provider("no-key")).await;
        let info = store.get_provider_with_key_info("no-key").await.unwrap();
        assert!(!info.has_key);
        assert_eq!(info.key_masked, None);

        assert_eq!(store.list_providers_with_key_info().await.len(), 2);
        assert!(store.get_provider_with_key_info("missing").await.is_none());
    }

    #[tokio::test]
    async fn on_disk_documents_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let cipher: Arc<dyn SecretCipher> = Arc::new(AesGcmCipher::new([5u8; 32]));

        let store = CredentialStore::open(dir.path(), cipher.clone()).await.unwrap();
        store.save_provider_config(provider("p")).await;
        store.store_key("p", "sk-persisted").await;
        store.set_default_provider("p").await;
        store.close().await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join(KEYS_STORE_FILE)).unwrap();
        assert!(raw.contains("encryptedKeys"));
        assert!(!raw.contains("sk-persisted"));

        let reopened = CredentialStore::open(dir.path(), cipher).await.unwrap();
        assert_eq!(reopened.get_key("p").await.as_deref(), Some("sk-persisted"));
        assert_eq!(reopened.get_default_provider().await.as_deref(), Some("p"));
    }

    #[tokio::test]
    async fn padded_ids_address_the_same_provider_and_key() {
        let store = encrypted_store();
        assert!(store.save_provider_config(provider(" p ")).await);
        assert!(store.store_key("p ", "sk-padded").await);

        assert_eq!(store.get_provider_config("p").await.map(|c| c.id).as_deref(), Some("p"));
        assert_eq!(store.list_key_ids().await, BTreeSet::from(["p".to_string()]));
        assert!(store.has_key(" p").await);
        assert!(store.set_default_provider(" p ").await);
        assert_eq!(store.get_default_provider().await.as_deref(), Some("p"));

        assert!(store.delete_provider_config("  p").await);
        assert!(store.get_provider_config("p").await.is_none());
        assert!(store.list_key_ids().await.is_empty());
        assert!(store.get_default_provider().await.is_none());
    }
}
