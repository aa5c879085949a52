use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Anthropic,
    Openai,
    Google,
    Openrouter,
    Ollama,
    Custom,
}

impl ProviderType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Openai => "openai",
            Self::Google => "google",
            Self::Openrouter => "openrouter",
            Self::Ollama => "ollama",
            Self::Custom => "custom",
        }
    }

    /// Local runtimes run without credentials.
    pub fn requires_api_key(self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::Openai),
            "google" => Ok(Self::Google),
            "openrouter" => Ok(Self::Openrouter),
            "ollama" => Ok(Self::Ollama),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown provider type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub enabled: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderWithKeyInfo {
    #[serde(flatten)]
    pub config: ProviderConfig,
    pub has_key: bool,
    pub key_masked: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProviderPayload {
    pub config: ProviderConfig,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl KeyValidation {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcErrorCode {
    Validation,
    Storage,
    Keyring,
    Network,
    Updater,
    Unknown,
}

impl IpcErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::Storage => "STORAGE",
            Self::Keyring => "KEYRING",
            Self::Network => "NETWORK",
            Self::Updater => "UPDATER",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl From<IpcErrorCode> for String {
    fn from(code: IpcErrorCode) -> Self {
        code.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IpcResult<T> {
    Ok { success: bool, value: T },
    Err { success: bool, error: IpcError },
}

impl<T> IpcResult<T> {
    pub fn ok(value: T) -> Self {
        Self::Ok {
            success: true,
            value,
        }
    }

    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Err {
            success: false,
            error: IpcError {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

pub(crate) fn now_iso() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn provider_config_uses_camel_case_and_type_field() {
        let config = ProviderConfig {
            id: "anthropic-1".to_string(),
            name: "Anthropic".to_string(),
            provider_type: ProviderType::Anthropic,
            base_url: None,
            model: Some("claude-sonnet-4".to_string()),
            enabled: true,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["type"], json!("anthropic"));
        assert_eq!(value["createdAt"], json!("2026-01-01T00:00:00Z"));
        assert!(value.get("baseUrl").is_none());
    }

    #[test]
    fn provider_with_key_info_flattens_config() {
        let info = ProviderWithKeyInfo {
            config: ProviderConfig {
                id: "openai".to_string(),
                name: "OpenAI".to_string(),
                provider_type: ProviderType::Openai,
                base_url: Some("https://api.openai.com/v1".to_string()),
                model: None,
                enabled: false,
                created_at: String::new(),
                updated_at: String::new(),
            },
            has_key: true,
            key_masked: Some("sk-a****bcde".to_string()),
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["id"], json!("openai"));
        assert_eq!(value["hasKey"], json!(true));
        assert_eq!(value["keyMasked"], json!("sk-a****bcde"));
    }

    #[test]
    fn ipc_result_serializes_success_flag() {
        let ok = serde_json::to_value(IpcResult::ok(3)).unwrap();
        assert_eq!(ok, json!({ "success": true, "value": 3 }));

        let err = serde_json::to_value(IpcResult::<()>::err(IpcErrorCode::Updater, "boom")).unwrap();
        assert_eq!(
            err,
            json!({ "success": false, "error": { "code": "UPDATER", "message": "boom" } })
        );
    }

    #[test]
    fn provider_type_parses_known_values_only() {
        assert_eq!("ollama".parse::<ProviderType>(), Ok(ProviderType::Ollama));
        assert!("bedrock".parse::<ProviderType>().is_err());
        assert!(!ProviderType::Ollama.requires_api_key());
        assert!(ProviderType::Openrouter.requires_api_key());
    }
}
