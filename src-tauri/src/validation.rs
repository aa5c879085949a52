use crate::redact::redact_secrets;
use crate::types::{KeyValidation, ProviderType};
use reqwest::StatusCode;
use std::time::Duration;

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com";
const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
const REQUEST_TIMEOUT_SECONDS: u64 = 15;

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Description of the probe request for one provider, kept separate from
/// the HTTP client so it can be inspected without the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
}

fn trim_base(base: &str) -> &str {
    base.trim().trim_end_matches('/')
}

/// `None` when the provider accepts requests without a key.
pub fn probe_request(
    provider_type: ProviderType,
    api_key: &str,
    base_url: Option<&str>,
) -> Option<ProbeRequest> {
    let base_url = base_url.map(trim_base).filter(|s| !s.is_empty());
    let key = api_key.trim();

    let request = match provider_type {
        ProviderType::Anthropic => ProbeRequest {
            url: format!("{}/v1/models", base_url.unwrap_or(ANTHROPIC_API_BASE)),
            headers: vec![
                ("x-api-key", key.to_string()),
                ("anthropic-version", ANTHROPIC_VERSION.to_string()),
            ],
        },
        ProviderType::Openai | ProviderType::Custom => ProbeRequest {
            url: format!("{}/models", base_url.unwrap_or(OPENAI_API_BASE)),
            headers: vec![("authorization", format!("Bearer {key}"))],
        },
        ProviderType::Google => ProbeRequest {
            url: format!(
                "{}/v1beta/models?key={key}",
                base_url.unwrap_or(GOOGLE_API_BASE)
            ),
            headers: vec![],
        },
        ProviderType::Openrouter => ProbeRequest {
            url: format!("{}/auth/key", base_url.unwrap_or(OPENROUTER_API_BASE)),
            headers: vec![("authorization", format!("Bearer {key}"))],
        },
        ProviderType::Ollama => return None,
    };
    Some(request)
}

pub fn classify_status(status: StatusCode) -> KeyValidation {
    if status.is_success() {
        KeyValidation::valid()
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        KeyValidation::invalid("Invalid API key.")
    } else {
        KeyValidation::invalid(format!("Unexpected response from provider (HTTP {}).", status.as_u16()))
    }
}

pub struct KeyValidator {
    http: reqwest::Client,
}

impl KeyValidator {
    pub fn new() -> Result<Self, ValidationError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ClawX/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()?;
        Ok(Self { http })
    }

    pub async fn validate(
        &self,
        provider_type: ProviderType,
        api_key: &str,
        base_url: Option<&str>,
    ) -> KeyValidation {
        if provider_type.requires_api_key() && api_key.trim().is_empty() {
            return KeyValidation::invalid("API key is required.");
        }
        if provider_type == ProviderType::Custom && base_url.map_or(true, |b| b.trim().is_empty()) {
            return KeyValidation::invalid("Base URL is required for custom providers.");
        }

        let Some(probe) = probe_request(provider_type, api_key, base_url) else {
            return KeyValidation::valid();
        };

        let mut request = self.http.get(&probe.url);
        for (name, value) in &probe.headers {
            request = request.header(*name, value);
        }

        match request.send().await {
            Ok(response) => {
                let verdict = classify_status(response.status());
                if !verdict.valid {
                    tracing::warn!(provider = %provider_type, status = %response.status(), "API key rejected");
                }
                verdict
            }
            Err(e) => {
                let message = redact_secrets(&e.to_string()).into_owned();
                tracing::warn!(provider = %provider_type, "API key validation failed: {message}");
                KeyValidation::invalid(format!("Connection failed: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anthropic_probe_uses_x_api_key_header() {
        let probe = probe_request(ProviderType::Anthropic, " sk-ant-1 ", None).unwrap();
        assert_eq!(probe.url, "https://api.anthropic.com/v1/models");
        assert!(probe.headers.contains(&("x-api-key", "sk-ant-1".to_string())));
        assert!(probe
            .headers
            .iter()
            .any(|(name, _)| *name == "anthropic-version"));
    }

    #[test]
    fn openai_compatible_probe_honours_base_url() {
        let probe =
            probe_request(ProviderType::Custom, "k", Some("http://localhost:8080/v1/")).unwrap();
        assert_eq!(probe.url, "http://localhost:8080/v1/models");
        assert_eq!(probe.headers, vec![("authorization", "Bearer k".to_string())]);
    }

    #[test]
    fn google_probe_passes_key_as_query() {
        let probe = probe_request(ProviderType::Google, "AIza1", None).unwrap();
        assert_eq!(
            probe.url,
            "https://generativelanguage.googleapis.com/v1beta/models?key=AIza1"
        );
        assert!(probe.headers.is_empty());
    }

    #[test]
    fn openrouter_probe_targets_auth_endpoint() {
        let probe = probe_request(ProviderType::Openrouter, "sk-or-1", None).unwrap();
        assert_eq!(probe.url, "https://openrouter.ai/api/v1/auth/key");
    }

    #[test]
    fn ollama_needs_no_probe() {
        assert!(probe_request(ProviderType::Ollama, "", None).is_none());
    }

    #[test]
    fn status_classification() {
        assert!(classify_status(StatusCode::OK).valid);
        let denied = classify_status(StatusCode::UNAUTHORIZED);
        assert!(!denied.valid);
        assert_eq!(denied.error.as_deref(), Some("Invalid API key."));
        assert!(!classify_status(StatusCode::FORBIDDEN).valid);
        let odd = classify_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(odd.error.unwrap().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn missing_inputs_are_rejected_without_network() {
        let validator = KeyValidator::new().unwrap();
        let result = validator
            .validate(ProviderType::Anthropic, "   ", None)
            .await;
        assert!(!result.valid);

        let result = validator.validate(ProviderType::Custom, "k", None).await;
        assert_eq!(
            result.error.as_deref(),
            Some("Base URL is required for custom providers.")
        );

        assert!(validator.validate(ProviderType::Ollama, "", None).await.valid);
    }
}
