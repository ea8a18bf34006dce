//! LLM gateway client.
//!
//! Contains the [`GatewayProvider`] implementation of the `LlmProvider` trait
//! from `parley-core`, a factory ([`create_provider`]) that builds it from
//! [`GatewayConfig`], and a connectivity check ([`test_provider_connection`]).

pub mod gateway;

use secrecy::SecretString;

use parley_core::llm::box_provider::BoxLlmProvider;
use parley_types::config::GatewayConfig;
use parley_types::llm::{CompletionRequest, LlmError, Message, MessageRole};

use self::gateway::GatewayProvider;

/// Environment variable holding the gateway API key.
pub const API_KEY_ENV: &str = "VSEGPT_API_KEY";

/// Resolve the gateway API key: the environment wins over `gateway.api_key`.
pub fn resolve_api_key(config: &GatewayConfig) -> Option<SecretString> {
    std::env::var(API_KEY_ENV)
        .ok()
        .or_else(|| config.api_key.clone())
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
}

/// Create a [`BoxLlmProvider`] for the configured gateway.
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] when no API key is available.
pub fn create_provider(
    config: &GatewayConfig,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
    let provider = GatewayProvider::new(config, key)?;
    Ok(BoxLlmProvider::new(provider))
}

/// Send a minimal completion request to verify the key and endpoint.
pub async fn test_provider_connection(provider: &BoxLlmProvider) -> Result<(), LlmError> {
    let request = CompletionRequest {
        model: String::new(),
        messages: vec![Message::new(MessageRole::User, "Hello")],
        system: None,
        max_tokens: 10,
        temperature: Some(0.0),
        attachments: Vec::new(),
    };
    provider.complete(&request).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider() {
        let provider = create_provider(
            &GatewayConfig::default(),
            Some(SecretString::from("sk-test-key")),
        )
        .unwrap();
        assert_eq!(provider.name(), "vsegpt");
        assert!(provider.capabilities().vision);
        assert_eq!(provider.capabilities().max_output_tokens, 3000);
    }

    #[test]
    fn test_create_provider_missing_key() {
        match create_provider(&GatewayConfig::default(), None) {
            Err(LlmError::AuthenticationFailed) => {}
            Err(other) => panic!("Expected AuthenticationFailed, got: {other}"),
            Ok(_) => panic!("Expected error but got Ok"),
        }
    }

    #[test]
    fn test_resolve_api_key_from_config() {
        use secrecy::ExposeSecret;

        // SAFETY: single-threaded test; the variable is restored immediately.
        let saved = std::env::var(API_KEY_ENV).ok();
        unsafe {
            std::env::remove_var(API_KEY_ENV);
        }

        let mut config = GatewayConfig::default();
        assert!(resolve_api_key(&config).is_none());

        config.api_key = Some("   ".to_string());
        assert!(resolve_api_key(&config).is_none());

        config.api_key = Some("sk-config".to_string());
        assert_eq!(resolve_api_key(&config).unwrap().expose_secret(), "sk-config");

        if let Some(value) = saved {
            unsafe {
                std::env::set_var(API_KEY_ENV, value);
            }
        }
    }
}
