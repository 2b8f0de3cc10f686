use crate::AnthropicProvider;

#[test]
fn with_api_key_redacts_debug_output() {
    let provider = AnthropicProvider::new("test-key");
    let debug = format!("{:?}", provider);
    assert!(debug.contains("AnthropicProvider"));
    assert!(!debug.contains("test-key"));
}

#[test]
fn with_base_url_overrides_endpoint() {
    let provider = AnthropicProvider::with_base_url(
        "test-key".to_string(),
        "https://custom.api.com/v1/messages".to_string(),
    );
    assert!(format!("{:?}", provider).contains("custom.api.com"));
}

#[test]
fn from_env_fails_without_api_key() {
    std::env::remove_var("ANTHROPIC_API_KEY");
    assert!(AnthropicProvider::from_env().is_err());
}
