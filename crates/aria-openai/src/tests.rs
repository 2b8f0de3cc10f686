use crate::OpenAiProvider;

#[test]
fn with_api_key_builds_default_endpoint() {
    let provider = OpenAiProvider::new("test-key");
    let debug = format!("{:?}", provider);
    assert!(debug.contains("OpenAiProvider"));
    assert!(!debug.contains("test-key"));
}

#[test]
fn with_base_url_overrides_endpoint() {
    let provider = OpenAiProvider::with_base_url(
        "test-key".to_string(),
        "https://compatible.example.com/v1/chat/completions".to_string(),
    );
    let debug = format!("{:?}", provider);
    assert!(debug.contains("compatible.example.com"));
}

#[test]
fn from_env_fails_without_api_key() {
    std::env::remove_var("OPENAI_API_KEY");
    assert!(OpenAiProvider::from_env().is_err());
}
