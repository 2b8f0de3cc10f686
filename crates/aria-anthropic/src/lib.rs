// Anthropic provider implementation for the ARIA LLM Gateway.
//
// Implements `aria_core::llm::LlmProvider` against Anthropic's Messages
// API. Supports extended thinking via `LlmCallConfig::thinking_effort`.

mod provider;

#[cfg(test)]
mod tests;

pub use provider::AnthropicProvider;

pub use aria_core::llm::LlmProvider;
