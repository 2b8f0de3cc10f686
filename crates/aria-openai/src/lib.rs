// OpenAI provider implementation for the ARIA LLM Gateway.
//
// Implements `aria_core::llm::LlmProvider` against OpenAI's chat
// completions API (and OpenAI-compatible endpoints via `with_base_url`).

mod provider;

#[cfg(test)]
mod tests;

pub use provider::OpenAiProvider;

pub use aria_core::llm::LlmProvider;
