//! Language-model backend clients for Verdant.
//!
//! One implementation covers every deployment target: any endpoint that
//! speaks the OpenAI `/v1/chat/completions` dialect (Groq in production,
//! OpenAI, Ollama, vLLM locally). Failures come back as typed
//! `ProviderError`s so the agent can distinguish rate limits and timeouts
//! from hard outages.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
