//! Client for the external completion API.

mod client;

pub use client::{
    build_prompt, is_supported_language, AssistReply, Assistant, CodeAssistant,
    SUPPORTED_LANGUAGES,
};

#[cfg(test)]
pub use client::MockAssistant;
