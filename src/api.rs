//! # API Module
//!
//! This module handles interactions with the OpenAI-compatible chat API used
//! to answer questions.
//!
//! The resolver hands in an already-formatted instruction (see
//! [`crate::prompt`]); this module creates a client from configuration, sends
//! a single user message, and returns the first choice's content. Errors are
//! propagated to the caller, which treats them as fallback triggers rather
//! than surfacing them to the user.
//!
//! # Example
//!
//! ```no_run
//! use wonder_why::api::fetch_answer;
//! use wonder_why::config::WonderWhyConfig;
//!
//! # async fn demo(config: WonderWhyConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let answer = fetch_answer(&config, "Explain this kindly to a 6-year-old: Why is the sky blue").await?;
//! println!("{answer}");
//! # Ok(()) }
//! ```

use crate::config::WonderWhyConfig;
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs,
    },
};
use std::error::Error;

use tracing::debug;

/// Creates a new chat API client from configuration.
///
/// # Parameters
/// - `config: &WonderWhyConfig`: Configuration containing API base and key.
///
/// # Returns
/// - `Result<Client<OpenAIConfig>, Box<dyn Error>>`: Created client or an error if initialization fails.
fn create_client(config: &WonderWhyConfig) -> Result<Client<OpenAIConfig>, Box<dyn Error>> {
    let openai_config = OpenAIConfig::new()
        .with_api_key(config.api_key.clone())
        .with_api_base(config.api_base.clone());
    debug!("Client created with config: {:?}", openai_config);
    Ok(Client::with_config(openai_config))
}

/// Sends a formatted instruction to the model and returns the answer text.
///
/// Builds a single-user-message chat completion request (no streaming, no
/// conversation history) and concatenates the returned choice contents.
///
/// # Parameters
/// - `config: &WonderWhyConfig`: API endpoint, key, model, and token budget.
/// - `formatted_prompt: &str`: The kid-friendly instruction to send.
///
/// # Returns
/// - `Result<String, Box<dyn Error>>`: The trimmed answer text, or the API
///   error. An empty response body yields an error so the caller can fall
///   back.
pub async fn fetch_answer(
    config: &WonderWhyConfig,
    formatted_prompt: &str,
) -> Result<String, Box<dyn Error>> {
    let client = create_client(config)?;

    let user_message = ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
        content: ChatCompletionRequestUserMessageContent::Text(formatted_prompt.to_string()),
        name: None,
    });

    let request = CreateChatCompletionRequestArgs::default()
        .max_tokens(config.max_answer_tokens)
        .model(config.model.clone())
        .messages(vec![user_message])
        .build()?;

    debug!("Sending request: {:?}", request);

    let response = client.chat().create(request).await?;

    let mut answer = String::new();
    response.choices.iter().for_each(|chat_choice| {
        if let Some(ref content) = chat_choice.message.content {
            answer.push_str(content);
        }
    });

    let answer = answer.trim().to_string();
    if answer.is_empty() {
        return Err("Empty model response".into());
    }

    Ok(answer)
}
