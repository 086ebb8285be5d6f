use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::Result;

/// A single chat turn sent to the language model.
#[derive(Clone, Debug)]
pub struct ChatRequest<'a> {
	pub system_prompt: &'a str,
	pub user_prompt: &'a str,
	pub temperature: f32,
	pub timeout: Duration,
}

/// Sends one chat request and returns the assistant text verbatim.
///
/// No retry is attempted: transport and HTTP status errors propagate to the caller. A well-formed
/// response without message content yields an empty string so the caller can treat it as
/// unusable model output.
pub async fn generate(
	cfg: &memvec_config::LlmProviderConfig,
	request: &ChatRequest<'_>,
) -> Result<String> {
	let client = Client::builder().timeout(request.timeout).build()?;
	let url = crate::endpoint(&cfg.api_base, &cfg.path);
	let body = request_body(cfg, request);

	tracing::debug!(
		provider_id = %cfg.provider_id,
		model = %cfg.model,
		protocol = %cfg.protocol,
		"Sending extraction request."
	);

	let res = client
		.post(url)
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	Ok(parse_chat_content(&cfg.protocol, &json))
}

fn request_body(cfg: &memvec_config::LlmProviderConfig, request: &ChatRequest<'_>) -> Value {
	let messages = serde_json::json!([
		{ "role": "system", "content": request.system_prompt },
		{ "role": "user", "content": request.user_prompt },
	]);

	match cfg.protocol.as_str() {
		"ollama" => serde_json::json!({
			"model": cfg.model,
			"messages": messages,
			"stream": false,
			"options": { "temperature": request.temperature },
		}),
		_ => serde_json::json!({
			"model": cfg.model,
			"messages": messages,
			"temperature": request.temperature,
		}),
	}
}

fn parse_chat_content(protocol: &str, json: &Value) -> String {
	let message = match protocol {
		"ollama" => json.get("message"),
		_ => json
			.get("choices")
			.and_then(|v| v.as_array())
			.and_then(|arr| arr.first())
			.and_then(|choice| choice.get("message")),
	};

	match message.and_then(|msg| msg.get("content")).and_then(|content| content.as_str()) {
		Some(content) => content.to_string(),
		None => {
			tracing::warn!(%protocol, "Chat response has no message content.");

			String::new()
		},
	}
}
