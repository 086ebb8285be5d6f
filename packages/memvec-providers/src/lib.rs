pub mod embedding;
pub mod error;
pub mod extractor;

pub use error::{Error, Result};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};

/// Builds request headers. The bearer header is only sent when an API key is configured.
pub fn auth_headers(
	api_key: Option<&str>,
	default_headers: &Map<String, Value>,
) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	if let Some(api_key) = api_key {
		headers.insert(AUTHORIZATION, header_value("authorization", &format!("Bearer {api_key}"))?);
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: format!("Default header {key:?} must be a string."),
			});
		};

		let name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| Error::InvalidConfig {
			message: format!("Default header name {key:?} is invalid: {err}."),
		})?;

		headers.insert(name, header_value(key, raw)?);
	}

	Ok(headers)
}

fn header_value(name: &str, raw: &str) -> Result<HeaderValue> {
	HeaderValue::from_str(raw).map_err(|err| Error::InvalidConfig {
		message: format!("Header {name:?} has an invalid value: {err}."),
	})
}

pub(crate) fn endpoint(api_base: &str, path: &str) -> String {
	format!("{}{}", api_base.trim_end_matches('/'), path)
}
