pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Provider request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("Provider returned malformed JSON: {0}")]
	Json(#[from] serde_json::Error),
	#[error("Invalid provider config: {message}")]
	InvalidConfig { message: String },
	#[error("Unexpected provider response: {message}")]
	InvalidResponse { message: String },
}
impl Error {
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Http(err) if err.is_timeout())
	}
}
