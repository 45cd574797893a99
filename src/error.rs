//! Client-level error types shared across the token grants, the request pipeline, and the
//! resource accessors.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical OpenMotics client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration or decoding problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout); retried with backoff.
	#[error(transparent)]
	Connection(#[from] ConnectionError),
	/// The API returned a structured 4xx/5xx failure; terminal.
	#[error(transparent)]
	Api(#[from] ApiError),

	/// The API throttled the request (HTTP 429); retried with a larger backoff budget.
	#[error("The OpenMotics API rate limit was exceeded.")]
	RateLimit {
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Credentials were rejected, either at the token endpoint or by the API (401/403).
	#[error("Authentication with the OpenMotics API failed: {reason}.")]
	Authentication {
		/// Upstream- or client-supplied reason string.
		reason: String,
	},
}
impl Error {
	/// Builds an [`Error::Authentication`] from a reason string.
	pub fn authentication(reason: impl Into<String>) -> Self {
		Self::Authentication { reason: reason.into() }
	}

	/// Returns `true` if the outer retry decorator may re-attempt the operation.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Connection(_) | Self::RateLimit { .. })
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A configured or derived endpoint URL is invalid.
	#[error("Endpoint URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The service-account private key could not be loaded or used for signing.
	#[error("Service account private key is invalid.")]
	InvalidPrivateKey {
		/// Underlying JWT library failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// A response body could not be decoded into the expected shape.
	#[error("Response body could not be decoded.")]
	Decode(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// A request body could not be serialized to JSON.
	#[error("Request body could not be serialized.")]
	Serialize(#[source] serde_json::Error),
	/// A 2xx JSON response did not carry the `data` envelope field.
	#[error("Response envelope is missing the data field.")]
	MissingData,
	/// The decode target expected a JSON payload but the response carried none.
	#[error("Expected a JSON payload but the response was {kind}.")]
	UnexpectedBody {
		/// Response kind actually observed (`empty` or `text`).
		kind: &'static str,
	},
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned a non-positive or out-of-range `expires_in`.
	#[error("The expires_in value must be a positive number of seconds.")]
	InvalidExpiresIn,
	/// Token record builder validation failed.
	#[error("Unable to build token record.")]
	TokenBuild(#[from] crate::auth::TokenRecordBuilderError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum ConnectionError {
	/// The request exceeded the configured timeout.
	#[error("Timeout occurred while connecting to the OpenMotics API.")]
	Timeout,
	/// Underlying HTTP client reported a network failure (DNS, TCP, TLS).
	#[error("Network error occurred while communicating with the OpenMotics API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while communicating with the OpenMotics API.")]
	Io(#[from] std::io::Error),
}
impl ConnectionError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

/// Structured API failure for non-retryable 4xx/5xx responses.
///
/// The OpenMotics API reports failures either as a JSON body shaped like
/// `{"status_code": ..., "error": ..., "message": ...}` or as plain text; both forms are
/// captured here so callers never lose the upstream diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("The OpenMotics API returned status {status}: {}.", detail(.error, .message, .body))]
pub struct ApiError {
	/// HTTP status code of the failing response.
	pub status: u16,
	/// Decoded `error` field when the body was JSON.
	pub error: Option<String>,
	/// Decoded `message` field when the body was JSON.
	pub message: Option<String>,
	/// Raw body preview when the payload was not the structured JSON form.
	pub body: Option<String>,
}
impl ApiError {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Builds an [`ApiError`] from a failing response's status and raw body bytes.
	///
	/// JSON bodies are decoded into the structured `{status_code, error, message}` form;
	/// anything else is kept as a truncated text preview.
	pub fn from_response(status: u16, json_content: bool, body: &[u8]) -> Self {
		#[derive(Deserialize)]
		struct Failure {
			error: Option<String>,
			message: Option<String>,
		}

		if json_content
			&& let Ok(failure) = serde_json::from_slice::<Failure>(body)
			&& (failure.error.is_some() || failure.message.is_some())
		{
			return Self { status, error: failure.error, message: failure.message, body: None };
		}

		let text = String::from_utf8_lossy(body);
		let preview = truncate_preview(text.as_ref());

		Self { status, error: None, message: None, body: (!preview.is_empty()).then_some(preview) }
	}

	/// Builds an [`ApiError`] carrying only a status code and a client-side message.
	pub fn with_message(status: u16, message: impl Into<String>) -> Self {
		Self { status, error: None, message: Some(message.into()), body: None }
	}
}

fn detail(error: &Option<String>, message: &Option<String>, body: &Option<String>) -> String {
	match (error, message, body) {
		(Some(error), Some(message), _) => format!("{error}: {message}"),
		(Some(error), None, _) => error.clone(),
		(None, Some(message), _) => message.clone(),
		(None, None, Some(body)) => body.clone(),
		(None, None, None) => "no details supplied".into(),
	}
}

fn truncate_preview(body: &str) -> String {
	let mut buf = String::new();

	for (idx, ch) in body.chars().enumerate() {
		if idx >= ApiError::BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}
		buf.push(ch);
	}

	buf
}
