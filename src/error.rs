//! Client-level error types and the uniform error envelope surfaced to callers.

// self
use crate::{_prelude::*, store::StoreError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// No response was received (DNS, TCP, TLS, timeout). Never retried by this layer.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Credential refresh failed; the session has been terminated.
	#[error(transparent)]
	RefreshFailed(#[from] RefreshError),

	/// The server kept rejecting the request after one refresh-and-retry cycle.
	#[error("Request was rejected as unauthorized: {}", .0.message)]
	Unauthorized(ApiError),
	/// The server answered with a non-401 error status.
	#[error("Server responded with HTTP {}: {}", .0.http_status, .0.message)]
	Server(ApiError),
	/// A successful response body could not be decoded into the requested type.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured parsing failure, including the offending field path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the decoded response.
		status: u16,
	},
}
impl Error {
	/// Converts any error into the uniform [`ApiError`] envelope.
	pub fn envelope(&self) -> ApiError {
		match self {
			Self::Unauthorized(envelope) | Self::Server(envelope) => envelope.clone(),
			Self::RefreshFailed(RefreshError::Rejected(envelope)) => envelope.clone(),
			Self::RefreshFailed(err) => ApiError::new(
				ApiError::SESSION_EXPIRED_CODE,
				err.to_string(),
				ApiError::UNAUTHORIZED_STATUS,
			),
			Self::Transport(err) => ApiError::without_response(Some(err.describe())),
			Self::Decode { status, .. } =>
				ApiError::new(ApiError::DEFAULT_CODE, self.to_string(), *status),
			Self::Storage(_) | Self::Config(_) => ApiError::new(
				ApiError::DEFAULT_CODE,
				self.to_string(),
				ApiError::NO_RESPONSE_STATUS,
			),
		}
	}

	/// Returns `true` if this error ended the session (tokens were cleared).
	pub fn is_session_ended(&self) -> bool {
		matches!(self, Self::RefreshFailed(_))
	}
}

/// Configuration and validation failures.
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
	HttpRequest(#[from] ::http::Error),
	/// Base URL cannot be parsed or used as a base.
	#[error("Base URL `{url}` cannot be used as an API base.")]
	InvalidBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// Base URL uses a scheme other than HTTP(S).
	#[error("Base URL must use http or https, found `{scheme}`.")]
	UnsupportedScheme {
		/// Offending scheme.
		scheme: String,
	},
	/// Request path cannot be resolved against the base URL.
	#[error("Path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Timeouts must be strictly positive.
	#[error("The {name} timeout must be greater than zero.")]
	ZeroTimeout {
		/// Which timeout failed validation.
		name: &'static str,
	},
	/// Navigation targets must be absolute paths.
	#[error("Navigation target `{path}` must start with `/`.")]
	InvalidNavigationTarget {
		/// Offending path.
		path: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	InvalidBody {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
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

/// Transport-level failures where no response was received.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	fn describe(&self) -> String {
		match self {
			Self::Network { source } => source.to_string(),
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Terminal refresh failures. Cloned to every caller waiting on the same refresh.
#[derive(Clone, Debug, ThisError)]
pub enum RefreshError {
	/// No refresh token was stored, so the network was never contacted.
	#[error("No refresh token is available; the session has ended.")]
	MissingRefreshToken,
	/// The refresh endpoint answered with an error status (including 401).
	#[error("Refresh endpoint rejected the request with HTTP {}.", .0.http_status)]
	Rejected(ApiError),
	/// The refresh call failed before a response was received.
	#[error("Refresh call failed before a response was received.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: SharedError,
	},
	/// The refresh call exceeded the configured timeout.
	#[error("Refresh call did not complete within {timeout:?}.")]
	Timeout {
		/// Configured refresh timeout.
		timeout: Duration,
	},
	/// The refresh response body could not be parsed.
	#[error("Refresh endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: Arc<serde_path_to_error::Error<serde_json::Error>>,
	},
	/// The refresh response carried an empty access token.
	#[error("Refresh endpoint returned an empty access token.")]
	EmptyAccessToken,
	/// The refreshed tokens could not be persisted.
	#[error("Refreshed tokens could not be persisted: {0}")]
	Storage(StoreError),
	/// The task driving the refresh was dropped before the refresh settled.
	#[error("Refresh was abandoned before it settled.")]
	Cancelled,
}
impl RefreshError {
	/// Wraps a transport failure observed while calling the refresh endpoint.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Arc::new(src) }
	}
}

/// Uniform error envelope handed to callers for every non-success outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
	/// Machine-readable error code; [`ApiError::DEFAULT_CODE`] when the server supplied none.
	pub code: String,
	/// Human-readable message.
	pub message: String,
	/// Optional structured details supplied by the server.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
	/// HTTP status of the response, or [`ApiError::NO_RESPONSE_STATUS`] if none was received.
	pub http_status: u16,
	/// Instant the envelope was produced.
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
}
impl ApiError {
	/// Code used when the server did not supply one.
	pub const DEFAULT_CODE: &'static str = "UNKNOWN_ERROR";
	/// Message used when neither the server nor the transport supplied one.
	pub const DEFAULT_MESSAGE: &'static str = "An unexpected error occurred";
	/// Status reported when no response was received.
	pub const NO_RESPONSE_STATUS: u16 = 500;
	/// Code reported for terminated sessions.
	pub const SESSION_EXPIRED_CODE: &'static str = "SESSION_EXPIRED";
	/// Status reported for terminated sessions.
	pub const UNAUTHORIZED_STATUS: u16 = 401;

	/// Creates an envelope stamped with the current instant.
	pub fn new(code: impl Into<String>, message: impl Into<String>, http_status: u16) -> Self {
		Self {
			code: code.into(),
			message: message.into(),
			details: None,
			http_status,
			timestamp: OffsetDateTime::now_utc(),
		}
	}

	/// Normalizes an error response.
	///
	/// The code is read from `error.code` (or a top-level `error_code`). The message falls back
	/// from the server message (`error.message`, then a string `detail`) to the transport
	/// message and finally to [`ApiError::DEFAULT_MESSAGE`].
	pub fn from_response(status: u16, body: &[u8]) -> Self {
		let parsed = serde_json::from_slice::<serde_json::Value>(body).ok();
		let nested = parsed.as_ref().and_then(|value| value.get("error"));
		let code = nested
			.and_then(|error| error.get("code"))
			.or_else(|| parsed.as_ref().and_then(|value| value.get("error_code")))
			.and_then(serde_json::Value::as_str)
			.unwrap_or(Self::DEFAULT_CODE);
		let detail = parsed.as_ref().and_then(|value| value.get("detail"));
		let server_message = nested
			.and_then(|error| error.get("message"))
			.and_then(serde_json::Value::as_str)
			.or_else(|| detail.and_then(serde_json::Value::as_str))
			.filter(|message| !message.is_empty());
		let details = nested
			.and_then(|error| error.get("details"))
			.or_else(|| detail.filter(|value| !value.is_string()))
			.filter(|value| !value.is_null())
			.cloned();
		let message = match server_message {
			Some(message) => message.to_owned(),
			None => format!("Request failed with status code {status}"),
		};

		Self { details, ..Self::new(code, message, status) }
	}

	/// Builds an envelope for a request that never received a response.
	pub fn without_response(transport_message: Option<String>) -> Self {
		let message = transport_message
			.filter(|message| !message.is_empty())
			.unwrap_or_else(|| Self::DEFAULT_MESSAGE.to_owned());

		Self::new(Self::DEFAULT_CODE, message, Self::NO_RESPONSE_STATUS)
	}
}
