//! Client configuration and its validating builder.

// self
use crate::{_prelude::*, error::ConfigError};

/// Validated configuration shared by the client, the refresh coordinator, and account helpers.
///
/// Request paths are resolved relative to [`ClientConfig::base_url`], which always ends with
/// `/`; a base of `http://localhost:8000/api/v1` therefore sends `auth/refresh` to
/// `http://localhost:8000/api/v1/auth/refresh`. Deserializing goes through
/// [`ClientConfigBuilder`], so values loaded from files are validated the same way.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ClientConfigBuilder")]
pub struct ClientConfig {
	/// API base URL.
	pub base_url: Url,
	/// Timeout applied to every outbound call by the default transport.
	pub request_timeout: Duration,
	/// Timeout applied to the refresh call; `None` waits indefinitely.
	pub refresh_timeout: Option<Duration>,
	/// Backend endpoint paths, relative to the base URL.
	pub endpoints: EndpointPaths,
	/// Page the hosting shell is sent to when the session ends.
	pub login_page: String,
}
impl ClientConfig {
	/// Default request and refresh timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

	/// Returns a builder for the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Resolves a request path against the base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let relative = path.trim_start_matches('/');

		self.base_url
			.join(relative)
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })
	}

	/// Fully-qualified refresh endpoint.
	pub fn refresh_url(&self) -> Result<Url, ConfigError> {
		self.endpoint(&self.endpoints.refresh)
	}
}

/// Backend endpoint paths used by the refresh coordinator and the account helpers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPaths {
	/// Refresh-token exchange.
	pub refresh: String,
	/// Password login (form encoded).
	pub login: String,
	/// Account registration.
	pub register: String,
	/// Session logout.
	pub logout: String,
	/// Current user profile.
	pub me: String,
	/// Profile update.
	pub profile: String,
	/// Password change for the logged-in user.
	pub change_password: String,
	/// Password-reset email request.
	pub password_reset: String,
	/// Password-reset confirmation.
	pub password_reset_confirm: String,
	/// Email verification.
	pub verify_email: String,
}
impl Default for EndpointPaths {
	fn default() -> Self {
		Self {
			refresh: "auth/refresh".into(),
			login: "auth/login".into(),
			register: "auth/register".into(),
			logout: "auth/logout".into(),
			me: "auth/me".into(),
			profile: "auth/profile".into(),
			change_password: "auth/change-password".into(),
			password_reset: "auth/password-reset".into(),
			password_reset_confirm: "auth/password-reset/confirm".into(),
			verify_email: "auth/verify-email".into(),
		}
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfigBuilder {
	/// API base URL.
	pub base_url: Url,
	/// Per-call timeout.
	#[serde(default = "default_timeout")]
	pub request_timeout: Duration,
	/// Refresh-call timeout.
	#[serde(default = "default_refresh_timeout")]
	pub refresh_timeout: Option<Duration>,
	/// Backend endpoint paths.
	#[serde(default)]
	pub endpoints: EndpointPaths,
	/// Login page used for session-ended redirects.
	#[serde(default = "default_login_page")]
	pub login_page: String,
}
impl ClientConfigBuilder {
	/// Creates a new builder with default timeouts and endpoint paths.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			request_timeout: default_timeout(),
			refresh_timeout: default_refresh_timeout(),
			endpoints: EndpointPaths::default(),
			login_page: default_login_page(),
		}
	}

	/// Overrides the per-call timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Overrides the refresh-call timeout; `None` disables it.
	pub fn refresh_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.refresh_timeout = timeout;

		self
	}

	/// Overrides the backend endpoint paths.
	pub fn endpoints(mut self, endpoints: EndpointPaths) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Overrides the login page used for session-ended redirects.
	pub fn login_page(mut self, page: impl Into<String>) -> Self {
		self.login_page = page.into();

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let base_url = normalize_base_url(self.base_url)?;

		if self.request_timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout { name: "request" });
		}
		if self.refresh_timeout.is_some_and(|timeout| timeout.is_zero()) {
			return Err(ConfigError::ZeroTimeout { name: "refresh" });
		}
		if !self.login_page.starts_with('/') {
			return Err(ConfigError::InvalidNavigationTarget { path: self.login_page });
		}

		let config = ClientConfig {
			base_url,
			request_timeout: self.request_timeout,
			refresh_timeout: self.refresh_timeout,
			endpoints: self.endpoints,
			login_page: self.login_page,
		};

		config.refresh_url()?;

		Ok(config)
	}
}
impl TryFrom<ClientConfigBuilder> for ClientConfig {
	type Error = ConfigError;

	fn try_from(builder: ClientConfigBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}

fn normalize_base_url(mut url: Url) -> Result<Url, ConfigError> {
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::UnsupportedScheme { scheme: url.scheme().to_owned() });
	}
	if url.cannot_be_a_base() {
		return Err(ConfigError::InvalidBaseUrl { url: url.to_string() });
	}
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url.set_query(None);
	url.set_fragment(None);

	Ok(url)
}

fn default_timeout() -> Duration {
	ClientConfig::DEFAULT_TIMEOUT
}

fn default_refresh_timeout() -> Option<Duration> {
	Some(ClientConfig::DEFAULT_TIMEOUT)
}

fn default_login_page() -> String {
	"/login".into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse configuration URL fixture.")
	}

	#[test]
	fn base_url_gains_trailing_slash_and_resolves_paths() {
		let config = ClientConfig::builder(url("http://localhost:8000/api/v1?x=1"))
			.build()
			.expect("Configuration should build for an HTTP base URL.");

		assert_eq!(config.base_url.as_str(), "http://localhost:8000/api/v1/");
		assert_eq!(
			config.refresh_url().expect("Refresh URL should resolve.").as_str(),
			"http://localhost:8000/api/v1/auth/refresh"
		);
		assert_eq!(
			config.endpoint("/detections/42").expect("Absolute-looking paths stay relative.").as_str(),
			"http://localhost:8000/api/v1/detections/42"
		);
	}

	#[test]
	fn builder_rejects_invalid_settings() {
		let err = ClientConfig::builder(url("ftp://example.com/"))
			.build()
			.expect_err("Non-HTTP schemes should be rejected.");

		assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));

		let err = ClientConfig::builder(url("https://example.com/"))
			.request_timeout(Duration::ZERO)
			.build()
			.expect_err("Zero timeouts should be rejected.");

		assert!(matches!(err, ConfigError::ZeroTimeout { name: "request" }));

		let err = ClientConfig::builder(url("https://example.com/"))
			.login_page("login")
			.build()
			.expect_err("Relative login pages should be rejected.");

		assert!(matches!(err, ConfigError::InvalidNavigationTarget { .. }));
	}

	#[test]
	fn deserialization_applies_defaults_and_validation() {
		let config: ClientConfig =
			serde_json::from_str(r#"{"base_url":"https://api.example.com/v1"}"#)
				.expect("Minimal configuration should deserialize.");

		assert_eq!(config.base_url.as_str(), "https://api.example.com/v1/");
		assert_eq!(config.request_timeout, ClientConfig::DEFAULT_TIMEOUT);
		assert_eq!(config.refresh_timeout, Some(ClientConfig::DEFAULT_TIMEOUT));
		assert_eq!(config.endpoints, EndpointPaths::default());
		assert_eq!(config.login_page, "/login");
		assert!(serde_json::from_str::<ClientConfig>(r#"{"base_url":"mailto:a@b.c"}"#).is_err());
	}
}
