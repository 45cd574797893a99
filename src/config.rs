//! Connection configuration for the OpenMotics cloud API.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, error::ConfigError};

/// Default API host.
pub const OM_API_HOST: &str = "cloud.openmotics.com";
/// Default API port.
pub const OM_API_PORT: u16 = 443;
/// Fixed API prefix; all resource paths are resolved relative to it.
pub const OM_API_BASE_PATH: &str = "/api/v1";
/// Token endpoint path, relative to the base path.
pub const OM_TOKEN_PATH: &str = "authentication/oauth2/token";

const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(8);

/// Connection parameters for one [`Api`](crate::client::Api) instance.
///
/// All values have cloud defaults; use the `with_*` helpers to point the client at a
/// different gateway or tune the request timeout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
	/// API server hostname.
	pub server: String,
	/// API server port.
	pub port: u16,
	/// Whether to connect over TLS.
	pub ssl: bool,
	/// Per-request timeout applied by the default transport.
	pub request_timeout: StdDuration,
	/// User-Agent header value sent with every request.
	pub user_agent: String,
}
impl ApiConfig {
	/// Creates a configuration with the cloud defaults.
	pub fn new() -> Self {
		Self {
			server: OM_API_HOST.into(),
			port: OM_API_PORT,
			ssl: true,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			user_agent: concat!("openmotics-client/", env!("CARGO_PKG_VERSION")).into(),
		}
	}

	/// Overrides the server hostname.
	pub fn with_server(mut self, server: impl Into<String>) -> Self {
		self.server = server.into();

		self
	}

	/// Overrides the server port.
	pub fn with_port(mut self, port: u16) -> Self {
		self.port = port;

		self
	}

	/// Toggles TLS for the connection.
	pub fn with_ssl(mut self, ssl: bool) -> Self {
		self.ssl = ssl;

		self
	}

	/// Overrides the per-request timeout (defaults to 8 seconds).
	pub fn with_request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Overrides the User-Agent header value.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();

		self
	}

	/// Returns the URL scheme implied by the TLS toggle.
	pub fn scheme(&self) -> &'static str {
		if self.ssl { "https" } else { "http" }
	}

	/// Returns `scheme://server:port<base-path>` as a parsed URL.
	pub fn base_url(&self) -> Result<Url> {
		let raw = format!("{}://{}:{}{}/", self.scheme(), self.server, self.port, OM_API_BASE_PATH);

		Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { source }.into())
	}

	/// Resolves a relative resource path against the base URL.
	///
	/// A leading `/` on `path` is stripped so both `/base/installations` and
	/// `base/installations` resolve under the API prefix.
	pub fn api_url(&self, path: &str) -> Result<Url> {
		let base = self.base_url()?;
		let trimmed = path.trim_start_matches('/');

		if trimmed.is_empty() {
			return Ok(base);
		}

		base.join(trimmed).map_err(|source| ConfigError::InvalidUrl { source }.into())
	}

	/// Returns the OAuth2 token endpoint URL.
	pub fn token_url(&self) -> Result<Url> {
		self.api_url(OM_TOKEN_PATH)
	}
}
impl Default for ApiConfig {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn base_url_reflects_scheme_host_and_prefix() {
		let config = ApiConfig::new();

		// The url crate normalizes away the default https port.
		assert_eq!(
			config.base_url().expect("Default base URL should parse.").as_str(),
			"https://cloud.openmotics.com/api/v1/",
		);

		let local = ApiConfig::new().with_server("gateway.local").with_port(8088).with_ssl(false);

		assert_eq!(
			local.base_url().expect("Local base URL should parse.").as_str(),
			"http://gateway.local:8088/api/v1/",
		);
	}

	#[test]
	fn api_url_strips_leading_slashes() {
		let config = ApiConfig::new();
		let with_slash =
			config.api_url("/base/installations/21").expect("Path with slash should resolve.");
		let without_slash =
			config.api_url("base/installations/21").expect("Path without slash should resolve.");

		assert_eq!(with_slash, without_slash);
		assert_eq!(with_slash.path(), "/api/v1/base/installations/21");
	}

	#[test]
	fn token_url_lives_under_the_api_prefix() {
		let token_url = ApiConfig::new().token_url().expect("Token URL should resolve.");

		assert_eq!(token_url.path(), "/api/v1/authentication/oauth2/token");
	}

	#[test]
	fn empty_path_resolves_to_the_base_url() {
		let config = ApiConfig::new();

		assert_eq!(
			config.api_url("/").expect("Root path should resolve."),
			config.base_url().expect("Base URL should parse."),
		);
	}
}
