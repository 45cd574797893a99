// Not every test binary uses every helper.
#![allow(dead_code)]

// crates.io
use httpmock::{Mock, MockServer, prelude::*};
// self
use openmotics_client::{
	auth::Credentials,
	client::{Api, ReqwestApi},
	config::ApiConfig,
	retry::RetryPolicy,
};

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";
pub const ACCESS_TOKEN: &str = "T";

/// Builds a client pointing at the mock server with millisecond-scale retry delays so
/// backoff assertions stay fast.
pub fn test_api(server: &MockServer) -> ReqwestApi {
	test_api_with_credentials(
		server,
		Credentials::client_credentials(CLIENT_ID, CLIENT_SECRET),
	)
}

pub fn test_api_with_credentials(server: &MockServer, credentials: Credentials) -> ReqwestApi {
	Api::new(test_config(&server.host(), server.port()), credentials)
		.expect("Failed to build API client for tests.")
		.with_retry_policy(fast_retry_policy())
}

pub fn test_config(host: &str, port: u16) -> ApiConfig {
	ApiConfig::new()
		.with_server(host)
		.with_port(port)
		.with_ssl(false)
		.with_request_timeout(std::time::Duration::from_secs(5))
}

pub fn fast_retry_policy() -> RetryPolicy {
	RetryPolicy::new()
		.with_connection_base_delay(std::time::Duration::from_millis(5))
		.with_rate_limit_base_delay(std::time::Duration::from_millis(5))
}

/// Mocks a token endpoint issuing the fixed access token `T`.
pub async fn mock_token_endpoint(server: &MockServer) -> Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/authentication/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				r#"{"access_token":"T","token_type":"bearer","expires_in":3600}"#,
			);
		})
		.await
}
