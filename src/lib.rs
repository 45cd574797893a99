//! Typed asynchronous client for the OpenMotics home automation cloud API—OAuth2 grants, a
//! retrying request pipeline, and per-resource accessors in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod base;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod retry;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::Credentials,
		client::{Api, ReqwestApi},
		config::ApiConfig,
		retry::RetryPolicy,
	};

	/// Builds a configuration pointing at a local mock server (plain HTTP, short timeout).
	pub fn test_api_config(host: &str, port: u16) -> ApiConfig {
		ApiConfig::new()
			.with_server(host)
			.with_port(port)
			.with_ssl(false)
			.with_request_timeout(std::time::Duration::from_secs(5))
	}

	/// Constructs a reqwest-backed [`Api`] with client-credentials auth and millisecond-scale
	/// retry delays so backoff assertions stay fast.
	pub fn build_test_api(config: ApiConfig, client_id: &str, client_secret: &str) -> ReqwestApi {
		Api::new(config, Credentials::client_credentials(client_id, client_secret))
			.expect("Failed to build reqwest API client for tests.")
			.with_retry_policy(
				RetryPolicy::new()
					.with_connection_base_delay(std::time::Duration::from_millis(5))
					.with_rate_limit_base_delay(std::time::Duration::from_millis(5)),
			)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;
