//! Central API client: token management, URL resolution, and the request pipeline.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpResponse,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
	},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{BearerType, Credentials, TokenGrant, TokenRecord, TokenSaver, TokenSlot},
	base::Base,
	config::ApiConfig,
	error::{ApiError, ConfigError},
	http::{ApiTransport, ResponseMetadataSlot, parse_retry_after},
	oauth::TransportErrorMapper,
	obs::{self, CallKind, CallOutcome, CallSpan},
	retry::{RetryPolicy, RetryState},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestTransport, oauth::ReqwestErrorMapper};

/// Request header announcing JWT service tokens to the API.
const BEARER_TOKEN_TYPE_HEADER: &str = "X-Bearer-Token-Type";

#[cfg(feature = "reqwest")]
/// API client specialized for the crate's default reqwest transport stack.
pub type ReqwestApi = Api<ReqwestTransport, ReqwestErrorMapper>;

/// Decoded outcome of one pipeline request.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiResponse {
	/// Explicit empty-result marker produced by HTTP 204.
	///
	/// Kept distinguishable from a decoded `null`/`{}` payload so callers can tell "the
	/// API acknowledged with no content" apart from "the API returned an empty object".
	Empty,
	/// Unwrapped `data` field of a 2xx JSON envelope.
	Json(Value),
	/// Raw body of a 2xx non-JSON response.
	Text(String),
}
impl ApiResponse {
	/// Returns `true` for the 204 empty-result marker.
	pub fn is_empty(&self) -> bool {
		matches!(self, Self::Empty)
	}

	/// Deserializes the JSON payload into `T`.
	///
	/// Empty and text responses fail with
	/// [`ConfigError::UnexpectedBody`](crate::error::ConfigError::UnexpectedBody) instead
	/// of being coerced into a default value.
	pub fn decode<T>(self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		match self {
			Self::Json(value) =>
				serde_path_to_error::deserialize(value).map_err(|e| ConfigError::Decode(e).into()),
			Self::Empty => Err(ConfigError::UnexpectedBody { kind: "empty" }.into()),
			Self::Text(_) => Err(ConfigError::UnexpectedBody { kind: "text" }.into()),
		}
	}
}

/// Main handle for the OpenMotics cloud API.
///
/// The client owns the transport, the grant strategy, and the single active token; every
/// resource accessor borrows it and funnels through [`request`](Api::request). The token
/// slot is the only shared mutable state; construct one client per task and share it by
/// reference rather than cloning tokens around.
pub struct Api<C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Connection configuration the client was built with.
	pub config: ApiConfig,
	transport: Arc<C>,
	error_mapper: Arc<M>,
	grant: Arc<dyn TokenGrant>,
	token: TokenSlot,
	refresh_guard: Arc<AsyncMutex<()>>,
	retry: RetryPolicy,
}
impl<C, M> Api<C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	///
	/// The transport must already apply the configured request timeout and disable
	/// redirect following; [`Api::new`] does both for the default reqwest stack.
	pub fn with_transport(
		config: ApiConfig,
		credentials: Credentials,
		transport: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let transport = transport.into();
		let error_mapper = error_mapper.into();
		let token_url = config.token_url()?;
		let grant = credentials.into_grant(&token_url, transport.clone(), error_mapper.clone())?;

		Ok(Self {
			config,
			transport,
			error_mapper,
			grant,
			token: TokenSlot::new(),
			refresh_guard: Arc::new(AsyncMutex::new(())),
			retry: RetryPolicy::new(),
		})
	}

	/// Overrides the retry policy (defaults to 3 connection / 6 rate-limit attempts).
	pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Replaces the grant strategy, e.g. to request non-default scopes.
	pub fn with_grant(mut self, grant: Arc<dyn TokenGrant>) -> Self {
		self.grant = grant;

		self
	}

	/// Attaches a saver hook invoked whenever the client stores a rotated token.
	///
	/// Call this before the first request; attaching a saver resets the token slot.
	pub fn with_token_saver(mut self, saver: TokenSaver) -> Self {
		self.token = TokenSlot::new().with_saver(saver);

		self
	}

	/// Seeds the token slot with a previously persisted record.
	pub fn with_token(self, record: TokenRecord) -> Self {
		self.token.store(record);

		self
	}

	/// Returns the accessor tree rooted at `/base`.
	pub fn base(&self) -> Base<'_, C, M> {
		Base::new(self)
	}

	/// Returns the authenticated user's information and paid features.
	pub async fn user(&self) -> Result<Value> {
		self.get("/").await?.decode()
	}

	/// Performs an HTTP GET for the provided relative path.
	pub async fn get(&self, path: &str) -> Result<ApiResponse> {
		self.request(Method::GET, path, None, None).await
	}

	/// Performs an HTTP GET with query parameters.
	pub async fn get_with_params(
		&self,
		path: &str,
		params: &[(&str, String)],
	) -> Result<ApiResponse> {
		self.request(Method::GET, path, Some(params), None).await
	}

	/// Performs an HTTP POST with an optional JSON body.
	pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
		self.request(Method::POST, path, None, body).await
	}

	/// Performs an HTTP PUT with an optional JSON body.
	pub async fn put(&self, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
		self.request(Method::PUT, path, None, body).await
	}

	/// Performs an HTTP DELETE for the provided relative path.
	pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
		self.request(Method::DELETE, path, None, None).await
	}

	/// GETs a path and deserializes the unwrapped `data` payload.
	pub(crate) async fn get_json<T>(
		&self,
		path: &str,
		params: Option<&[(&str, String)]>,
	) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.request(Method::GET, path, params, None).await?.decode()
	}

	/// Performs one logical API operation with retries, spans, and outcome metrics.
	pub async fn request(
		&self,
		method: Method,
		path: &str,
		params: Option<&[(&str, String)]>,
		body: Option<&Value>,
	) -> Result<ApiResponse> {
		let span = CallSpan::new(CallKind::Request, path);

		obs::record_call_outcome(CallKind::Request, CallOutcome::Attempt);

		let result = span.instrument(self.request_with_retries(method, path, params, body)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(CallKind::Request, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(CallKind::Request, CallOutcome::Failure),
		}

		result
	}

	async fn request_with_retries(
		&self,
		method: Method,
		path: &str,
		params: Option<&[(&str, String)]>,
		body: Option<&Value>,
	) -> Result<ApiResponse> {
		let mut state = RetryState::new(&self.retry);

		loop {
			match self.request_once(method.clone(), path, params, body).await {
				Ok(response) => return Ok(response),
				Err(error) => match state.next_delay(&error) {
					Some(delay) => tokio::time::sleep(delay).await,
					None => return Err(error),
				},
			}
		}
	}

	async fn request_once(
		&self,
		method: Method,
		path: &str,
		params: Option<&[(&str, String)]>,
		body: Option<&Value>,
	) -> Result<ApiResponse> {
		let mut url = self.config.api_url(path)?;

		if let Some(params) = params
			&& !params.is_empty()
		{
			let mut pairs = url.query_pairs_mut();

			for (key, value) in params {
				pairs.append_pair(key, value);
			}
		}

		let token = self.ensure_token().await?;
		let mut builder = Request::builder()
			.method(method)
			.uri(url.as_str())
			.header(AUTHORIZATION, format!("Bearer {}", token.access_token.expose()))
			.header(ACCEPT, "application/json")
			.header(USER_AGENT, self.config.user_agent.as_str());

		if token.bearer_type == BearerType::Jwt {
			builder = builder.header(BEARER_TOKEN_TYPE_HEADER, "JWT");
		}

		let payload = match body {
			Some(value) => {
				builder = builder.header(CONTENT_TYPE, "application/json");

				serde_json::to_vec(value).map_err(ConfigError::Serialize)?
			},
			None => Vec::new(),
		};
		let request = builder.body(payload).map_err(ConfigError::from)?;
		let meta = ResponseMetadataSlot::default();
		let handle = self.transport.with_metadata(meta.clone());
		let response = handle.call(request).await.map_err(|err| {
			let taken = meta.take();

			self.error_mapper.map_transport_error(taken.as_ref(), err)
		})?;

		classify_response(response)
	}

	/// Returns the active token, fetching a fresh one when the slot is empty or expired.
	///
	/// The async mutex makes the re-fetch a singleflight: concurrent callers wait for the
	/// in-flight exchange instead of stampeding the token endpoint, and exactly one
	/// exchange happens per expiry.
	async fn ensure_token(&self) -> Result<TokenRecord> {
		if let Some(record) = self.token.current()
			&& !record.is_expired()
		{
			return Ok(record);
		}

		let _singleflight = self.refresh_guard.lock().await;

		// Re-check: another caller may have refreshed while we waited on the guard.
		if let Some(record) = self.token.current()
			&& !record.is_expired()
		{
			return Ok(record);
		}

		let span = CallSpan::new(CallKind::TokenExchange, "fetch_token");

		obs::record_call_outcome(CallKind::TokenExchange, CallOutcome::Attempt);

		let result = span.instrument(self.grant.fetch_token()).await;

		match &result {
			Ok(_) => obs::record_call_outcome(CallKind::TokenExchange, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(CallKind::TokenExchange, CallOutcome::Failure),
		}

		let record = result?;

		self.token.store(record.clone());

		Ok(record)
	}
}
#[cfg(feature = "reqwest")]
impl ReqwestApi {
	/// Creates a client backed by a fresh reqwest transport.
	///
	/// The transport applies the configured request timeout and never follows redirects,
	/// matching OAuth 2.0 guidance that token endpoints return results directly.
	pub fn new(config: ApiConfig, credentials: Credentials) -> Result<Self> {
		let client = ReqwestClient::builder()
			.timeout(config.request_timeout)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::from)?;

		Self::with_transport(
			config,
			credentials,
			ReqwestTransport::with_client(client),
			Arc::new(ReqwestErrorMapper),
		)
	}
}
impl<C, M> Debug for Api<C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Api")
			.field("config", &self.config)
			.field("token", &self.token)
			.field("retry", &self.retry)
			.finish()
	}
}

fn classify_response(response: HttpResponse) -> Result<ApiResponse> {
	let status = response.status().as_u16();
	let json_content = response
		.headers()
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.map(|value| value.contains("application/json"))
		.unwrap_or(false);

	if matches!(status, 401 | 403) {
		return Err(Error::authentication("the provided OpenMotics credentials are not valid"));
	}
	if status == 429 {
		return Err(Error::RateLimit { retry_after: parse_retry_after(response.headers()) });
	}
	if status >= 400 {
		return Err(ApiError::from_response(status, json_content, response.body()).into());
	}
	if status == 204 {
		return Ok(ApiResponse::Empty);
	}

	if json_content {
		let mut deserializer = serde_json::Deserializer::from_slice(response.body());
		let envelope: Value =
			serde_path_to_error::deserialize(&mut deserializer).map_err(ConfigError::Decode)?;

		return match envelope {
			Value::Object(mut map) =>
				map.remove("data").map(ApiResponse::Json).ok_or_else(|| ConfigError::MissingData.into()),
			_ => Err(ConfigError::MissingData.into()),
		};
	}

	Ok(ApiResponse::Text(String::from_utf8_lossy(response.body()).into_owned()))
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::{Response, StatusCode, header::HeaderValue};
	// self
	use super::*;
	use crate::error::ConnectionError;

	fn response(status: u16, content_type: Option<&'static str>, body: &[u8]) -> HttpResponse {
		let mut response = Response::new(body.to_vec());

		*response.status_mut() = StatusCode::from_u16(status).expect("Status fixture is valid.");

		if let Some(content_type) = content_type {
			response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
		}

		response
	}

	#[test]
	fn envelopes_are_unwrapped_on_success() {
		let body = br#"{"data":[{"id":1,"name":"Hall"}]}"#;
		let classified = classify_response(response(200, Some("application/json"), body))
			.expect("2xx JSON envelopes should classify successfully.");

		assert_eq!(
			classified,
			ApiResponse::Json(serde_json::json!([{"id": 1, "name": "Hall"}])),
		);
	}

	#[test]
	fn missing_data_field_is_a_decode_failure() {
		let body = br#"{"payload":[]}"#;
		let err = classify_response(response(200, Some("application/json"), body))
			.expect_err("Envelopes without a data field should fail.");

		assert!(matches!(err, Error::Config(ConfigError::MissingData)));
	}

	#[test]
	fn no_content_yields_the_empty_marker() {
		let classified = classify_response(response(204, None, b""))
			.expect("204 responses should classify successfully.");

		assert!(classified.is_empty());
		assert_ne!(classified, ApiResponse::Json(Value::Null));
	}

	#[test]
	fn non_json_success_returns_raw_text() {
		let classified = classify_response(response(200, Some("text/plain"), b"pong"))
			.expect("2xx text responses should classify successfully.");

		assert_eq!(classified, ApiResponse::Text("pong".into()));
	}

	#[test]
	fn auth_statuses_map_to_authentication_errors() {
		for status in [401, 403] {
			let err = classify_response(response(status, None, b""))
				.expect_err("401/403 should classify as authentication failures.");

			assert!(matches!(err, Error::Authentication { .. }));
		}
	}

	#[test]
	fn throttling_maps_to_rate_limit_with_hint() {
		let mut throttled = response(429, None, b"");

		throttled
			.headers_mut()
			.insert(oauth2::http::header::RETRY_AFTER, HeaderValue::from_static("7"));

		let err = classify_response(throttled).expect_err("429 should classify as rate limit.");

		assert!(matches!(
			err,
			Error::RateLimit { retry_after: Some(delay) } if delay == Duration::seconds(7),
		));
	}

	#[test]
	fn other_failures_map_to_api_errors() {
		let body = br#"{"status_code":500,"error":"internal","message":"boom"}"#;
		let err = classify_response(response(500, Some("application/json"), body))
			.expect_err("5xx should classify as API errors.");

		match err {
			Error::Api(api) => {
				assert_eq!(api.status, 500);
				assert_eq!(api.error.as_deref(), Some("internal"));
				assert_eq!(api.message.as_deref(), Some("boom"));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn decode_rejects_empty_and_text_responses() {
		assert!(matches!(
			ApiResponse::Empty.decode::<Value>(),
			Err(Error::Config(ConfigError::UnexpectedBody { kind: "empty" })),
		));
		assert!(matches!(
			ApiResponse::Text("pong".into()).decode::<Value>(),
			Err(Error::Config(ConfigError::UnexpectedBody { kind: "text" })),
		));
	}

	#[test]
	fn transport_errors_stay_retryable() {
		assert!(Error::from(ConnectionError::Timeout).is_retryable());
	}
}
