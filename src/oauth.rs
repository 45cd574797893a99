//! Internal facade over the `oauth2` crate for token endpoint exchanges.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError,
	RequestTokenError, ResourceOwnerPassword, ResourceOwnerUsername, Scope, TokenResponse,
	TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	error::{ApiError, ConfigError, ConnectionError},
	http::{ApiTransport, ResponseMetadata, ResponseMetadataSlot},
};

type ConfiguredTokenClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeTokenResponse = oauth2::basic::BasicTokenResponse;

/// Maps HTTP transport failures into client [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a client error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestErrorMapper {
	fn map_transport_error(
		&self,
		_meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => ConnectionError::Io(inner).into(),
			HttpClientError::Other(message) =>
				ConnectionError::Network { source: message.into() }.into(),
			_ => ConnectionError::Network { source: "unknown transport failure".into() }.into(),
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return ConnectionError::Timeout.into();
	}

	ConnectionError::network(err).into()
}

/// Token-endpoint facade shared by the client-credentials and password grants.
///
/// Owns a configured `oauth2` client (token endpoint only, `client_secret_post` auth as
/// the OpenMotics cloud requires) plus the transport handle factory and error mapper.
pub(crate) struct TokenEndpointFacade<C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredTokenClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> TokenEndpointFacade<C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(
		token_url: &Url,
		client_id: &str,
		client_secret: Option<&str>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let token_url = TokenUrl::new(token_url.to_string())
			.map_err(|source| ConfigError::InvalidUrl { source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		if let Some(secret) = client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.to_owned()));
		}

		Ok(Self {
			oauth_client,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
		})
	}

	pub(crate) async fn exchange_client_credentials(&self, scopes: &[&str]) -> Result<TokenRecord> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let mut request = self.oauth_client.exchange_client_credentials();

		for scope in scopes {
			request = request.add_scope(Scope::new((*scope).to_owned()));
		}

		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;

		map_standard_token_response(response)
	}

	pub(crate) async fn exchange_password(
		&self,
		username: &str,
		password: &str,
		scopes: &[&str],
	) -> Result<TokenRecord> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let owner_username = ResourceOwnerUsername::new(username.to_owned());
		let owner_password = ResourceOwnerPassword::new(password.to_owned());
		let mut request = self.oauth_client.exchange_password(&owner_username, &owner_password);

		for scope in scopes {
			request = request.add_scope(Scope::new((*scope).to_owned()));
		}

		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;

		map_standard_token_response(response)
	}
}

fn map_standard_token_response(response: FacadeTokenResponse) -> Result<TokenRecord> {
	let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::InvalidExpiresIn)?;

	if expires_in <= 0 {
		return Err(ConfigError::InvalidExpiresIn.into());
	}

	let mut builder = TokenRecord::builder()
		.access_token(response.access_token().secret().to_owned())
		.issued_at(OffsetDateTime::now_utc())
		.expires_in(Duration::seconds(expires_in));

	if let Some(refresh) = response.refresh_token() {
		builder = builder.refresh_token(refresh.secret().to_owned());
	}

	builder.build().map_err(|err| ConfigError::from(err).into())
}

fn map_request_error<E, M>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(response, meta_ref),
		RequestTokenError::Request(error) => mapper.map_transport_error(meta_ref, error),
		// Throttled token endpoints rarely bother with a parseable OAuth error body.
		RequestTokenError::Parse(error, _body) => match meta_status(meta_ref) {
			Some(429) => Error::RateLimit {
				retry_after: meta_ref.and_then(|value| value.retry_after),
			},
			Some(status) =>
				ApiError::with_message(status, "Token endpoint returned a malformed response")
					.into(),
			None => ConfigError::Decode(error).into(),
		},
		RequestTokenError::Other(message) =>
			ConnectionError::Network { source: message.into() }.into(),
	}
}

fn map_server_response_error(
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	if meta_status(meta) == Some(429) {
		return Error::RateLimit { retry_after: meta.and_then(|value| value.retry_after) };
	}

	let reason = match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_owned(),
	};

	Error::authentication(format!("token endpoint rejected the exchange ({reason})"))
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::http::ReqwestTransport;

	fn facade(
		secret: Option<&str>,
	) -> Result<TokenEndpointFacade<ReqwestTransport, ReqwestErrorMapper>> {
		let token_url = Url::parse("https://cloud.openmotics.com/api/v1/authentication/oauth2/token")
			.expect("Token URL fixture should parse.");

		TokenEndpointFacade::new(
			&token_url,
			"client-id",
			secret,
			Arc::new(ReqwestTransport::default()),
			Arc::new(ReqwestErrorMapper),
		)
	}

	#[test]
	fn builds_facade_with_and_without_secret() {
		assert!(facade(Some("secret")).is_ok());
		assert!(facade(None).is_ok());
	}

	#[test]
	fn rate_limited_exchanges_map_to_rate_limit_errors() {
		let meta =
			ResponseMetadata { status: Some(429), retry_after: Some(Duration::seconds(10)) };
		let response: BasicErrorResponse = serde_json::from_value(serde_json::json!({
			"error": "temporarily_unavailable",
		}))
		.expect("Error response fixture should deserialize.");
		let err = map_server_response_error(response, Some(&meta));

		assert!(matches!(
			err,
			Error::RateLimit { retry_after: Some(delay) } if delay == Duration::seconds(10),
		));
	}

	#[test]
	fn rejected_exchanges_map_to_authentication_errors() {
		let meta = ResponseMetadata { status: Some(400), retry_after: None };
		let response: BasicErrorResponse = serde_json::from_value(serde_json::json!({
			"error": "invalid_client",
			"error_description": "unknown client",
		}))
		.expect("Error response fixture should deserialize.");
		let err = map_server_response_error(response, Some(&meta));

		match err {
			Error::Authentication { reason } => {
				assert!(reason.contains("invalid_client"));
				assert!(reason.contains("unknown client"));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}
