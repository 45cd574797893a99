//! Signed-JWT service-account grant.
//!
//! Gateways registered as service accounts authenticate by signing a short-lived JWT
//! with their RSA private key and exchanging it through the `jwt-bearer` grant. Tokens
//! minted this way must be announced with an `X-Bearer-Token-Type: JWT` header on every
//! API request, which the pipeline derives from the record's [`BearerType::Jwt`] marker.

// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use oauth2::{
	AsyncHttpClient,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{
		grant::{DEFAULT_SCOPE, TokenFuture, TokenGrant},
		token::{BearerType, TokenRecord},
	},
	error::{ApiError, ConfigError},
	http::{ApiTransport, ResponseMetadataSlot, parse_retry_after},
	oauth::TransportErrorMapper,
};

const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_ISSUER: &str = "OM";
const ASSERTION_SUBJECT: &str = "gateway";
const ASSERTION_LIFETIME: Duration = Duration::minutes(5);

#[derive(Serialize)]
struct AssertionClaims<'a> {
	iss: &'a str,
	sub: &'a str,
	aud: &'a str,
	iat: i64,
	exp: i64,
	registration_key: &'a str,
}

#[derive(Deserialize)]
struct AssertionTokenResponse {
	access_token: String,
	expires_in: Option<i64>,
	refresh_token: Option<String>,
}

/// Builds a signed JWT assertion and exchanges it for a service token.
pub struct AssertionGrant<C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	transport: Arc<C>,
	error_mapper: Arc<M>,
	token_url: Url,
	registration_key: String,
	encoding_key: EncodingKey,
	scopes: Vec<String>,
}
impl<C, M> AssertionGrant<C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates the grant from a registration key and an RSA private key in PEM form.
	pub fn new(
		token_url: Url,
		registration_key: impl Into<String>,
		private_key_pem: &str,
		transport: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
			.map_err(|source| ConfigError::InvalidPrivateKey { source })?;

		Ok(Self {
			transport: transport.into(),
			error_mapper: error_mapper.into(),
			token_url,
			registration_key: registration_key.into(),
			encoding_key,
			scopes: DEFAULT_SCOPE.iter().map(|scope| (*scope).to_owned()).collect(),
		})
	}

	/// Overrides the requested scopes (defaults to `control view`).
	pub fn with_scopes(mut self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	fn signed_assertion(&self, now: OffsetDateTime) -> Result<String> {
		let claims = AssertionClaims {
			iss: ASSERTION_ISSUER,
			sub: ASSERTION_SUBJECT,
			aud: self.token_url.as_str(),
			iat: now.unix_timestamp(),
			exp: (now + ASSERTION_LIFETIME).unix_timestamp(),
			registration_key: &self.registration_key,
		};

		jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
			.map_err(|source| ConfigError::InvalidPrivateKey { source }.into())
	}

	async fn exchange(&self) -> Result<TokenRecord> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.transport.with_metadata(meta.clone());
		let assertion = self.signed_assertion(OffsetDateTime::now_utc())?;
		let body = url::form_urlencoded::Serializer::new(String::new())
			.append_pair("grant_type", JWT_BEARER_GRANT_TYPE)
			.append_pair("assertion", &assertion)
			.append_pair("scope", &self.scopes.join(" "))
			.finish();
		let request = Request::builder()
			.method(Method::POST)
			.uri(self.token_url.as_str())
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(ACCEPT, "application/json")
			.body(body.into_bytes())
			.map_err(ConfigError::from)?;
		let response = handle.call(request).await.map_err(|err| {
			let taken = meta.take();

			self.error_mapper.map_transport_error(taken.as_ref(), err)
		})?;
		let status = response.status().as_u16();

		if status == 429 {
			return Err(Error::RateLimit { retry_after: parse_retry_after(response.headers()) });
		}
		if matches!(status, 400 | 401 | 403) {
			return Err(Error::authentication(format!(
				"token endpoint rejected the assertion ({})",
				describe_rejection(response.body()),
			)));
		}
		if !(200..300).contains(&status) {
			return Err(ApiError::from_response(status, true, response.body()).into());
		}

		let mut deserializer = serde_json::Deserializer::from_slice(response.body());
		let parsed: AssertionTokenResponse =
			serde_path_to_error::deserialize(&mut deserializer).map_err(ConfigError::Decode)?;
		let expires_in = parsed.expires_in.ok_or(ConfigError::MissingExpiresIn)?;

		if expires_in <= 0 {
			return Err(ConfigError::InvalidExpiresIn.into());
		}

		let mut builder = TokenRecord::builder()
			.access_token(parsed.access_token)
			.issued_at(OffsetDateTime::now_utc())
			.expires_in(Duration::seconds(expires_in))
			.bearer_type(BearerType::Jwt);

		if let Some(refresh) = parsed.refresh_token {
			builder = builder.refresh_token(refresh);
		}

		builder.build().map_err(|err| ConfigError::from(err).into())
	}
}
impl<C, M> TokenGrant for AssertionGrant<C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fetch_token(&self) -> TokenFuture<'_> {
		Box::pin(self.exchange())
	}
}

fn describe_rejection(body: &[u8]) -> String {
	#[derive(Deserialize)]
	struct Rejection {
		error: Option<String>,
		error_description: Option<String>,
	}

	match serde_json::from_slice::<Rejection>(body) {
		Ok(Rejection { error: Some(error), error_description: Some(description) }) =>
			format!("{error}: {description}"),
		Ok(Rejection { error: Some(error), .. }) => error,
		Ok(Rejection { error_description: Some(description), .. }) => description,
		_ => String::from_utf8_lossy(body).into_owned(),
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::{http::ReqwestTransport, oauth::ReqwestErrorMapper};

	#[test]
	fn rejects_garbage_private_keys() {
		let token_url = Url::parse("https://cloud.openmotics.com/api/v1/authentication/oauth2/token")
			.expect("Token URL fixture should parse.");
		let err = AssertionGrant::<ReqwestTransport, ReqwestErrorMapper>::new(
			token_url,
			"registration-key",
			"not a pem",
			Arc::new(ReqwestTransport::default()),
			Arc::new(ReqwestErrorMapper),
		)
		.map(|_| ())
		.expect_err("Garbage PEM input should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidPrivateKey { .. })));
	}

	#[test]
	fn rejection_bodies_are_summarized() {
		assert_eq!(
			describe_rejection(br#"{"error":"invalid_grant","error_description":"bad signature"}"#),
			"invalid_grant: bad signature",
		);
		assert_eq!(describe_rejection(br#"{"error":"invalid_client"}"#), "invalid_client");
		assert_eq!(describe_rejection(b"plain refusal"), "plain refusal");
	}
}
