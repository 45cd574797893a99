//! Credential models and the grant strategies that produce bearer tokens on demand.

pub mod assertion;
pub mod client_credentials;
pub mod password;

pub use assertion::*;
pub use client_credentials::*;
pub use password::*;

// self
use crate::{
	_prelude::*,
	auth::token::{TokenRecord, TokenSecret},
	http::ApiTransport,
	oauth::TransportErrorMapper,
};

/// Default OAuth2 scopes requested by every grant.
pub const DEFAULT_SCOPE: &[&str] = &["control", "view"];

/// Boxed future returned by [`TokenGrant::fetch_token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenRecord>> + 'a + Send>>;

/// Strategy that produces a valid bearer token on demand.
///
/// Implementations own their credential material and the transport handle factory; the
/// request pipeline only ever calls [`fetch_token`](TokenGrant::fetch_token) when the
/// token slot is empty or holds an expired record.
pub trait TokenGrant: Send + Sync {
	/// Performs the grant-specific token exchange.
	///
	/// Fails with [`Error::Authentication`](crate::error::Error::Authentication) when the
	/// exchange is rejected and with a connection-class error when the transport fails,
	/// which keeps exchange failures eligible for the pipeline's backoff retries.
	fn fetch_token(&self) -> TokenFuture<'_>;
}

/// Immutable credential material for one client instance.
#[derive(Clone)]
pub enum Credentials {
	/// Confidential client exchanging its id/secret via the `client_credentials` grant.
	ClientCredentials {
		/// OAuth2 client identifier.
		client_id: String,
		/// OAuth2 client secret.
		client_secret: TokenSecret,
	},
	/// Legacy resource-owner password grant carrying end-user credentials.
	Password {
		/// OAuth2 client identifier.
		client_id: String,
		/// OAuth2 client secret.
		client_secret: TokenSecret,
		/// End-user login name.
		username: String,
		/// End-user password.
		password: TokenSecret,
	},
	/// Service account proving possession of a gateway registration via a signed JWT.
	ServiceAssertion {
		/// Gateway registration key embedded in the assertion claims.
		registration_key: String,
		/// RSA private key in PEM form used to sign the assertion.
		private_key_pem: TokenSecret,
	},
}
impl Credentials {
	/// Creates client-credentials material.
	pub fn client_credentials(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		Self::ClientCredentials {
			client_id: client_id.into(),
			client_secret: TokenSecret::new(client_secret),
		}
	}

	/// Creates legacy resource-owner password material.
	pub fn password(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		Self::Password {
			client_id: client_id.into(),
			client_secret: TokenSecret::new(client_secret),
			username: username.into(),
			password: TokenSecret::new(password),
		}
	}

	/// Creates service-account material from a registration key and an RSA private key.
	pub fn service_assertion(
		registration_key: impl Into<String>,
		private_key_pem: impl Into<String>,
	) -> Self {
		Self::ServiceAssertion {
			registration_key: registration_key.into(),
			private_key_pem: TokenSecret::new(private_key_pem),
		}
	}

	/// Builds the grant strategy matching this credential material.
	pub(crate) fn into_grant<C, M>(
		self,
		token_url: &Url,
		transport: Arc<C>,
		error_mapper: Arc<M>,
	) -> Result<Arc<dyn TokenGrant>>
	where
		C: ?Sized + ApiTransport,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		match self {
			Self::ClientCredentials { client_id, client_secret } =>
				Ok(Arc::new(ClientCredentialsGrant::<C, M>::new(
					token_url,
					&client_id,
					client_secret.expose(),
					transport,
					error_mapper,
				)?)),
			Self::Password { client_id, client_secret, username, password } =>
				Ok(Arc::new(PasswordGrant::<C, M>::new(
					token_url,
					&client_id,
					client_secret.expose(),
					username,
					password,
					transport,
					error_mapper,
				)?)),
			Self::ServiceAssertion { registration_key, private_key_pem } =>
				Ok(Arc::new(AssertionGrant::<C, M>::new(
					token_url.clone(),
					registration_key,
					private_key_pem.expose(),
					transport,
					error_mapper,
				)?)),
		}
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::ClientCredentials { client_id, .. } => f
				.debug_struct("ClientCredentials")
				.field("client_id", client_id)
				.field("client_secret", &"<redacted>")
				.finish(),
			Self::Password { client_id, username, .. } => f
				.debug_struct("Password")
				.field("client_id", client_id)
				.field("username", username)
				.field("client_secret", &"<redacted>")
				.field("password", &"<redacted>")
				.finish(),
			Self::ServiceAssertion { registration_key, .. } => f
				.debug_struct("ServiceAssertion")
				.field("registration_key", registration_key)
				.field("private_key_pem", &"<redacted>")
				.finish(),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn debug_output_redacts_secret_material() {
		let rendered = format!(
			"{:?}",
			Credentials::password("client", "s3cret", "john", "hunter2"),
		);

		assert!(rendered.contains("client"));
		assert!(rendered.contains("john"));
		assert!(!rendered.contains("s3cret"));
		assert!(!rendered.contains("hunter2"));
	}
}
