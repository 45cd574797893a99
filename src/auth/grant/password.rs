//! Legacy resource-owner password grant.

// self
use crate::{
	_prelude::*,
	auth::{
		grant::{DEFAULT_SCOPE, TokenFuture, TokenGrant},
		token::{TokenRecord, TokenSecret},
	},
	http::ApiTransport,
	oauth::{TokenEndpointFacade, TransportErrorMapper},
};

/// Exchanges client credentials plus end-user username/password for a token.
///
/// Kept for installations that predate the backend-application registration flow; new
/// integrations should prefer [`ClientCredentialsGrant`](super::ClientCredentialsGrant).
pub struct PasswordGrant<C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	facade: TokenEndpointFacade<C, M>,
	username: String,
	password: TokenSecret,
	scopes: Vec<String>,
}
impl<C, M> PasswordGrant<C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates the grant for the provided token endpoint, client, and end-user credentials.
	pub fn new(
		token_url: &Url,
		client_id: &str,
		client_secret: &str,
		username: impl Into<String>,
		password: impl Into<TokenSecret>,
		transport: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let facade = TokenEndpointFacade::new(
			token_url,
			client_id,
			Some(client_secret),
			transport,
			error_mapper,
		)?;

		Ok(Self {
			facade,
			username: username.into(),
			password: password.into(),
			scopes: DEFAULT_SCOPE.iter().map(|scope| (*scope).to_owned()).collect(),
		})
	}

	/// Overrides the requested scopes (defaults to `control view`).
	pub fn with_scopes(mut self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	async fn exchange(&self) -> Result<TokenRecord> {
		let scopes = self.scopes.iter().map(String::as_str).collect::<Vec<_>>();

		self.facade.exchange_password(&self.username, self.password.expose(), &scopes).await
	}
}
impl<C, M> TokenGrant for PasswordGrant<C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fetch_token(&self) -> TokenFuture<'_> {
		Box::pin(self.exchange())
	}
}
