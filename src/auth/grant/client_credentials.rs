//! Client-credentials grant for confidential backend applications.

// self
use crate::{
	_prelude::*,
	auth::{
		grant::{DEFAULT_SCOPE, TokenFuture, TokenGrant},
		token::TokenRecord,
	},
	http::ApiTransport,
	oauth::{TokenEndpointFacade, TransportErrorMapper},
};

/// Exchanges `client_id`/`client_secret` for a token; no user interaction involved.
pub struct ClientCredentialsGrant<C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	facade: TokenEndpointFacade<C, M>,
	scopes: Vec<String>,
}
impl<C, M> ClientCredentialsGrant<C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates the grant for the provided token endpoint and client credentials.
	pub fn new(
		token_url: &Url,
		client_id: &str,
		client_secret: &str,
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

		Ok(Self { facade, scopes: DEFAULT_SCOPE.iter().map(|scope| (*scope).to_owned()).collect() })
	}

	/// Overrides the requested scopes (defaults to `control view`).
	pub fn with_scopes(mut self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	async fn exchange(&self) -> Result<TokenRecord> {
		let scopes = self.scopes.iter().map(String::as_str).collect::<Vec<_>>();

		self.facade.exchange_client_credentials(&scopes).await
	}
}
impl<C, M> TokenGrant for ClientCredentialsGrant<C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fetch_token(&self) -> TokenFuture<'_> {
		Box::pin(self.exchange())
	}
}
