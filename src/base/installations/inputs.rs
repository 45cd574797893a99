//! Inputs: physical switches and push-buttons wired to the gateway.

// self
use crate::{
	_prelude::*,
	base::Location,
	client::Api,
	http::ApiTransport,
	oauth::TransportErrorMapper,
};

/// A physical input channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Input {
	/// Input identifier.
	pub id: u32,
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Physical placement metadata.
	#[serde(default)]
	pub location: Option<Location>,
	/// Current state, when reported.
	#[serde(default)]
	pub status: Option<Value>,
}

/// Accessor for `/base/installations/{id}/inputs`.
#[derive(Clone, Copy, Debug)]
pub struct Inputs<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	api: &'a Api<C, M>,
}
impl<'a, C, M> Inputs<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates the accessor for the provided client.
	pub fn new(api: &'a Api<C, M>) -> Self {
		Self { api }
	}

	/// Lists every input of an installation.
	pub async fn all(&self, installation_id: u32) -> Result<Vec<Input>> {
		self.api.get_json(&format!("/base/installations/{installation_id}/inputs"), None).await
	}

	/// Fetches one input.
	pub async fn by_id(&self, installation_id: u32, input_id: u32) -> Result<Input> {
		self.api
			.get_json(&format!("/base/installations/{installation_id}/inputs/{input_id}"), None)
			.await
	}
}
