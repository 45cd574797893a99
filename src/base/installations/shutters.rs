//! Shutters: paired-motor covering actuators with up/down/stop/position semantics.

// self
use crate::{
	_prelude::*,
	base::Location,
	client::{Api, ApiResponse},
	error::ConfigError,
	http::ApiTransport,
	oauth::TransportErrorMapper,
};

/// A covering actuator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Shutter {
	/// Shutter identifier.
	pub id: u32,
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Capabilities announced for this shutter (e.g. `UP_DOWN`, `POSITION`).
	#[serde(default)]
	pub capabilities: Vec<String>,
	/// Physical placement metadata.
	#[serde(default)]
	pub location: Option<Location>,
	/// Current state, when reported.
	#[serde(default)]
	pub status: Option<Value>,
	/// Unix timestamp of the last state change.
	#[serde(default)]
	pub last_state_change: Option<f64>,
}

/// Accessor for `/base/installations/{id}/shutters`.
#[derive(Clone, Copy, Debug)]
pub struct Shutters<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	api: &'a Api<C, M>,
}
impl<'a, C, M> Shutters<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates the accessor for the provided client.
	pub fn new(api: &'a Api<C, M>) -> Self {
		Self { api }
	}

	/// Lists the shutters of an installation, optionally narrowed by a JSON filter.
	pub async fn all(&self, installation_id: u32, filter: Option<&Value>) -> Result<Vec<Shutter>> {
		let path = collection_path(installation_id);

		match filter {
			Some(filter) => {
				let filter = serde_json::to_string(filter).map_err(ConfigError::Serialize)?;

				self.api.get_json(&path, Some(&[("filter", filter)])).await
			},
			None => self.api.get_json(&path, None).await,
		}
	}

	/// Fetches one shutter.
	pub async fn by_id(&self, installation_id: u32, shutter_id: u32) -> Result<Shutter> {
		self.api.get_json(&resource_path(installation_id, shutter_id), None).await
	}

	/// Starts moving one shutter up.
	pub async fn up(&self, installation_id: u32, shutter_id: u32) -> Result<ApiResponse> {
		self.command(installation_id, shutter_id, "up").await
	}

	/// Starts moving one shutter down.
	pub async fn down(&self, installation_id: u32, shutter_id: u32) -> Result<ApiResponse> {
		self.command(installation_id, shutter_id, "down").await
	}

	/// Stops any ongoing movement.
	pub async fn stop(&self, installation_id: u32, shutter_id: u32) -> Result<ApiResponse> {
		self.command(installation_id, shutter_id, "stop").await
	}

	/// Locks one shutter against local control.
	pub async fn lock(&self, installation_id: u32, shutter_id: u32) -> Result<ApiResponse> {
		self.command(installation_id, shutter_id, "lock").await
	}

	/// Unlocks one shutter.
	pub async fn unlock(&self, installation_id: u32, shutter_id: u32) -> Result<ApiResponse> {
		self.command(installation_id, shutter_id, "unlock").await
	}

	/// Moves one shutter to its configured preset position.
	pub async fn move_to_preset(
		&self,
		installation_id: u32,
		shutter_id: u32,
	) -> Result<ApiResponse> {
		self.command(installation_id, shutter_id, "move").await
	}

	/// Moves one shutter to an absolute position.
	pub async fn change_position(
		&self,
		installation_id: u32,
		shutter_id: u32,
		position: u8,
	) -> Result<ApiResponse> {
		let body = serde_json::json!({ "position": position });

		self.api
			.post(
				&format!("{}/change_position", resource_path(installation_id, shutter_id)),
				Some(&body),
			)
			.await
	}

	/// Moves one shutter by a relative offset.
	pub async fn change_relative_position(
		&self,
		installation_id: u32,
		shutter_id: u32,
		offset: i32,
	) -> Result<ApiResponse> {
		let body = serde_json::json!({ "offset": offset });

		self.api
			.post(
				&format!("{}/change_relative_position", resource_path(installation_id, shutter_id)),
				Some(&body),
			)
			.await
	}

	/// Stores a new preset position for one shutter.
	pub async fn preset(
		&self,
		installation_id: u32,
		shutter_id: u32,
		position: u8,
	) -> Result<ApiResponse> {
		let body = serde_json::json!({ "position": position });

		self.api
			.post(&format!("{}/preset", resource_path(installation_id, shutter_id)), Some(&body))
			.await
	}

	async fn command(
		&self,
		installation_id: u32,
		shutter_id: u32,
		action: &str,
	) -> Result<ApiResponse> {
		self.api
			.post(&format!("{}/{action}", resource_path(installation_id, shutter_id)), None)
			.await
	}
}

fn collection_path(installation_id: u32) -> String {
	format!("/base/installations/{installation_id}/shutters")
}

fn resource_path(installation_id: u32, shutter_id: u32) -> String {
	format!("/base/installations/{installation_id}/shutters/{shutter_id}")
}
