//! Outputs: controllable appliance channels (lights or outlets) with on/off/dim
//! capabilities.

// self
use crate::{
	_prelude::*,
	base::{Location, location_body},
	client::{Api, ApiResponse},
	error::ConfigError,
	http::ApiTransport,
	oauth::TransportErrorMapper,
};

/// A controllable appliance channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Output {
	/// Output identifier.
	pub id: u32,
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Output type (`LIGHT` or `OUTLET`).
	#[serde(default, rename = "type")]
	pub kind: Option<String>,
	/// Capabilities announced for this output (e.g. `ON_OFF`, `RANGE`).
	#[serde(default)]
	pub capabilities: Vec<String>,
	/// Physical placement metadata.
	#[serde(default)]
	pub location: Option<Location>,
	/// Current state, when reported.
	#[serde(default)]
	pub status: Option<OutputStatus>,
	/// Unix timestamp of the last state change.
	#[serde(default)]
	pub last_state_change: Option<f64>,
}

/// Current state of an output.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputStatus {
	/// Whether the output is on.
	#[serde(default)]
	pub on: bool,
	/// Whether the output is locked against local control.
	#[serde(default)]
	pub locked: bool,
	/// Dim value (0-100), when the output supports `RANGE`.
	#[serde(default)]
	pub value: Option<u8>,
	/// Whether a manual override is active.
	#[serde(default)]
	pub manual_override: bool,
}

/// Accessor for `/base/installations/{id}/outputs`.
#[derive(Clone, Copy, Debug)]
pub struct Outputs<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	api: &'a Api<C, M>,
}
impl<'a, C, M> Outputs<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates the accessor for the provided client.
	pub fn new(api: &'a Api<C, M>) -> Self {
		Self { api }
	}

	/// Lists every output of an installation.
	pub async fn all(&self, installation_id: u32) -> Result<Vec<Output>> {
		self.api.get_json(&collection_path(installation_id), None).await
	}

	/// Lists outputs matching a JSON filter.
	pub async fn by_filter(&self, installation_id: u32, filter: &Value) -> Result<Vec<Output>> {
		let filter = serde_json::to_string(filter).map_err(ConfigError::Serialize)?;

		self.api
			.get_json(&collection_path(installation_id), Some(&[("filter", filter)]))
			.await
	}

	/// Fetches one output.
	pub async fn by_id(&self, installation_id: u32, output_id: u32) -> Result<Output> {
		self.api.get_json(&resource_path(installation_id, output_id), None).await
	}

	/// Lists outputs of one type (`LIGHT`, `OUTLET`, ...); the type is upper-cased.
	pub async fn by_type(&self, installation_id: u32, output_type: &str) -> Result<Vec<Output>> {
		self.by_filter(installation_id, &serde_json::json!({ "type": output_type.to_uppercase() }))
			.await
	}

	/// Lists outputs tagged with one usage; the usage is upper-cased.
	pub async fn by_usage(&self, installation_id: u32, usage: &str) -> Result<Vec<Output>> {
		self.by_filter(installation_id, &serde_json::json!({ "usage": usage.to_uppercase() }))
			.await
	}

	/// Lists outputs of type `LIGHT`.
	pub async fn lights(&self, installation_id: u32) -> Result<Vec<Output>> {
		self.by_type(installation_id, "LIGHT").await
	}

	/// Lists outputs of type `OUTLET`.
	pub async fn outlets(&self, installation_id: u32) -> Result<Vec<Output>> {
		self.by_type(installation_id, "OUTLET").await
	}

	/// Toggles one output.
	pub async fn toggle(&self, installation_id: u32, output_id: u32) -> Result<ApiResponse> {
		self.api.post(&format!("{}/toggle", resource_path(installation_id, output_id)), None).await
	}

	/// Turns one output on, optionally dimmed (defaults to full brightness).
	pub async fn turn_on(
		&self,
		installation_id: u32,
		output_id: u32,
		value: Option<u8>,
	) -> Result<ApiResponse> {
		let body = serde_json::json!({ "value": value.unwrap_or(100) });

		self.api
			.post(&format!("{}/turn_on", resource_path(installation_id, output_id)), Some(&body))
			.await
	}

	/// Turns one output off, or every output when no id is given.
	pub async fn turn_off(
		&self,
		installation_id: u32,
		output_id: Option<u32>,
	) -> Result<ApiResponse> {
		let path = match output_id {
			Some(output_id) => format!("{}/turn_off", resource_path(installation_id, output_id)),
			None => format!("{}/turn_off", collection_path(installation_id)),
		};

		self.api.post(&path, None).await
	}

	/// Updates the floor placement of one output.
	pub async fn location(
		&self,
		installation_id: u32,
		output_id: u32,
		floor_id: Option<u32>,
		floor_coordinates_x: Option<i64>,
		floor_coordinates_y: Option<i64>,
	) -> Result<ApiResponse> {
		let body = location_body(floor_id, floor_coordinates_x, floor_coordinates_y);

		self.api
			.post(&format!("{}/location", resource_path(installation_id, output_id)), Some(&body))
			.await
	}
}

fn collection_path(installation_id: u32) -> String {
	format!("/base/installations/{installation_id}/outputs")
}

fn resource_path(installation_id: u32, output_id: u32) -> String {
	format!("/base/installations/{installation_id}/outputs/{output_id}")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn outputs_deserialize_from_api_payloads() {
		let output: Output = serde_json::from_value(serde_json::json!({
			"name": "Dinning Table",
			"type": "OUTLET",
			"capabilities": ["ON_OFF", "RANGE"],
			"location": {
				"floor_coordinates": { "x": 59, "y": 55 },
				"installation_id": 21,
				"gateway_id": 408,
				"floor_id": null,
				"room_id": null,
			},
			"metadata": null,
			"status": { "on": false, "locked": false, "value": 100, "manual_override": false },
			"last_state_change": 1634799514.671482,
			"id": 70,
			"_version": 1.0,
		}))
		.expect("Output payload should deserialize.");

		assert_eq!(output.id, 70);
		assert_eq!(output.kind.as_deref(), Some("OUTLET"));
		assert_eq!(output.status.and_then(|status| status.value), Some(100));
	}
}
