//! Lights with full capability support (color, temperature).
//!
//! A light can be represented in two ways: some gateways support lights with all their
//! capabilities, while others expose lights as a type of output (see
//! [`Outputs`](super::Outputs)). This accessor covers gateways with full light support.

// self
use crate::{
	_prelude::*,
	base::{Location, location_body},
	client::{Api, ApiResponse},
	error::ConfigError,
	http::ApiTransport,
	oauth::TransportErrorMapper,
};

/// A light with its full capability set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Light {
	/// Light identifier.
	pub id: u32,
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Capabilities announced for this light (e.g. `ON_OFF`, `RANGE`, `FULL_COLOR`).
	#[serde(default)]
	pub capabilities: Vec<String>,
	/// Physical placement metadata.
	#[serde(default)]
	pub location: Option<Location>,
	/// Current state, when reported.
	#[serde(default)]
	pub status: Option<LightStatus>,
	/// Unix timestamp of the last state change.
	#[serde(default)]
	pub last_state_change: Option<f64>,
}

/// Current state of a light.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LightStatus {
	/// Whether the light is on.
	#[serde(default)]
	pub on: bool,
	/// Whether the light is locked against local control.
	#[serde(default)]
	pub locked: bool,
	/// Whether a manual override is active.
	#[serde(default)]
	pub manual_override: bool,
}

/// Turn-on parameters for a light.
///
/// Every field is serialized, absent values as `null`, matching the wire contract; the
/// gateway ignores parameters the light does not support.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LightState {
	/// Brightness (0-100).
	pub value: Option<u8>,
	/// White temperature.
	pub temperature: Option<u16>,
	/// Hue (0-360).
	pub hue: Option<u16>,
	/// Saturation (0-100).
	pub saturation: Option<u8>,
	/// Red channel (0-255).
	pub red: Option<u8>,
	/// Green channel (0-255).
	pub green: Option<u8>,
	/// Blue channel (0-255).
	pub blue: Option<u8>,
}
impl LightState {
	/// Creates a state that only sets brightness.
	pub fn brightness(value: u8) -> Self {
		Self { value: Some(value), ..Self::default() }
	}

	/// Creates a state that sets an RGB color at full brightness.
	pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
		Self {
			value: Some(100),
			red: Some(red),
			green: Some(green),
			blue: Some(blue),
			..Self::default()
		}
	}

	/// Overrides the white temperature.
	pub fn with_temperature(mut self, temperature: u16) -> Self {
		self.temperature = Some(temperature);

		self
	}

	/// Overrides hue and saturation.
	pub fn with_hue_saturation(mut self, hue: u16, saturation: u8) -> Self {
		self.hue = Some(hue);
		self.saturation = Some(saturation);

		self
	}
}

/// Accessor for `/base/installations/{id}/lights`.
#[derive(Clone, Copy, Debug)]
pub struct Lights<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	api: &'a Api<C, M>,
}
impl<'a, C, M> Lights<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates the accessor for the provided client.
	pub fn new(api: &'a Api<C, M>) -> Self {
		Self { api }
	}

	/// Lists every light of an installation.
	pub async fn all(&self, installation_id: u32) -> Result<Vec<Light>> {
		self.api.get_json(&collection_path(installation_id), None).await
	}

	/// Fetches one light.
	pub async fn by_id(&self, installation_id: u32, light_id: u32) -> Result<Light> {
		self.api.get_json(&resource_path(installation_id, light_id), None).await
	}

	/// Turns one light on with the provided state (defaults to full brightness).
	pub async fn turn_on(
		&self,
		installation_id: u32,
		light_id: u32,
		state: Option<LightState>,
	) -> Result<ApiResponse> {
		let state = state.unwrap_or_else(|| LightState::brightness(100));
		let body = serde_json::to_value(state).map_err(ConfigError::Serialize)?;

		self.api
			.post(&format!("{}/turn_on", resource_path(installation_id, light_id)), Some(&body))
			.await
	}

	/// Turns one light off.
	pub async fn turn_off(&self, installation_id: u32, light_id: u32) -> Result<ApiResponse> {
		self.api.post(&format!("{}/turn_off", resource_path(installation_id, light_id)), None).await
	}

	/// Updates the floor placement of one light.
	pub async fn location(
		&self,
		installation_id: u32,
		light_id: u32,
		floor_id: Option<u32>,
		floor_coordinates_x: Option<i64>,
		floor_coordinates_y: Option<i64>,
	) -> Result<ApiResponse> {
		let body = location_body(floor_id, floor_coordinates_x, floor_coordinates_y);

		self.api
			.post(&format!("{}/location", resource_path(installation_id, light_id)), Some(&body))
			.await
	}
}

fn collection_path(installation_id: u32) -> String {
	format!("/base/installations/{installation_id}/lights")
}

fn resource_path(installation_id: u32, light_id: u32) -> String {
	format!("/base/installations/{installation_id}/lights/{light_id}")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn light_state_serializes_absent_fields_as_null() {
		let body = serde_json::to_value(LightState::brightness(50))
			.expect("Light state should serialize.");

		assert_eq!(
			body,
			serde_json::json!({
				"value": 50,
				"temperature": null,
				"hue": null,
				"saturation": null,
				"red": null,
				"green": null,
				"blue": null,
			}),
		);
	}

	#[test]
	fn rgb_state_defaults_to_full_brightness() {
		let state = LightState::rgb(255, 64, 0);

		assert_eq!(state.value, Some(100));
		assert_eq!(state.red, Some(255));
		assert_eq!(state.hue, None);
	}
}
