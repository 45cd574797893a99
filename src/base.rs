//! Resource accessor tree rooted at `/base`.
//!
//! Accessors are lightweight borrows of the [`Api`] client: they only know their URL
//! templates and payload shapes and delegate every call to the request pipeline.

pub mod installations;

pub use installations::*;

// self
use crate::{_prelude::*, client::Api, http::ApiTransport, oauth::TransportErrorMapper};

/// Entry point for the `/base` resource family.
#[derive(Clone, Copy, Debug)]
pub struct Base<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	api: &'a Api<C, M>,
}
impl<'a, C, M> Base<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates the accessor for the provided client.
	pub fn new(api: &'a Api<C, M>) -> Self {
		Self { api }
	}

	/// Returns the installations accessor.
	pub fn installations(&self) -> Installations<'a, C, M> {
		Installations::new(self.api)
	}
}

/// Physical placement metadata shared by several resource families.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
	/// Coordinates on the floor plan, when placed.
	#[serde(default)]
	pub floor_coordinates: Option<FloorCoordinates>,
	/// Owning installation identifier.
	#[serde(default)]
	pub installation_id: Option<u32>,
	/// Gateway the resource is wired to.
	#[serde(default)]
	pub gateway_id: Option<u32>,
	/// Floor identifier, when assigned.
	#[serde(default)]
	pub floor_id: Option<u32>,
	/// Room identifier, when assigned.
	#[serde(default)]
	pub room_id: Option<u32>,
}

/// X/Y position on a floor plan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorCoordinates {
	/// Horizontal coordinate.
	#[serde(default)]
	pub x: Option<i64>,
	/// Vertical coordinate.
	#[serde(default)]
	pub y: Option<i64>,
}

/// Builds the shared `{floor_id, floor_coordinates: {x, y}}` location update body.
pub(crate) fn location_body(floor_id: Option<u32>, x: Option<i64>, y: Option<i64>) -> Value {
	serde_json::json!({
		"floor_id": floor_id,
		"floor_coordinates": { "x": x, "y": y },
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn location_body_always_carries_both_keys() {
		let body = location_body(Some(2), Some(59), None);

		assert_eq!(
			body,
			serde_json::json!({
				"floor_id": 2,
				"floor_coordinates": { "x": 59, "y": null },
			}),
		);
	}

	#[test]
	fn locations_tolerate_null_coordinates() {
		let location: Location = serde_json::from_value(serde_json::json!({
			"floor_coordinates": { "x": null, "y": null },
			"installation_id": 21,
			"gateway_id": 408,
			"floor_id": null,
			"room_id": null,
		}))
		.expect("Location payload with nulls should deserialize.");

		assert_eq!(location.installation_id, Some(21));
		assert_eq!(location.floor_coordinates, Some(FloorCoordinates { x: None, y: None }));
		assert!(location.floor_id.is_none());
	}
}
