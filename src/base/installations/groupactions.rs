//! Group-actions: named, stateless action sequences triggerable as a unit.
//!
//! A "scene" is a group-action tagged with usage `SCENE`.

// self
use crate::{
	_prelude::*,
	base::Location,
	client::{Api, ApiResponse},
	error::ConfigError,
	http::ApiTransport,
	oauth::TransportErrorMapper,
};

/// A named action sequence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupAction {
	/// Group-action identifier.
	pub id: u32,
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Flattened `(action type, action number)` sequence.
	#[serde(default)]
	pub actions: Vec<Value>,
	/// Owning installation reference.
	#[serde(default)]
	pub location: Option<Location>,
}

/// Accessor for `/base/installations/{id}/groupactions`.
#[derive(Clone, Copy, Debug)]
pub struct GroupActions<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	api: &'a Api<C, M>,
}
impl<'a, C, M> GroupActions<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates the accessor for the provided client.
	pub fn new(api: &'a Api<C, M>) -> Self {
		Self { api }
	}

	/// Lists the group-actions of an installation, optionally narrowed by a JSON filter.
	pub async fn all(
		&self,
		installation_id: u32,
		filter: Option<&Value>,
	) -> Result<Vec<GroupAction>> {
		let path = collection_path(installation_id);

		match filter {
			Some(filter) => {
				let filter = serde_json::to_string(filter).map_err(ConfigError::Serialize)?;

				self.api.get_json(&path, Some(&[("filter", filter)])).await
			},
			None => self.api.get_json(&path, None).await,
		}
	}

	/// Fetches one group-action.
	pub async fn by_id(&self, installation_id: u32, groupaction_id: u32) -> Result<GroupAction> {
		self.api.get_json(&resource_path(installation_id, groupaction_id), None).await
	}

	/// Triggers one group-action.
	pub async fn trigger(
		&self,
		installation_id: u32,
		groupaction_id: u32,
	) -> Result<ApiResponse> {
		self.api
			.post(&format!("{}/trigger", resource_path(installation_id, groupaction_id)), None)
			.await
	}

	/// Lists group-actions tagged with one usage; the usage is upper-cased.
	pub async fn by_usage(&self, installation_id: u32, usage: &str) -> Result<Vec<GroupAction>> {
		self.api
			.get_json(
				&collection_path(installation_id),
				Some(&[("usage", usage.to_uppercase())]),
			)
			.await
	}

	/// Lists scenes, i.e. group-actions with usage `SCENE`.
	pub async fn scenes(&self, installation_id: u32) -> Result<Vec<GroupAction>> {
		self.by_usage(installation_id, "SCENE").await
	}
}

fn collection_path(installation_id: u32) -> String {
	format!("/base/installations/{installation_id}/groupactions")
}

fn resource_path(installation_id: u32, groupaction_id: u32) -> String {
	format!("/base/installations/{installation_id}/groupactions/{groupaction_id}")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn group_actions_deserialize_from_api_payloads() {
		let groupaction: GroupAction = serde_json::from_value(serde_json::json!({
			"_version": 1.0,
			"actions": [2, 17, 2, 18],
			"id": 4,
			"location": { "installation_id": 21 },
			"name": "Movie night",
		}))
		.expect("Group-action payload should deserialize.");

		assert_eq!(groupaction.id, 4);
		assert_eq!(groupaction.name.as_deref(), Some("Movie night"));
		assert_eq!(groupaction.actions.len(), 4);
		assert_eq!(
			groupaction.location.and_then(|location| location.installation_id),
			Some(21),
		);
	}
}
