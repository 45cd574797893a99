//! Installation accessor plus the per-installation resource families.

pub mod groupactions;
pub mod inputs;
pub mod lights;
pub mod outputs;
pub mod sensors;
pub mod shutters;

pub use groupactions::*;
pub use inputs::*;
pub use lights::*;
pub use outputs::*;
pub use sensors::*;
pub use shutters::*;

// self
use crate::{_prelude::*, client::Api, http::ApiTransport, oauth::TransportErrorMapper};

/// A customer site/building, the top-level scoping entity for all resources.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Installation {
	/// Installation identifier.
	pub id: u32,
	/// Display name.
	pub name: String,
	/// Free-form description.
	#[serde(default)]
	pub description: Option<String>,
	/// Gateway software version.
	#[serde(default)]
	pub version: Option<String>,
	/// Gateway model (`openmotics` or `overkiz`).
	#[serde(default)]
	pub gateway_model: Option<String>,
	/// Platform identifier (e.g. `CLASSIC`).
	#[serde(default)]
	pub platform: Option<String>,
	/// Role of the authenticated user within this installation.
	#[serde(default)]
	pub user_role: Option<UserRole>,
	/// Registration key of the gateway.
	#[serde(default)]
	pub registration_key: Option<String>,
	/// Network details reported by the gateway.
	#[serde(default)]
	pub network: Option<Network>,
	/// Per-installation flag metadata.
	#[serde(default)]
	pub flags: Option<Value>,
	/// Feature availability/usage map.
	#[serde(default)]
	pub features: FeatureMap,
	/// Capabilities announced by the gateway firmware.
	#[serde(default)]
	pub gateway_features: Vec<String>,
}

/// Role of the authenticated user within an installation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
	/// Role name (`ADMIN`, `NORMAL`, `APPLICATION`, or `SUPER`).
	#[serde(default)]
	pub role: Option<String>,
	/// User identifier the role applies to.
	#[serde(default)]
	pub user_id: Option<u32>,
}

/// Network details reported by the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
	/// LAN address of the gateway.
	#[serde(default)]
	pub local_ip_address: Option<String>,
}

/// Per-installation feature metadata keyed by feature name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureMap(HashMap<String, Feature>);
impl FeatureMap {
	/// Returns the raw entry for a feature key.
	pub fn get(&self, feature: &str) -> Option<&Feature> {
		self.0.get(feature)
	}

	/// Returns `true` only when the feature is both available and actively used.
	///
	/// A missing key degrades to `false` rather than erroring; gateways simply omit
	/// features they know nothing about.
	pub fn is_used(&self, feature: &str) -> bool {
		self.0.get(feature).map(|entry| entry.available && entry.used).unwrap_or(false)
	}
}
impl FromIterator<(String, Feature)> for FeatureMap {
	fn from_iter<I: IntoIterator<Item = (String, Feature)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

/// Availability and usage flags for one feature.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
	/// Whether the gateway supports the feature.
	#[serde(default)]
	pub available: bool,
	/// Whether the installation actively uses the feature.
	#[serde(default)]
	pub used: bool,
	/// Optional feature-specific metadata.
	#[serde(default)]
	pub metadata: Option<Value>,
}

/// Merged status of all connected devices, keyed by resource family.
///
/// `outputs` and `shutters` stay `None` when the installation's feature flags mark the
/// family as unavailable or unused; lights, group-actions, and sensors are always
/// fetched.
#[derive(Clone, Debug, Default, Serialize)]
pub struct InstallationStatus {
	/// Outputs, when the `outputs` feature is available and used.
	pub outputs: Option<Vec<Output>>,
	/// Lights; always fetched.
	pub lights: Vec<Light>,
	/// Shutters, when the `shutters` feature is available and used.
	pub shutters: Option<Vec<Shutter>>,
	/// Group-actions; always fetched.
	pub groupactions: Vec<GroupAction>,
	/// Sensors; always fetched.
	pub sensors: Vec<Sensor>,
}

/// Accessor for `/base/installations`.
#[derive(Clone, Copy, Debug)]
pub struct Installations<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	api: &'a Api<C, M>,
}
impl<'a, C, M> Installations<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates the accessor for the provided client.
	pub fn new(api: &'a Api<C, M>) -> Self {
		Self { api }
	}

	/// Returns the outputs accessor.
	pub fn outputs(&self) -> Outputs<'a, C, M> {
		Outputs::new(self.api)
	}

	/// Returns the lights accessor.
	pub fn lights(&self) -> Lights<'a, C, M> {
		Lights::new(self.api)
	}

	/// Returns the shutters accessor.
	pub fn shutters(&self) -> Shutters<'a, C, M> {
		Shutters::new(self.api)
	}

	/// Returns the sensors accessor.
	pub fn sensors(&self) -> Sensors<'a, C, M> {
		Sensors::new(self.api)
	}

	/// Returns the inputs accessor.
	pub fn inputs(&self) -> Inputs<'a, C, M> {
		Inputs::new(self.api)
	}

	/// Returns the group-actions accessor.
	pub fn group_actions(&self) -> GroupActions<'a, C, M> {
		GroupActions::new(self.api)
	}

	/// Lists all installations the authenticated principal can reach.
	pub async fn all(&self, filter: Option<&str>) -> Result<Vec<Installation>> {
		let path = "/base/installations";

		match filter {
			Some(filter) =>
				self.api.get_json(path, Some(&[("filter", filter.to_owned())])).await,
			None => self.api.get_json(path, None).await,
		}
	}

	/// Lists gateways awaiting registration.
	pub async fn discovery(&self) -> Result<Value> {
		self.api.get_json("/base/discovery", None).await
	}

	/// Fetches one installation, including its feature map.
	pub async fn by_id(&self, installation_id: u32) -> Result<Installation> {
		self.api.get_json(&format!("/base/installations/{installation_id}"), None).await
	}

	/// Returns the status of all connected devices in one call.
	///
	/// Outputs and shutters are only fetched when the installation's feature flags mark
	/// them available-and-used; group-actions, sensors, and lights are fetched
	/// regardless.
	pub async fn status_by_id(&self, installation_id: u32) -> Result<InstallationStatus> {
		let installation = self.by_id(installation_id).await?;
		let features = &installation.features;
		let outputs = if features.is_used("outputs") {
			Some(self.outputs().all(installation_id).await?)
		} else {
			None
		};
		let shutters = if features.is_used("shutters") {
			Some(self.shutters().all(installation_id, None).await?)
		} else {
			None
		};
		let groupactions = self.group_actions().all(installation_id, None).await?;
		let sensors = self.sensors().all(installation_id, None).await?;
		let lights = self.lights().all(installation_id).await?;

		Ok(InstallationStatus { outputs, lights, shutters, groupactions, sensors })
	}
}
