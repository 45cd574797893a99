//! Sensors and their historical measurement series.

// self
use crate::{
	_prelude::*,
	base::Location,
	client::Api,
	error::ConfigError,
	http::ApiTransport,
	oauth::TransportErrorMapper,
};

/// A measurement source attached to an installation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sensor {
	/// Sensor identifier.
	pub id: u32,
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Measured quantity (e.g. `temperature`, `humidity`).
	#[serde(default)]
	pub physical_quantity: Option<String>,
	/// Physical placement metadata.
	#[serde(default)]
	pub location: Option<Location>,
	/// Current reading, when reported.
	#[serde(default)]
	pub status: Option<Value>,
}

/// One historical series entry: a timestamp, identifying tags, and measured values.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SensorHistory {
	/// Sample timestamp in the requested time format.
	#[serde(default)]
	pub time: Option<Value>,
	/// Identifying tags (sensor id/name, gateway id).
	#[serde(default)]
	pub tags: Option<Value>,
	/// Measured values keyed by quantity.
	#[serde(default)]
	pub values: Option<Value>,
}

/// Query parameters for [`Sensors::historical`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoricalQuery {
	/// Series start, when bounded.
	pub start: Option<String>,
	/// Series end, when bounded.
	pub end: Option<String>,
	/// Sample resolution (defaults to `5m`).
	pub resolution: String,
	/// Aggregation function per bucket (defaults to `last`).
	pub group_function: String,
	/// Restrict sampling to the installation's active hours.
	pub use_active_hours: bool,
	/// Timestamp format of the returned samples (defaults to `iso`).
	pub time_format: String,
}
impl HistoricalQuery {
	/// Creates the default query (5-minute resolution, `last` aggregation, ISO times).
	pub fn new() -> Self {
		Self {
			start: None,
			end: None,
			resolution: "5m".into(),
			group_function: "last".into(),
			use_active_hours: false,
			time_format: "iso".into(),
		}
	}

	/// Bounds the series start.
	pub fn with_start(mut self, start: impl Into<String>) -> Self {
		self.start = Some(start.into());

		self
	}

	/// Bounds the series end.
	pub fn with_end(mut self, end: impl Into<String>) -> Self {
		self.end = Some(end.into());

		self
	}

	/// Overrides the sample resolution.
	pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
		self.resolution = resolution.into();

		self
	}

	/// Overrides the aggregation function.
	pub fn with_group_function(mut self, group_function: impl Into<String>) -> Self {
		self.group_function = group_function.into();

		self
	}

	/// Restricts sampling to active hours.
	pub fn with_use_active_hours(mut self, use_active_hours: bool) -> Self {
		self.use_active_hours = use_active_hours;

		self
	}

	/// Overrides the timestamp format.
	pub fn with_time_format(mut self, time_format: impl Into<String>) -> Self {
		self.time_format = time_format.into();

		self
	}

	fn to_params(&self) -> Vec<(&'static str, String)> {
		let mut params = Vec::with_capacity(6);

		if let Some(start) = &self.start {
			params.push(("start", start.clone()));
		}
		if let Some(end) = &self.end {
			params.push(("end", end.clone()));
		}

		params.push(("resolution", self.resolution.clone()));
		params.push(("group_function", self.group_function.clone()));
		params.push(("use_active_hours", self.use_active_hours.to_string()));
		params.push(("time_format", self.time_format.clone()));

		params
	}
}
impl Default for HistoricalQuery {
	fn default() -> Self {
		Self::new()
	}
}

/// Accessor for `/base/installations/{id}/sensors`.
#[derive(Clone, Copy, Debug)]
pub struct Sensors<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	api: &'a Api<C, M>,
}
impl<'a, C, M> Sensors<'a, C, M>
where
	C: ?Sized + ApiTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates the accessor for the provided client.
	pub fn new(api: &'a Api<C, M>) -> Self {
		Self { api }
	}

	/// Lists the sensors of an installation, optionally narrowed by a JSON filter.
	pub async fn all(&self, installation_id: u32, filter: Option<&Value>) -> Result<Vec<Sensor>> {
		let path = collection_path(installation_id);

		match filter {
			Some(filter) => {
				let filter = serde_json::to_string(filter).map_err(ConfigError::Serialize)?;

				self.api.get_json(&path, Some(&[("filter", filter)])).await
			},
			None => self.api.get_json(&path, None).await,
		}
	}

	/// Fetches one sensor.
	pub async fn by_id(&self, installation_id: u32, sensor_id: u32) -> Result<Sensor> {
		self.api.get_json(&resource_path(installation_id, sensor_id), None).await
	}

	/// Fetches the historical measurement series of one sensor.
	pub async fn historical(
		&self,
		installation_id: u32,
		sensor_id: u32,
		query: HistoricalQuery,
	) -> Result<SensorHistory> {
		let params = query.to_params();

		self.api
			.get_json(
				&format!("{}/historical", resource_path(installation_id, sensor_id)),
				Some(params.as_slice()),
			)
			.await
	}
}

fn collection_path(installation_id: u32) -> String {
	format!("/base/installations/{installation_id}/sensors")
}

fn resource_path(installation_id: u32, sensor_id: u32) -> String {
	format!("/base/installations/{installation_id}/sensors/{sensor_id}")
}
