mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use common::test_api;
use openmotics_client::base::LightState;

#[tokio::test]
async fn output_turn_on_posts_the_documented_path_and_body() {
	let server = MockServer::start_async().await;
	let api = test_api(&server);
	let _token = common::mock_token_endpoint(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v1/base/installations/21/outputs/70/turn_on")
				.header("content-type", "application/json")
				.json_body(json!({ "value": 50 }));
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":{}}"#);
		})
		.await;
	let _ = api
		.base()
		.installations()
		.outputs()
		.turn_on(21, 70, Some(50))
		.await
		.expect("Turn-on should succeed.");

	mock.assert_async().await;
}

#[tokio::test]
async fn output_turn_off_without_id_targets_the_collection() {
	let server = MockServer::start_async().await;
	let api = test_api(&server);
	let _token = common::mock_token_endpoint(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/base/installations/21/outputs/turn_off");
			then.status(204);
		})
		.await;
	let response = api
		.base()
		.installations()
		.outputs()
		.turn_off(21, None)
		.await
		.expect("Collection-level turn-off should succeed.");

	assert!(response.is_empty());

	mock.assert_async().await;
}

#[tokio::test]
async fn by_type_builds_the_same_filter_as_by_filter() {
	let server = MockServer::start_async().await;
	let api = test_api(&server);
	let _token = common::mock_token_endpoint(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/base/installations/21/outputs")
				.query_param("filter", r#"{"type":"LIGHT"}"#);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":[]}"#);
		})
		.await;
	let outputs = api.base().installations().outputs();
	let _ = outputs.by_type(21, "light").await.expect("by_type should succeed.");
	let _ = outputs
		.by_filter(21, &json!({ "type": "LIGHT" }))
		.await
		.expect("by_filter should succeed.");

	// Both calls hit the mock with identical, upper-cased query parameters.
	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn outlets_compose_by_type_with_the_outlet_filter() {
	let server = MockServer::start_async().await;
	let api = test_api(&server);
	let _token = common::mock_token_endpoint(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/base/installations/21/outputs")
				.query_param("filter", r#"{"type":"OUTLET"}"#);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":[{"id":18,"name":"Dinning Table","type":"OUTLET"}]}"#);
		})
		.await;
	let outlets = api
		.base()
		.installations()
		.outputs()
		.outlets(21)
		.await
		.expect("Outlet listing should succeed.");

	assert_eq!(outlets.len(), 1);
	assert_eq!(outlets[0].kind.as_deref(), Some("OUTLET"));

	mock.assert_async().await;
}

#[tokio::test]
async fn group_action_usage_queries_are_upper_cased() {
	let server = MockServer::start_async().await;
	let api = test_api(&server);
	let _token = common::mock_token_endpoint(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/base/installations/21/groupactions")
				.query_param("usage", "SCENE");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":[{"id":4,"name":"Movie night"}]}"#);
		})
		.await;
	let group_actions = api.base().installations().group_actions();
	let scenes = group_actions.scenes(21).await.expect("Scene listing should succeed.");
	let by_usage =
		group_actions.by_usage(21, "scene").await.expect("Usage listing should succeed.");

	assert_eq!(scenes.len(), 1);
	assert_eq!(by_usage.len(), 1);

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn light_turn_on_defaults_to_full_brightness_with_null_channels() {
	let server = MockServer::start_async().await;
	let api = test_api(&server);
	let _token = common::mock_token_endpoint(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v1/base/installations/5/lights/12/turn_on")
				.json_body(json!({
					"value": 100,
					"temperature": null,
					"hue": null,
					"saturation": null,
					"red": null,
					"green": null,
					"blue": null,
				}));
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":{}}"#);
		})
		.await;
	let _ = api
		.base()
		.installations()
		.lights()
		.turn_on(5, 12, None)
		.await
		.expect("Default turn-on should succeed.");

	mock.assert_async().await;
}

#[tokio::test]
async fn light_turn_on_sends_explicit_color_state() {
	let server = MockServer::start_async().await;
	let api = test_api(&server);
	let _token = common::mock_token_endpoint(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v1/base/installations/5/lights/12/turn_on")
				.json_body(json!({
					"value": 100,
					"temperature": null,
					"hue": null,
					"saturation": null,
					"red": 255,
					"green": 64,
					"blue": 0,
				}));
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":{}}"#);
		})
		.await;
	let _ = api
		.base()
		.installations()
		.lights()
		.turn_on(5, 12, Some(LightState::rgb(255, 64, 0)))
		.await
		.expect("Color turn-on should succeed.");

	mock.assert_async().await;
}

#[tokio::test]
async fn shutter_position_changes_post_json_bodies() {
	let server = MockServer::start_async().await;
	let api = test_api(&server);
	let _token = common::mock_token_endpoint(&server).await;
	let position_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v1/base/installations/21/shutters/3/change_position")
				.json_body(json!({ "position": 75 }));
			then.status(204);
		})
		.await;
	let relative_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v1/base/installations/21/shutters/3/change_relative_position")
				.json_body(json!({ "offset": -10 }));
			then.status(204);
		})
		.await;
	let shutters = api.base().installations().shutters();
	let _ = shutters
		.change_position(21, 3, 75)
		.await
		.expect("Absolute position change should succeed.");
	let _ = shutters
		.change_relative_position(21, 3, -10)
		.await
		.expect("Relative position change should succeed.");

	position_mock.assert_async().await;
	relative_mock.assert_async().await;
}

#[tokio::test]
async fn shutter_commands_post_to_their_action_suffix() {
	let server = MockServer::start_async().await;
	let api = test_api(&server);
	let _token = common::mock_token_endpoint(&server).await;
	let up_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/base/installations/21/shutters/3/up");
			then.status(204);
		})
		.await;
	let move_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/base/installations/21/shutters/3/move");
			then.status(204);
		})
		.await;
	let shutters = api.base().installations().shutters();
	let _ = shutters.up(21, 3).await.expect("Up command should succeed.");
	let _ = shutters.move_to_preset(21, 3).await.expect("Preset move should succeed.");

	up_mock.assert_async().await;
	move_mock.assert_async().await;
}

#[tokio::test]
async fn sensor_history_sends_the_documented_query_parameters() {
	let server = MockServer::start_async().await;
	let api = test_api(&server);
	let _token = common::mock_token_endpoint(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/base/installations/21/sensors/6/historical")
				.query_param("resolution", "5m")
				.query_param("group_function", "last")
				.query_param("use_active_hours", "false")
				.query_param("time_format", "iso");
			then.status(200).header("content-type", "application/json").body(
				r#"{"data":{"time":"1970-01-01T00:10:00","tags":{"sensor_id":"6"},"values":{"temperature":22.1}}}"#,
			);
		})
		.await;
	let history = api
		.base()
		.installations()
		.sensors()
		.historical(21, 6, Default::default())
		.await
		.expect("Historical series should succeed.");

	assert_eq!(history.values.expect("Values should be present.")["temperature"], 22.1);

	mock.assert_async().await;
}

#[tokio::test]
async fn status_by_id_skips_families_disabled_by_feature_flags() {
	let server = MockServer::start_async().await;
	let api = test_api(&server);
	let _token = common::mock_token_endpoint(&server).await;
	let _installation = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/base/installations/21");
			then.status(200).header("content-type", "application/json").body(
				r#"{"data":{"id":21,"name":"Home","features":{
					"outputs":{"available":true,"used":true,"metadata":null},
					"shutters":{"available":true,"used":false,"metadata":null}
				}}}"#,
			);
		})
		.await;
	let outputs_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/base/installations/21/outputs");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":[{"id":18,"name":"Outlet","type":"OUTLET"}]}"#);
		})
		.await;
	let shutters_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/base/installations/21/shutters");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":[]}"#);
		})
		.await;
	let _groupactions = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/base/installations/21/groupactions");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":[{"id":4,"name":"Movie night"}]}"#);
		})
		.await;
	let _sensors = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/base/installations/21/sensors");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":[{"id":6,"name":"Kitchen"}]}"#);
		})
		.await;
	let _lights = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/base/installations/21/lights");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":[]}"#);
		})
		.await;
	let status = api
		.base()
		.installations()
		.status_by_id(21)
		.await
		.expect("Status aggregation should succeed.");

	assert_eq!(status.outputs.as_ref().map(Vec::len), Some(1));
	assert!(status.shutters.is_none(), "Unused shutters must not be fetched.");
	assert_eq!(status.groupactions.len(), 1);
	assert_eq!(status.sensors.len(), 1);
	assert!(status.lights.is_empty());

	outputs_mock.assert_calls_async(1).await;
	shutters_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn status_by_id_always_fetches_group_actions_and_sensors() {
	let server = MockServer::start_async().await;
	let api = test_api(&server);
	let _token = common::mock_token_endpoint(&server).await;
	let _installation = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/base/installations/9");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":{"id":9,"name":"Bare"}}"#);
		})
		.await;
	let groupactions_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/base/installations/9/groupactions");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":[]}"#);
		})
		.await;
	let sensors_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/base/installations/9/sensors");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":[]}"#);
		})
		.await;
	let _lights = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/base/installations/9/lights");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":[]}"#);
		})
		.await;
	let status = api
		.base()
		.installations()
		.status_by_id(9)
		.await
		.expect("Status aggregation without features should succeed.");

	assert!(status.outputs.is_none());
	assert!(status.shutters.is_none());

	groupactions_mock.assert_calls_async(1).await;
	sensors_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn installation_listing_passes_the_filter_parameter() {
	let server = MockServer::start_async().await;
	let api = test_api(&server);
	let _token = common::mock_token_endpoint(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/base/installations")
				.query_param("filter", "gateway_model=openmotics");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":[{"id":1,"name":"Home"}]}"#);
		})
		.await;
	let installations = api
		.base()
		.installations()
		.all(Some("gateway_model=openmotics"))
		.await
		.expect("Filtered installation listing should succeed.");

	assert_eq!(installations.len(), 1);

	mock.assert_async().await;
}
