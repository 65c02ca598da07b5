//! Integration tests driving MapController through the in-memory engine.

use mapkit_runtime::memory::{InMemoryEngine, InMemoryObjectManagerFactory, PlainClusterRenderer};
use mapkit_runtime::{MapConfig, MapController, MapError, RenderContext};
use mapkit_types::{CallResult, MethodCall};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    engine: Arc<InMemoryEngine>,
    factory: Arc<InMemoryObjectManagerFactory>,
    map: Arc<MapController>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(MapConfig::default())
    }

    fn with_config(config: MapConfig) -> Self {
        let engine = Arc::new(InMemoryEngine::new());
        let factory = Arc::new(InMemoryObjectManagerFactory::new());
        let render = RenderContext::new(factory.clone(), Arc::new(PlainClusterRenderer));
        let map = Arc::new(MapController::new(config, engine.as_ref(), render));
        Self {
            engine,
            factory,
            map,
        }
    }

    async fn call(&self, method: &str, args: Value) -> CallResult {
        self.map.handle(MethodCall::new(method, args)).await
    }

    fn submit(&self, method: &str, args: Value) -> tokio::task::JoinHandle<CallResult> {
        tokio::spawn(self.map.submit(MethodCall::new(method, args)))
    }
}

fn marker(id: &str, user_data: Value) -> Value {
    json!({
        "id": id,
        "position": {"lat": 55.0, "lng": 37.0},
        "userData": user_data,
    })
}

fn short_timeout() -> MapConfig {
    let mut config = MapConfig::default();
    config.timeouts.ready_ms = 50;
    config
}

async fn join(handle: tokio::task::JoinHandle<CallResult>) -> CallResult {
    handle.await.expect("call task panicked")
}

// =============================================================================
// Layer lifecycle
// =============================================================================

mod layers {
    use super::*;

    #[tokio::test]
    async fn adds_and_removes_before_ready_net_out() {
        let h = Harness::new();

        h.call("map#addLayer", json!({"layerId": "a"})).await.expect("add a");
        h.call("map#addLayer", json!({"layerId": "b"})).await.expect("add b");
        h.call("map#addLayer", json!({"layerId": null})).await.expect("add default");
        h.call("map#removeLayer", json!({"layerId": "a"})).await.expect("remove a");
        h.call("map#addLayerWithClustering", json!({"layerId": "c"}))
            .await
            .expect("add c");
        h.call("map#removeLayer", json!({"layerId": "zzz"}))
            .await
            .expect("remove unknown is a no-op");

        assert!(!h.map.is_ready());
        assert_eq!(h.factory.created_count(), 0);

        h.engine.fire_ready();

        assert!(h.map.is_ready());
        assert_eq!(
            h.map.layer_ids(),
            vec![Some("b".to_string()), None, Some("c".to_string())]
        );
        // The removed layer is still built once, then released exactly once.
        assert_eq!(h.factory.created_count(), 4);
        assert_eq!(h.factory.closed_count(), 1);
        assert_eq!(h.factory.clustering_policies().len(), 1);
    }

    #[tokio::test]
    async fn removed_layer_is_not_found() {
        let h = Harness::new();
        h.engine.fire_ready();

        h.call("map#addLayer", json!({"layerId": "poi"})).await.expect("add");
        h.call("map#removeLayer", json!({"layerId": "poi"}))
            .await
            .expect("remove");

        assert_eq!(
            h.map.get_layer(Some("poi")).expect_err("gone"),
            MapError::LayerNotFound(Some("poi".into()))
        );
        let err = h
            .call("markers#getAll", json!({"layerId": "poi"}))
            .await
            .expect_err("gone");
        assert_eq!(err.code, "MAP_LAYER_NOT_FOUND");
        assert_eq!(h.factory.closed_count(), 1);
    }

    #[tokio::test]
    async fn duplicate_default_layers_remove_one_at_a_time() {
        let h = Harness::new();
        h.map.add_layer(None, false).expect("first");
        h.map.add_layer(None, false).expect("second");
        assert!(h.map.remove_layer(None));

        assert_eq!(h.map.layer_count(), 1);
        assert!(h.map.get_layer(None).is_ok());

        h.engine.fire_ready();
        assert_eq!(h.factory.closed_count(), 1);
    }

    #[tokio::test]
    async fn configured_layers_exist_from_construction() {
        let config = MapConfig::from_toml(
            r#"
            [[layers]]
            layer_id = "poi"
            clustering = true

            [[layers]]
            "#,
        )
        .expect("config");
        let h = Harness::with_config(config);

        assert_eq!(h.map.layer_ids(), vec![Some("poi".to_string()), None]);
        h.engine.fire_ready();
        assert_eq!(h.factory.created_count(), 2);
        assert_eq!(h.factory.clustering_policies().len(), 1);
    }

    #[tokio::test]
    async fn build_failure_after_ready_is_reported_and_not_registered() {
        let h = Harness::new();
        h.engine.fire_ready();
        h.factory.fail_next_create("no memory");

        let err = h
            .call("map#addLayer", json!({"layerId": "poi"}))
            .await
            .expect_err("build fails");
        assert_eq!(err.code, "ENGINE_OBJECT_MANAGER");
        assert_eq!(h.map.layer_count(), 0);
    }

    #[tokio::test]
    async fn build_failure_at_readiness_fails_later_commands_fast() {
        let h = Harness::new();
        h.call("map#addLayer", json!({"layerId": "poi"})).await.expect("add");
        h.factory.fail_next_create("no memory");
        h.engine.fire_ready();

        let err = h
            .call("markers#getAll", json!({"layerId": "poi"}))
            .await
            .expect_err("layer broken");
        assert_eq!(err.code, "ENGINE_OBJECT_MANAGER");
        assert_eq!(err.message, "object manager failed: no memory");
    }

    #[tokio::test]
    async fn dispose_closes_everything() {
        let h = Harness::new();
        h.map.add_layer(Some("a".into()), false).expect("a");
        h.engine.fire_ready();
        h.map.add_layer(Some("b".into()), true).expect("b");

        h.map.dispose();

        assert_eq!(h.map.layer_count(), 0);
        assert_eq!(h.factory.closed_count(), 2);
    }
}

// =============================================================================
// Marker commands
// =============================================================================

mod markers {
    use super::*;

    #[tokio::test]
    async fn add_then_get_by_id_round_trips_user_data() {
        let h = Harness::new();
        h.engine.fire_ready();
        h.call("map#addLayer", json!({"layerId": "poi"})).await.expect("add layer");

        let payload = json!({"name": "cafe", "tags": ["coffee", 1, null], "nested": {"x": 1.5}});
        h.call(
            "markers#addMarker",
            json!({"layerId": "poi", "marker": marker("m1", payload.clone())}),
        )
        .await
        .expect("add marker");

        let got = h
            .call("markers#getById", json!({"layerId": "poi", "markerId": "m1"}))
            .await
            .expect("get by id");
        assert_eq!(got, payload);
    }

    #[tokio::test]
    async fn full_crud_cycle() {
        let h = Harness::new();
        h.engine.fire_ready();
        h.call("map#addLayer", json!({"layerId": null})).await.expect("add layer");

        h.call(
            "markers#addMarkers",
            json!({"layerId": null, "markers": [marker("a", json!(1)), marker("b", json!(2))]}),
        )
        .await
        .expect("add many");

        let all = h
            .call("markers#getAll", json!({"layerId": null}))
            .await
            .expect("get all");
        let ids: Vec<&str> = all
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|m| m["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        h.call(
            "markers#update",
            json!({"layerId": null, "markerId": "a", "newMarker": marker("a", json!("updated"))}),
        )
        .await
        .expect("update");
        assert_eq!(
            h.call("markers#getById", json!({"layerId": null, "markerId": "a"}))
                .await
                .expect("get a"),
            json!("updated")
        );

        h.call("markers#removeById", json!({"layerId": null, "markerId": "b"}))
            .await
            .expect("remove b");
        let err = h
            .call("markers#getById", json!({"layerId": null, "markerId": "b"}))
            .await
            .expect_err("b gone");
        assert_eq!(err.code, "MAP_MARKER_NOT_FOUND");

        h.call("markers#removeAll", json!({"layerId": null}))
            .await
            .expect("remove all");
        assert_eq!(
            h.call("markers#getAll", json!({"layerId": null}))
                .await
                .expect("get all"),
            json!([])
        );
    }

    #[tokio::test]
    async fn commands_before_ready_run_in_submission_order() {
        let h = Harness::new();
        h.call("map#addLayer", json!({"layerId": "l"})).await.expect("add layer");

        let pending = vec![
            h.submit(
                "markers#addMarker",
                json!({"layerId": "l", "marker": marker("m", json!("v1"))}),
            ),
            h.submit(
                "markers#update",
                json!({"layerId": "l", "markerId": "m", "newMarker": marker("m", json!("v2"))}),
            ),
            h.submit("markers#getById", json!({"layerId": "l", "markerId": "m"})),
            h.submit("markers#removeAll", json!({"layerId": "l"})),
            h.submit("markers#getAll", json!({"layerId": "l"})),
        ];

        tokio::time::sleep(Duration::from_millis(20)).await;
        h.engine.fire_ready();

        let mut results = Vec::new();
        for handle in pending {
            results.push(join(handle).await.expect("queued call succeeds"));
        }
        assert_eq!(
            results,
            vec![Value::Null, Value::Null, json!("v2"), Value::Null, json!([])]
        );
    }

    #[tokio::test]
    async fn later_ready_layer_does_not_block_other_targets() {
        let h = Harness::new();
        h.engine.fire_ready();
        h.call("map#addLayer", json!({"layerId": "ready"})).await.expect("add");

        let got = h
            .call("markers#getAll", json!({"layerId": "ready"}))
            .await
            .expect("ready layer answers");
        assert_eq!(got, json!([]));
    }

    #[tokio::test]
    async fn queued_command_before_remove_still_runs() {
        let h = Harness::new();
        h.call("map#addLayer", json!({"layerId": "l"})).await.expect("add layer");

        let add = h.submit(
            "markers#addMarker",
            json!({"layerId": "l", "marker": marker("m", json!(null))}),
        );
        h.call("map#removeLayer", json!({"layerId": "l"}))
            .await
            .expect("remove");
        h.engine.fire_ready();

        join(add).await.expect("queued add ran before close");
        assert_eq!(h.factory.closed_count(), 1);
    }
}

// =============================================================================
// Validation and failures
// =============================================================================

mod failures {
    use super::*;

    #[tokio::test]
    async fn missing_marker_argument_has_no_side_effect() {
        let h = Harness::new();
        h.engine.fire_ready();
        h.call("map#addLayer", json!({"layerId": "l"})).await.expect("add layer");

        let err = h
            .call("markers#addMarker", json!({"layerId": "l"}))
            .await
            .expect_err("no marker");
        assert_eq!(err.code, "MAP_BAD_ARGUMENT");
        assert!(err.message.contains("'marker'"));
        assert!(err.details.is_none());

        assert_eq!(
            h.call("markers#getAll", json!({"layerId": "l"}))
                .await
                .expect("get all"),
            json!([])
        );
    }

    #[tokio::test]
    async fn malformed_marker_in_batch_rejects_whole_batch() {
        let h = Harness::new();
        h.engine.fire_ready();
        h.call("map#addLayer", json!({"layerId": "l"})).await.expect("add layer");

        let err = h
            .call(
                "markers#addMarkers",
                json!({"layerId": "l", "markers": [marker("ok", json!(1)), {"id": "broken"}]}),
            )
            .await
            .expect_err("bad batch");
        assert_eq!(err.code, "MAP_BAD_ARGUMENT");
        assert_eq!(
            h.call("markers#getAll", json!({"layerId": "l"}))
                .await
                .expect("get all"),
            json!([])
        );
    }

    #[tokio::test]
    async fn unknown_method_is_reported() {
        let h = Harness::new();
        let err = h
            .call("map#setTheme", json!({"theme": "dark"}))
            .await
            .expect_err("unknown");
        assert_eq!(err.code, "MAP_NOT_IMPLEMENTED");
    }

    #[tokio::test]
    async fn never_ready_engine_times_out() {
        let h = Harness::with_config(short_timeout());
        h.call("map#addLayer", json!({"layerId": "l"})).await.expect("add layer");

        let err = h
            .call("markers#getAll", json!({"layerId": "l"}))
            .await
            .expect_err("times out");
        assert_eq!(err.code, "MAP_ENGINE_NOT_READY");
        assert_eq!(err.message, "engine not ready after 50ms");
    }

    #[tokio::test]
    async fn timed_out_command_is_skipped_when_ready_arrives() {
        let h = Harness::with_config(short_timeout());
        h.call("map#addLayer", json!({"layerId": "l"})).await.expect("add layer");

        h.call(
            "markers#addMarker",
            json!({"layerId": "l", "marker": marker("late", json!(1))}),
        )
        .await
        .expect_err("times out");

        h.engine.fire_ready();
        assert_eq!(
            h.call("markers#getAll", json!({"layerId": "l"}))
                .await
                .expect("get all"),
            json!([])
        );
    }

    #[tokio::test]
    async fn repeated_timeouts_leave_no_queued_work() {
        let mut config = MapConfig::default();
        config.timeouts.ready_ms = 5;
        let h = Harness::with_config(config);
        h.call("map#addLayer", json!({"layerId": "l"})).await.expect("add layer");

        for _ in 0..1000 {
            let err = h
                .call("markers#getAll", json!({"layerId": "l"}))
                .await
                .expect_err("never ready");
            assert_eq!(err.code, "MAP_ENGINE_NOT_READY");
        }

        let layer = h.map.get_layer(Some("l")).expect("registered");
        assert!(layer.queued() <= 1, "queued = {}", layer.queued());
    }

    #[tokio::test]
    async fn execute_keeps_typed_errors() {
        let h = Harness::new();
        h.engine.fire_ready();

        let call = MethodCall::new("markers#getAll", json!({"layerId": "nope"}));
        assert_eq!(
            h.map.execute(&call).await,
            Err(MapError::LayerNotFound(Some("nope".into())))
        );

        let add = MethodCall::new("map#addLayer", json!({"layerId": "nope"}));
        assert_eq!(h.map.execute(&add).await, Ok(Value::Null));
        assert_eq!(h.map.execute(&call).await, Ok(json!([])));
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_others() {
        let h = Harness::new();
        h.engine.fire_ready();
        h.call("map#addLayer", json!({"layerId": "l"})).await.expect("add layer");

        let bad = h.submit("markers#getById", json!({"layerId": "l", "markerId": "nope"}));
        let good = h.submit(
            "markers#addMarker",
            json!({"layerId": "l", "marker": marker("m", json!(true))}),
        );

        assert_eq!(
            join(bad).await.expect_err("missing").code,
            "MAP_MARKER_NOT_FOUND"
        );
        join(good).await.expect("unaffected");
        assert_eq!(h.map.layer_count(), 1);
    }
}

// =============================================================================
// Camera
// =============================================================================

mod camera {
    use super::*;
    use mapkit_types::{CameraPosition, GeoPoint};

    #[tokio::test]
    async fn move_before_ready_applies_after_initial_position() {
        let mut config = MapConfig::default();
        config.initial_camera_position =
            Some(CameraPosition::new(GeoPoint { lat: 1.0, lng: 2.0 }, 5.0));
        let h = Harness::with_config(config);

        let pending = h.submit(
            "camera#move",
            json!({"point": {"lat": 3.0, "lng": 4.0}, "zoom": 10.0}),
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.engine.fire_ready();
        join(pending).await.expect("move");

        let moves = h.engine.map().recording_camera().moves();
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0]["zoom"], json!(5.0));
        assert_eq!(moves[1]["point"], json!({"lat": 3.0, "lng": 4.0}));
    }

    #[tokio::test]
    async fn engine_rejection_is_wrapped() {
        let h = Harness::new();
        h.engine.fire_ready();

        let err = h
            .call("camera#move", json!({"zoom": 3}))
            .await
            .expect_err("no point");
        assert_eq!(err.code, "ENGINE_CAMERA");
    }

    #[tokio::test]
    async fn missing_camera_fails_fast() {
        let h = Harness::new();
        h.engine.map().fail_camera("headless");
        h.engine.fire_ready();

        let err = h
            .call("camera#move", json!({"point": {"lat": 0.0, "lng": 0.0}}))
            .await
            .expect_err("no camera");
        assert_eq!(err.code, "ENGINE_UNAVAILABLE");
    }
}

// =============================================================================
// Readiness racing dispatch
// =============================================================================

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn ready_callback_racing_get_all() {
        for delay_us in [0u64, 50, 200, 1000] {
            let h = Harness::new();
            h.call("map#addLayer", json!({"layerId": "l"})).await.expect("add layer");

            let firing = h.engine.fire_ready_after(Duration::from_micros(delay_us));
            let result = h.call("markers#getAll", json!({"layerId": "l"})).await;
            firing.join().expect("engine thread");

            assert_eq!(result.expect("getAll resolves"), json!([]), "delay {delay_us}us");
            assert!(h.map.is_ready());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn layers_added_while_ready_fires_are_all_built() {
        let h = Harness::new();
        let firing = h.engine.fire_ready_after(Duration::from_micros(100));

        for i in 0..50 {
            h.map.add_layer(Some(format!("l{i}")), i % 2 == 0).expect("add");
        }
        firing.join().expect("engine thread");

        assert_eq!(h.map.layer_count(), 50);
        assert_eq!(h.factory.created_count(), 50);
        for i in 0..50 {
            let layer = h.map.get_layer(Some(&format!("l{i}"))).expect("registered");
            assert!(layer.is_ready(), "layer l{i} built");
        }
    }
}
