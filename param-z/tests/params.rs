use std::{
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use param_z::{
    Builder, ParamError, Parameter, ParameterEvent, SetResult,
    context::{ZContext, ZContextBuilder},
};
use serde_json::json;

const TIMEOUT: Duration = Duration::from_secs(2);

/// Isolated in-process context: no multicast scouting, no remote peers.
fn test_ctx() -> ZContext {
    ZContextBuilder::default()
        .disable_multicast_scouting()
        .with_json("connect/endpoints", json!([]))
        .build()
        .expect("Failed to create context")
}

fn settle() {
    thread::sleep(Duration::from_millis(200));
}

#[test]
fn test_set_get_list_scenario_with_event() {
    let ctx = test_ctx();

    let server = ctx
        .create_param_server("robot1")
        .build()
        .expect("Failed to create server");
    assert_eq!(server.parameter_count(), 0);

    let events: Arc<Mutex<Vec<ParameterEvent>>> = Arc::default();
    let sink = events.clone();
    let client = ctx
        .create_param_client()
        .with_event_callback(move |event| {
            sink.lock().unwrap().push(event);
        })
        .build()
        .expect("Failed to create client");

    settle();

    let results = client
        .set_parameters(
            "robot1",
            &[Parameter::new("max_velocity", 2.0)],
            TIMEOUT,
        )
        .expect("Set request failed");
    assert_eq!(results.len(), 1);
    assert!(results[0].successful);

    let fetched = client
        .get_parameters("robot1", &["max_velocity"], TIMEOUT)
        .expect("Get request failed");
    assert_eq!(fetched, vec![Parameter::new("max_velocity", 2.0)]);

    let names = client
        .list_parameters("robot1", &[], 0, TIMEOUT)
        .expect("List request failed");
    assert_eq!(names, vec!["max_velocity"]);

    // The event subscriber sees one broadcast with the new parameter.
    let deadline = Instant::now() + TIMEOUT;
    loop {
        {
            let events = events.lock().unwrap();
            if let Some(event) = events.iter().find(|e| e.node_id == "robot1") {
                assert_eq!(event.new.len(), 1);
                assert_eq!(event.new[0], Parameter::new("max_velocity", 2.0));
                assert!(event.changed.is_empty());
                assert!(event.deleted.is_empty());
                break;
            }
        }
        assert!(Instant::now() < deadline, "No parameter event received");
        thread::sleep(Duration::from_millis(20));
    }

    // The server observed the remote set through its local API too.
    assert!(server.has_parameter("max_velocity"));
    let local = server.get_parameter("max_velocity").expect("Missing locally");
    assert_eq!(local.value.as_double().unwrap(), 2.0);
}

#[test]
fn test_concurrent_clients_receive_only_their_own_responses() {
    let ctx = test_ctx();

    let _server = ctx
        .create_param_server("hub")
        .build()
        .expect("Failed to create server");

    settle();

    let mut handles = Vec::new();
    for (param, value) in [("alpha.rate", 10i64), ("beta.rate", 20i64)] {
        let ctx = ctx.clone();
        handles.push(thread::spawn(move || {
            let client = ctx
                .create_param_client()
                .build()
                .expect("Failed to create client");
            for round in 0..10 {
                let results = client
                    .set_parameters(
                        "hub",
                        &[Parameter::new(param, value + round)],
                        TIMEOUT,
                    )
                    .expect("Set request failed");
                assert_eq!(results.len(), 1);
                assert!(results[0].successful);

                let fetched = client
                    .get_parameters("hub", &[param], TIMEOUT)
                    .expect("Get request failed");
                assert_eq!(fetched.len(), 1, "got a response meant for another client");
                assert_eq!(fetched[0].name, param);
                assert_eq!(fetched[0].value.as_integer().unwrap(), value + round);
            }
        }));
    }
    for handle in handles {
        handle.join().expect("Client thread panicked");
    }
}

#[test]
fn test_requests_are_invisible_to_other_nodes() {
    let ctx = test_ctx();

    let alpha = ctx
        .create_param_server("alpha")
        .build()
        .expect("Failed to create server");
    let beta = ctx
        .create_param_server("beta")
        .build()
        .expect("Failed to create server");
    let client = ctx.create_param_client().build().expect("Failed to create client");

    settle();

    client
        .set_parameters("beta", &[Parameter::new("only.here", true)], TIMEOUT)
        .expect("Set request failed");

    assert!(beta.has_parameter("only.here"));
    assert!(!alpha.has_parameter("only.here"));
    assert_eq!(alpha.parameter_count(), 0);
    assert!(alpha.get_all_parameters().is_empty());

    let beta_params = beta.get_all_parameters();
    assert_eq!(beta_params.len(), 1);
    assert_eq!(beta_params[0].name, "only.here");
}

#[test]
fn test_request_to_absent_node_times_out() {
    let ctx = test_ctx();
    let client = ctx.create_param_client().build().expect("Failed to create client");

    let timeout = Duration::from_millis(300);
    let start = Instant::now();
    let err = client
        .set_parameters("ghost", &[Parameter::new("x", 1i64)], timeout)
        .unwrap_err();
    let elapsed = start.elapsed();

    assert_eq!(
        err,
        ParamError::Timeout {
            node_id: "ghost".into()
        }
    );
    assert_eq!(err.to_string(), "no response from node 'ghost' - timeout");
    assert!(elapsed >= timeout);
    assert!(elapsed < timeout + Duration::from_secs(1), "blocked too long");
}

#[test]
fn test_get_omits_missing_names() {
    let ctx = test_ctx();
    let _server = ctx
        .create_param_server("store")
        .build()
        .expect("Failed to create server");
    let client = ctx.create_param_client().build().expect("Failed to create client");

    settle();

    client
        .set_parameters("store", &[Parameter::new("present", 1i64)], TIMEOUT)
        .expect("Set request failed");

    let fetched = client
        .get_parameters("store", &["present", "absent"], TIMEOUT)
        .expect("Get request failed");
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].name, "present");
}

#[test]
fn test_list_unions_prefixes_without_duplicates() {
    let ctx = test_ctx();
    let _server = ctx
        .create_param_server("lister")
        .build()
        .expect("Failed to create server");
    let client = ctx.create_param_client().build().expect("Failed to create client");

    settle();

    client
        .set_parameters(
            "lister",
            &[
                Parameter::new("robot.arm.reach", 1.0),
                Parameter::new("robot.max_velocity", 2.0),
                Parameter::new("sensor.rate", 3.0),
            ],
            TIMEOUT,
        )
        .expect("Set request failed");

    // Overlapping prefixes match the same names; the union is deduplicated.
    let names = client
        .list_parameters("lister", &["robot.", "robot.arm"], 0, TIMEOUT)
        .expect("List request failed");
    assert_eq!(names, vec!["robot.arm.reach", "robot.max_velocity"]);

    let names = client
        .list_parameters("lister", &[], 1, TIMEOUT)
        .expect("List request failed");
    assert!(names.is_empty(), "depth 1 must exclude dotted names");
}

#[test]
fn test_set_hook_rejections_reach_the_caller() {
    let ctx = test_ctx();
    let server = ctx
        .create_param_server("guarded")
        .with_set_hook(|param: &Parameter| {
            if param.name.starts_with("locked.") {
                SetResult::failure(format!("parameter '{}' is read-only", param.name))
            } else {
                SetResult::success()
            }
        })
        .build()
        .expect("Failed to create server");
    let client = ctx.create_param_client().build().expect("Failed to create client");

    settle();

    let results = client
        .set_parameters(
            "guarded",
            &[
                Parameter::new("locked.mode", "auto"),
                Parameter::new("open.mode", "manual"),
            ],
            TIMEOUT,
        )
        .expect("Set request failed");

    assert_eq!(results.len(), 2);
    assert!(!results[0].successful);
    assert_eq!(results[0].reason, "parameter 'locked.mode' is read-only");
    assert!(results[1].successful);

    // Rejected values never reach the store.
    assert!(!server.has_parameter("locked.mode"));
    assert!(server.has_parameter("open.mode"));
}

#[test]
fn test_delete_parameter_broadcasts_deleted_event() {
    let ctx = test_ctx();
    let server = ctx
        .create_param_server("cleaner")
        .build()
        .expect("Failed to create server");

    let events: Arc<Mutex<Vec<ParameterEvent>>> = Arc::default();
    let sink = events.clone();
    let _client = ctx
        .create_param_client()
        .with_event_callback(move |event| {
            sink.lock().unwrap().push(event);
        })
        .build()
        .expect("Failed to create client");

    settle();

    server
        .set_parameters([Parameter::new("ephemeral", 1i64)])
        .expect("Local set failed");
    assert!(server.delete_parameter("ephemeral").expect("Delete failed"));
    assert!(!server.has_parameter("ephemeral"));

    let deadline = Instant::now() + TIMEOUT;
    loop {
        {
            let events = events.lock().unwrap();
            if events.iter().any(|e| {
                e.node_id == "cleaner" && e.deleted.iter().any(|p| p.name == "ephemeral")
            }) {
                break;
            }
        }
        assert!(Instant::now() < deadline, "No deleted event received");
        thread::sleep(Duration::from_millis(20));
    }
}
