//! End-to-end scenarios from spec §8 (S1-S6), run against the
//! in-memory `MockTransport`/`MockSession` in `tests/common`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{provider_config, MockSession, MockTransport};
use pgw_domain::{ProviderStatus, RestartPolicy, Tunables};
use pgw_supervisor::{RemoteTool, SupervisorError};
use serde_json::json;

fn tunables(interval_ms: u64, policy: RestartPolicy) -> Tunables {
    Tunables {
        health_check_interval_ms: interval_ms,
        restart_policy: policy,
        default_timeout_ms: 5_000,
        max_timeout_ms: 60_000,
    }
}

#[tokio::test]
async fn s1_happy_path_dispatch() {
    let transport = MockTransport::new();
    let session = MockSession::new();
    session.with_catalogue(vec![RemoteTool {
        name: "echo".to_owned(),
        description: "echoes its input".to_owned(),
        input_schema: json!({}),
        output_schema: json!({}),
    }]);
    session.with_call_tool(|name, args| {
        assert_eq!(name, "echo");
        Ok(json!({ "echoed": args["msg"] }))
    });
    transport.register("p1", session);

    let supervisor = pgw_supervisor::ProviderSupervisor::new(
        transport,
        tunables(30_000, RestartPolicy::Never),
    );
    supervisor.connect_all(vec![provider_config("p1")]).await;

    let result = supervisor
        .call("p1", "echo", json!({ "msg": "hi" }))
        .await
        .expect("dispatch should succeed");
    assert_eq!(result, json!({ "echoed": "hi" }));
}

#[tokio::test]
async fn s1_two_providers_with_identically_named_tools_do_not_shadow() {
    let transport = MockTransport::new();

    let s1 = MockSession::new();
    s1.with_catalogue(vec![RemoteTool {
        name: "echo".to_owned(),
        description: String::new(),
        input_schema: json!({}),
        output_schema: json!({}),
    }]);
    s1.with_call_tool(|_, _| Ok(json!({ "from": "p1" })));
    transport.register("p1", s1);

    let s2 = MockSession::new();
    s2.with_catalogue(vec![RemoteTool {
        name: "echo".to_owned(),
        description: String::new(),
        input_schema: json!({}),
        output_schema: json!({}),
    }]);
    s2.with_call_tool(|_, _| Ok(json!({ "from": "p2" })));
    transport.register("p2", s2);

    let supervisor = pgw_supervisor::ProviderSupervisor::new(
        transport,
        tunables(30_000, RestartPolicy::Never),
    );
    supervisor
        .connect_all(vec![provider_config("p1"), provider_config("p2")])
        .await;

    let r1 = supervisor.call("p1", "echo", json!({})).await.unwrap();
    let r2 = supervisor.call("p2", "echo", json!({})).await.unwrap();
    assert_eq!(r1, json!({ "from": "p1" }));
    assert_eq!(r2, json!({ "from": "p2" }));
}

#[tokio::test]
async fn s2_three_strike_restart() {
    let transport = MockTransport::new();
    let session = MockSession::new();
    session.with_ping_script(vec![Ok(false)]); // sticky failure forever
    transport.register("p1", session);

    let supervisor = pgw_supervisor::ProviderSupervisor::new(
        transport,
        tunables(50, RestartPolicy::OnFailure),
    );
    supervisor.connect_all(vec![provider_config("p1")]).await;

    // Three ticks at 50ms plus margin for the crash callback to fire and
    // the restart coordinator to claim the Restarting transition.
    tokio::time::sleep(Duration::from_millis(400)).await;

    let status = supervisor.snapshot_status();
    let final_status = status.get("p1").copied().unwrap_or_default();
    assert!(
        matches!(final_status, ProviderStatus::Crashed | ProviderStatus::Restarting),
        "expected Crashed or Restarting, got {final_status:?}"
    );
}

#[tokio::test]
async fn s3_recovery_resets_counter() {
    let transport = MockTransport::new();
    let session = MockSession::new();
    session.with_ping_script(vec![Ok(false), Ok(false), Ok(true)]);
    transport.register("p1", session);

    let supervisor = pgw_supervisor::ProviderSupervisor::new(
        transport,
        tunables(30, RestartPolicy::Never),
    );
    supervisor.connect_all(vec![provider_config("p1")]).await;

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(supervisor.snapshot_status().get("p1").copied(), Some(ProviderStatus::Available));
}

#[tokio::test]
async fn s5_dispatch_on_unknown_provider() {
    let transport = MockTransport::new();
    let supervisor = pgw_supervisor::ProviderSupervisor::new(
        transport,
        tunables(30_000, RestartPolicy::Never),
    );

    let err = supervisor.call("missing", "whatever", json!({})).await.unwrap_err();
    assert!(matches!(err, SupervisorError::ProviderNotFound(name) if name == "missing"));
}

#[tokio::test]
async fn s6_concurrent_dispatch_never_panics() {
    let transport = MockTransport::new();
    let session = MockSession::new();
    session.with_catalogue(vec![RemoteTool {
        name: "echo".to_owned(),
        description: String::new(),
        input_schema: json!({}),
        output_schema: json!({}),
    }]);
    session.with_call_tool(|_, _| Ok(json!({ "ok": true })));
    transport.register("p1", session);

    let supervisor = Arc::new(pgw_supervisor::ProviderSupervisor::new(
        transport,
        tunables(30_000, RestartPolicy::Never),
    ));
    supervisor.connect_all(vec![provider_config("p1")]).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let supervisor = Arc::clone(&supervisor);
        handles.push(tokio::spawn(async move {
            supervisor.call("p1", "echo", json!({})).await
        }));
    }
    for handle in handles {
        let outcome = handle.await.expect("task should not panic");
        assert!(matches!(
            outcome,
            Ok(_) | Err(SupervisorError::ProviderNotRunning(_))
        ));
    }
}
