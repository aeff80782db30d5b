use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn finalize_produces_one_summary_with_sent_ts_duration() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    app.ingest("room-f1", "user", "I'm interested", 0.0).await;
    app.ingest("room-f1", "assistant", "Great, let's talk pricing", 5.0)
        .await;
    app.ingest("room-f1", "user", "Too expensive", 12.0).await;

    let resp = app.end_call("room-f1", "anon-participant").await;
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["ok"], true);
    assert_eq!(json["already_finalized"], false);
    assert_eq!(json["duration"]["seconds"], 12);
    assert_eq!(json["duration"]["mmss"], "0:12");

    assert_eq!(app.summary_count("room-f1").await, 1);

    // No model configured: experience falls back to Neutral.
    let resp = app
        .client
        .get(format!("{}/api/session/room-f1/summary", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let summary: Value = resp.json().await.unwrap();
    assert_eq!(summary["experience"], "Neutral");
    assert_eq!(summary["total_messages"], 3);

    app.cleanup().await;
}

#[tokio::test]
async fn finalize_is_idempotent() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    app.ingest("room-f2", "user", "hello", 0.0).await;
    app.ingest("room-f2", "user", "goodbye", 30.0).await;

    let first: Value = app.end_call("room-f2", "p1").await.json().await.unwrap();
    let second: Value = app.end_call("room-f2", "p1").await.json().await.unwrap();

    assert_eq!(second["ok"], true);
    assert_eq!(second["already_finalized"], true);
    assert_eq!(second["summary_id"], first["summary_id"]);
    assert_eq!(second["duration"], first["duration"]);
    assert_eq!(app.summary_count("room-f2").await, 1);

    app.cleanup().await;
}

#[tokio::test]
async fn finalize_without_any_utterances_is_not_found() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let resp = app.end_call("room-f3", "p1").await;
    assert_eq!(resp.status().as_u16(), 404);
    assert_eq!(app.summary_count("room-f3").await, 0);

    app.cleanup().await;
}

#[tokio::test]
async fn concurrent_finalize_yields_exactly_one_summary() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    app.ingest("room-f4", "user", "first", 0.0).await;
    app.ingest("room-f4", "user", "last", 8.0).await;

    let (a, b) = tokio::join!(app.end_call("room-f4", "p1"), app.end_call("room-f4", "p1"));
    assert_eq!(a.status().as_u16(), 200);
    assert_eq!(b.status().as_u16(), 200);

    let a: Value = a.json().await.unwrap();
    let b: Value = b.json().await.unwrap();
    assert_eq!(a["duration"]["seconds"], 8);
    assert_eq!(b["duration"]["seconds"], 8);

    assert_eq!(app.summary_count("room-f4").await, 1);

    app.cleanup().await;
}

#[tokio::test]
async fn finalize_falls_back_to_the_durable_mirror_by_prefix() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    // Utterances were recorded under the decorated room id. The end-call
    // request only knows the undecorated prefix, and this process's buffer
    // holds nothing for it; the mirror must supply the transcript.
    app.ingest("room-f5-user-65f0", "user", "hi", 0.0).await;
    app.ingest("room-f5-user-65f0", "user", "bye", 7.0).await;

    let resp = app.end_call("room-f5", "65f0").await;
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["duration"]["seconds"], 7);
    assert_eq!(app.summary_count("room-f5").await, 1);

    app.cleanup().await;
}

#[tokio::test]
async fn finalize_clears_session_memory() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    app.ingest("room-f6", "user", "only message", 0.0).await;
    let resp = app.end_call("room-f6", "p1").await;
    assert_eq!(resp.status().as_u16(), 200);

    // Verdict cache is dropped with the buffer.
    let resp = app
        .client
        .get(format!("{}/api/session/room-f6/analysis", app.address))
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert!(json["analysis"].is_null());

    app.cleanup().await;
}
