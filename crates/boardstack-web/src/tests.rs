use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, BodyDataStream},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use boardstack_core::events::ChannelId;
use boardstack_db::MemoryStore;
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::config::{MailMode, ServerConfig};
use crate::create_router;
use crate::state::AppState;

const INTERNAL_TOKEN: &str = "internal-secret";

struct TestApp {
    app: Router,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(ServerConfig {
            mail: MailMode::Log,
            internal_token: Some(INTERNAL_TOKEN.to_string()),
            ..Default::default()
        })
    }

    fn with_config(config: ServerConfig) -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()), config).unwrap();
        Self {
            app: create_router(state.clone()),
            state,
        }
    }

    async fn send(&self, req: Request<Body>) -> Response {
        self.app.clone().oneshot(req).await.unwrap()
    }

    async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    /// Sign up and return `(token, user_id)`.
    async fn signup(&self, email: &str) -> (String, String) {
        let resp = self
            .call(
                "POST",
                "/api/users/signup",
                None,
                Some(json!({"email": email, "full_name": "Tester", "password": "password123"})),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = json_body(resp).await;
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    async fn create_board(&self, token: &str) -> String {
        let resp = self
            .call("POST", "/api/boards", Some(token), Some(json!({"title": "Roadmap"})))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        json_body(resp).await["id"].as_str().unwrap().to_string()
    }

    async fn subscribe(&self, token: &str, board_id: &str) -> EventReader {
        let resp = self
            .call("GET", &format!("/api/events?boardId={}", board_id), Some(token), None)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/event-stream"));
        EventReader {
            body: resp.into_body().into_data_stream(),
            buffer: String::new(),
        }
    }

    async fn publish(&self, channel: &str, payload: Value) -> StatusCode {
        self.call(
            "POST",
            "/internal/publish",
            Some(INTERNAL_TOKEN),
            Some(json!({"channel": channel, "payload": payload})),
        )
        .await
        .status()
    }
}

async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Client side of an SSE response.
struct EventReader {
    body: BodyDataStream,
    buffer: String,
}

/// Read one SSE frame and parse its data as JSON.
async fn next_event(events: &mut EventReader) -> Value {
    loop {
        while let Some(end) = events.buffer.find("\n\n") {
            let data: String = events.buffer[..end]
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(str::trim_start)
                .collect();
            events.buffer.drain(..end + 2);
            // empty for keep-alive comments
            if !data.is_empty() {
                return serde_json::from_str(&data).unwrap();
            }
        }
        let chunk = tokio::time::timeout(Duration::from_secs(2), events.body.next())
            .await
            .expect("timed out waiting for event")
            .expect("event stream ended")
            .unwrap();
        events.buffer.push_str(std::str::from_utf8(&chunk).unwrap());
    }
}

#[tokio::test]
async fn test_subscriber_receives_published_event_once() {
    let t = TestApp::new();
    let (token, _) = t.signup("ada@example.com").await;
    let board_id = t.create_board(&token).await;
    let mut events = t.subscribe(&token, &board_id).await;
    let channel = ChannelId::board(&board_id);
    assert_eq!(t.state.registry().subscriber_count(&channel), 1);

    let payload = json!({"type": "card_created", "data": {"id": "C1"}});
    assert_eq!(t.publish(channel.as_str(), payload.clone()).await, StatusCode::OK);

    assert_eq!(next_event(&mut events).await, payload);
    let nothing_more = tokio::time::timeout(Duration::from_millis(100), events.body.next()).await;
    assert!(nothing_more.is_err());
}

#[tokio::test]
async fn test_disconnect_removes_channel() {
    let t = TestApp::new();
    let (token, _) = t.signup("ada@example.com").await;
    let board_id = t.create_board(&token).await;
    let channel = ChannelId::board(&board_id);

    let events = t.subscribe(&token, &board_id).await;
    assert!(t.state.registry().contains(&channel));
    drop(events);

    assert!(!t.state.registry().contains(&channel));
    let status = t.publish(channel.as_str(), json!({"type": "card_created", "data": {}})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(t.state.registry().channel_count(), 0);
}

#[tokio::test]
async fn test_unauthenticated_subscribe_rejected_without_registry_change() {
    let t = TestApp::new();
    let resp = t.call("GET", "/api/events?boardId=B1", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(t.state.registry().channel_count(), 0);

    let resp = t.call("GET", "/api/events?boardId=B1", Some("bogus"), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(t.state.registry().channel_count(), 0);
}

#[tokio::test]
async fn test_subscribe_checks_board_and_membership() {
    let t = TestApp::new();
    let (owner, _) = t.signup("owner@example.com").await;
    let (stranger, _) = t.signup("stranger@example.com").await;
    let board_id = t.create_board(&owner).await;

    let resp = t.call("GET", "/api/events", Some(&owner), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = t.call("GET", "/api/events?boardId=missing", Some(&owner), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let uri = format!("/api/events?boardId={}", board_id);
    let resp = t.call("GET", &uri, Some(&stranger), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(resp).await["error"], "Forbidden");

    assert_eq!(t.state.registry().channel_count(), 0);
}

#[tokio::test]
async fn test_mutations_publish_board_events_in_order() {
    let t = TestApp::new();
    let (token, _) = t.signup("ada@example.com").await;
    let board_id = t.create_board(&token).await;
    let mut events = t.subscribe(&token, &board_id).await;

    let resp = t
        .call(
            "POST",
            &format!("/api/boards/{}/lists", board_id),
            Some(&token),
            Some(json!({"title": "Todo"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let list_id = json_body(resp).await["id"].as_str().unwrap().to_string();

    let resp = t
        .call(
            "POST",
            &format!("/api/boards/{}/cards", board_id),
            Some(&token),
            Some(json!({"parent_list": list_id, "title": "Write tests"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let card_id = json_body(resp).await["id"].as_str().unwrap().to_string();

    let resp = t
        .call(
            "PATCH",
            &format!("/api/boards/{}/cards/{}", board_id, card_id),
            Some(&token),
            Some(json!({"title": "Write more tests"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = t
        .call(
            "DELETE",
            &format!("/api/boards/{}/cards/{}", board_id, card_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = t
        .call(
            "PATCH",
            &format!("/api/boards/{}", board_id),
            Some(&token),
            Some(json!({"title": "Renamed"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let list_created = next_event(&mut events).await;
    assert_eq!(list_created["type"], "list_created");
    assert_eq!(list_created["data"]["id"], list_id);

    let card_created = next_event(&mut events).await;
    assert_eq!(card_created["type"], "card_created");
    assert_eq!(card_created["data"]["title"], "Write tests");

    let card_updated = next_event(&mut events).await;
    assert_eq!(card_updated["type"], "card_updated");
    assert_eq!(card_updated["data"]["title"], "Write more tests");

    let card_deleted = next_event(&mut events).await;
    assert_eq!(
        card_deleted,
        json!({"type": "card_deleted", "data": {"id": card_id, "parent_list": list_id}})
    );

    let board_updated = next_event(&mut events).await;
    assert_eq!(board_updated["type"], "board_updated");
    assert_eq!(board_updated["data"]["title"], "Renamed");
}

#[tokio::test]
async fn test_duplicate_subscriptions_each_receive() {
    let t = TestApp::new();
    let (token, _) = t.signup("ada@example.com").await;
    let board_id = t.create_board(&token).await;
    let mut first = t.subscribe(&token, &board_id).await;
    let mut second = t.subscribe(&token, &board_id).await;
    assert_eq!(
        t.state.registry().subscriber_count(&ChannelId::board(&board_id)),
        2
    );

    let resp = t
        .call(
            "POST",
            &format!("/api/boards/{}/labels", board_id),
            Some(&token),
            Some(json!({"label": "bug", "color": "f00"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    for events in [&mut first, &mut second] {
        let event = next_event(events).await;
        assert_eq!(event["type"], "label_created");
        assert_eq!(event["data"]["color"], "#f00");
    }
}

#[tokio::test]
async fn test_invitation_flow_publishes_member_events() {
    let t = TestApp::new();
    let (owner, _) = t.signup("owner@example.com").await;
    let (bob, bob_id) = t.signup("bob@example.com").await;
    let board_id = t.create_board(&owner).await;
    let mut events = t.subscribe(&owner, &board_id).await;

    let resp = t
        .call(
            "POST",
            &format!("/api/boards/{}/invitations", board_id),
            Some(&owner),
            Some(json!({"email": "bob@example.com", "role": "member"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let invitation_id = json_body(resp).await["id"].as_str().unwrap().to_string();

    let resp = t
        .call("GET", &format!("/api/invitations/{}", invitation_id), Some(&bob), None)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["board"]["id"], board_id);

    let resp = t
        .call(
            "POST",
            &format!("/api/invitations/{}/accept", invitation_id),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(next_event(&mut events).await["type"], "invitation_created");
    let member_created = next_event(&mut events).await;
    assert_eq!(member_created["type"], "member_created");
    assert_eq!(member_created["data"]["user_id"], bob_id);
    assert_eq!(
        next_event(&mut events).await,
        json!({"type": "invitation_deleted", "data": invitation_id})
    );

    // the new member may now subscribe
    let _bob_events = t.subscribe(&bob, &board_id).await;
}

#[tokio::test]
async fn test_invitation_without_mailer_is_unavailable() {
    let t = TestApp::with_config(ServerConfig::default());
    let (owner, _) = t.signup("owner@example.com").await;
    let board_id = t.create_board(&owner).await;

    let resp = t
        .call(
            "POST",
            &format!("/api/boards/{}/invitations", board_id),
            Some(&owner),
            Some(json!({"email": "bob@example.com", "role": "reader"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_registration_gate_and_sessions() {
    let closed = TestApp::with_config(ServerConfig {
        enable_registration: false,
        ..Default::default()
    });
    let resp = closed
        .call(
            "POST",
            "/api/users/signup",
            None,
            Some(json!({"email": "a@example.com", "full_name": "A", "password": "password123"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let t = TestApp::new();
    let (token, user_id) = t.signup("ada@example.com").await;
    let resp = t
        .call(
            "POST",
            "/api/users/signup",
            None,
            Some(json!({"email": "ada@example.com", "full_name": "A", "password": "password123"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = t.call("GET", "/api/users/@me", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["id"], user_id);

    let resp = t
        .call(
            "POST",
            "/api/auth/signin",
            None,
            Some(json!({"email": "ada@example.com", "password": "wrong-password"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = t
        .call(
            "POST",
            "/api/auth/signin",
            None,
            Some(json!({"email": "ada@example.com", "password": "password123"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("boardstack_session="));
    let cookie_pair = cookie.split(';').next().unwrap().to_string();

    let req = Request::builder()
        .uri("/api/users/@me")
        .header(header::COOKIE, cookie_pair)
        .body(Body::empty())
        .unwrap();
    assert_eq!(t.send(req).await.status(), StatusCode::OK);

    let resp = t.call("GET", "/api/auth/signout", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = t.call("GET", "/api/users/@me", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_internal_routes_require_token() {
    let t = TestApp::new();
    let body = json!({"channel": "boards/B1", "payload": {"type": "x", "data": null}});

    let resp = t.call("POST", "/internal/publish", None, Some(body.clone())).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = t
        .call("POST", "/internal/publish", Some("wrong"), Some(body.clone()))
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = t.call("GET", "/internal/stats", Some(INTERNAL_TOKEN), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!({"channels": 0, "subscribers": 0}));

    let disabled = TestApp::with_config(ServerConfig::default());
    let resp = disabled
        .call("POST", "/internal/publish", Some(INTERNAL_TOKEN), Some(body))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_close_all_ends_open_streams() {
    let t = TestApp::new();
    let (token, _) = t.signup("ada@example.com").await;
    let board_id = t.create_board(&token).await;
    let mut events = t.subscribe(&token, &board_id).await;

    t.state.registry().close_all();

    let end = tokio::time::timeout(Duration::from_secs(2), events.body.next())
        .await
        .expect("stream should end");
    assert!(end.is_none());
    assert_eq!(t.state.registry().channel_count(), 0);

    // subscribers arriving while the server drains get an ended stream
    let mut late = t.subscribe(&token, &board_id).await;
    let end = tokio::time::timeout(Duration::from_secs(2), late.body.next())
        .await
        .expect("late stream should end");
    assert!(end.is_none());
    assert_eq!(t.state.registry().channel_count(), 0);
}
