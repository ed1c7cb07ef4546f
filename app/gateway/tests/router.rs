//! Router scenarios over an in-memory session.

use agent::{AgentGateway, AgentMessage, ScriptedAgent, Step};
use dataagent_gateway::{AppState, GatewayConfig, Mode, Session};
use protocol::{Card, Envelope, Listing, OutboundEvent, TextPart, ToolCall, codec};
use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedReceiver};

fn config(mode: Mode) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.agent.mode = mode;
    config.agent.fallback = "fallback".into();
    config
}

/// Admit `c1` and discard its `connected` event.
fn connect(state: &AppState) -> (Session, UnboundedReceiver<OutboundEvent>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = Session::open(state.registry(), "c1", tx);
    assert!(matches!(rx.try_recv(), Ok(OutboundEvent::Connected { .. })));
    (session, rx)
}

fn drain(rx: &mut UnboundedReceiver<OutboundEvent>) -> Vec<OutboundEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

async fn send(state: &AppState, session: &Session, raw: &str) {
    state.router.dispatch(session, codec::decode(raw)).await;
}

#[tokio::test]
async fn connected_is_the_only_event_before_any_frame() {
    let state = AppState::new(&config(Mode::Batch), AgentGateway::empty());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = Session::open(state.registry(), "c1", tx);
    assert_eq!(session.thread_id, "c1");

    let frame = codec::encode(&rx.try_recv().unwrap()).unwrap();
    assert_eq!(frame, r#"{"type":"connected","payload":{"client_id":"c1"}}"#);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn query_without_agent_is_a_single_error() {
    let state = AppState::new(&config(Mode::Batch), AgentGateway::empty());
    let (session, mut rx) = connect(&state);

    send(&state, &session, r#"{"type":"query","payload":{"text":"hi"}}"#).await;
    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(
        codec::encode(&events[0]).unwrap(),
        r#"{"type":"agent_error","payload":{"error":"Agent not initialized"}}"#
    );
}

#[tokio::test]
async fn list_orders_files_before_directories() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("b")).unwrap();
    std::fs::write(dir.path().join("c.txt"), b"c").unwrap();
    std::fs::write(dir.path().join("a.txt"), b"a").unwrap();

    let state = AppState::new(&config(Mode::Batch), AgentGateway::empty());
    let (session, mut rx) = connect(&state);
    let frame = json!({ "type": "list", "payload": { "path": dir.path() } }).to_string();
    send(&state, &session, &frame).await;

    let events = drain(&mut rx);
    let [OutboundEvent::ListResult(Listing::Items { items })] = events.as_slice() else {
        panic!("unexpected events: {events:?}");
    };
    let names: Vec<_> = items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, ["a.txt", "c.txt", "b"]);
    assert!(items[2].is_dir);
    assert!(std::path::Path::new(&items[0].path).is_absolute());
}

#[tokio::test]
async fn list_respects_cap_and_reports_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["x", "y", "z"] {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }

    let mut config = config(Mode::Batch);
    config.listing.max_items = 2;
    let state = AppState::new(&config, AgentGateway::empty());
    let (session, mut rx) = connect(&state);

    let frame = json!({ "type": "list", "payload": { "path": dir.path() } }).to_string();
    send(&state, &session, &frame).await;
    let missing = json!({ "type": "list", "payload": { "path": dir.path().join("nope") } });
    send(&state, &session, &missing.to_string()).await;

    let events = drain(&mut rx);
    assert!(matches!(&events[0], OutboundEvent::ListResult(Listing::Items { items }) if items.len() == 2));
    assert_eq!(
        events[1],
        OutboundEvent::ListResult(Listing::Error {
            error: "path not found".into()
        })
    );
}

#[tokio::test]
async fn visualize_renders_cards() {
    let state = AppState::new(&config(Mode::Batch), AgentGateway::empty());
    let (session, mut rx) = connect(&state);
    send(
        &state,
        &session,
        r#"{"type":"visualize","payload":{"items":[{"name":"src","is_dir":true},{"name":"a.txt"}]}}"#,
    )
    .await;

    assert_eq!(
        drain(&mut rx),
        vec![OutboundEvent::VisualizeResult(vec![
            Card {
                title: "src".into(),
                subtitle: "dir".into()
            },
            Card {
                title: "a.txt".into(),
                subtitle: "file".into()
            },
        ])]
    );
}

#[tokio::test]
async fn unknown_and_malformed_frames_are_echoed() {
    let state = AppState::new(&config(Mode::Batch), AgentGateway::empty());
    let (session, mut rx) = connect(&state);

    send(&state, &session, r#"{"type":"ping","payload":{"n":1}}"#).await;
    send(&state, &session, r#"{"type":"visualize","payload":{"items":"nope"}}"#).await;

    assert_eq!(
        drain(&mut rx),
        vec![
            OutboundEvent::Echo(Envelope::new("ping", json!({ "n": 1 }))),
            OutboundEvent::Echo(Envelope::new("visualize", json!({ "items": "nope" }))),
        ]
    );
}

#[tokio::test]
async fn legacy_echo_becomes_a_query() {
    let agent = ScriptedAgent::reply(vec![AgentMessage::ai("pong")]);
    let state = AppState::new(&config(Mode::Batch), AgentGateway::ready(agent.clone()));
    let (session, mut rx) = connect(&state);

    send(&state, &session, r#"{"type":"echo","payload":{"msg":"ping"}}"#).await;
    assert_eq!(agent.requests()[0].text, "ping");
    assert_eq!(
        drain(&mut rx),
        vec![
            OutboundEvent::AgentResult(vec![TextPart {
                content: "pong".into()
            }]),
            OutboundEvent::AgentDone {},
        ]
    );

    // Not JSON at all: the raw text becomes the query.
    send(&state, &session, "hello there").await;
    assert_eq!(agent.requests()[1].text, "hello there");
}

#[tokio::test]
async fn batch_failure_delivers_only_the_error() {
    let agent = ScriptedAgent::failing(
        vec![
            AgentMessage::ai_with_tools("", vec![ToolCall {
                name: "read_file".into(),
                arguments: json!({}),
                id: None,
            }]),
            AgentMessage::ai("partial"),
        ],
        "model exploded",
    );
    let state = AppState::new(&config(Mode::Batch), AgentGateway::ready(agent));
    let (session, mut rx) = connect(&state);

    send(&state, &session, r#"{"type":"query","payload":{"text":"q"}}"#).await;
    assert_eq!(
        drain(&mut rx),
        vec![OutboundEvent::agent_error("model exploded")]
    );
}

#[tokio::test]
async fn stream_failure_replaces_the_terminal_marker() {
    let agent = ScriptedAgent::failing(
        vec![AgentMessage::ai("one"), AgentMessage::ai("two")],
        "connection reset",
    );
    let state = AppState::new(&config(Mode::Stream), AgentGateway::ready(agent));
    let (session, mut rx) = connect(&state);

    send(&state, &session, r#"{"type":"query","payload":{"text":"q"}}"#).await;
    let events = drain(&mut rx);
    assert_eq!(
        events,
        vec![
            OutboundEvent::AgentStream {
                content: "one".into()
            },
            OutboundEvent::AgentStream {
                content: "\ntwo".into()
            },
            OutboundEvent::agent_error("connection reset"),
        ]
    );
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

    // The session stays usable.
    send(&state, &session, r#"{"type":"visualize","payload":{}}"#).await;
    assert_eq!(drain(&mut rx), vec![OutboundEvent::VisualizeResult(vec![])]);
}

#[tokio::test]
async fn head_message_is_never_emitted() {
    let agent = ScriptedAgent::new(vec![
        Step::Message(AgentMessage::ai("SECRET HEAD")),
        Step::Message(AgentMessage::ai("answer")),
    ]);
    let state = AppState::new(&config(Mode::Stream), AgentGateway::ready(agent));
    let (session, mut rx) = connect(&state);

    send(&state, &session, r#"{"type":"query","payload":{"text":"q"}}"#).await;
    for event in drain(&mut rx) {
        assert!(!codec::encode(&event).unwrap().contains("SECRET HEAD"));
    }
}

#[tokio::test]
async fn queries_pass_thread_and_images() {
    let agent = ScriptedAgent::reply(vec![AgentMessage::ai("ok")]);
    let state = AppState::new(&config(Mode::Batch), AgentGateway::ready(agent.clone()));
    let (session, _rx) = connect(&state);

    send(
        &state,
        &session,
        r#"{"type":"query","payload":{"text":"chart?","image_paths":["plot.png"]}}"#,
    )
    .await;
    let request = &agent.requests()[0];
    assert_eq!(request.thread_id, "c1");
    assert_eq!(request.attachments, vec![std::path::PathBuf::from("plot.png")]);
}

#[tokio::test]
async fn disconnected_session_drops_events_silently() {
    let agent = ScriptedAgent::reply(vec![AgentMessage::ai("late")]);
    let state = AppState::new(&config(Mode::Batch), AgentGateway::ready(agent.clone()));
    let (session, rx) = connect(&state);
    session.close(state.registry());
    drop(rx);

    send(&state, &session, r#"{"type":"query","payload":{"text":"q"}}"#).await;
    assert_eq!(agent.requests().len(), 1);
    assert!(state.registry().is_empty());
}

#[tokio::test]
async fn stream_events_are_not_held_for_the_next_message() {
    let step = std::time::Duration::from_millis(200);
    let agent = ScriptedAgent::reply(vec![
        AgentMessage::ai_with_tools("", vec![ToolCall {
            name: "read_file".into(),
            arguments: json!({ "file_path": "a.txt" }),
            id: None,
        }]),
        AgentMessage::ai("answer"),
    ])
    .with_delay(step);
    let state = AppState::new(&config(Mode::Stream), AgentGateway::ready(agent));
    let (session, mut rx) = connect(&state);

    let started = tokio::time::Instant::now();
    let task = {
        let state = state.clone();
        let session = session.clone();
        tokio::spawn(async move {
            send(&state, &session, r#"{"type":"query","payload":{"text":"q"}}"#).await;
        })
    };

    // The tool call is yielded after two steps; the answer after three.
    let first = rx.recv().await.unwrap();
    assert_eq!(first.kind(), "tool_calls");
    assert!(started.elapsed() < step * 5 / 2, "tool_calls waited for the answer");

    task.await.unwrap();
    assert_eq!(
        drain(&mut rx),
        vec![
            OutboundEvent::AgentStream {
                content: "answer".into()
            },
            OutboundEvent::AgentStreamEnd {},
        ]
    );
}
