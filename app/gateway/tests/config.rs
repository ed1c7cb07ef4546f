//! Configuration loading tests.

use dataagent_gateway::{GatewayConfig, Mode};

#[test]
fn empty_config_uses_defaults() {
    let config = GatewayConfig::from_toml("").unwrap();
    assert_eq!(config.bind_address(), "127.0.0.1:8000");
    assert_eq!(config.listing.max_items, 100);
    assert_eq!(config.agent.mode, Mode::Batch);
    assert!(config.agent.lazy_init);
    assert!(!config.agent.fallback.is_empty());
    assert!(config.llm.is_none());
}

#[test]
fn full_config_parses() {
    let config = GatewayConfig::from_toml(
        r#"
[server]
host = "0.0.0.0"
port = 9100

[listing]
max_items = 10

[agent]
mode = "stream"
fallback = "nothing to say"
lazy_init = false
prompt = "You analyse data."

[llm]
base_url = "http://localhost:8000/v1"
model = "smolvlm"
api_key = "${DATAAGENT_TEST_UNSET_KEY}"
max_tokens = 512
temperature = 0.2
"#,
    )
    .unwrap();

    assert_eq!(config.bind_address(), "0.0.0.0:9100");
    assert_eq!(config.listing.max_items, 10);
    assert_eq!(config.agent.mode, Mode::Stream);
    assert_eq!(config.agent.fallback, "nothing to say");
    assert!(!config.agent.lazy_init);

    let llm = config.llm.unwrap();
    assert_eq!(llm.model, "smolvlm");
    assert_eq!(llm.api_key, "");
    assert_eq!(llm.max_tokens, Some(512));
}

#[test]
fn unknown_mode_is_rejected() {
    assert!(GatewayConfig::from_toml("[agent]\nmode = \"turbo\"").is_err());
}

#[test]
fn load_reads_file_and_falls_back_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gateway.toml");

    let config = GatewayConfig::load(&path).unwrap();
    assert_eq!(config.server.port, 8000);

    std::fs::write(&path, "[server]\nport = 0\n").unwrap();
    let config = GatewayConfig::load(&path).unwrap();
    assert_eq!(config.server.port, 0);

    std::fs::write(&path, "[server\n").unwrap();
    assert!(GatewayConfig::load(&path).is_err());
}

#[test]
fn separators_follow_mode() {
    assert_eq!(Mode::Batch.separator(), " ");
    assert_eq!(Mode::Stream.separator(), "\n");
}
