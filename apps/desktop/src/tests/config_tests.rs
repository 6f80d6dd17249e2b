use super::{apply_env, apply_file, load_settings, Settings};

use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_dir(label: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("transport_console_{label}_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    dir
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        "server_url = \"http://transport.local:9000\"\nlog_filter = \"debug\"\n",
    )
    .expect("parse");

    assert_eq!(settings.server_url, "http://transport.local:9000");
    assert_eq!(settings.log_filter, "debug");
}

#[test]
fn app_prefixed_env_wins_over_plain_env() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("TRANSPORT_SERVER_URL", "http://plain:1"),
        ("APP__SERVER_URL", "http://prefixed:2"),
        ("TRANSPORT_LOG_FILTER", "warn"),
    ]);
    let mut settings = Settings::default();
    apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.server_url, "http://prefixed:2");
    assert_eq!(settings.log_filter, "warn");
}

#[test]
fn malformed_file_is_reported() {
    let dir = temp_dir("bad");
    let path = dir.join("console.toml");
    fs::write(&path, "server_url = [").expect("write");

    let err = load_settings(Some(&path)).expect_err("bad toml");
    assert!(err.to_string().contains("failed to parse config file"));

    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = temp_dir("missing");
    let path = dir.join("nope.toml");

    assert!(load_settings(Some(&path)).is_err());

    fs::remove_dir_all(dir).expect("cleanup");
}
