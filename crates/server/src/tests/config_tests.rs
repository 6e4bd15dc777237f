use super::*;

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn empty_database_url_falls_back_to_default() {
    assert_eq!(normalize_database_url("  "), Settings::default().database_url);
}

#[test]
fn keeps_memory_url_untouched() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn creates_parent_dir_for_sqlite_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("data").join("test.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.path().join("data").exists());
}

#[test]
fn missing_file_and_env_yield_defaults() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let settings = load_settings_from(&temp_root.path().join("absent.toml"), env_from(&[]));
    assert_eq!(settings.server_bind, "127.0.0.1:5000");
    assert_eq!(settings.token_ttl_minutes, 120);
    assert_eq!(settings.jwt_secret, DEFAULT_JWT_SECRET);
}

#[test]
fn file_values_are_overridden_by_env() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let path = temp_root.path().join("server.toml");
    fs::write(
        &path,
        "bind_addr = \"0.0.0.0:9000\"\nworker_count = 4\njwt_secret = \"from-file\"\n",
    )
    .expect("write settings");

    let settings = load_settings_from(
        &path,
        env_from(&[("APP__JWT_SECRET", "from-env"), ("APP__WORKER_TICK_MS", "250")]),
    );
    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.worker_count, 4);
    assert_eq!(settings.jwt_secret, "from-env");
    assert_eq!(settings.worker_pool().tick, Duration::from_millis(250));
}

#[test]
fn unparsable_numeric_env_is_ignored() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let settings = load_settings_from(
        &temp_root.path().join("absent.toml"),
        env_from(&[("APP__TOKEN_TTL_MINUTES", "soon")]),
    );
    assert_eq!(settings.jwt().ttl_minutes, 120);
}

#[test]
fn zero_worker_count_still_yields_one_worker() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let settings = load_settings_from(
        &temp_root.path().join("absent.toml"),
        env_from(&[("APP__WORKER_COUNT", "0"), ("APP__WORKER_TICK_MS", "0")]),
    );
    assert_eq!(settings.worker_count, 0);
    let pool = settings.worker_pool();
    assert_eq!(pool.worker_count, 1);
    assert_eq!(pool.tick, Duration::from_millis(1));
}
