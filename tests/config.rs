use std::io::Write;

use assert_matches::assert_matches;

use dexproxy::config::{Config, ConfigLoader, SearchSection};
use dexproxy::error::DexError;

#[test]
fn explicit_config_file_overrides_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "schema_version": 1,
            "upstream": {{"base_url": "http://127.0.0.1:9999/api/v2/", "timeout_secs": 5}},
            "search": {{"max_results": 10}},
            "language": "de"
        }}"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap();
    let resolved = ConfigLoader::resolve(Some(path)).unwrap();
    assert_eq!(resolved.upstream.base_url, "http://127.0.0.1:9999/api/v2");
    assert_eq!(resolved.upstream.timeout_secs, 5);
    assert!(resolved.upstream.user_agent.starts_with("dexproxy/"));
    assert_eq!(resolved.search.max_results, 10);
    assert_eq!(resolved.search.index_limit, 1500);
    assert_eq!(resolved.language, "de");
}

#[test]
fn missing_explicit_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, DexError::ConfigRead(_));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    let err = ConfigLoader::resolve(file.path().to_str()).unwrap_err();
    assert_matches!(err, DexError::ConfigParse(_));
}

#[test]
fn zero_max_results_is_rejected() {
    let config = Config {
        search: Some(SearchSection {
            max_results: Some(0),
            index_limit: None,
        }),
        ..Default::default()
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, DexError::ConfigParse(_));
}

#[test]
fn max_results_above_cap_is_rejected() {
    let config: Config = serde_json::from_str(r#"{"search": {"max_results": 80}}"#).unwrap();
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, DexError::ConfigParse(_));

    let config: Config = serde_json::from_str(r#"{"search": {"max_results": 50}}"#).unwrap();
    assert_eq!(ConfigLoader::resolve_config(config).unwrap().search.max_results, 50);
}

#[test]
fn non_http_base_url_is_rejected() {
    let config: Config =
        serde_json::from_str(r#"{"upstream": {"base_url": "ftp://example.test"}}"#).unwrap();
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, DexError::ConfigParse(_));
}
