//! Tests for config loading and environment overrides

mod common;

use common::Fixture;
use ontoweave::config::{Config, Dbms, ValidationMode};
use serial_test::serial;

fn clear_env() {
    for key in [
        "ONTOWEAVE_DBMS",
        "ONTOWEAVE_OUTPUT_DIR",
        "ONTOWEAVE_VALIDATION_MODE",
        "ONTOWEAVE_LOG_LEVEL",
        "ONTOWEAVE_LOG_FORMAT",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn test_fixture_config_loads() {
    let fixture = Fixture::new("postgresql", "");
    let config = fixture.config();

    assert_eq!(config.ontoweave.dbms, Dbms::Postgresql);
    assert_eq!(config.ontoweave.schema_config_path, fixture.schema_path);
    assert!(config.validate().is_ok());

    let writer = config.writer_settings().unwrap();
    assert_eq!(writer.delimiter, '\t');
    assert_eq!(writer.database_name, "postgres");
}

#[test]
fn test_missing_file_names_path() {
    let err = Config::from_file("does/not/exist.yaml".as_ref()).unwrap_err();
    assert!(format!("{err:#}").contains("does/not/exist.yaml"));
}

#[test]
fn test_unknown_dbms_rejected() {
    assert!(Config::from_yaml_str("ontoweave:\n  dbms: mongodb\n").is_err());
}

#[test]
fn test_unknown_rdf_format_rejected() {
    let config =
        Config::from_yaml_str("ontoweave:\n  dbms: owl\nrdf:\n  rdf_format: json-ld\n").unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_backend_section_overrides_defaults() {
    let config = Config::from_yaml_str(
        "ontoweave:\n  dbms: csv\ncsv:\n  delimiter: '\\t'\n  quote_character: \"'\"\n  batch_size: 50\n",
    )
    .unwrap();
    let writer = config.writer_settings().unwrap();
    assert_eq!(writer.delimiter, '\t');
    assert_eq!(writer.quote, '\'');
    assert_eq!(writer.batch_size, 50);
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_env();
    std::env::set_var("ONTOWEAVE_DBMS", "sqlite");
    std::env::set_var("ONTOWEAVE_OUTPUT_DIR", "/tmp/ontoweave-env");
    std::env::set_var("ONTOWEAVE_VALIDATION_MODE", "none");

    let mut config =
        Config::from_yaml_str("ontoweave:\n  dbms: neo4j\n  strict_mode: true\n").unwrap();
    config.apply_env_overrides().unwrap();
    clear_env();

    assert_eq!(config.ontoweave.dbms, Dbms::Sqlite);
    assert_eq!(
        config.ontoweave.output_directory,
        std::path::PathBuf::from("/tmp/ontoweave-env")
    );
    // the environment wins over the legacy switch
    assert_eq!(config.validation_mode(), ValidationMode::None);
}

#[test]
#[serial]
fn test_invalid_env_override_is_an_error() {
    clear_env();
    std::env::set_var("ONTOWEAVE_VALIDATION_MODE", "lenient");

    let mut config = Config::default();
    let result = config.apply_env_overrides();
    clear_env();

    assert!(result.is_err());
}
