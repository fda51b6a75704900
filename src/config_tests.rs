//! Unit tests for session configuration.

use super::*;
use rstest::rstest;

const SESSION: &str = r#"
output_dir = "dist"
version = "3"
extract_from_models = false

[weights]
adapter = "adapter.safetensors"

[metadata]
author = "Jane Doe"
email = "jane@example.org"
adapter_url_template = "https://example.org/{file}"

[defaults]
task = "sst"
subtask = "sst-2"

[adapters."bert-sst"]
config_name = "pfeiffer"

[adapters."runs/bert-sst"]
subtask = "sst-5"
"#;

fn session() -> PackConfig {
    PackConfig::from_toml_str(SESSION).expect("session parses")
}

#[rstest]
fn parses_all_tables() {
    let config = session();

    assert_eq!(config.output_dir, Some(Utf8PathBuf::from("dist")));
    assert_eq!(config.extract_from_models, Some(false));
    assert_eq!(config.weights.file_names().adapter, "adapter.safetensors");
    assert_eq!(config.weights.file_names().model, "pytorch_model.bin");
    assert_eq!(
        config.metadata.url_template(),
        Some("https://example.org/{file}")
    );
    assert_eq!(config.adapters.len(), 2);
}

#[rstest]
#[case::unknown_top_level("colour = \"red\"\n")]
#[case::unknown_field_in_defaults("[defaults]\nlanguage = \"en\"\n")]
#[case::wrong_type("version = 3\n")]
fn rejects_invalid_sessions(#[case] text: &str) {
    assert!(PackConfig::from_toml_str(text).is_err());
}

#[rstest]
#[case::no_match("checkpoints/roberta", None, Some("sst-2"))]
#[case::single_component("checkpoints/bert-sst", Some("pfeiffer"), Some("sst-2"))]
#[case::longest_key_wins("checkpoints/runs/bert-sst", None, Some("sst-5"))]
fn fields_for_overlays_matching_adapter(
    #[case] dir: &str,
    #[case] config_name: Option<&str>,
    #[case] subtask: Option<&str>,
) {
    let fields = session().fields_for(Path::new(dir));

    assert_eq!(fields.task.as_deref(), Some("sst"));
    assert_eq!(fields.config_name.as_deref(), config_name);
    assert_eq!(fields.subtask.as_deref(), subtask);
}

#[test]
fn partial_component_does_not_match() {
    let fields = session().fields_for(Path::new("checkpoints/old-bert-sst"));
    assert_eq!(fields.config_name, None);
}

#[test]
fn metadata_fills_blanks_from_fallback() {
    let own = MetadataConfig {
        author: Some("Jane".to_owned()),
        email: Some("  ".to_owned()),
        ..MetadataConfig::default()
    };
    let cached = MetadataConfig {
        author: Some("Cached".to_owned()),
        email: Some("cached@example.org".to_owned()),
        github: Some("cached-gh".to_owned()),
        ..MetadataConfig::default()
    };

    let merged = own.filled_from(&cached);

    assert_eq!(merged.author.as_deref(), Some("Jane"));
    assert_eq!(merged.email.as_deref(), Some("cached@example.org"));
    assert_eq!(merged.github.as_deref(), Some("cached-gh"));
    assert_eq!(merged.url, None);
}

#[test]
fn metadata_record_requires_author_or_email() {
    assert!(MetadataConfig::default().record().is_none());
    assert!(MetadataConfig::default().is_empty());

    let record = MetadataConfig {
        email: Some("a@x.com".to_owned()),
        twitter: Some(String::new()),
        ..MetadataConfig::default()
    }
    .record()
    .expect("email is enough");
    assert_eq!(record.author, "");
    assert_eq!(record.email, "a@x.com");
    assert_eq!(record.twitter, None);
}

#[rstest]
fn cli_flags_override_session() {
    let cli = Cli {
        paths: vec![Utf8PathBuf::from("checkpoints")],
        output_dir: Some(Utf8PathBuf::from("elsewhere")),
        template: Some(Utf8PathBuf::from("card.yaml")),
        ..Cli::default()
    };

    let settings = RunSettings::resolve(&cli, &session());

    assert_eq!(settings.output_dir, PathBuf::from("elsewhere"));
    assert_eq!(settings.version, "3");
    assert_eq!(settings.template, TemplateSource::Local(PathBuf::from("card.yaml")));
    assert!(!settings.include_models);
}

#[rstest]
fn defaults_apply_without_session() {
    let cli = Cli {
        paths: vec![Utf8PathBuf::from("checkpoints")],
        ..Cli::default()
    };

    let settings = RunSettings::resolve(&cli, &PackConfig::default());

    assert_eq!(settings.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    assert_eq!(settings.version, DEFAULT_VERSION);
    assert_eq!(settings.template, TemplateSource::default());
    assert!(settings.include_models);
}

#[rstest]
fn no_extract_flag_disables_model_scan() {
    let cli = Cli {
        paths: vec![Utf8PathBuf::from("checkpoints")],
        no_extract: true,
        ..Cli::default()
    };

    assert!(!RunSettings::resolve(&cli, &PackConfig::default()).include_models);
}
