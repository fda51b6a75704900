//! Tests for the CLI run flow.

use super::*;
use adapterpack::error::CliError;
use adapterpack_packer::artefact::template_source::FetchError;
use adapterpack_packer::error::SetupError;
use adapterpack_packer::fingerprint::known_variants;
use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const TEMPLATE: &str = "title: ''\nauthor: ''\nemail: ''\nmodel_name: ''\nconfig: {}\nfiles: []\n";

/// Serves one fixed template.
struct StaticFetcher;

impl TemplateFetcher for StaticFetcher {
    fn fetch(&self, _url: &str) -> std::result::Result<String, FetchError> {
        Ok(TEMPLATE.to_owned())
    }
}

/// Fails every download.
struct OfflineFetcher;

impl TemplateFetcher for OfflineFetcher {
    fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
        Err(FetchError::Http {
            url: url.to_owned(),
            reason: "offline".to_owned(),
        })
    }
}

struct TestBaseDirs {
    cache_dir: Option<PathBuf>,
}

impl BaseDirs for TestBaseDirs {
    fn cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir.clone()
    }
}

struct Fixture {
    temp: TempDir,
    dirs: TestBaseDirs,
}

impl Fixture {
    fn path(&self, relative: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.temp.path().join(relative)).expect("utf-8 temp path")
    }

    fn cli(&self) -> Cli {
        Cli {
            paths: vec![self.path("checkpoints")],
            output_dir: Some(self.path("dist")),
            quiet: true,
            ..Cli::default()
        }
    }
}

#[fixture]
fn fixture() -> Fixture {
    let temp = TempDir::new().expect("temp dir");
    let dirs = TestBaseDirs {
        cache_dir: Some(temp.path().join("cache")),
    };
    let adapter = temp.path().join("checkpoints").join("bert-sst");
    fs::create_dir_all(&adapter).expect("mkdir adapter");
    fs::write(adapter.join("pytorch_adapter.bin"), b"weights").expect("write weights");
    let config = known_variants()
        .into_iter()
        .find(|(name, _)| *name == "pfeiffer")
        .map(|(_, config)| config)
        .expect("pfeiffer is known");
    let document = serde_json::json!({"model_name": "bert-base-uncased", "config": config});
    fs::write(
        adapter.join("adapter_config.json"),
        serde_json::to_string(&document).expect("serialize"),
    )
    .expect("write config");
    fs::write(
        temp.path().join("session.toml"),
        concat!(
            "[metadata]\nauthor = \"A\"\nemail = \"a@x.com\"\n\n",
            "[defaults]\ntask = \"sst\"\nsubtask = \"sst-2\"\n",
        ),
    )
    .expect("write session");
    Fixture { temp, dirs }
}

fn cache_file(fixture: &Fixture) -> PathBuf {
    fixture.temp.path().join("cache").join("pack_metadata.json")
}

#[rstest]
fn packs_adapters_and_remembers_metadata(fixture: Fixture) {
    let cli = Cli {
        session: Some(fixture.path("session.toml")),
        ..fixture.cli()
    };
    let mut stderr = Vec::new();

    let outcome = run(&cli, &fixture.dirs, &StaticFetcher, &mut stderr).expect("run succeeds");

    let result = match outcome {
        Outcome::Packed(result) => result,
        other => panic!("expected a packaging run, got {other:?}"),
    };
    assert!(result.is_success(), "failures: {:?}", result.failed);
    assert!(
        fixture
            .path("dist/bert-base-uncased_sst_sst-2_pfeiffer.zip")
            .is_file()
    );
    let cached = metadata_cache::load(&cache_file(&fixture)).expect("cache readable");
    assert_eq!(cached.metadata.author.as_deref(), Some("A"));
    let text = String::from_utf8(stderr).expect("utf-8");
    assert!(text.contains("Packed 1 of 1 adapter(s)"));
}

#[rstest]
fn cached_metadata_fills_missing_session(fixture: Fixture) {
    let cache = cache_file(&fixture);
    metadata_cache::save(
        &cache,
        &MetadataConfig {
            author: Some("Cached Author".to_owned()),
            email: Some("cached@x.com".to_owned()),
            ..MetadataConfig::default()
        },
    )
    .expect("seed cache");
    fs::write(
        fixture.temp.path().join("session.toml"),
        "[defaults]\ntask = \"sst\"\nsubtask = \"sst-2\"\n",
    )
    .expect("rewrite session");
    let cli = Cli {
        session: Some(fixture.path("session.toml")),
        ..fixture.cli()
    };

    run(&cli, &fixture.dirs, &StaticFetcher, &mut Vec::new()).expect("run succeeds");

    let card = fs::read_to_string(fixture.path("dist/bert-base-uncased_sst_sst-2_pfeiffer.yaml"))
        .expect("card written");
    assert!(card.contains("Cached Author"));
}

#[rstest]
fn missing_task_fails_the_adapter_with_exit_code_two(fixture: Fixture) {
    let mut stderr = Vec::new();

    let result = run(&fixture.cli(), &fixture.dirs, &StaticFetcher, &mut stderr);

    assert_eq!(exit_code_for_run_result(result, &mut stderr), 2);
    let text = String::from_utf8(stderr).expect("utf-8");
    assert!(text.contains("missing required configuration field `task`"));
}

#[rstest]
fn dry_run_writes_nothing(fixture: Fixture) {
    let cli = Cli {
        dry_run: true,
        ..fixture.cli()
    };

    let outcome = run(&cli, &fixture.dirs, &OfflineFetcher, &mut Vec::new()).expect("dry run");

    assert!(matches!(outcome, Outcome::DryRun));
    assert!(!fixture.path("dist").exists());
}

#[rstest]
fn empty_scan_packs_nothing(fixture: Fixture) {
    let cli = Cli {
        paths: vec![fixture.path("nowhere")],
        ..fixture.cli()
    };

    let outcome = run(&cli, &fixture.dirs, &OfflineFetcher, &mut Vec::new()).expect("run");

    assert!(matches!(outcome, Outcome::NothingToPack));
    assert_eq!(exit_code_for_run_result(Ok(outcome), &mut Vec::new()), 0);
}

#[rstest]
fn unreachable_template_is_fatal(fixture: Fixture) {
    let mut stderr = Vec::new();

    let result = run(&fixture.cli(), &fixture.dirs, &OfflineFetcher, &mut stderr);

    assert!(matches!(
        result,
        Err(CliError::Setup(SetupError::TemplateFetch(_)))
    ));
    assert_eq!(exit_code_for_run_result(result, &mut stderr), 1);
    let text = String::from_utf8(stderr).expect("utf-8");
    assert!(text.starts_with("error: failed to fetch manifest template"));
    assert!(!fixture.path("dist").exists());
}

#[rstest]
fn invalid_session_file_is_fatal(fixture: Fixture) {
    fs::write(fixture.temp.path().join("session.toml"), "colour = 1\n").expect("write");
    let cli = Cli {
        session: Some(fixture.path("session.toml")),
        ..fixture.cli()
    };

    let result = run(&cli, &fixture.dirs, &StaticFetcher, &mut Vec::new());

    assert!(matches!(result, Err(CliError::Config(_))));
}

#[test]
fn missing_cache_dir_does_not_stop_the_run() {
    let dirs = TestBaseDirs { cache_dir: None };
    let own = MetadataConfig {
        author: Some("A".to_owned()),
        ..MetadataConfig::default()
    };

    assert_eq!(resolve_metadata(&own, &dirs), own);
    remember_metadata(&own, &dirs);
}

#[test]
fn exit_code_is_zero_for_clean_batch() {
    let mut stderr = Vec::new();
    let code = exit_code_for_run_result(Ok(Outcome::Packed(BatchResult::default())), &mut stderr);
    assert_eq!(code, 0);
    assert!(stderr.is_empty());
}
