//! `adapterpack` CLI entrypoint.
//!
//! Scans the given paths for adapters, packages each one into a zip archive
//! and YAML info card, and prints a summary. Exits with 1 when the run could
//! not start and with 2 when some adapters failed.

use adapterpack::cli::Cli;
use adapterpack::config::{MetadataConfig, PackConfig, RunSettings};
use adapterpack::dirs::{BaseDirs, SystemBaseDirs};
use adapterpack::error::Result;
use adapterpack::metadata_cache;
use adapterpack::output::{NEXT_STEPS, batch_summary, scan_report, write_stderr_line};
use adapterpack_packer::artefact::template_source::{HttpFetcher, TemplateFetcher, load_template};
use adapterpack_packer::fingerprint::ConfigRegistry;
use adapterpack_packer::orchestrator::{
    BatchResult, PackSession, pack_directories, prepare_output_dir,
};
use adapterpack_packer::scanner::{ScanResult, scan};
use clap::Parser;
use log::{info, warn};
use std::io::Write;
use tracing_subscriber::EnvFilter;

/// How a run that did not fail ended.
#[derive(Debug)]
enum Outcome {
    /// Adapters were packaged; some may have failed.
    Packed(BatchResult),
    /// The scan found no adapters.
    NothingToPack,
    /// Dry run; nothing was written.
    DryRun,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &SystemBaseDirs::new(), &HttpFetcher, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Install the log backend. `RUST_LOG` takes precedence over `-v`.
fn init_logging(cli: &Cli) {
    let default_level = match (cli.quiet, cli.verbosity) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        // A subscriber is already installed.
    }
}

fn run(
    cli: &Cli,
    dirs: &dyn BaseDirs,
    fetcher: &dyn TemplateFetcher,
    stderr: &mut dyn Write,
) -> Result<Outcome> {
    let config = match &cli.session {
        Some(path) => PackConfig::load_from_path(path)?,
        None => PackConfig::default(),
    };
    let settings = RunSettings::resolve(cli, &config);

    let found = scan(
        &settings.inputs,
        &config.weights.file_names(),
        settings.include_models,
    );
    report_scan(&settings, &found, stderr);

    if settings.dry_run {
        write_stderr_line(stderr, "Dry run - no files will be written");
        write_stderr_line(
            stderr,
            format!("Output directory: {}", settings.output_dir.display()),
        );
        write_stderr_line(stderr, format!("Version: {}", settings.version));
        return Ok(Outcome::DryRun);
    }
    if found.adapter_dirs.is_empty() {
        write_stderr_line(stderr, "No adapters found.");
        return Ok(Outcome::NothingToPack);
    }

    let template = load_template(&settings.template, fetcher)?;
    prepare_output_dir(&settings.output_dir)?;
    let metadata = resolve_metadata(&config.metadata, dirs);

    let session = PackSession {
        template,
        metadata: metadata.record(),
        version: settings.version.clone(),
        url_template: metadata.url_template().map(str::to_owned),
        output_dir: settings.output_dir.clone(),
    };
    if session.metadata.is_none() {
        warn!("no author or email configured; info cards keep the template values");
    }

    if !settings.quiet {
        write_stderr_line(
            stderr,
            format!("Packing {} adapter(s)...", found.adapter_dirs.len()),
        );
    }
    let registry = ConfigRegistry::with_known_variants();
    let fields_for = |dir: &std::path::Path| config.fields_for(dir);
    let result = pack_directories(&found.adapter_dirs, &fields_for, &registry, &session);

    remember_metadata(&metadata, dirs);
    report_result(&settings, &result, stderr);
    Ok(Outcome::Packed(result))
}

fn report_scan(settings: &RunSettings, found: &ScanResult, stderr: &mut dyn Write) {
    if !settings.quiet {
        for line in scan_report(found) {
            write_stderr_line(stderr, line);
        }
    }
    if !found.model_dirs.is_empty() {
        warn!(
            "{} model checkpoint(s) found; extracting their adapters needs the training framework, skipping",
            found.model_dirs.len()
        );
    }
}

fn report_result(settings: &RunSettings, result: &BatchResult, stderr: &mut dyn Write) {
    write_stderr_line(stderr, "");
    for line in batch_summary(result, &settings.output_dir) {
        write_stderr_line(stderr, line);
    }
    if !settings.quiet && !result.succeeded.is_empty() {
        write_stderr_line(stderr, "");
        write_stderr_line(stderr, "Next steps for publishing on AdapterHub:");
        for step in NEXT_STEPS {
            write_stderr_line(stderr, step);
        }
    }
}

/// Session metadata with blanks filled from the cache of the last run.
fn resolve_metadata(own: &MetadataConfig, dirs: &dyn BaseDirs) -> MetadataConfig {
    let cached = metadata_cache::cache_path(dirs).and_then(|path| metadata_cache::load(&path));
    match cached {
        Ok(cached) => {
            if cached.recovered_from_corrupt_file {
                warn!("ignoring malformed metadata cache");
            }
            own.filled_from(&cached.metadata)
        }
        Err(err) => {
            warn!("metadata cache unavailable: {err}");
            own.clone()
        }
    }
}

fn remember_metadata(metadata: &MetadataConfig, dirs: &dyn BaseDirs) {
    if metadata.is_empty() {
        return;
    }
    let saved = metadata_cache::cache_path(dirs).and_then(|path| {
        metadata_cache::save(&path, metadata)?;
        Ok(path)
    });
    match saved {
        Ok(path) => info!("remembered metadata in {}", path.display()),
        Err(err) => warn!("could not remember metadata: {err}"),
    }
}

fn exit_code_for_run_result(result: Result<Outcome>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(Outcome::Packed(batch)) if !batch.is_success() => 2,
        Ok(_) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
