//! User-facing progress and summary text.

use adapterpack_packer::orchestrator::BatchResult;
use adapterpack_packer::scanner::ScanResult;
use std::io::Write;
use std::path::Path;

/// Steps left to the author once the files exist.
pub const NEXT_STEPS: [&str; 4] = [
    "-> Upload the created zip archives to your server.",
    "-> Add the download links to the respective YAML info cards.",
    "-> Add a description and citation to your info cards.",
    "-> Open a pull request to https://github.com/adapter-hub/Hub to add your info cards.",
];

/// Write one line, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Lines listing what the scan found.
#[must_use]
pub fn scan_report(scan: &ScanResult) -> Vec<String> {
    let models = scan
        .model_dirs
        .iter()
        .map(|dir| format!("Model in {}", dir.display()));
    let adapters = scan
        .adapter_dirs
        .iter()
        .map(|dir| format!("Adapter in {}", dir.display()));
    models.chain(adapters).collect()
}

/// Lines summarising a packaging run.
#[must_use]
pub fn batch_summary(result: &BatchResult, output_dir: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Packed {} of {} adapter(s) into {}",
        result.succeeded.len(),
        result.total(),
        output_dir.display()
    )];
    lines.extend(
        result
            .succeeded
            .iter()
            .map(|packaged| format!("  ok      {}", packaged.name)),
    );
    lines.extend(
        result
            .failed
            .iter()
            .map(|failure| format!("  failed  {}: {}", failure.artifact, failure.reason)),
    );
    lines
}
