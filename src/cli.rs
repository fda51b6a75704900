//! CLI argument definitions for `adapterpack`.
//!
//! Flags override the values of the session file given with `--session`.

use camino::Utf8PathBuf;
use clap::Parser;

/// Pack trained adapters into archives and registry info cards.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "adapterpack")]
#[command(about)]
#[command(long_about = concat!(
    "Pack trained adapters into archives and registry info cards.\n\n",
    "Every directory below the given paths that holds adapter weights is ",
    "packaged into a zip archive together with a YAML info card listing the ",
    "archive's SHA-1 and SHA-256 digests. Values an interactive tool would ask ",
    "for (task, subtask, author, ...) come from a TOML session file.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Pack every adapter below ./checkpoints:\n",
    "    $ adapterpack checkpoints --session pack.toml\n\n",
    "  Preview what would be packed:\n",
    "    $ adapterpack checkpoints --dry-run\n\n",
    "  Use a local info card template:\n",
    "    $ adapterpack checkpoints --template adapter.template.yaml -o dist",
))]
pub struct Cli {
    /// Directories holding pre-trained models or adapters.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<Utf8PathBuf>,

    /// Directory receiving the archives and info cards [default: .PACK_OUTPUT].
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<Utf8PathBuf>,

    /// Local YAML file to use as the info card template.
    #[arg(long, value_name = "FILE")]
    pub template: Option<Utf8PathBuf>,

    /// Version label written to the info cards [default: 1].
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// TOML session file with metadata and per-adapter fields.
    #[arg(long, value_name = "FILE")]
    pub session: Option<Utf8PathBuf>,

    /// Do not look for full model checkpoints.
    #[arg(long)]
    pub no_extract: bool,

    /// Report what would be packed and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors and the summary are still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}
