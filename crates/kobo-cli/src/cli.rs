//! CLI argument definitions for the submission converter.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "kobo-convert",
    version,
    about = "Convert flat survey table exports into Kobo submission XML",
    long_about = "Convert flat survey table exports (one main table plus child tables\n\
                  linked by submission UUID) into KoboToolbox submission XML documents,\n\
                  resolving display labels to canonical codes along the way."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert a folder of table exports into submission XML documents.
    Convert(ConvertArgs),

    /// Print the normalized field mapping for debugging mapping files.
    Inspect(InspectArgs),
}

#[derive(Parser)]
pub struct ConvertArgs {
    /// Folder containing the CSV exports (data.csv plus child tables).
    #[arg(value_name = "DATA_FOLDER")]
    pub data_dir: PathBuf,

    /// Path to the JSON field mapping file.
    #[arg(long = "mapping", value_name = "PATH")]
    pub mapping: PathBuf,

    /// Form identity; becomes the document root element and its id attribute.
    #[arg(long = "form-id", value_name = "ID")]
    pub form_id: String,

    /// Form version marker emitted as the __version__ element.
    #[arg(long = "version-id", value_name = "ID")]
    pub version_id: String,

    /// Root version attribute (default: derived from the current time).
    #[arg(long = "form-version", value_name = "VERSION")]
    pub form_version: Option<String>,

    /// formhub UUID of the target form. Must match the form on the server
    /// or submissions route to the wrong project.
    #[arg(long = "formhub-uuid", value_name = "UUID")]
    pub formhub_uuid: Option<String>,

    /// Convert only the record with this submission UUID.
    #[arg(long = "uuid", value_name = "UUID")]
    pub uuid: Option<String>,

    /// Output directory for XML documents (default: <DATA_FOLDER>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Field to validate against its choice table (repeatable; default:
    /// parish, community).
    #[arg(long = "validated-field", value_name = "FIELD")]
    pub validated_fields: Vec<String>,

    /// Write the findings summary as JSON to this path.
    #[arg(long = "findings-report", value_name = "PATH")]
    pub findings_report: Option<PathBuf>,

    /// Convert and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Path to the JSON field mapping file.
    #[arg(value_name = "MAPPING")]
    pub mapping: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
