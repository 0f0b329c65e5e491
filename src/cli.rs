use clap::{Parser, Subcommand, ValueEnum};

// Display order for log level option (placed at end of help text)
const LOG_LEVEL_DISPLAY_ORDER: usize = 100;

/// CLI arguments
#[derive(Parser)]
#[command(name = "spanmerge", version, about = "Consolidates overlapping style-check violations", long_about = None)]
pub struct Cli {
    /// Log level (see https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
    /// [env: SPANMERGE_LOG=] [default: info]
    #[arg(
        long,
        env = "SPANMERGE_LOG",
        default_value = "info",
        global = true,
        hide_default_value = true,
        hide_env = true,
        display_order = LOG_LEVEL_DISPLAY_ORDER,
        verbatim_doc_comment
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Consolidate the violations of one or more documents
    Consolidate(ConsolidateArgs),
    /// Write the built-in priority config to a file
    Init(InitArgs),
    /// Print the JSON Schema of violations or of the priority config
    Schema(SchemaArgs),
}

/// Arguments for the consolidate command
#[derive(Parser, Debug)]
pub struct ConsolidateArgs {
    /// Violation files: a JSON array or an object with a "violations" array
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Priority config (.yaml, .toml or .json); built-in defaults when omitted
    #[arg(long)]
    pub config: Option<String>,

    /// Override config values using dot notation (e.g. severity_escalation.multiple_medium=medium)
    #[arg(long = "config-override")]
    pub config_overrides: Vec<String>,

    /// Output file path (.md or .json)
    #[arg(long)]
    pub output: Option<String>,

    /// Maximum number of documents consolidated at once [default: unlimited]
    #[arg(long)]
    pub max_parallel_workers: Option<usize>,
}

/// Arguments for the init command
#[derive(Parser)]
pub struct InitArgs {
    /// Path to config file; the extension picks the format
    #[arg(long, default_value = "spanmerge.yaml")]
    pub config: String,

    /// Override existing config file
    #[arg(long)]
    pub r#override: bool,
}

/// Arguments for the schema command
#[derive(Parser)]
pub struct SchemaArgs {
    /// Which schema to print
    #[arg(value_enum, default_value_t = SchemaTarget::Violation)]
    pub target: SchemaTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaTarget {
    Violation,
    Config,
}
