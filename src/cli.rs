use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::aggregate::DEFAULT_TOP_N;

#[derive(Parser, Debug)]
#[command(
    name = "pipeconsole",
    version,
    about = "Operator console for the mail analysis pipeline service"
)]
pub struct Cli {
    #[command(flatten)]
    pub service: ServiceArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    #[arg(
        long,
        global = true,
        env = "PIPECONSOLE_API_BASE",
        default_value = "http://localhost:8000"
    )]
    pub api_base: String,

    #[arg(long, global = true, default_value_t = 30_000)]
    pub timeout_ms: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Config(ConfigArgs),
    Files(FilesArgs),
    Run(RunArgs),
    Summarize(SummarizeArgs),
    Insight(InsightArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    Show(ConfigShowArgs),
    Edit(ConfigEditArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConfigShowArgs {
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Print one field as pretty JSON block text instead of the overview.
    #[arg(long, conflicts_with = "json")]
    pub block: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigEditArgs {
    #[arg(long = "add-step")]
    pub add_steps: Vec<String>,

    #[arg(long = "remove-step")]
    pub remove_steps: Vec<String>,

    /// Reorder a step, as FROM:TO (zero-based positions).
    #[arg(long = "move-step")]
    pub move_steps: Vec<String>,

    /// Set one row of a mapping field, as FIELD:KEY=VALUE.
    #[arg(long = "row")]
    pub rows: Vec<String>,

    /// Remove one row of a mapping field, as FIELD:KEY.
    #[arg(long = "remove-row")]
    pub remove_rows: Vec<String>,

    /// Replace every row of a mapping field from a file of KEY=VALUE lines, as FIELD=PATH.
    #[arg(long = "rows-file")]
    pub rows_files: Vec<String>,

    /// Replace a whole field from a JSON file, as FIELD=PATH.
    #[arg(long = "block")]
    pub blocks: Vec<String>,

    #[arg(long = "add-category")]
    pub add_categories: Vec<String>,

    #[arg(long = "remove-category")]
    pub remove_categories: Vec<String>,

    /// CATEGORY=KEYWORD
    #[arg(long = "add-keyword")]
    pub add_keywords: Vec<String>,

    /// CATEGORY=KEYWORD
    #[arg(long = "remove-keyword")]
    pub remove_keywords: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FilesArgs {
    #[command(subcommand)]
    pub command: FilesCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum FilesCommand {
    List,
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    Delete {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long)]
    pub output_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SummarizeArgs {
    #[arg(long)]
    pub results_path: PathBuf,

    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InsightArgs {
    #[arg(long)]
    pub keyword: String,

    #[arg(long)]
    pub count: u64,

    #[arg(long)]
    pub ratio: f64,

    /// Keyword category; without it the keyword is treated as a class label.
    #[arg(long)]
    pub category: Option<String>,
}
