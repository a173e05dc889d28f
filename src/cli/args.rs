//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};

/// Business object hierarchy service: 'Bo List' + 'Relations' workbook -> JSON forest
#[derive(Parser, Debug)]
#[command(name = "bograph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log level (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Local config file (default: ./bograph.toml if present)
    #[arg(short, long, global = true, env = "BOGRAPH_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the upload server
    Serve {
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to bind
        #[arg(short, long)]
        port: Option<u16>,
        /// Directory served as static files
        #[arg(long, value_hint = ValueHint::DirPath)]
        static_dir: Option<PathBuf>,
        /// Directory for temporary upload files
        #[arg(long, value_hint = ValueHint::DirPath)]
        upload_dir: Option<PathBuf>,
    },

    /// Print the hierarchy of a local workbook
    Parse {
        /// Workbook file (xlsx, xlsm, xlsb, xls, ods)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings as TOML
    Show,
    /// Show config file locations
    Path,
    /// Print a commented config template
    Template,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON array of {id, name, children}
    Json,
    /// Indented tree
    Tree,
}
