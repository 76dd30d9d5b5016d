use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "gxupload", about = "Upload files to a Galaxy instance", version)]
pub struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/gxupload/config.json)
    #[arg(long, global = true, env = "GXUPLOAD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug output
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload files into a history
    Upload(UploadArgs),
    /// List histories, optionally filtered by name
    Histories(HistoriesArgs),
    /// Inspect or clean up stored resume records
    Resume(ResumeArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    /// URL of the Galaxy instance [default: http://localhost:8080]
    #[arg(long, env = "GALAXY_URL")]
    pub url: Option<String>,

    /// API key for the Galaxy instance
    #[arg(long, env = "GALAXY_API_KEY", hide_env_values = true)]
    pub api_key: String,
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("destination")
        .required(true)
        .args(["history_id", "history_name"])
))]
pub struct UploadArgs {
    /// Files to upload
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub server: ServerArgs,

    /// Target history ID
    #[arg(long)]
    pub history_id: Option<String>,

    /// Target history name pattern; must match exactly one history
    #[arg(long)]
    pub history_name: Option<String>,

    /// Ignore case when matching history names
    #[arg(short = 'i', long)]
    pub ignore_case: bool,

    /// Galaxy file type to use
    #[arg(long, default_value = "auto")]
    pub file_type: String,

    /// Genome build for the dataset
    #[arg(long, default_value = "?")]
    pub dbkey: String,

    /// Convert spaces to tabs
    #[arg(long, overrides_with = "no_space_to_tab")]
    pub space_to_tab: bool,

    #[arg(long, overrides_with = "space_to_tab", hide = true)]
    pub no_space_to_tab: bool,

    /// Do not decompress after upload
    #[arg(long, overrides_with = "auto_decompress")]
    pub no_auto_decompress: bool,

    #[arg(long, overrides_with = "no_auto_decompress", hide = true)]
    pub auto_decompress: bool,

    /// Dataset name in the history, if different from the file name
    #[arg(long, alias = "filename")]
    pub file_name: Option<String>,

    /// Store upload URLs here to resume interrupted uploads
    #[arg(long)]
    pub storage: Option<PathBuf>,

    /// Chunk size in bytes [default: 10000000]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk_size: Option<u64>,

    /// Retries per operation for transient failures [default: 3]
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// No output while uploading
    #[arg(long)]
    pub silent: bool,
}

#[derive(Debug, Args)]
pub struct HistoriesArgs {
    /// Only list histories whose name matches this pattern
    pub name: Option<String>,

    #[command(flatten)]
    pub server: ServerArgs,

    /// Only output history IDs
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Ignore case when matching history names
    #[arg(short = 'i', long)]
    pub ignore_case: bool,
}

#[derive(Debug, Args)]
pub struct ResumeArgs {
    #[command(subcommand)]
    pub command: ResumeCommand,
}

#[derive(Debug, Subcommand)]
pub enum ResumeCommand {
    /// List stored resume records
    List {
        /// Resume store file
        #[arg(long)]
        storage: Option<PathBuf>,
    },
    /// Remove one resume record so the file uploads from the start
    Clear {
        /// Resume store file
        #[arg(long)]
        storage: Option<PathBuf>,

        /// Fingerprint shown in the "unable to resume" error
        fingerprint: String,
    },
}
