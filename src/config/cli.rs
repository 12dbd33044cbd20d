use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

use crate::domain::types::ContentType;

/// Command-line arguments for the Quorum operator binary.
#[derive(Debug, Parser)]
#[command(name = "quorum", version, about = "Quorum community core tools")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "QUORUM_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Apply pending database migrations.
    Migrate,
    /// Print a subverse's metadata as JSON.
    Subverse(NameArgs),
    /// Print a user's preferences as JSON.
    Preferences(NameArgs),
    /// Print a user's public profile summary as JSON.
    Info(NameArgs),
    /// Print the ids a user has saved.
    Saves(SavesArgs),
}

#[derive(Debug, Args, Clone)]
pub struct NameArgs {
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[derive(Debug, Args, Clone)]
pub struct SavesArgs {
    #[arg(value_name = "USER")]
    pub user: String,

    /// Kind of content to list (submission|comment).
    #[arg(long = "type", value_name = "TYPE", value_parser = parse_content_type, default_value = "submission")]
    pub content_type: ContentType,
}

fn parse_content_type(value: &str) -> Result<ContentType, String> {
    value
        .parse()
        .map_err(|()| format!("unknown content type `{value}`"))
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT", global = true)]
    pub database_max_connections: Option<u32>,

    /// Enable or disable the query cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub cache_enabled: Option<bool>,
}
