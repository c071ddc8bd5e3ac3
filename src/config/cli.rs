use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the lectern binary.
#[derive(Debug, Parser)]
#[command(
    name = "lectern",
    version,
    about = "Resolve blog content from a remote API with cached, static fallbacks"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "LECTERN_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Base URL of the remote content API.
    #[arg(
        long = "remote-url",
        value_name = "URL",
        value_hint = ValueHint::Url,
        global = true
    )]
    pub remote_url: Option<String>,

    /// Serve from the static corpus only, ignoring any configured remote.
    #[arg(long, action = clap::ArgAction::SetTrue, global = true)]
    pub offline: bool,

    /// Override the per-call remote timeout.
    #[arg(long = "remote-timeout-ms", value_name = "MILLIS", global = true)]
    pub remote_timeout_ms: Option<u64>,

    /// Load the fallback corpus from this TOML file instead of the bundled one.
    #[arg(
        long = "corpus-path",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub corpus_path: Option<PathBuf>,

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
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print metadata for every post.
    List,
    /// Print one full post.
    Show(SlugArgs),
    /// Search titles, excerpts and tags.
    Search(SearchArgs),
    /// Print the most recent posts.
    Recent(LimitArgs),
    /// Print featured posts.
    Featured(LimitArgs),
    /// Print posts in a category.
    Category(NameArgs),
    /// Print posts carrying a tag.
    Tag(NameArgs),
    /// Print posts related to a post.
    Related(RelatedArgs),
    /// Print category names with post counts.
    Categories,
    /// Print tag names with post counts.
    Tags,
    /// Re-fetch the listing, bypassing cache and breaker.
    Refresh,
    /// Run the start-up preload, then resolve the given posts concurrently.
    Warm(WarmArgs),
    /// Print cache statistics and breaker state.
    Stats,
}

#[derive(Debug, Args, Clone)]
pub struct SlugArgs {
    #[arg(value_name = "SLUG")]
    pub slug: String,
}

#[derive(Debug, Args, Clone)]
pub struct SearchArgs {
    #[arg(value_name = "TERM")]
    pub term: String,
}

#[derive(Debug, Args, Clone)]
pub struct NameArgs {
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[derive(Debug, Args, Clone)]
pub struct LimitArgs {
    /// Maximum number of posts; defaults to the preload setting.
    #[arg(long, value_name = "COUNT")]
    pub limit: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct RelatedArgs {
    #[arg(value_name = "SLUG")]
    pub slug: String,

    #[arg(long, default_value_t = 3, value_name = "COUNT")]
    pub limit: usize,
}

#[derive(Debug, Args, Clone)]
pub struct WarmArgs {
    /// Posts to resolve after the preload completes.
    #[arg(value_name = "SLUG")]
    pub slugs: Vec<String>,
}
