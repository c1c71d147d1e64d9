use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Agency portal CLI: talk to the portal backend API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API base URL (overrides config and the built-in default)
    #[arg(short, long, global = true, env = "PORTAL_API_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "PORTAL_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Bypass the response cache even if the profile enables it
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Log requests to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Copy, ValueEnum, Default, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a session token for this profile
    Login(LoginArgs),
    /// Remove the stored session token
    Logout,
    /// Show current session info
    Whoami,
    /// GET a backend path (e.g. /clients page=1)
    Get(ReadArgs),
    /// POST a JSON body to a backend path
    Post(WriteArgs),
    /// PUT a JSON body to a backend path
    Put(WriteArgs),
    /// PATCH a backend path with a JSON body
    Patch(WriteArgs),
    /// DELETE a backend path
    Delete(ReadArgs),
    /// Browse the service and feature price catalog
    Catalog(CatalogArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Bearer token issued by the portal
    #[arg(short, long)]
    pub token: String,
}

#[derive(clap::Args)]
pub struct ReadArgs {
    /// Backend path relative to the API base (e.g. /projects/7/milestones)
    pub path: String,
    /// Query parameters as key=value pairs
    pub params: Vec<String>,
}

#[derive(clap::Args)]
pub struct WriteArgs {
    /// Backend path relative to the API base
    pub path: String,
    /// Path to JSON file (reads from stdin if omitted)
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(clap::Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommands,
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List services, or the features of one service
    List {
        /// Service id (e.g. website)
        service: Option<String>,
    },
    /// Estimate the price of a service with selected features
    Estimate {
        /// Service id
        service: String,
        /// Feature ids
        features: Vec<String>,
    },
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (server, format, strategy, cache_ttl_secs)
    pub key: String,
    /// Value
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_get_with_params() {
        let cli = Cli::try_parse_from(["portal", "get", "/clients", "page=1", "status=active"]).unwrap();
        match cli.command {
            Commands::Get(args) => {
                assert_eq!(args.path, "/clients");
                assert_eq!(args.params, vec!["page=1", "status=active"]);
            }
            _ => panic!("expected get"),
        }
        assert_eq!(cli.profile, "default");
        assert!(!cli.no_cache);
    }

    #[test]
    fn test_parses_global_flags() {
        let cli = Cli::try_parse_from([
            "portal",
            "--server",
            "http://api.test/api",
            "--format",
            "table",
            "--no-cache",
            "whoami",
        ])
        .unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://api.test/api"));
        assert_eq!(cli.format, Some(OutputFormat::Table));
        assert!(cli.no_cache);
    }
}
