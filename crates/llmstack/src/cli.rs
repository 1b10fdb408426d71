//! Clap derive structures for the `llmstack` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// llmstack -- command-line client for LLMStack servers
#[derive(Debug, Parser)]
#[command(
    name = "llmstack",
    version,
    about = "Work with an LLMStack server from the command line",
    long_about = "Browse and manage apps, connections, data sources and sheets on an\n\
        LLMStack server, run published apps, and inspect account settings.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "LLMSTACK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 's', env = "LLMSTACK_SERVER", global = true)]
    pub server: Option<String>,

    /// API token (overrides profile credentials)
    #[arg(long, env = "LLMSTACK_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LLMSTACK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "LLMSTACK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "LLMSTACK_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show or update the signed-in user's profile
    #[command(alias = "me")]
    Profile(ProfileArgs),

    /// Organization details and settings
    Org(OrgArgs),

    /// Manage stored connections
    #[command(alias = "conn")]
    Connections(ConnectionsArgs),

    /// List processors and API providers
    #[command(alias = "proc")]
    Processors(ProcessorsArgs),

    /// Manage data sources
    #[command(alias = "ds")]
    Datasources(DatasourcesArgs),

    /// Manage your apps
    Apps(AppsArgs),

    /// Browse and run apps from the store
    Store(StoreArgs),

    /// Manage sheets
    Sheets(SheetsArgs),

    /// Show a shared app run
    Share {
        /// Share code from the run URL
        code: String,
    },

    /// Subscription prices and checkout
    Billing(BillingArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Profile ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: Option<ProfileCommand>,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Show the profile (default)
    Show,

    /// Show feature flags
    Flags,

    /// Update profile fields
    Update {
        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Provider configuration JSON file (replaces all provider configs)
        #[arg(long)]
        provider_configs: Option<PathBuf>,
    },
}

// ── Organization ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OrgArgs {
    #[command(subcommand)]
    pub command: Option<OrgCommand>,
}

#[derive(Debug, Subcommand)]
pub enum OrgCommand {
    /// Show the organization (default)
    Show,

    /// Show organization settings
    Settings,

    /// Disable a processor backend for the organization
    DisableBackend {
        /// Backend id (provider/processor)
        backend: String,
    },

    /// Re-enable a disabled processor backend
    EnableBackend {
        /// Backend id (provider/processor)
        backend: String,
    },
}

// ── Connections ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConnectionsArgs {
    #[command(subcommand)]
    pub command: ConnectionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConnectionsCommand {
    /// List stored connections
    #[command(alias = "ls")]
    List,

    /// List available connection types
    Types,

    /// Create a connection
    Create {
        /// Connection name
        name: String,

        /// Connection type slug
        #[arg(long = "type")]
        type_slug: String,

        /// Provider slug
        #[arg(long)]
        provider: String,

        /// Base connection type (credentials, browser_login, oauth2)
        #[arg(long, default_value = "credentials")]
        base_type: String,

        /// Description
        #[arg(long, default_value = "")]
        description: String,

        /// Configuration JSON file
        #[arg(long)]
        from_file: Option<PathBuf>,
    },

    /// Update a connection
    Update {
        /// Connection id
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Configuration JSON file
        #[arg(long)]
        from_file: Option<PathBuf>,
    },

    /// Delete a connection
    #[command(alias = "rm")]
    Delete {
        /// Connection id
        id: String,
    },

    /// Activate a connection and wait for the result
    Activate {
        /// Connection id
        id: String,
    },
}

// ── Processors ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProcessorsArgs {
    #[command(subcommand)]
    pub command: ProcessorsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProcessorsCommand {
    /// List processors enabled for the organization
    #[command(alias = "ls")]
    List {
        /// Only processors from this provider
        #[arg(long)]
        provider: Option<String>,

        /// Include backends the organization has disabled
        #[arg(long)]
        all: bool,
    },

    /// List API providers
    Providers,
}

// ── Data sources ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DatasourcesArgs {
    #[command(subcommand)]
    pub command: DatasourcesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DatasourcesCommand {
    /// List your data sources followed by organization ones
    #[command(alias = "ls")]
    List {
        /// Only data sources you own
        #[arg(long)]
        mine: bool,
    },

    /// List data source types
    Types,

    /// Create a data source
    Create {
        /// Data source name
        name: String,

        /// Data source type slug
        #[arg(long = "type")]
        type_slug: String,

        /// Type-specific configuration JSON file
        #[arg(long)]
        from_file: Option<PathBuf>,
    },

    /// Delete a data source
    #[command(alias = "rm")]
    Delete {
        /// Data source UUID
        uuid: String,
    },
}

// ── Apps ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AppsArgs {
    #[command(subcommand)]
    pub command: AppsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AppsCommand {
    /// List your apps
    #[command(alias = "ls")]
    List,

    /// List app templates
    Templates,

    /// Show one app
    Show {
        /// App UUID
        uuid: String,
    },

    /// List an app's versions
    Versions {
        /// App UUID
        uuid: String,
    },

    /// Delete an app
    #[command(alias = "rm")]
    Delete {
        /// App UUID
        uuid: String,
    },

    /// Publish an app
    Publish {
        /// App UUID
        uuid: String,
    },

    /// Unpublish an app
    Unpublish {
        /// App UUID
        uuid: String,
    },
}

// ── Store ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StoreArgs {
    #[command(subcommand)]
    pub command: StoreCommand,
}

#[derive(Debug, Subcommand)]
pub enum StoreCommand {
    /// Show a store app
    App {
        /// Store app slug
        slug: String,
    },

    /// List store categories
    Categories,

    /// Search the store
    Search {
        /// Search text
        #[arg(default_value = "")]
        query: String,

        /// Restrict to a category slug
        #[arg(long)]
        category: Option<String>,

        /// Result page (1-based)
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Run a store app
    Run {
        /// Store app slug
        slug: String,

        /// Input as a JSON object (repeat to send several inputs in one session)
        #[arg(long, short = 'i', required = true)]
        input: Vec<String>,
    },
}

// ── Sheets ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SheetsArgs {
    #[command(subcommand)]
    pub command: SheetsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SheetsCommand {
    /// List sheets
    #[command(alias = "ls")]
    List,

    /// List sheet templates
    Templates,

    /// Create a sheet
    Create {
        /// Sheet name
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Template slug
        #[arg(long)]
        template: Option<String>,
    },

    /// Delete a sheet
    #[command(alias = "rm")]
    Delete {
        /// Sheet UUID
        uuid: String,
    },
}

// ── Billing ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BillingArgs {
    #[command(subcommand)]
    pub command: BillingCommand,
}

#[derive(Debug, Subcommand)]
pub enum BillingCommand {
    /// List subscription prices
    Prices,

    /// Start a checkout session and print its URL
    Checkout {
        /// Price id
        price_id: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the current configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// Store the active profile's API token in the system keyring
    SetToken,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
