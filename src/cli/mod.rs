pub mod commands;
pub mod context;
pub mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Install, remove and inspect certificates in system certificate stores.
#[derive(Parser, Debug)]
#[command(name = "certstore", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to alternative config file
    #[arg(long, global = true, env = "CERTSTORE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root of the machine-wide data directory (stores and machine keys)
    #[arg(long, global = true, env = "CERTSTORE_MACHINE_DATA_DIR")]
    pub machine_data_dir: Option<PathBuf>,

    /// Root of the current user's data directory (stores, user keys, audit log)
    #[arg(long, global = true, env = "CERTSTORE_USER_DATA_DIR")]
    pub user_data_dir: Option<PathBuf>,

    /// Output format for command results
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode: only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision the standard certificate stores
    Init {
        /// Provision the LocalMachine stores instead of CurrentUser
        #[arg(long)]
        machine: bool,
    },

    /// Import a certificate (PKCS#12, DER or PEM) into a store
    Add {
        /// Certificate file to import
        file: PathBuf,

        /// Password protecting the PKCS#12 bundle
        #[arg(long, env = "CERTSTORE_PFX_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Allow the private key to be exported later
        #[arg(long)]
        exportable: bool,

        #[command(flatten)]
        target: StoreTarget,
    },

    /// Remove exactly one certificate from a store
    Remove {
        #[command(flatten)]
        key: KeyArgs,

        #[command(flatten)]
        target: StoreTarget,
    },

    /// Show details of exactly one certificate
    Info {
        #[command(flatten)]
        key: KeyArgs,

        #[command(flatten)]
        target: StoreTarget,
    },

    /// Show the audit history of store changes
    History {
        /// Only entries for this store
        #[arg(long)]
        store: Option<String>,
        /// Filter entries since this date (ISO 8601)
        #[arg(long)]
        since: Option<String>,
        /// Show last N entries
        #[arg(long)]
        last: Option<usize>,
    },
}

/// Store addressed by a command.
#[derive(Args, Debug, Clone)]
pub struct StoreTarget {
    /// Use the LocalMachine location instead of CurrentUser
    #[arg(long)]
    pub machine: bool,

    /// Store name (default from config, normally MY)
    #[arg(long)]
    pub store: Option<String>,
}

/// How the certificate is looked up. Exactly one is required.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct KeyArgs {
    /// SHA-1 thumbprint in hex; spaces and colons are ignored
    #[arg(long)]
    pub thumbprint: Option<String>,

    /// Full subject distinguished name, e.g. "CN=Build Agent, O=Acme"
    #[arg(long)]
    pub subject: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
