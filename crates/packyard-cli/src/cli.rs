use clap::{ArgAction, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output logs as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    /// View metadata as this user ID
    #[arg(short, long, global = true)]
    pub user: Option<i64>,

    /// Treat the user as a maintainer who sees every package
    #[arg(long, global = true, requires = "user")]
    pub privileged: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the configuration file to stdout
    Config {
        /// Print the annotated default configuration instead
        #[arg(required = false, long)]
        default: bool,
    },

    /// Show where packyard keeps its files and how much it stores
    Env,

    /// Import Composer repository JSON into the store
    #[command(arg_required_else_help = true)]
    Import {
        /// JSON file with a top-level "packages" object
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        file: String,
    },

    /// Print the root packages.json document
    Root,

    /// Print the provider index
    Providers {
        /// Only print the index if this is still the current root hash
        #[arg(required = false, long)]
        hash: Option<String>,
    },

    /// Print the metadata of a package
    #[command(arg_required_else_help = true)]
    Package {
        /// Package name, e.g. acme/http
        #[arg(required = true)]
        name: String,

        /// Print the minified protocol-v2 document
        #[arg(required = false, long)]
        v2: bool,

        /// With --v2, list the dev versions instead of the tagged releases
        #[arg(required = false, long, requires = "v2")]
        dev: bool,

        /// Read the package from the cached graph
        #[arg(required = false, long, conflicts_with = "v2")]
        cached: bool,

        /// With --cached, only print the package if this is its current hash
        #[arg(required = false, long, requires = "cached")]
        hash: Option<String>,
    },

    /// Delete a package with all of its versions
    #[command(arg_required_else_help = true)]
    #[clap(name = "delete", visible_alias = "rm")]
    Delete {
        /// Packages to delete
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Report an update failure to the maintainers of a package
    #[command(arg_required_else_help = true)]
    NotifyFailure {
        /// Package name
        #[arg(required = true)]
        name: String,

        /// Error that made the update fail
        #[arg(required = true, short, long)]
        error: String,

        /// Additional details appended to the message
        #[arg(required = false, short, long)]
        details: Option<String>,
    },

    /// Clear the failure notification flag after a successful update
    #[command(arg_required_else_help = true)]
    ResetFailure {
        /// Package name
        #[arg(required = true)]
        name: String,
    },
}
