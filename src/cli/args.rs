// svnconf top-level command-line arguments
// (c) 2024 Ross Younger

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{CATEGORY_SERVERS, SECTION_GROUPS};

/// Parses a `KEY=VALUE` argument
fn parse_key_val(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected KEY=VALUE, found {arg:?}"))
}

#[derive(Debug, Parser, Clone)]
#[command(
    author,
    version(env!("SVNCONF_VERSION_STRING")),
    about,
    before_help = "e.g.   svnconf server-setting --host repo.example.com http-timeout",
    infer_long_args(true)
)]
#[command(help_template(
    "\
{name} version {version}
{about-with-newline}
{usage-heading} {usage}
{before-help}
{all-args}{after-help}
"
))]
pub(crate) struct CliArgs {
    /// Reads configuration from this directory only.
    ///
    /// By default the system-wide directory is read, then the user's directory
    /// is merged over it. This also locates the credential cache.
    #[arg(short = 'c', long, global = true, value_name("DIR"), help_heading("Configuration"))]
    pub config_dir: Option<PathBuf>,

    /// Merges an additional file over the selected category.
    ///
    /// May be repeated; later files take priority. Each file must exist.
    #[arg(short = 'f', long = "file", global = true, value_name("FILE"), help_heading("Configuration"))]
    pub files: Vec<PathBuf>,

    /// The configuration category to operate on
    #[arg(short = 'C', long, global = true, default_value(CATEGORY_SERVERS), help_heading("Configuration"))]
    pub category: String,

    /// Quiet mode
    ///
    /// Reports only errors
    #[arg(short, long, action, global = true, conflicts_with("debug"))]
    pub quiet: bool,

    /// Enable detailed debug output
    ///
    /// This has the same effect as setting `RUST_LOG=svnconf=debug` in the environment.
    /// If present, `RUST_LOG` overrides this option.
    #[arg(short, long, action, global = true, help_heading("Debug"))]
    pub debug: bool,

    /// Log to a file
    ///
    /// By default the log receives everything printed to stderr.
    /// To override this behaviour, set the environment variable `RUST_LOG_FILE_DETAIL` (same semantics as `RUST_LOG`).
    #[arg(short('l'), long, action, global = true, help_heading("Debug"), value_name("FILE"))]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub(crate) enum Command {
    /// Prints the expanded value of an option.
    ///
    /// Exits unsuccessfully if the option is not set and no default was given.
    Get {
        /// Section name
        section: String,
        /// Option name
        option: String,
        /// Value to print if the option is not set
        #[arg(long)]
        default: Option<String>,
        /// Interprets the value (or the default) as a boolean, printing `true` or `false`
        #[arg(short = 'b', long = "bool", action, conflicts_with("raw"))]
        as_bool: bool,
        /// Prints the value as written, without expansion
        #[arg(long, action)]
        raw: bool,
    },

    /// Sets an option, then prints the resulting category
    Set {
        /// Section name
        section: String,
        /// Option name
        option: String,
        /// New value
        value: String,
        /// Writes the result to this file instead of standard output
        #[arg(short, long, value_name("FILE"))]
        output: Option<PathBuf>,
    },

    /// Lists the sections of the category
    Sections,

    /// Lists the options in a section, with their expanded values
    Options {
        /// Section name
        section: String,
    },

    /// Displays the whole category as a table
    Show {
        /// Also shows values as written, where they differ from the expansion
        #[arg(long, action)]
        raw: bool,
    },

    /// Reports which server group a host belongs to
    FindGroup {
        /// Host name or address
        key: String,
        /// The section holding the group definitions
        #[arg(long, default_value(SECTION_GROUPS))]
        groups_section: String,
    },

    /// Looks up a per-server setting, in the host's group then in `[global]`
    ServerSetting {
        /// Option name
        option: String,
        /// Finds the group for this host
        #[arg(long, conflicts_with("group"))]
        host: Option<String>,
        /// Uses this group directly
        #[arg(long)]
        group: Option<String>,
        /// Value to use if the setting is not found
        #[arg(long, default_value(""))]
        default: String,
        /// Requires the setting to be an integer
        #[arg(long, action)]
        int: bool,
    },

    /// Prints a cached credential record
    AuthRead {
        /// Credential kind, e.g. `svn.simple`
        kind: String,
        /// Realm string
        realm: String,
    },

    /// Stores a credential record, replacing any existing one
    AuthWrite {
        /// Credential kind, e.g. `svn.simple`
        kind: String,
        /// Realm string
        realm: String,
        /// Entries to store
        #[arg(value_name("KEY=VALUE"), value_parser = parse_key_val)]
        entries: Vec<(String, String)>,
    },

    /// Lists the configuration files which would be read
    ConfigFiles,
}
