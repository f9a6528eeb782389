// (c) 2024 Ross Younger
//! # Configuration management
//!
//! svnconf reads run-time configuration from INI-style files, in order:
//! 1. The system-wide configuration directory (typically `/etc/subversion`)
//! 2. The user's configuration directory (typically `~/.subversion`)
//!
//! Each directory holds one file per *category* (`servers`, `config`), and each category
//! gets its own [`Config`] store. Later files are merged over earlier ones, option by option.
//!
//! **Note** Configuration file locations are platform-dependent.
//! To see what applies on the current platform, run `svnconf config-files`.
//!
//! ## File format
//!
//! ```text
//! # Comments start with '#' or ';'
//! [global]
//! http-timeout = 30
//! http-proxy-host: proxy.example.com
//!
//! [groups]
//! svn-server = *.svn.example.com, 192.168.*
//!
//! [svn-server]
//! http-timeout = 60
//! editor-cmd = vim
//!     -n
//! ```
//!
//! * Section and option names are case-insensitive.
//! * Options are written `name = value` or `name: value`. Whitespace around the name and
//!   value is ignored, as is one pair of matching quotes around the value.
//! * An indented line continues the previous value, joined with a single space.
//! * Every option must be inside a section.
//!
//! ### Expansion
//!
//! A value may refer to another option as `%(name)s` (same section) or
//! `%(section.name)s`. The referenced value is itself expanded, then substituted.
//! * A reference to an option which does not exist expands to nothing.
//! * A reference back to an option already being expanded (a cycle) expands to nothing.
//! * References nested more than 64 deep expand to nothing.
//! * An option not found in its section is also sought in the `DEFAULT` section.
//!
//! ### Server groups
//!
//! The `[groups]` section of the `servers` category maps group names to lists of host
//! wildcard patterns. Settings are then looked up first in the section named after the
//! host's group, then in `[global]`; see [`Config::find_group`] and
//! [`Config::get_server_setting`].
//!
//! ### Traps and tips
//! 1. Like `Host` blocks in ssh config files, the _first_ group that matches a host wins,
//!    so list your groups from most-specific to least-specific.
//! 1. Lookup defaults are used exactly as given; they are never expanded.

mod categories;
mod expand;
mod groups;
mod lines;
mod parser;
mod pretty;
mod store;

pub use categories::ConfigCategories;
pub use pretty::DisplayAdapter;
pub use store::Config;
pub(crate) use store::parse_bool;

/// Category holding per-server settings
pub const CATEGORY_SERVERS: &str = "servers";
/// Category holding general client settings
pub const CATEGORY_CONFIG: &str = "config";

/// Section of the `servers` category which maps group names to host patterns
pub const SECTION_GROUPS: &str = "groups";
/// Section of the `servers` category holding settings for all servers
pub const SECTION_GLOBAL: &str = "global";
/// Section searched for options missing from the requested section
pub const SECTION_DEFAULT: &str = "DEFAULT";
/// Section of the `config` category governing credential caching
pub const SECTION_AUTH: &str = "auth";

/// Seconds to wait for a server response
pub const OPTION_HTTP_TIMEOUT: &str = "http-timeout";
/// Proxy host name
pub const OPTION_HTTP_PROXY_HOST: &str = "http-proxy-host";
/// Proxy port number
pub const OPTION_HTTP_PROXY_PORT: &str = "http-proxy-port";
/// Whether to cache credentials on disk at all
pub const OPTION_STORE_AUTH_CREDS: &str = "store-auth-creds";
/// Whether to cache passwords on disk
pub const OPTION_STORE_PASSWORDS: &str = "store-passwords";

/// Canonical boolean true
pub const TRUE: &str = "true";
/// Canonical boolean false
pub const FALSE: &str = "false";

/// Looks up an option in a store which may not exist.
///
/// With no store, `default` is returned; otherwise this is [`Config::get`].
#[must_use]
pub fn get<'a>(config: Option<&'a Config>, section: &str, option: &str, default: &'a str) -> &'a str {
    config.map_or(default, |c| c.get(section, option, default))
}
