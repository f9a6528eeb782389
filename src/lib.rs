//! Layered INI-style run-time configuration
// (c) 2024 Ross Younger
//!
//! * [`Config`] holds one configuration store: sections of options, read from INI-style text
//!   and layered by merging further sources over it. Values may refer to other options
//!   (`%(name)s`) and are expanded on demand, with the result cached until the store changes.
//! * [`Config::find_group`] and [`Config::get_server_setting`] classify a host by wildcard
//!   patterns and resolve per-server settings with a `[global]` fallback.
//! * [`ConfigCategories`] gathers the standard configuration files (`servers`, `config`)
//!   from the system and user configuration directories.
//! * [`AuthStore`] keeps cached credential records, one file per credential kind and realm.
//!
//! ```
//! use svnconf::Config;
//! let cfg = Config::parse_str("
//! [groups]
//! internal = *.example.com
//! [global]
//! http-timeout = 30
//! [internal]
//! http-timeout = 300
//! ").unwrap();
//! assert_eq!(cfg.server_setting_for_host("svn.example.com", "http-timeout", "10"), "300");
//! assert_eq!(cfg.server_setting_for_host("svn.example.org", "http-timeout", "10"), "30");
//! ```
//!
//! The `svnconf` binary is a small command-line front end over this library.

pub mod auth;
mod cli;
pub use cli::cli;
pub mod config;
pub mod error;
/// OS abstraction layer
pub mod os;
/// Utilities
pub mod util;

pub use auth::AuthStore;
pub use config::{Config, ConfigCategories};
pub use error::{Error, Result};
