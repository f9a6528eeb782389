//! OS abstraction layer
// (c) 2024 Ross Younger

use std::path::PathBuf;

/// General platform abstraction trait.
/// The active implementation should be pulled into this crate
/// Implementations should be called `Platform`, e.g. [unix::Platform].
///
/// This is the boundary with platform-specific configuration discovery; nothing else
/// in the crate knows where files live.
///
/// Usage:
/// ```
///    use svnconf::os::Platform;
///    use svnconf::os::AbstractPlatform as _;
///    println!("{:?}", Platform::system_config_dir());
/// ```
pub trait AbstractPlatform {
    /// The directory holding system-wide configuration files.
    /// On most platforms this will be `/etc/subversion`
    fn system_config_dir() -> Option<PathBuf>;

    /// The directory holding the current user's configuration files and credential cache.
    /// On Unix platforms this is `${HOME}/.subversion`.
    ///
    /// # Note
    /// This is a _theoretical_ path construction; it does not guarantee that the path actually exists.
    ///
    /// If somehow we could not determine the directory to use, returns None (and may emit a warning).
    fn user_config_dir() -> Option<PathBuf>;

    /// The list of configuration files which apply for a given category, lowest priority first
    #[must_use]
    fn config_files(category: &str) -> Vec<PathBuf> {
        [Self::system_config_dir(), Self::user_config_dir()]
            .into_iter()
            .flatten()
            .map(|d| d.join(category))
            .collect()
    }
}

#[cfg(any(unix, doc))]
mod unix;

#[cfg(any(unix, doc))]
pub use unix::*;

static_assertions::assert_cfg!(unix, "This OS is not yet supported");
