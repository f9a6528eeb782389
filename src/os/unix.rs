// OS abstraction layer for svnconf - Unix implementation
// (c) 2024 Ross Younger

use std::path::PathBuf;

use tracing::warn;

use super::AbstractPlatform;

const SYSTEM_CONFIG_DIR: &str = "/etc/subversion";
const USER_CONFIG_DIR: &str = ".subversion";

#[derive(Debug, Clone, Copy)]
/// Concretions for Unix platforms
pub struct Platform {}

impl AbstractPlatform for Platform {
    fn system_config_dir() -> Option<PathBuf> {
        Some(PathBuf::from(SYSTEM_CONFIG_DIR))
    }

    fn user_config_dir() -> Option<PathBuf> {
        let Some(mut d) = dirs::home_dir() else {
            warn!("could not determine home directory");
            return None;
        };
        d.push(USER_CONFIG_DIR);
        Some(d)
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::super::AbstractPlatform as _;
    use super::Platform;

    #[test]
    fn config_paths() {
        assert_eq!(
            Platform::system_config_dir(),
            Some(PathBuf::from("/etc/subversion"))
        );
        let files = Platform::config_files("servers");
        assert_eq!(files[0], PathBuf::from("/etc/subversion/servers"));
        if let Some(user) = Platform::user_config_dir() {
            assert!(user.ends_with(".subversion"));
            assert_eq!(files[1], user.join("servers"));
        }
    }
}
