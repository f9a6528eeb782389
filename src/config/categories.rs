//! Configuration categories
// (c) 2024 Ross Younger

use std::{collections::BTreeMap, path::Path};

use tracing::debug;

use super::{Config, CATEGORY_CONFIG, CATEGORY_SERVERS};
use crate::{error::Result, os::AbstractPlatform};

/// The set of configuration categories in use, each with its own [`Config`].
///
/// Each category lives in a file of the same name (`servers`, `config`) in a
/// configuration directory. The set is owned by the caller; there is no global instance.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct ConfigCategories {
    categories: BTreeMap<String, Config>,
}

impl ConfigCategories {
    /// The categories read by [`read`](Self::read)
    pub const STANDARD: [&'static str; 2] = [CATEGORY_CONFIG, CATEGORY_SERVERS];

    /// Creates an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the standard categories.
    ///
    /// If `config_dir` is given, only that directory is read. Otherwise the system-wide
    /// directory is read first, then the user's directory is merged over it.
    /// Missing files are not an error; they give empty stores.
    pub fn read<P: AbstractPlatform>(config_dir: Option<&Path>) -> Result<Self> {
        let mut result = Self::new();
        for category in Self::STANDARD {
            let files = match config_dir {
                Some(dir) => vec![dir.join(category)],
                None => P::config_files(category),
            };
            let mut config = Config::new();
            for f in files {
                debug!("category {category}: merging {f:?}");
                config.merge_file(&f, false)?;
            }
            let _ = result.insert(category, config);
        }
        Ok(result)
    }

    /// Adds or replaces a category, returning the previous store if there was one
    pub fn insert(&mut self, category: &str, config: Config) -> Option<Config> {
        self.categories.insert(category.to_owned(), config)
    }

    /// Accesses a category
    #[must_use]
    pub fn get(&self, category: &str) -> Option<&Config> {
        self.categories.get(category)
    }

    /// Mutably accesses a category
    pub fn get_mut(&mut self, category: &str) -> Option<&mut Config> {
        self.categories.get_mut(category)
    }

    /// Iterates over the categories in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Config)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }
}

///////////////////////////////////////////////////////////////////////////////////////
