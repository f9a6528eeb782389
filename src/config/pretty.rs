//! Pretty-printing support
// (c) 2024 Ross Younger

use std::{fmt::Display, ops::ControlFlow};

use tabled::{settings::style::Style, Table, Tabled};

use super::Config;

#[derive(Tabled)]
struct PrettyOption {
    section: String,
    option: String,
    value: String,
}

#[derive(Tabled)]
struct PrettyOptionWithRaw {
    section: String,
    option: String,
    value: String,
    raw: String,
}

/// Pretty-printing type wrapper to [`Config`]
#[derive(Debug)]
pub struct DisplayAdapter<'a> {
    /// Data source
    source: &'a Config,
    /// Whether to show raw values alongside expanded ones
    show_raw: bool,
}

impl Config {
    /// Creates a `DisplayAdapter` for this store.
    ///
    /// # Returns
    /// An ephemeral structure implementing `Display`, which renders the store as a table.
    #[must_use]
    pub fn to_display_adapter(&self, show_raw: bool) -> DisplayAdapter<'_> {
        DisplayAdapter {
            source: self,
            show_raw,
        }
    }
}

impl Display for DisplayAdapter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cfg = self.source;
        let mut rows = Vec::<PrettyOptionWithRaw>::new();
        for section in cfg.section_names() {
            let _ = cfg.enumerate_options(section, |option, value| {
                let raw = cfg.get_raw(section, option).unwrap_or_default();
                rows.push(PrettyOptionWithRaw {
                    section: section.into(),
                    option: option.into(),
                    value: value.into(),
                    raw: if raw == value {
                        String::new()
                    } else {
                        raw.into()
                    },
                });
                ControlFlow::Continue(())
            });
        }
        if self.show_raw {
            write!(f, "{}", Table::new(rows).with(Style::sharp()))
        } else {
            let rows = rows.into_iter().map(|r| PrettyOption {
                section: r.section,
                option: r.option,
                value: r.value,
            });
            write!(f, "{}", Table::new(rows).with(Style::sharp()))
        }
    }
}
