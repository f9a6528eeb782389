//! The in-memory configuration store
// (c) 2024 Ross Younger

use std::{
    cell::OnceCell,
    collections::HashMap,
    fmt::Write as _,
    io::{BufReader, ErrorKind, Read, Write},
    ops::ControlFlow,
    path::Path,
};

use tracing::{debug, trace};

use super::{
    expand,
    lines::{check_option_name, check_section_name, quote_value},
    parser::Parser,
    FALSE, SECTION_DEFAULT, TRUE,
};
use crate::error::{Error, Result};

/// Section and option names are compared without regard to (ASCII) case
fn fold(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// A single option: its raw value and the memoised result of expanding it
#[derive(Debug)]
pub(crate) struct ConfigOption {
    name: String,
    value: String,
    expanded: OnceCell<String>,
}

impl ConfigOption {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }
    pub(crate) fn raw(&self) -> &str {
        &self.value
    }
}

/// A named, insertion-ordered collection of options
#[derive(Debug)]
pub(crate) struct Section {
    name: String,
    options: Vec<ConfigOption>,
    index: HashMap<String, usize>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            options: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn option(&self, name: &str) -> Option<&ConfigOption> {
        self.index.get(&fold(name)).map(|&i| &self.options[i])
    }

    /// Overwrites an existing option in place, or appends a new one
    fn insert(&mut self, name: &str, value: &str) {
        let key = fold(name);
        if let Some(&i) = self.index.get(&key) {
            let opt = &mut self.options[i];
            value.clone_into(&mut opt.value);
            let _ = opt.expanded.take();
        } else {
            let _ = self.index.insert(key, self.options.len());
            self.options.push(ConfigOption {
                name: name.to_owned(),
                value: value.to_owned(),
                expanded: OnceCell::new(),
            });
        }
    }
}

/// An INI-style configuration store.
///
/// A store holds a set of named sections, each of which holds a set of named options.
/// Section and option names are case-insensitive; the spelling first seen is the one
/// reported back. Enumeration follows insertion order.
///
/// ## Expansion
/// Option values may refer to other options with the syntax `%(name)s` or
/// `%(section.name)s`. Values returned by [`get`](Self::get) and friends have these
/// references substituted; see [`crate::config`] for the full rules.
///
/// Expanded values are computed on first access and cached inside the store. This means
/// that a `&Config` is not as read-only as it looks: the cache is interior state, and for
/// that reason `Config` is not `Sync`. Every mutation (`set`, `merge_*`) discards all
/// cached expansions, as any option may refer to any other.
#[derive(Debug, Default)]
pub struct Config {
    sections: Vec<Section>,
    index: HashMap<String, usize>,
}

// CONSTRUCTION ////////////////////////////////////////////////////////////////////////////////////

impl Config {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses configuration text
    pub fn parse_str(text: &str) -> Result<Self> {
        Parser::for_str(text).parse()
    }

    /// Parses configuration data from an arbitrary reader.
    /// `source_name` is used in error messages.
    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        Parser::for_reader(BufReader::new(reader), source_name.to_owned()).parse()
    }

    /// Reads a configuration file.
    ///
    /// If the file does not exist, this is an error if `must_exist` is set;
    /// otherwise an empty store is returned.
    pub fn read<P: AsRef<Path>>(path: P, must_exist: bool) -> Result<Self> {
        let path = path.as_ref();
        match Parser::for_path(path) {
            Ok(parser) => {
                debug!("reading configuration from {path:?}");
                parser.parse()
            }
            Err(e) if e.kind() == ErrorKind::NotFound && !must_exist => {
                trace!("configuration file {path:?} not present");
                Ok(Self::new())
            }
            Err(e) => Err(Error::io(format!("opening {}", path.display()), e)),
        }
    }
}

// MERGING /////////////////////////////////////////////////////////////////////////////////////////

impl Config {
    /// Layers another store over this one.
    ///
    /// Every option in `other` overwrites (or creates) the corresponding option here.
    /// Sections not mentioned in `other` are untouched.
    pub fn merge_config(&mut self, other: &Config) {
        for section in &other.sections {
            let _ = self.ensure_section(&section.name);
            for opt in &section.options {
                self.insert_raw(&section.name, &opt.name, &opt.value);
            }
        }
        self.invalidate();
    }

    /// Parses `text` and layers it over this store.
    ///
    /// The text is parsed in full before anything is applied, so a parse error leaves
    /// the store unchanged.
    pub fn merge_str(&mut self, text: &str) -> Result<()> {
        let other = Self::parse_str(text)?;
        self.merge_config(&other);
        Ok(())
    }

    /// Reads a configuration file and layers it over this store.
    ///
    /// A missing file is only an error if `must_exist` is set.
    /// As with [`merge_str`](Self::merge_str), a parse error leaves the store unchanged.
    pub fn merge_file<P: AsRef<Path>>(&mut self, path: P, must_exist: bool) -> Result<()> {
        let other = Self::read(path, must_exist)?;
        self.merge_config(&other);
        Ok(())
    }

    /// Discards every cached expansion
    fn invalidate(&mut self) {
        for opt in self.sections.iter_mut().flat_map(|s| s.options.iter_mut()) {
            let _ = opt.expanded.take();
        }
    }
}

// LOOKUP //////////////////////////////////////////////////////////////////////////////////////////

impl Config {
    pub(crate) fn section(&self, name: &str) -> Option<&Section> {
        self.index.get(&fold(name)).map(|&i| &self.sections[i])
    }

    pub(crate) fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Finds an option, falling back to the `DEFAULT` section
    pub(crate) fn find_option(
        &self,
        section: &str,
        option: &str,
    ) -> Option<(&Section, &ConfigOption)> {
        let found = self
            .section(section)
            .and_then(|s| s.option(option).map(|o| (s, o)));
        if found.is_some() || section.eq_ignore_ascii_case(SECTION_DEFAULT) {
            return found;
        }
        self.section(SECTION_DEFAULT)
            .and_then(|s| s.option(option).map(|o| (s, o)))
    }

    /// Returns the expanded value of an option, computing and caching it if necessary
    fn expanded<'a>(&'a self, section: &Section, opt: &'a ConfigOption) -> &'a str {
        opt.expanded
            .get_or_init(|| expand::expand_option(self, section, opt))
    }

    /// Looks up an option, returning the section it was found in and its expanded value
    pub(crate) fn lookup(&self, section: &str, option: &str) -> Option<(&str, &str)> {
        let (sec, opt) = self.find_option(section, option)?;
        Some((sec.name(), self.expanded(sec, opt)))
    }

    /// As [`lookup`](Self::lookup), but without the `DEFAULT` fallback
    pub(crate) fn lookup_exact(&self, section: &str, option: &str) -> Option<(&str, &str)> {
        let sec = self.section(section)?;
        let opt = sec.option(option)?;
        Some((sec.name(), self.expanded(sec, opt)))
    }

    /// Returns the expanded value of an option, or `None` if it is not present.
    ///
    /// Options not present in `section` are also sought in the `DEFAULT` section.
    ///
    /// This may update the store's expansion cache.
    #[must_use]
    pub fn get_opt(&self, section: &str, option: &str) -> Option<&str> {
        self.lookup(section, option).map(|(_, v)| v)
    }

    /// Returns the expanded value of an option, or `default` if it is not present.
    ///
    /// The default is returned verbatim; it is never expanded.
    ///
    /// This may update the store's expansion cache.
    #[must_use]
    pub fn get<'a>(&'a self, section: &str, option: &str, default: &'a str) -> &'a str {
        self.get_opt(section, option).unwrap_or(default)
    }

    /// Returns the raw (unexpanded) value of an option, without `DEFAULT` fallback
    #[must_use]
    pub fn get_raw(&self, section: &str, option: &str) -> Option<&str> {
        self.section(section)?.option(option).map(ConfigOption::raw)
    }

    /// Reads an option as a boolean.
    ///
    /// Recognised values are `true`/`false`, `yes`/`no`, `on`/`off` and `1`/`0`, in any case.
    /// A missing option yields `default`; a present but unrecognised value is an error.
    pub fn get_bool(&self, section: &str, option: &str, default: bool) -> Result<bool> {
        let Some((found_in, value)) = self.lookup(section, option) else {
            return Ok(default);
        };
        parse_bool(value).ok_or_else(|| Error::MalformedValue {
            section: found_in.to_owned(),
            option: option.to_owned(),
            value: value.to_owned(),
            expected: "a boolean (true/false, yes/no, on/off, 1/0)",
        })
    }

    /// Does the store contain this section?
    #[must_use]
    pub fn has_section(&self, section: &str) -> bool {
        self.section(section).is_some()
    }

    /// Iterates over the section names, in insertion order
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(Section::name)
    }

    /// Iterates over the option names in a section, in insertion order.
    /// An unknown section yields nothing.
    pub fn option_names<'a>(&'a self, section: &str) -> impl Iterator<Item = &'a str> {
        self.section(section)
            .into_iter()
            .flat_map(|s| s.options.iter().map(ConfigOption::name))
    }

    /// Calls `visit` with the name of each section, in insertion order, until it returns
    /// [`ControlFlow::Break`].
    ///
    /// Returns the number of times `visit` was called.
    pub fn enumerate_sections<F>(&self, mut visit: F) -> usize
    where
        F: FnMut(&str) -> ControlFlow<()>,
    {
        let mut count = 0;
        for section in &self.sections {
            count += 1;
            if visit(&section.name).is_break() {
                break;
            }
        }
        count
    }

    /// Calls `visit` with the name and expanded value of each option in `section`,
    /// in insertion order, until it returns [`ControlFlow::Break`].
    ///
    /// Returns the number of times `visit` was called; an unknown section gives 0.
    /// This may update the store's expansion cache.
    pub fn enumerate_options<F>(&self, section: &str, mut visit: F) -> usize
    where
        F: FnMut(&str, &str) -> ControlFlow<()>,
    {
        let Some(sec) = self.section(section) else {
            return 0;
        };
        let mut count = 0;
        for opt in &sec.options {
            count += 1;
            if visit(&opt.name, self.expanded(sec, opt)).is_break() {
                break;
            }
        }
        count
    }
}

/// Interprets one of the accepted boolean spellings
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    const TRUTHY: [&str; 4] = [TRUE, "yes", "on", "1"];
    const FALSY: [&str; 4] = [FALSE, "no", "off", "0"];
    if TRUTHY.iter().any(|t| t.eq_ignore_ascii_case(value)) {
        Some(true)
    } else if FALSY.iter().any(|f| f.eq_ignore_ascii_case(value)) {
        Some(false)
    } else {
        None
    }
}

// MUTATION ////////////////////////////////////////////////////////////////////////////////////////

impl Config {
    /// Returns the named section, creating it if necessary
    pub(crate) fn ensure_section(&mut self, name: &str) -> &mut Section {
        let key = fold(name);
        let i = if let Some(&i) = self.index.get(&key) {
            i
        } else {
            let i = self.sections.len();
            self.sections.push(Section::new(name));
            let _ = self.index.insert(key, i);
            i
        };
        &mut self.sections[i]
    }

    /// Sets a raw value without touching any other option's cache
    pub(crate) fn insert_raw(&mut self, section: &str, option: &str, value: &str) {
        self.ensure_section(section).insert(option, value);
    }

    /// Adds or replaces an option, creating the section if necessary.
    ///
    /// This discards all cached expansions.
    pub fn set(&mut self, section: &str, option: &str, value: &str) {
        self.insert_raw(section, option, value);
        self.invalidate();
    }

    /// Sets an option to `true` or `false`
    pub fn set_bool(&mut self, section: &str, option: &str, value: bool) {
        self.set(section, option, if value { TRUE } else { FALSE });
    }
}

// SERIALISATION ///////////////////////////////////////////////////////////////////////////////////

impl Config {
    /// Writes the raw contents of the store in configuration file format.
    ///
    /// Reading the output back with [`parse_str`](Self::parse_str) gives an equivalent store.
    /// Names and values which could not survive that trip are rejected.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let text = self.to_text()?;
        writer
            .write_all(text.as_bytes())
            .map_err(|e| Error::io("writing configuration", e))
    }

    /// Renders the raw contents of the store in configuration file format
    pub fn to_text(&self) -> Result<String> {
        let mut out = String::new();
        for (i, section) in self.sections.iter().enumerate() {
            check_section_name(&section.name).map_err(|reason| Error::Unrepresentable {
                what: format!("section [{}]", section.name),
                reason,
            })?;
            if i > 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "[{}]", section.name);
            for opt in &section.options {
                let what = || format!("option '{}' in section [{}]", opt.name, section.name);
                check_option_name(&opt.name).map_err(|reason| Error::Unrepresentable {
                    what: what(),
                    reason,
                })?;
                let value = quote_value(&opt.value).map_err(|reason| Error::Unrepresentable {
                    what: what(),
                    reason,
                })?;
                let _ = writeln!(out, "{} = {value}", opt.name);
            }
        }
        Ok(out)
    }
}

///////////////////////////////////////////////////////////////////////////////////////
