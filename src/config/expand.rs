//! Value expansion
// (c) 2024 Ross Younger

use std::collections::HashMap;

use tracing::{trace, warn};

use super::store::{Config, ConfigOption, Section};

/// References nested deeper than this expand to nothing
pub(crate) const MAX_EXPANSION_DEPTH: usize = 64;

const REF_OPEN: &str = "%(";
const REF_CLOSE: &str = ")s";

/// (section, option), both case-folded
type Key = (String, String);

fn key_of(section: &Section, opt: &ConfigOption) -> Key {
    (
        section.name().to_ascii_lowercase(),
        opt.name().to_ascii_lowercase(),
    )
}

/// The result of expanding some text
struct Expansion {
    text: String,
    /// False if any part was cut short by the cycle or depth guard
    clean: bool,
    /// How many levels of nested references were followed
    height: usize,
}

/// State for one top-level expansion.
///
/// Expansion always works from raw values and never consults the store's cache, so the
/// result for a given option does not depend on what has been looked up before.
struct Expander<'a> {
    config: &'a Config,
    /// The options currently being expanded, outermost first
    chain: Vec<Key>,
    /// Results which did not depend on where they were reached from, with their heights
    memo: HashMap<Key, (String, usize)>,
}

impl<'a> Expander<'a> {
    fn new(config: &'a Config, root: Key) -> Self {
        Self {
            config,
            chain: vec![root],
            memo: HashMap::new(),
        }
    }

    /// Finds the target of a reference made from within `section`.
    ///
    /// An unqualified name is tried first; failing that, `section.option` splits at the last dot.
    fn locate(&self, section: &str, name: &str) -> Option<(&'a Section, &'a ConfigOption)> {
        self.config.find_option(section, name).or_else(|| {
            let (sec, opt) = name.rsplit_once('.')?;
            self.config.find_option(sec, opt)
        })
    }

    /// Substitutes every reference in `raw`
    fn substitute(&mut self, raw: &str, section: &str) -> Expansion {
        let mut out = Expansion {
            text: String::with_capacity(raw.len()),
            clean: true,
            height: 0,
        };
        let mut rest = raw;
        while let Some(start) = rest.find(REF_OPEN) {
            let after = &rest[start + REF_OPEN.len()..];
            let Some(end) = after.find(REF_CLOSE) else {
                break; // unterminated; copied through below
            };
            out.text.push_str(&rest[..start]);
            let inner = self.resolve(section, &after[..end]);
            out.text.push_str(&inner.text);
            out.clean &= inner.clean;
            out.height = out.height.max(inner.height);
            rest = &after[end + REF_CLOSE.len()..];
        }
        out.text.push_str(rest);
        out
    }

    fn resolve(&mut self, section: &str, name: &str) -> Expansion {
        let Some((target_section, target)) = self.locate(section, name) else {
            trace!("reference %({name})s in [{section}] does not exist");
            return Expansion {
                text: String::new(),
                clean: true,
                height: 0,
            };
        };
        let key = key_of(target_section, target);
        if self.chain.contains(&key) {
            trace_cycle(&self.chain, &key);
            return Expansion {
                text: String::new(),
                clean: false,
                height: 0,
            };
        }
        // A memoised result is only reused if it fits in the remaining depth,
        // so that it is exactly what a fresh expansion from here would give.
        if let Some((text, height)) = self.memo.get(&key) {
            if self.chain.len() + height <= MAX_EXPANSION_DEPTH {
                return Expansion {
                    text: text.clone(),
                    clean: true,
                    height: *height,
                };
            }
        }
        if self.chain.len() >= MAX_EXPANSION_DEPTH {
            warn!(
                "expansion of [{}] {} exceeded the maximum depth of {MAX_EXPANSION_DEPTH}",
                self.chain[0].0, self.chain[0].1
            );
            return Expansion {
                text: String::new(),
                clean: false,
                height: 0,
            };
        }

        self.chain.push(key);
        let mut result = self.substitute(target.raw(), target_section.name());
        result.height += 1;
        let key = self.chain.pop().unwrap_or_default();
        if result.clean {
            let _ = self
                .memo
                .insert(key, (result.text.clone(), result.height));
        }
        result
    }
}

fn trace_cycle(chain: &[Key], key: &Key) {
    let path: Vec<_> = chain
        .iter()
        .chain(std::iter::once(key))
        .map(|(s, o)| format!("[{s}] {o}"))
        .collect();
    trace!("expansion cycle: {}", path.join(" -> "));
}

/// Fully expands the value of `opt`, which lives in `section` of `config`
pub(super) fn expand_option(config: &Config, section: &Section, opt: &ConfigOption) -> String {
    let raw = opt.raw();
    if !raw.contains(REF_OPEN) {
        return raw.to_owned();
    }
    Expander::new(config, key_of(section, opt))
        .substitute(raw, section.name())
        .text
}

///////////////////////////////////////////////////////////////////////////////////////
