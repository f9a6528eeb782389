//! Server group matching
// (c) 2024 Ross Younger

use std::ops::ControlFlow;

use glob::{MatchOptions, Pattern};
use tracing::{debug, trace};

use super::{Config, SECTION_GLOBAL, SECTION_GROUPS};
use crate::error::{Error, Result};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Does `key` match any of a comma-separated list of shell-style wildcard patterns?
pub(super) fn evaluate_group_match(key: &str, patterns: &str) -> bool {
    patterns
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .any(|p| match Pattern::new(p) {
            Ok(pattern) => pattern.matches_with(key, MATCH_OPTIONS),
            Err(e) => {
                trace!("treating invalid pattern {p:?} literally: {e}");
                p == key
            }
        })
}

impl Config {
    /// Finds the group that `key` (typically a hostname) belongs to.
    ///
    /// Each option in `groups_section` names a group; its value is a comma-separated list of
    /// shell-style wildcard patterns (`*`, `?`, `[abc]`, `[!abc]`).
    /// The options are tried in order and the first whose list matches wins, like
    /// `Host` blocks in an ssh config file.
    ///
    /// This may update the store's expansion cache.
    #[must_use]
    pub fn find_group(&self, key: &str, groups_section: &str) -> Option<&str> {
        let mut found = None;
        let _ = self.enumerate_options(groups_section, |name, patterns| {
            if evaluate_group_match(key, patterns) {
                found = Some(name.to_owned());
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        let found = found?;
        debug!("{key} is in server group {found}");
        // Hand back the store's own copy of the name
        self.option_names(groups_section)
            .find(|n| n.eq_ignore_ascii_case(&found))
    }

    /// Finds the value and source section of a per-group setting.
    /// `DEFAULT` only backs up the global tier, so it never shadows `[global]`.
    fn find_server_setting(&self, group: Option<&str>, option: &str) -> Option<(&str, &str)> {
        group
            .and_then(|g| self.lookup_exact(g, option))
            .or_else(|| self.lookup(SECTION_GLOBAL, option))
    }

    /// Retrieves a setting for a server group.
    ///
    /// The `[group]` section is consulted first (if `group` is given), then the `[global]` section.
    /// If neither holds the option, returns `default` verbatim.
    ///
    /// This may update the store's expansion cache.
    #[must_use]
    pub fn get_server_setting<'a>(
        &'a self,
        group: Option<&str>,
        option: &str,
        default: &'a str,
    ) -> &'a str {
        self.find_server_setting(group, option)
            .map_or(default, |(_, v)| v)
    }

    /// Retrieves an integer setting for a server group.
    ///
    /// Lookup works as for [`get_server_setting`](Self::get_server_setting).
    /// A value which is present but not a base-10 integer is an error.
    pub fn get_server_setting_int(
        &self,
        group: Option<&str>,
        option: &str,
        default: i64,
    ) -> Result<i64> {
        let Some((section, value)) = self.find_server_setting(group, option) else {
            return Ok(default);
        };
        value
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::MalformedValue {
                section: section.to_owned(),
                option: option.to_owned(),
                value: value.to_owned(),
                expected: "an integer",
            })
    }

    /// Retrieves a setting for a given host, via its group in the `[groups]` section
    #[must_use]
    pub fn server_setting_for_host<'a>(
        &'a self,
        host: &str,
        option: &str,
        default: &'a str,
    ) -> &'a str {
        let group = self.find_group(host, SECTION_GROUPS);
        self.get_server_setting(group, option, default)
    }
}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use anyhow::Result;
    use assertables::assert_contains;

    use super::evaluate_group_match;
    use crate::{config::Config, Error};

    const SERVERS: &str = r"
[groups]
svn-server = *.svn.example.com, 192.168.*
Office = [a-c]?.office.example.org
catch-all = *

[global]
http-timeout = 30
http-compression = yes

[svn-server]
http-timeout = 60
http-proxy-port = 3128

[office]
http-proxy-port = eighty
";

    #[test]
    fn group_matching() {
        for (key, patterns, result) in [
            ("foo", "foo", true),
            ("foo", "", false),
            ("foo", " , ,", false),
            ("foo", "bar", false),
            ("foo", "bar, foo", true),
            ("foo", "bar,foo", true),
            ("foo", "  foo  ", true),
            ("foo", "f?o", true),
            ("fooo", "f?o", false),
            ("foo", "f*", true),
            ("oof", "*of", true),
            ("Foo", "foo", false),
            ("b1.office", "[a-c]?.office", true),
            ("d1.office", "[a-c]?.office", false),
            ("d1.office", "[!a-c]?.office", true),
            (".hidden/path", "*", true),
            ("192.168.1.42", "192.168.?.42", true),
            ("192.168.10.42", "192.168.?.42", false),
            ("[unclosed", "[unclosed", true),
            ("x", "[unclosed", false),
        ] {
            assert_eq!(
                evaluate_group_match(key, patterns),
                result,
                "key {key}, patterns {patterns:?}"
            );
        }
    }

    #[test]
    fn first_match_wins() {
        let cfg = Config::parse_str(SERVERS).unwrap();
        assert_eq!(
            cfg.find_group("repo.svn.example.com", "groups"),
            Some("svn-server")
        );
        assert_eq!(cfg.find_group("192.168.0.7", "GROUPS"), Some("svn-server"));
        assert_eq!(
            cfg.find_group("a9.office.example.org", "groups"),
            Some("Office")
        );
        assert_eq!(cfg.find_group("10.0.0.1", "groups"), Some("catch-all"));
    }

    #[test]
    fn no_match() {
        let cfg = Config::parse_str(
            "[groups]\nsvn-server = *.svn.example.com, 192.168.*\n",
        )
        .unwrap();
        assert_eq!(cfg.find_group("10.0.0.1", "groups"), None);
        assert_eq!(cfg.find_group("repo.svn.example.com", "nosuch"), None);
    }

    #[test]
    fn group_patterns_are_expanded() {
        let cfg = Config::parse_str(
            "[DEFAULT]\ndomain = example.com\n[groups]\ncorp = *.%(domain)s\n",
        )
        .unwrap();
        assert_eq!(cfg.find_group("svn.example.com", "groups"), Some("corp"));
    }

    #[test]
    fn override_then_global_then_default() {
        let cfg = Config::parse_str(SERVERS).unwrap();
        assert_eq!(
            cfg.get_server_setting(Some("svn-server"), "http-timeout", "30"),
            "60"
        );
        assert_eq!(
            cfg.get_server_setting(Some("office"), "http-timeout", "99"),
            "30"
        );
        assert_eq!(cfg.get_server_setting(None, "http-timeout", "99"), "30");
        assert_eq!(
            cfg.get_server_setting(Some("svn-server"), "nothing", "dflt"),
            "dflt"
        );
        assert_eq!(
            cfg.get_server_setting(Some("nosuch"), "http-compression", "no"),
            "yes"
        );

        let empty = Config::new();
        assert_eq!(
            empty.get_server_setting(Some("svn-server"), "http-timeout", "30"),
            "30"
        );
    }

    #[test]
    fn default_section_does_not_shadow_global() {
        let cfg = Config::parse_str(
            "[DEFAULT]\nhttp-timeout = 5\n[global]\nhttp-timeout = 30\n[svn-server]\n",
        )
        .unwrap();
        assert_eq!(
            cfg.get_server_setting(Some("svn-server"), "http-timeout", "1"),
            "30"
        );
        let cfg = Config::parse_str("[DEFAULT]\nhttp-timeout = 5\n").unwrap();
        assert_eq!(
            cfg.get_server_setting(Some("svn-server"), "http-timeout", "1"),
            "5"
        );
    }

    #[test]
    fn integer_settings() -> Result<()> {
        let cfg = Config::parse_str(SERVERS)?;
        assert_eq!(
            cfg.get_server_setting_int(Some("svn-server"), "http-proxy-port", 80)?,
            3128
        );
        assert_eq!(cfg.get_server_setting_int(None, "http-timeout", 0)?, 30);
        assert_eq!(
            cfg.get_server_setting_int(Some("svn-server"), "absent", -1)?,
            -1
        );

        let err = cfg
            .get_server_setting_int(Some("office"), "http-proxy-port", 80)
            .unwrap_err();
        assert_contains!(err.to_string(), "eighty");
        assert_contains!(err.to_string(), "http-proxy-port");
        let Error::MalformedValue { section, .. } = err else {
            panic!("unexpected error {err:?}");
        };
        assert_eq!(section, "office");
        Ok(())
    }

    #[test]
    fn settings_by_host() {
        let cfg = Config::parse_str(SERVERS).unwrap();
        assert_eq!(
            cfg.server_setting_for_host("repo.svn.example.com", "http-timeout", "1"),
            "60"
        );
        assert_eq!(
            cfg.server_setting_for_host("elsewhere.net", "http-timeout", "1"),
            "30"
        );
        assert_eq!(
            cfg.server_setting_for_host("elsewhere.net", "http-proxy-port", "none"),
            "none"
        );
    }
}
