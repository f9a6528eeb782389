//! Error types
// (c) 2024 Ross Younger

use thiserror::Error;

/// Result type alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while loading, querying or persisting configuration.
///
/// Note that a missing option is never an error: lookups return the caller's default instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The input was not in the expected line format.
    #[error("{source_name}:{line}: {message}")]
    Parse {
        /// Where the input came from (a file path, or `<string>`)
        source_name: String,
        /// 1-based line number of the offending line
        line: usize,
        /// What was wrong with it
        message: String,
    },

    /// An option was present, but its value could not be interpreted as the requested type.
    #[error("invalid value '{value}' for option '{option}' in section '{section}' (expected {expected})")]
    MalformedValue {
        /// Section the value was found in
        section: String,
        /// Option name
        option: String,
        /// The offending raw value
        value: String,
        /// Human-readable description of what we wanted
        expected: &'static str,
    },

    /// Some item held in memory cannot be expressed in the on-disk format.
    #[error("cannot write {what}: {reason}")]
    Unrepresentable {
        /// The item concerned
        what: String,
        /// Why it cannot be written
        reason: &'static str,
    },

    /// The underlying storage failed.
    #[error("{context}: {source}")]
    Io {
        /// What we were doing at the time
        context: String,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn parse<S: Into<String>>(source_name: &str, line: usize, message: S) -> Self {
        Self::Parse {
            source_name: source_name.to_owned(),
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Error;

    #[test]
    fn display_parse() {
        let e = Error::parse("servers", 12, "section header expected");
        assert_eq!(e.to_string(), "servers:12: section header expected");
    }

    #[test]
    fn display_malformed() {
        let e = Error::MalformedValue {
            section: "global".into(),
            option: "http-timeout".into(),
            value: "soon".into(),
            expected: "an integer",
        };
        assert_eq!(
            e.to_string(),
            "invalid value 'soon' for option 'http-timeout' in section 'global' (expected an integer)"
        );
    }

    #[test]
    fn io_keeps_source() {
        use std::error::Error as _;
        let e = Error::io(
            "reading /nonexistent",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(e.source().is_some());
        assert!(e.to_string().starts_with("reading /nonexistent: "));
    }
}
