//! File parsing internals
// (c) 2024 Ross Younger

use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use tracing::trace;

use super::{
    lines::{parse_line, unquote, Line},
    Config,
};
use crate::error::{Error, Result};

/// The business end of reading a config file.
///
/// # Note
/// You can only use this struct once. If for some reason you want to re-parse a file,
/// you must create a fresh `Parser` to do so.
pub(super) struct Parser<R>
where
    R: Read,
{
    line_number: usize,
    reader: BufReader<R>,
    source: String,
}

impl Parser<File> {
    pub(super) fn for_path<P>(path: P) -> std::io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::for_reader(
            BufReader::new(file),
            path.to_string_lossy().to_string(),
        ))
    }
}

impl<'a> Parser<&'a [u8]> {
    pub(super) fn for_str(s: &'a str) -> Self {
        Self::for_reader(BufReader::new(s.as_bytes()), "<string>".into())
    }
}

/// An option whose value may yet be continued on following lines
struct Pending {
    section: String,
    name: String,
    value: String,
}

impl<R: Read> Parser<R> {
    pub(super) fn for_reader(reader: BufReader<R>, source: String) -> Self {
        Self {
            line_number: 0,
            reader,
            source,
        }
    }

    fn error<S: Into<String>>(&self, message: S) -> Error {
        Error::parse(&self.source, self.line_number, message)
    }

    fn flush(output: &mut Config, pending: Option<Pending>) {
        if let Some(p) = pending {
            output.insert_raw(&p.section, &p.name, unquote(&p.value));
        }
    }

    /// Reads the whole input into a fresh [`Config`].
    /// This consumes the `Parser`.
    ///
    /// Parsing stops at the first malformed line.
    pub(super) fn parse(mut self) -> Result<Config> {
        let mut output = Config::new();
        let mut section: Option<String> = None;
        let mut pending: Option<Pending> = None;
        let mut line = String::new();

        loop {
            line.clear();
            self.line_number += 1;
            let n = self.reader.read_line(&mut line).map_err(|e| {
                Error::io(format!("reading {} line {}", self.source, self.line_number), e)
            })?;
            if n == 0 {
                break; // EOF
            }
            match parse_line(&line).map_err(|msg| self.error(msg))? {
                Line::Empty => (),
                Line::Section { name } => {
                    Self::flush(&mut output, pending.take());
                    // Sections exist even if they turn out to be empty
                    let _ = output.ensure_section(name);
                    section = Some(name.to_owned());
                }
                Line::Option { name, value } => {
                    Self::flush(&mut output, pending.take());
                    let Some(section) = &section else {
                        return Err(self.error("option found before any section header"));
                    };
                    pending = Some(Pending {
                        section: section.clone(),
                        name: name.to_owned(),
                        value: value.to_owned(),
                    });
                }
                Line::Continuation { text } => {
                    let Some(p) = pending.as_mut() else {
                        return Err(self.error("continuation line does not follow an option"));
                    };
                    p.value.push(' ');
                    p.value.push_str(text);
                }
            }
        }
        Self::flush(&mut output, pending);
        trace!(
            "parsed {} section(s) from {}",
            output.section_count(),
            self.source
        );
        Ok(output)
    }
}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use anyhow::Result;
    use assertables::assert_contains;

    use super::Parser;
    use crate::{util::make_test_tempfile, Error};

    #[test]
    fn sections_and_options() -> Result<()> {
        let cfg = Parser::for_str(
            r"
# leading comment
[global]
http-timeout = 60
http-proxy-host: proxy.example.com

[groups]
; another comment
svn-server = *.svn.example.com, 192.168.*
",
        )
        .parse()?;
        assert_eq!(cfg.get_raw("global", "http-timeout"), Some("60"));
        assert_eq!(
            cfg.get_raw("GLOBAL", "HTTP-Proxy-Host"),
            Some("proxy.example.com")
        );
        assert_eq!(
            cfg.get_raw("groups", "svn-server"),
            Some("*.svn.example.com, 192.168.*")
        );
        Ok(())
    }

    #[test]
    fn continuation_lines() -> Result<()> {
        let cfg = Parser::for_str(
            "[helpers]\neditor-cmd = vim\n   -n\n\t+1\nother = x\n",
        )
        .parse()?;
        assert_eq!(cfg.get_raw("helpers", "editor-cmd"), Some("vim -n +1"));
        assert_eq!(cfg.get_raw("helpers", "other"), Some("x"));
        Ok(())
    }

    #[test]
    fn quotes_are_stripped_after_joining() -> Result<()> {
        let cfg = Parser::for_str("[s]\na = \"  spaced  \"\nb = \"one\n  two\"\n").parse()?;
        assert_eq!(cfg.get_raw("s", "a"), Some("  spaced  "));
        assert_eq!(cfg.get_raw("s", "b"), Some("one two"));
        Ok(())
    }

    #[test]
    fn duplicates_overwrite_in_place() -> Result<()> {
        let cfg = Parser::for_str("[s]\na = 1\nb = 2\n[S]\nA = 3\n").parse()?;
        assert_eq!(cfg.get_raw("s", "a"), Some("3"));
        let names: Vec<_> = cfg.option_names("s").collect();
        assert_eq!(names, vec!["a", "b"]);
        let sections: Vec<_> = cfg.section_names().collect();
        assert_eq!(sections, vec!["s"]);
        Ok(())
    }

    #[test]
    fn empty_sections_are_kept() -> Result<()> {
        let cfg = Parser::for_str("[empty]\n[full]\nx = y\n").parse()?;
        assert!(cfg.has_section("empty"));
        assert!(cfg.has_section("full"));
        Ok(())
    }

    #[test]
    fn errors_carry_line_numbers() {
        for (input, line, expected_msg) in [
            ("x = 1\n", 1, "before any section header"),
            ("\n\n  indented\n", 3, "does not follow an option"),
            ("[s]\n\ngarbage\n", 3, "expected an option"),
            ("[s]\n[t\n", 2, "unterminated section header"),
            ("[s]\n  stray\n", 2, "does not follow an option"),
        ] {
            let err = Parser::for_str(input).parse().unwrap_err();
            let Error::Parse {
                line: l, message, ..
            } = &err
            else {
                panic!("unexpected error {err:?} for {input:?}");
            };
            assert_eq!(*l, line, "input {input:?}");
            assert_contains!(message, expected_msg);
        }
    }

    #[test]
    fn read_real_file() -> Result<()> {
        let (path, _dir) = make_test_tempfile("[hi]\nthere = friend\n", "servers");
        let cfg = Parser::for_path(&path)?.parse()?;
        assert_eq!(cfg.get_raw("hi", "there"), Some("friend"));
        Ok(())
    }

    #[test]
    fn error_names_the_file() {
        let (path, _dir) = make_test_tempfile("[hi]\nthere\n", "config");
        let err = Parser::for_path(&path).unwrap().parse().unwrap_err();
        assert_contains!(err.to_string(), path.to_string_lossy().as_ref());
        assert_contains!(err.to_string(), ":2:");
    }
}
