//! Hash dump file format
// (c) 2024 Ross Younger
//
// Each entry is written as a length-prefixed key and value:
//
//   K <key length in bytes>
//   <key>
//   V <value length in bytes>
//   <value>
//
// and the file ends with a line `END`.

use std::{
    collections::BTreeMap,
    io::{BufRead, ErrorKind, Read as _, Write},
};

use crate::error::{Error, Result};

const END: &str = "END";

/// Writes a map in hash dump format
pub(super) fn write_hash<W: Write>(
    writer: &mut W,
    data: &BTreeMap<String, String>,
) -> std::io::Result<()> {
    for (k, v) in data {
        writeln!(writer, "K {}\n{k}", k.len())?;
        writeln!(writer, "V {}\n{v}", v.len())?;
    }
    writeln!(writer, "{END}")
}

struct Reader<'a, R: BufRead> {
    reader: &'a mut R,
    source: &'a str,
    line_number: usize,
}

impl<R: BufRead> Reader<'_, R> {
    fn error<S: Into<String>>(&self, message: S) -> Error {
        Error::parse(self.source, self.line_number, message)
    }

    fn map_io(&self, e: std::io::Error) -> Error {
        if matches!(e.kind(), ErrorKind::UnexpectedEof | ErrorKind::InvalidData) {
            self.error(format!("truncated or corrupt record: {e}"))
        } else {
            Error::io(format!("reading {}", self.source), e)
        }
    }

    /// Reads a header line, without its line ending. None at end of input.
    fn header(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        self.line_number += 1;
        let n = self
            .reader
            .read_line(&mut line)
            .map_err(|e| self.map_io(e))?;
        if n == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Parses a `K n` or `V n` header
    fn length(&self, header: &str, tag: char) -> Result<usize> {
        header
            .strip_prefix(tag)
            .and_then(|rest| rest.strip_prefix(' '))
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| self.error(format!("expected '{tag} <length>', found {header:?}")))
    }

    /// Reads `len` bytes of data plus the newline which follows them.
    /// The length comes from the file, so it is not trusted for allocation.
    fn body(&mut self, len: usize) -> Result<String> {
        let Some(want) = len.checked_add(1) else {
            return Err(self.error(format!("record length {len} is too large")));
        };
        let limit = u64::try_from(want)
            .map_err(|_| self.error(format!("record length {len} is too large")))?;
        let mut buf = Vec::new();
        let result = self.reader.by_ref().take(limit).read_to_end(&mut buf);
        let _ = result.map_err(|e| self.map_io(e))?;
        if buf.len() < want {
            return Err(self.error("truncated or corrupt record: unexpected end of file"));
        }
        if buf.pop() != Some(b'\n') {
            self.line_number += 1;
            return Err(self.error("data is not followed by a newline"));
        }
        let text = String::from_utf8(buf).map_err(|_| self.error("data is not valid UTF-8"))?;
        self.line_number += 1 + text.matches('\n').count();
        Ok(text)
    }

    fn read(mut self) -> Result<BTreeMap<String, String>> {
        let mut output = BTreeMap::new();
        loop {
            let Some(header) = self.header()? else {
                return Err(self.error("unexpected end of file"));
            };
            if header == END {
                break;
            }
            let len = self.length(&header, 'K')?;
            let key = self.body(len)?;
            let Some(header) = self.header()? else {
                return Err(self.error("unexpected end of file"));
            };
            let len = self.length(&header, 'V')?;
            let value = self.body(len)?;
            let _ = output.insert(key, value);
        }
        Ok(output)
    }
}

/// Reads a map in hash dump format. `source` is used in error messages.
pub(super) fn read_hash<R: BufRead>(
    reader: &mut R,
    source: &str,
) -> Result<BTreeMap<String, String>> {
    Reader {
        reader,
        source,
        line_number: 0,
    }
    .read()
}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use anyhow::Result;
    use assertables::assert_contains;

    use super::{read_hash, write_hash};
    use crate::Error;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn known_layout() -> Result<()> {
        let mut buf = Vec::new();
        write_hash(&mut buf, &map(&[("username", "alice"), ("svn:realmstring", "R")]))?;
        assert_eq!(
            String::from_utf8(buf)?,
            "K 15\nsvn:realmstring\nV 1\nR\nK 8\nusername\nV 5\nalice\nEND\n"
        );
        Ok(())
    }

    #[test]
    fn awkward_values() -> Result<()> {
        let data = map(&[
            ("multi", "line one\nline two\n"),
            ("empty", ""),
            ("unicode", "caf\u{e9} \u{1f980}"),
            ("looks like END", "END\nK 3\n"),
        ]);
        let mut buf = Vec::new();
        write_hash(&mut buf, &data)?;
        let back = read_hash(&mut buf.as_slice(), "test")?;
        assert_eq!(back, data);
        Ok(())
    }

    #[test]
    fn corrupt_input() {
        for (input, expected_msg) in [
            ("", "unexpected end of file"),
            ("K 3\nabc\n", "unexpected end of file"),
            ("X 3\nabc\n", "expected 'K <length>'"),
            ("K three\nabc\n", "expected 'K <length>'"),
            ("K 3\nabc\nK 1\nx\nEND\n", "expected 'V <length>'"),
            ("K 10\nabc\n", "truncated"),
            ("K 2\nabc\nV 1\nx\nEND\n", "not followed by a newline"),
        ] {
            let err = read_hash(&mut input.as_bytes(), "record").unwrap_err();
            assert_contains!(err.to_string(), expected_msg);
            assert_contains!(err.to_string(), "record:");
        }
    }

    #[test]
    fn absurd_lengths_are_errors() {
        for (len, expected_msg) in [
            (usize::MAX, "too large"),
            (usize::MAX - 1, "truncated"),
            (1 << 30, "truncated"),
        ] {
            let input = format!("K {len}\nabc\nV 1\nx\nEND\n");
            let err = read_hash(&mut input.as_bytes(), "record").unwrap_err();
            assert!(matches!(err, Error::Parse { .. }), "{err:?}");
            assert_contains!(err.to_string(), expected_msg);
        }
    }
}
