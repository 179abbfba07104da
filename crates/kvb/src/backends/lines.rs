// ai
//! 📜 Line-oriented tuple reading: the wire format external workers actually speak.
//!
//! 🎬 *[the worker process prints "apple\t3" and a newline. it does not know what happens next.]*
//! *[it does not need to. it is a worker. it is at peace.]*
//!
//! One tuple per line. Key and value split at the FIRST separator (tab by default).
//! No separator at all? The whole line is the key and the value is empty, the
//! time-honored streaming convention. Empty lines are skipped, `\r\n` is tolerated,
//! and invalid UTF-8 is a loud error with a line number attached.
//!
//! 🧠 Knowledge graph: shared by `FileSource` and `StdinSource`, which only differ in
//! where their bytes come from. Separator search is `memchr::memmem`, because
//! scanning bytes one at a time is how we got here in the first place. 🦆

use anyhow::{Context, Result, bail};
use memchr::memmem;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::trace;

use crate::common::RawTuple;

/// ➗ Split a line at the first occurrence of the separator.
///
/// Returns `(key, value)`. No separator means `(line, "")`.
pub(crate) fn split_tuple<'l>(line: &'l [u8], finder: &memmem::Finder<'_>) -> (&'l [u8], &'l [u8]) {
    match finder.find(line) {
        Some(at) => (&line[..at], &line[at + finder.needle().len()..]),
        None => (line, &line[line.len()..]),
    }
}

/// 📜 Reads tuples out of any async buffered reader, one line at a time.
pub(crate) struct LineTupleSource<R> {
    reader: R,
    finder: memmem::Finder<'static>,
    line: Vec<u8>,
    line_number: u64,
    exhausted: bool,
}

impl<R> std::fmt::Debug for LineTupleSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineTupleSource")
            .field("separator", &String::from_utf8_lossy(self.finder.needle()))
            .field("line_number", &self.line_number)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

impl<R: AsyncBufRead + Unpin + Send> LineTupleSource<R> {
    /// 🏗️ Wrap a reader. An empty separator is rejected: it would match everywhere.
    pub(crate) fn new(reader: R, separator: &str) -> Result<Self> {
        if separator.is_empty() {
            bail!("💀 The tuple separator is empty. Every byte would be a split point. Pick a tab. Tabs are nice.");
        }
        Ok(Self {
            reader,
            finder: memmem::Finder::new(separator.as_bytes()).into_owned(),
            line: Vec::with_capacity(4096),
            line_number: 0,
            exhausted: false,
        })
    }

    /// 📦 Next non-empty line as a tuple, or `None` at end of input.
    pub(crate) async fn next_tuple(&mut self) -> Result<Option<RawTuple>> {
        if self.exhausted {
            return Ok(None);
        }
        loop {
            self.line.clear();
            let bytes_read = self
                .reader
                .read_until(b'\n', &mut self.line)
                .await
                .with_context(|| format!("💀 Failed reading tuple line {}", self.line_number + 1))?;
            if bytes_read == 0 {
                // -- 🏁 EOF. The well is dry. It stays dry.
                self.exhausted = true;
                return Ok(None);
            }
            self.line_number += 1;

            let mut end = self.line.len();
            if end > 0 && self.line[end - 1] == b'\n' {
                end -= 1;
            }
            if end > 0 && self.line[end - 1] == b'\r' {
                end -= 1;
            }
            if end == 0 {
                continue;
            }

            let (key, value) = split_tuple(&self.line[..end], &self.finder);
            let line_number = self.line_number;
            let key = std::str::from_utf8(key)
                .with_context(|| format!("💀 Line {line_number}: key is not valid UTF-8"))?;
            let value = std::str::from_utf8(value)
                .with_context(|| format!("💀 Line {line_number}: value is not valid UTF-8"))?;
            trace!("📜 line {} split into a {}-byte key and a {}-byte value", line_number, key.len(), value.len());
            return Ok(Some(RawTuple::new(key, value)));
        }
    }
}
