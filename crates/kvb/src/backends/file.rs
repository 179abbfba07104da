//! 📂 File backends: tuples in from a text file, records out as JSON Lines.
//!
//! Config lives next to the backend that uses it. One backend = one config = one file.
//! It avoids the "where the heck is that config defined" scavenger hunt at 2am. 🦆

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::{self, AsyncWriteExt};
use tracing::trace;

use crate::backends::lines::LineTupleSource;
use crate::backends::{RecordSink, Sink, TupleSource};
use crate::common::{RawTuple, StructuredRecord};
use crate::error::SinkError;

/// ➗ Tab. The separator of streaming legends.
pub(crate) fn default_separator() -> String {
    "\t".to_string()
}

// -- 📂 FileSourceConfig: "It's just a file", said no sysadmin ever before the disk filled up.
#[derive(Debug, Deserialize, Clone)]
pub struct FileSourceConfig {
    pub file_name: String,
    #[serde(default = "default_separator")]
    pub separator: String,
}

/// 📂 FileSource: reads a worker's output file, one tuple per line.
#[derive(Debug)]
pub struct FileSource {
    lines: LineTupleSource<io::BufReader<File>>,
}

impl FileSource {
    /// 🚀 Opens the source file and wraps it in a line reader.
    ///
    /// A missing file is an error now, not at the first read.
    pub async fn new(source_config: FileSourceConfig) -> Result<Self> {
        let file_handle = File::open(&source_config.file_name).await.context(format!(
            "💀 Could not open worker output '{}'. Either the worker never wrote it, \
            or it wrote it somewhere else. The tuples stay where they are.",
            source_config.file_name
        ))?;
        let lines = LineTupleSource::new(io::BufReader::new(file_handle), &source_config.separator)
            .context(format!(
                "💀 Invalid separator for source file '{}'",
                source_config.file_name
            ))?;
        Ok(Self { lines })
    }
}

#[async_trait]
impl TupleSource for FileSource {
    async fn next_tuple(&mut self) -> Result<Option<RawTuple>> {
        self.lines.next_tuple().await
    }
}

// -- 🚰 FileSinkConfig: cousin of FileSourceConfig, equally traumatized by disk full errors.
#[derive(Debug, Deserialize, Clone)]
pub struct FileSinkConfig {
    pub file_name: String,
}

/// 🚰 FileSink: one JSON object per record, one record per line.
///
/// It's a BufWriter around a tokio `File`. Simple. Honest. Does not retry.
/// Field order in each line is the schema's field order.
///
/// ⚠️ An existing file at `file_name` is truncated on open.
#[derive(Debug)]
pub struct FileSink {
    file_buf: io::BufWriter<File>,
    line_buf: Vec<u8>,
    sink_config: FileSinkConfig,
}

impl FileSink {
    /// 🚀 Creates (or obliterates and recreates) the sink file and wraps it in a BufWriter.
    pub async fn new(sink_config: FileSinkConfig) -> Result<Self> {
        let file_handle = File::create(&sink_config.file_name).await.context(format!(
            "💀 Could not create the record file '{}'. Does the parent directory exist, \
                and are we allowed to write there?",
            &sink_config.file_name
        ))?;
        // -- 📦 one syscall per record would be a lot of syscalls
        Ok(Self {
            file_buf: io::BufWriter::new(file_handle),
            line_buf: Vec::with_capacity(256),
            sink_config,
        })
    }
}

#[async_trait]
impl RecordSink for FileSink {
    /// 📡 Serialize the record into a reusable line buffer, then write it out.
    async fn write(&mut self, record: StructuredRecord) -> Result<(), SinkError> {
        self.line_buf.clear();
        serde_json::to_writer(&mut self.line_buf, &record).map_err(std::io::Error::from)?;
        self.line_buf.push(b'\n');
        trace!(
            "📬 {}-byte record line walked into '{}'",
            self.line_buf.len(),
            self.sink_config.file_name
        );
        self.file_buf.write_all(&self.line_buf).await?;
        Ok(())
    }
}

#[async_trait]
impl Sink for FileSink {
    /// 🗑️ Flush the BufWriter and close up shop.
    ///
    /// Until this runs, the last records may still be sitting in the buffer, warm and cozy.
    async fn close(&mut self) -> Result<(), SinkError> {
        trace!("🎬 final flush for '{}'", self.sink_config.file_name);
        self.file_buf.flush().await?;
        Ok(())
    }
}
