//! ⌨️ Stdin backend: the classic streaming hookup. `worker | kvb-cli bridge.toml`.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{self, BufReader, Stdin};

use crate::backends::TupleSource;
use crate::backends::file::default_separator;
use crate::backends::lines::LineTupleSource;
use crate::common::RawTuple;

#[derive(Debug, Deserialize, Clone)]
pub struct StdinSourceConfig {
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for StdinSourceConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
        }
    }
}

/// ⌨️ Reads tuples from the process's standard input until EOF.
#[derive(Debug)]
pub struct StdinSource {
    lines: LineTupleSource<BufReader<Stdin>>,
}

impl StdinSource {
    pub fn new(config: StdinSourceConfig) -> Result<Self> {
        Ok(Self {
            lines: LineTupleSource::new(BufReader::new(io::stdin()), &config.separator)?,
        })
    }
}

#[async_trait]
impl TupleSource for StdinSource {
    async fn next_tuple(&mut self) -> Result<Option<RawTuple>> {
        self.lines.next_tuple().await
    }
}
