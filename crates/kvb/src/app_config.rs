//! 🔧 App configuration: where a TOML file and some env vars become a bridge task.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." (a bridge with no mode, 3am) 🦆
//!
//! 🏗️ Figment does the layering: `KVB_*` env vars first, then the TOML file on top.
//! Every section has a default except `bridge.mode`, `source_config` and `sink_config`.
//!
//! ```toml
//! [bridge]
//! mode = "KV"
//! [bridge.schema]
//! name = "WordCount"
//! fields = [{ name = "word", type = "string" }, { name = "count", type = "long" }]
//!
//! [source_config.File]
//! file_name = "part-00000"
//!
//! [sink_config.File]
//! file_name = "word_counts.jsonl"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::backends::{FileSinkConfig, FileSourceConfig, InMemorySourceConfig, StdinSourceConfig};
use crate::modes::OutputMode;
use crate::schema::RecordSchema;

/// 📦 The AppConfig: where tuples come from, where records go, and how they get there.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 📡 Where tuples come from.
    pub source_config: SourceConfig,
    /// 🚰 Where records go.
    pub sink_config: SinkConfig,
    /// 🌉 How tuples become records.
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// 🚰 Source selection. Externally tagged: `[source_config.File]`, `[source_config.Stdin]`, ...
#[derive(Debug, Deserialize, Clone)]
pub enum SourceConfig {
    File(FileSourceConfig),
    Stdin(StdinSourceConfig),
    InMemory(InMemorySourceConfig),
}

/// 🕳️ Sink selection. `InMemory` takes no knobs: `sink_config = "InMemory"`.
#[derive(Debug, Deserialize, Clone)]
pub enum SinkConfig {
    File(FileSinkConfig),
    InMemory,
}

/// 🌉 Mode plus schema. The schema is inline, in a file, or derived from the mode.
#[derive(Debug, Deserialize, Clone)]
pub struct BridgeConfig {
    pub mode: OutputMode,
    #[serde(default)]
    pub schema: Option<RecordSchema>,
    #[serde(default)]
    pub schema_file: Option<PathBuf>,
}

impl BridgeConfig {
    /// 📐 Settle on exactly one schema, validated.
    ///
    /// Inline wins if it is the only one. File wins if it is the only one.
    /// Both at once is a contradiction and gets rejected. Neither means
    /// "the default for this mode".
    pub fn resolve_schema(&self) -> anyhow::Result<RecordSchema> {
        match (&self.schema, &self.schema_file) {
            (Some(_), Some(path)) => bail!(
                "💀 bridge.schema and bridge.schema_file ('{}') are both set. Pick one. They cannot both be the truth.",
                path.display()
            ),
            (Some(schema), None) => {
                schema
                    .validate()
                    .context("💀 The inline bridge.schema is not a valid record schema")?;
                Ok(schema.clone())
            }
            (None, Some(path)) => {
                let json = std::fs::read_to_string(path).with_context(|| {
                    format!("💀 Could not read schema file '{}'", path.display())
                })?;
                RecordSchema::from_json(&json).with_context(|| {
                    format!("💀 Schema file '{}' is not a usable record schema", path.display())
                })
            }
            (None, None) => {
                info!("📐 no schema configured, using the default {} schema", self.mode);
                Ok(RecordSchema::default_for(self.mode))
            }
        }
    }
}

/// 🎛️ Runtime knobs for the task around the bridge.
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// 📬 Tuples buffered between the source worker and the bridge loop.
    #[serde(default = "default_queue_capacity", alias = "channel_size")]
    pub queue_capacity: usize,
    /// 🌀 Spin a progress spinner on stderr while the task runs.
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

fn default_queue_capacity() -> usize {
    10
}

fn default_show_progress() -> bool {
    true
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            show_progress: default_show_progress(),
        }
    }
}

/// 🚀 Load the config: `KVB_*` env vars first, the TOML file on top if given.
///
/// 🔧 Merges environment variables (`KVB_*`, nested with `__`, e.g. `KVB_BRIDGE__MODE=KV`)
/// with an optional TOML file. TOML wins on conflicts.
///   - `config_file_name` is None  → env vars only.
///   - `config_file_name` is Some  → env vars + TOML file, merged.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading bridge configuration from {:?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("KVB_").split("__"));
    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (KVB_*). \
             Check the [bridge] table first; it's usually the [bridge] table.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (KVB_*). \
                 No file was given, so KVB_BRIDGE__MODE and friends had to carry it alone."
            .to_string(),
    };

    config.extract().context(context_msg)
}
