//! 🎬 *[slow zoom on a terminal full of tab-separated lines]*
//! 🎬 "In a world where workers print tuples endlessly..."
//! 🎬 "One supervisor dared to own the sink."
//! 🎬 *[cut to black]* 🦆
//!
//! 📦 The Supervisor module: the task context around the bridge. It owns the sink for
//! the whole task, lends it to the BridgeWriter, and closes it exactly once at the end,
//! whether the task succeeded, failed, or was refused at the door.
//!
//! ```text
//!  SourceWorker (spawned)          Supervisor task (inline)
//!  ┌───────────────┐  channel   ┌──────────────────────────┐     ┌──────┐
//!  │ next_tuple()  │ ─────────▶ │ BridgeWriter::write(k,v) │ ──▶ │ Sink │
//!  └───────────────┘  (bounded) └──────────────────────────┘     └──────┘
//!                                 then writer.close(), then sink.close() ×1
//! ```
//!
//! ⚠️ DO NOT MAKE `workers` PUB EVER. Like Fight Club, but for async tasks.

mod workers;

use anyhow::{Context, Result, anyhow};
use async_channel::Receiver;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::app_config::{AppConfig, SinkConfig, SourceConfig};
use crate::backends::{
    FileSink, FileSource, InMemorySink, InMemorySource, RecordSink, Sink, SinkBackend, SourceBackend,
    StdinSource,
};
use crate::bridge::{BridgeStats, BridgeWriter};
use crate::common::RawTuple;
use crate::error::BridgeError;
use crate::modes::{ModeResolver, OutputMode, SchemaResolver};
use crate::progress::{ProgressMetrics, TaskSummary};
use workers::{SourceWorker, Worker};

/// 📦 The Supervisor: one bridge task, from config to a closed sink.
pub(crate) struct Supervisor {
    app_config: AppConfig,
}

impl Supervisor {
    pub(crate) fn new(app_config: AppConfig) -> Self {
        Self { app_config }
    }

    /// 🚀 Resolve the schema, check it fits the mode, build the backends, run the task.
    ///
    /// The mode/schema check happens BEFORE any backend is built, so a misconfigured
    /// bridge never truncates an output file it was never going to write.
    pub(crate) async fn run(self, shutdown: watch::Receiver<bool>) -> Result<TaskSummary> {
        let bridge_config = &self.app_config.bridge;
        let schema = bridge_config
            .resolve_schema()
            .context("💀 Could not settle on a record schema for the bridge")?;
        let resolver = SchemaResolver::new(schema);
        resolver.validate(bridge_config.mode).context(
            "💀 The configured output mode does not fit the record schema. \
             This is a configuration error; retrying will not help.",
        )?;

        let source = build_source(&self.app_config.source_config).await?;
        let sink = build_sink(&self.app_config.sink_config).await?;
        info!(
            "🌉 bridging in {} mode into schema '{}'",
            bridge_config.mode,
            resolver.schema_name()
        );
        run_task(
            bridge_config.mode,
            resolver,
            source,
            sink,
            self.app_config.runtime.queue_capacity,
            self.app_config.runtime.show_progress,
            shutdown,
        )
        .await
    }
}

/// 🏗️ Source config → live source.
pub(crate) async fn build_source(config: &SourceConfig) -> Result<SourceBackend> {
    Ok(match config {
        SourceConfig::File(file_config) => {
            SourceBackend::File(FileSource::new(file_config.clone()).await?)
        }
        SourceConfig::Stdin(stdin_config) => SourceBackend::Stdin(
            StdinSource::new(stdin_config.clone()).context("💀 Could not set up the stdin source")?,
        ),
        SourceConfig::InMemory(mem_config) => {
            SourceBackend::InMemory(InMemorySource::new(mem_config.clone()))
        }
    })
}

/// 🏗️ Sink config → live sink.
pub(crate) async fn build_sink(config: &SinkConfig) -> Result<SinkBackend> {
    Ok(match config {
        SinkConfig::File(file_config) => SinkBackend::File(FileSink::new(file_config.clone()).await?),
        SinkConfig::InMemory => SinkBackend::InMemory(InMemorySink::new()),
    })
}

/// 🧵 Run one bridge task to completion. This function OWNS the sink.
///
/// Error precedence when several things go wrong at once: bridge, then source, then
/// sink close. The sink is closed exactly once on every path that reaches it.
///
/// 🛑 `shutdown` flipping to `true` stops the task between tuples with
/// `BridgeError::Interrupted`; the sink still gets its one close. A dropped sender
/// just means nobody can ask anymore.
pub async fn run_task<S, R>(
    mode: OutputMode,
    resolver: R,
    source: SourceBackend,
    mut sink: S,
    queue_capacity: usize,
    show_progress: bool,
    shutdown: watch::Receiver<bool>,
) -> Result<TaskSummary>
where
    S: Sink,
    R: ModeResolver,
{
    let (tx, rx) = async_channel::bounded(queue_capacity.max(1));
    let source_handle = SourceWorker::new(tx, source).start();
    let mut progress = ProgressMetrics::new("🌉 kvb", show_progress);

    let bridge_result = bridge_loop(&rx, mode, resolver, &mut sink, &mut progress, shutdown).await;

    // -- 📴 hang up on the source worker, whatever happened
    rx.close();
    progress.finish();
    if bridge_result.is_err() {
        // -- 🪓 it may be parked on a read that never ends (hello, stdin). don't wait for it.
        source_handle.abort();
    }

    // -- 🗑️ the one and only close. the writer is long gone by now; this is the owner's job.
    let close_result = sink.close().await;
    let source_result = match source_handle.await {
        Ok(result) => result,
        Err(join_err) if join_err.is_cancelled() => Ok(()),
        Err(join_err) => Err(anyhow!(join_err)),
    };

    let stats = bridge_result.context("💀 The bridge failed while writing records")?;
    source_result.context("💀 The source worker failed")?;
    if let Err(close_err) = close_result {
        warn!("⚠️ sink close failed after {} records", stats.records_written);
        return Err(BridgeError::from(close_err)).context("💀 The sink failed to close cleanly");
    }

    let summary = TaskSummary::from_stats(stats, progress.elapsed());
    info!(
        "✅ task done: {} tuples, {} records",
        summary.tuples_written, summary.records_written
    );
    Ok(summary)
}

/// 🔁 Drain the channel through a BridgeWriter that borrows the sink for exactly this long.
async fn bridge_loop<S, R>(
    rx: &Receiver<RawTuple>,
    mode: OutputMode,
    resolver: R,
    sink: &mut S,
    progress: &mut ProgressMetrics,
    mut shutdown: watch::Receiver<bool>,
) -> Result<BridgeStats, BridgeError>
where
    S: RecordSink + ?Sized,
    R: ModeResolver,
{
    let mut writer = BridgeWriter::new(mode, resolver, sink)?;
    let drained: Result<(), BridgeError> = async {
        loop {
            let tuple = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => {
                    warn!(
                        "🛑 shutdown requested after {} tuples; stopping before the next one",
                        writer.stats().tuples_written
                    );
                    return Err(BridgeError::Interrupted);
                }
                received = rx.recv() => match received {
                    Ok(tuple) => tuple,
                    Err(_) => return Ok(()),
                },
            };
            writer.write(&tuple.key, &tuple.value).await?;
            progress.tick();
        }
    }
    .await;
    // -- 🏁 end-of-task signal, success or not. the writer never reopens.
    writer.close();
    debug!("🏁 bridge loop finished with {:?}", writer.stats());
    drained.map(|_| writer.stats())
}

/// 🛑 Resolves once `shutdown` reads `true`. Never resolves if the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let sender_gone = shutdown.wait_for(|&stop| stop).await.is_err();
    if sender_gone {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{FileSinkConfig, InMemorySourceConfig};
    use crate::common::StructuredRecord;
    use crate::error::SinkError;
    use crate::schema::RecordSchema;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 🎭 Accepts `budget` records, then reports a broken pipe. Counts closes.
    #[derive(Debug)]
    struct BrittleSink {
        budget: usize,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RecordSink for BrittleSink {
        async fn write(&mut self, _record: StructuredRecord) -> Result<(), SinkError> {
            if self.budget == 0 {
                return Err(SinkError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe)));
            }
            self.budget -= 1;
            Ok(())
        }
    }

    #[async_trait]
    impl Sink for BrittleSink {
        async fn close(&mut self) -> Result<(), SinkError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// 🎭 Passes records through to `inner`, and asks for shutdown once `trip_after`
    /// of them have landed. Like pulling the fire alarm halfway through a shift.
    #[derive(Debug)]
    struct TrippingSink<S> {
        inner: S,
        trip_after: usize,
        written: usize,
        alarm: watch::Sender<bool>,
    }

    #[async_trait]
    impl<S: Sink> RecordSink for TrippingSink<S> {
        async fn write(&mut self, record: StructuredRecord) -> Result<(), SinkError> {
            self.inner.write(record).await?;
            self.written += 1;
            if self.written == self.trip_after {
                let _ = self.alarm.send(true);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl<S: Sink> Sink for TrippingSink<S> {
        async fn close(&mut self) -> Result<(), SinkError> {
            self.inner.close().await
        }
    }

    fn kv_source(n: usize) -> SourceBackend {
        SourceBackend::InMemory(InMemorySource::from_tuples(
            (0..n).map(|i| (format!("k{i}"), format!("v{i}"))),
        ))
    }

    /// 📴 A shutdown signal whose sender is already gone: it can never fire.
    fn no_shutdown() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    fn kv_resolver() -> SchemaResolver {
        SchemaResolver::new(RecordSchema::default_for(OutputMode::KeyValue))
    }

    #[tokio::test]
    async fn the_one_where_everything_arrives_and_the_sink_is_closed_once() -> Result<()> {
        let the_witness = InMemorySink::new();
        let the_summary = run_task(
            OutputMode::KeyValue,
            kv_resolver(),
            kv_source(50),
            SinkBackend::InMemory(the_witness.clone()),
            3,
            false,
            no_shutdown(),
        )
        .await?;

        assert_eq!(the_summary.tuples_written, 50);
        assert_eq!(the_summary.records_written, 50);
        let the_records = the_witness.records().await;
        let the_keys: Vec<&str> = the_records
            .iter()
            .filter_map(|r| r.get("key").and_then(|v| v.as_str()))
            .collect();
        let the_expected: Vec<String> = (0..50).map(|i| format!("k{i}")).collect();
        assert_eq!(the_keys, the_expected, "FIFO in, FIFO out");
        assert_eq!(the_witness.close_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_sink_failure_still_gets_the_sink_closed() {
        let the_closes = Arc::new(AtomicUsize::new(0));
        let the_sink = BrittleSink {
            budget: 2,
            closes: the_closes.clone(),
        };
        let the_err = run_task(
            OutputMode::KeyValue,
            kv_resolver(),
            kv_source(10),
            the_sink,
            1,
            false,
            no_shutdown(),
        )
            .await
            .expect_err("the third record should break the pipe");

        match the_err.downcast_ref::<BridgeError>() {
            Some(BridgeError::Io(inner)) => assert_eq!(inner.kind(), std::io::ErrorKind::BrokenPipe),
            plot_twist => panic!("💀 expected a BridgeError::Io inside, got {plot_twist:?}"),
        }
        assert_eq!(the_closes.load(Ordering::SeqCst), 1, "closed exactly once, even on failure");
    }

    #[tokio::test]
    async fn the_one_where_a_mismatched_mode_closes_the_sink_without_writing() {
        let the_witness = InMemorySink::new();
        let the_err = run_task(
            OutputMode::KeyOnly,
            kv_resolver(),
            kv_source(5),
            SinkBackend::InMemory(the_witness.clone()),
            2,
            false,
            no_shutdown(),
        )
        .await
        .expect_err("KV schema cannot hold K records");

        assert!(matches!(
            the_err.downcast_ref::<BridgeError>(),
            Some(BridgeError::SchemaMismatch { .. })
        ));
        assert!(the_witness.records().await.is_empty());
        assert_eq!(the_witness.close_count(), 1);
    }

    #[tokio::test]
    async fn the_one_where_the_supervisor_refuses_before_touching_the_output_file() -> Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_output = the_dir.path().join("never.jsonl");
        let the_config: AppConfig = toml::from_str(&format!(
            r#"
            [bridge]
            mode = "K"
            [bridge.schema]
            name = "TooWide"
            fields = [{{ name = "a", type = "string" }}, {{ name = "b", type = "string" }}]
            [source_config.InMemory]
            tuples = [["x", "y"]]
            [sink_config.File]
            file_name = "{}"
            [runtime]
            show_progress = false
            "#,
            the_output.display()
        ))?;

        let the_err = Supervisor::new(the_config)
            .run(no_shutdown())
            .await
            .expect_err("mode K cannot fit a two-field schema");
        assert!(matches!(
            the_err.downcast_ref::<BridgeError>(),
            Some(BridgeError::SchemaMismatch { .. })
        ));
        assert!(!the_output.exists(), "no sink should have been built");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_supervisor_runs_memory_to_file() -> Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_output = the_dir.path().join("out.jsonl");
        let the_config = AppConfig {
            source_config: SourceConfig::InMemory(InMemorySourceConfig {
                tuples: vec![("a".into(), "1".into()), ("b".into(), "2".into())],
            }),
            sink_config: SinkConfig::File(FileSinkConfig {
                file_name: the_output.display().to_string(),
            }),
            bridge: crate::app_config::BridgeConfig {
                mode: OutputMode::ValueOnly,
                schema: None,
                schema_file: None,
            },
            runtime: crate::app_config::RuntimeConfig {
                queue_capacity: 1,
                show_progress: false,
            },
        };

        let the_summary = Supervisor::new(the_config).run(no_shutdown()).await?;
        assert_eq!((the_summary.tuples_written, the_summary.records_written), (2, 2));
        let the_contents = tokio::fs::read_to_string(&the_output).await?;
        assert_eq!(the_contents, "{\"value\":\"1\"}\n{\"value\":\"2\"}\n");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_shutdown_mid_task_still_closes_the_sink_once() {
        let (the_alarm, the_shutdown) = watch::channel(false);
        let the_witness = InMemorySink::new();
        let the_sink = TrippingSink {
            inner: the_witness.clone(),
            trip_after: 2,
            written: 0,
            alarm: the_alarm,
        };

        let the_err = run_task(
            OutputMode::KeyValue,
            kv_resolver(),
            kv_source(20),
            the_sink,
            4,
            false,
            the_shutdown,
        )
        .await
        .expect_err("a shutdown must end the task early");

        assert!(matches!(
            the_err.downcast_ref::<BridgeError>(),
            Some(BridgeError::Interrupted)
        ));
        assert_eq!(the_witness.records().await.len(), 2, "stopped between tuples, not mid-way");
        assert_eq!(the_witness.close_count(), 1, "closed exactly once, even when interrupted");
    }

    #[tokio::test]
    async fn the_one_where_a_shutdown_still_flushes_what_the_file_was_given() -> Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_output = the_dir.path().join("partial.jsonl");
        let (the_alarm, the_shutdown) = watch::channel(false);
        let the_sink = TrippingSink {
            inner: FileSink::new(FileSinkConfig {
                file_name: the_output.display().to_string(),
            })
            .await?,
            trip_after: 3,
            written: 0,
            alarm: the_alarm,
        };

        let the_result = run_task(
            OutputMode::KeyValue,
            kv_resolver(),
            kv_source(100),
            the_sink,
            8,
            false,
            the_shutdown,
        )
        .await;
        assert!(the_result.is_err());

        let the_contents = tokio::fs::read_to_string(&the_output).await?;
        assert_eq!(
            the_contents,
            "{\"key\":\"k0\",\"value\":\"v0\"}\n\
             {\"key\":\"k1\",\"value\":\"v1\"}\n\
             {\"key\":\"k2\",\"value\":\"v2\"}\n"
        );
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_shutdown_before_the_first_tuple_writes_nothing() {
        let (the_alarm, the_shutdown) = watch::channel(false);
        the_alarm.send_replace(true);
        let the_witness = InMemorySink::new();

        let the_err = run_task(
            OutputMode::KeyValue,
            kv_resolver(),
            kv_source(5),
            SinkBackend::InMemory(the_witness.clone()),
            2,
            false,
            the_shutdown,
        )
        .await
        .expect_err("already asked to stop");

        assert!(matches!(
            the_err.downcast_ref::<BridgeError>(),
            Some(BridgeError::Interrupted)
        ));
        assert!(the_witness.records().await.is_empty());
        assert_eq!(the_witness.close_count(), 1);
    }
}
