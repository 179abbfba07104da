//! 🎬 The whole trip, through the public API only: tuples in one end, records out the other.

use anyhow::Result;
use kvb::backends::{InMemorySink, InMemorySource, SinkBackend, SourceBackend};
use kvb::{
    BridgeWriter, FieldSchema, FieldType, FieldValue, OutputMode, RecordSchema, SchemaResolver,
    run_task,
};

fn kv_schema() -> Result<RecordSchema> {
    Ok(RecordSchema::new(
        "kv",
        vec![
            FieldSchema::new("k", FieldType::String),
            FieldSchema::new("v", FieldType::String),
        ],
    )?)
}

fn as_pairs(records: &[kvb::StructuredRecord]) -> Vec<Vec<(String, FieldValue)>> {
    records
        .iter()
        .map(|r| r.fields().map(|(name, value)| (name.to_string(), value.clone())).collect())
        .collect()
}

#[tokio::test]
async fn the_one_where_two_tuples_become_two_records_in_order() -> Result<()> {
    let mut the_sink = InMemorySink::new();
    let mut the_writer =
        BridgeWriter::new(OutputMode::KeyValue, SchemaResolver::new(kv_schema()?), &mut the_sink)?;
    for (key, value) in [("a", "1"), ("b", "2")] {
        the_writer.write(key, value).await?;
    }
    the_writer.close();

    let text = |s: &str| FieldValue::String(s.to_string());
    assert_eq!(
        as_pairs(&the_sink.records().await),
        vec![
            vec![("k".to_string(), text("a")), ("v".to_string(), text("1"))],
            vec![("k".to_string(), text("b")), ("v".to_string(), text("2"))],
        ]
    );
    assert_eq!(the_sink.close_count(), 0, "the writer borrowed the sink; it did not close it");
    Ok(())
}

#[tokio::test]
async fn the_one_where_the_task_runner_does_the_same_and_closes_up() -> Result<()> {
    let the_witness = InMemorySink::new();
    let the_summary = run_task(
        OutputMode::KeyValue,
        SchemaResolver::new(kv_schema()?),
        SourceBackend::InMemory(InMemorySource::from_tuples([("a", "1"), ("b", "2")])),
        SinkBackend::InMemory(the_witness.clone()),
        4,
        false,
        tokio::sync::watch::channel(false).1,
    )
    .await?;

    assert_eq!(the_summary.records_written, 2);
    let the_json: Vec<String> = the_witness
        .records()
        .await
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<_, _>>()?;
    assert_eq!(the_json, [r#"{"k":"a","v":"1"}"#, r#"{"k":"b","v":"2"}"#]);
    assert_eq!(the_witness.close_count(), 1);
    Ok(())
}
