// ai
//! 📦 Common data structures: the things that actually cross the bridge.
//!
//! 🎬 COLD OPEN. INT. LOADING DOCK, 3:47 AM
//!
//! Two strings step off the truck from the worker process. They are untyped.
//! They are unschema'd. They have no idea what a "field" is. By the time they
//! reach the far side of the dock they will be a [`StructuredRecord`], wearing
//! a name tag for every value and standing in exactly the order the schema said.
//! Character development. In O(fields).
//!
//! - [`RawTuple`]: what the transport hands us. Two `String`s. No opinions.
//! - [`FieldValue`]: one coerced value. The typed half of a field.
//! - [`StructuredRecord`]: named, ordered, typed fields. What the sink receives. 🦆

use std::sync::Arc;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

/// 📬 One key/value pair as the external worker emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTuple {
    pub key: String,
    pub value: String,
}

impl RawTuple {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for RawTuple {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// 🔢 A single typed value, post-coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    String(String),
    Bytes(Vec<u8>),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
}

impl FieldValue {
    /// 🔍 Peek at a string value without the ceremony of a match.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// 🧱 A schema-typed record: named fields, schema order, no surprises.
///
/// Field names are `Arc<str>` shared with the resolver's slot table, so building
/// a record per tuple costs one refcount bump per field instead of one allocation.
/// The record is handed to the sink by value; nobody upstream keeps a copy.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRecord {
    schema: Arc<str>,
    fields: Vec<(Arc<str>, FieldValue)>,
}

impl StructuredRecord {
    pub(crate) fn with_capacity(schema: Arc<str>, capacity: usize) -> Self {
        Self {
            schema,
            fields: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: Arc<str>, value: FieldValue) {
        self.fields.push((name, value));
    }

    /// 🏷️ Name of the schema this record conforms to.
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 🔍 Look a field up by name. Linear scan; records have one or two fields.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name.as_ref() == name)
            .map(|(_, value)| value)
    }

    /// 📋 Field names in record order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_ref())
    }

    /// 📋 `(name, value)` pairs in record order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_ref(), value))
    }
}

impl Serialize for StructuredRecord {
    /// 📡 Serializes as a map in field order. Hand-rolled so serde_json's `Map`
    /// never gets the chance to alphabetize anything.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name.as_ref(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn the_usual_record() -> StructuredRecord {
        let mut record = StructuredRecord::with_capacity(Arc::from("kv"), 2);
        record.push(Arc::from("zebra"), FieldValue::String("a".into()));
        record.push(Arc::from("apple"), FieldValue::Long(1));
        record
    }

    #[test]
    fn the_one_where_json_keeps_schema_order_not_alphabetical_order() -> anyhow::Result<()> {
        let the_json = serde_json::to_string(&the_usual_record())?;
        assert_eq!(the_json, r#"{"zebra":"a","apple":1}"#);
        Ok(())
    }

    #[test]
    fn the_one_where_fields_can_be_found_by_name() {
        let the_record = the_usual_record();
        assert_eq!(the_record.schema_name(), "kv");
        assert_eq!(the_record.len(), 2);
        assert_eq!(the_record.get("zebra").and_then(FieldValue::as_str), Some("a"));
        assert_eq!(the_record.get("apple"), Some(&FieldValue::Long(1)));
        assert_eq!(the_record.get("mango"), None);
        assert_eq!(the_record.field_names().collect::<Vec<_>>(), ["zebra", "apple"]);
    }

    #[test]
    fn the_one_where_nulls_and_bytes_serialize_plainly() -> anyhow::Result<()> {
        let mut the_record = StructuredRecord::with_capacity(Arc::from("odd"), 2);
        the_record.push(Arc::from("nothing"), FieldValue::Null);
        the_record.push(Arc::from("raw"), FieldValue::Bytes(b"hi".to_vec()));
        assert_eq!(
            serde_json::to_string(&the_record)?,
            r#"{"nothing":null,"raw":[104,105]}"#
        );
        Ok(())
    }
}
