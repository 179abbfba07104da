// ai
//! 🎛️ Output modes and the resolver that packs tuples into records.
//!
//! 🎬 *[three doors. behind door K: the key. behind door V: the value.]*
//! *[behind door KV: both, holding hands, in that order, forever.]*
//!
//! [`OutputMode`] decides how many logical fields go into each record.
//! [`ModeResolver`] is the strategy seam the `BridgeWriter` is parameterized over;
//! [`SchemaResolver`] is the schema-driven implementation everybody actually uses.
//!
//! ## Slot matching 🧩
//!
//! Positional. The schema must declare exactly as many fields as the mode packs:
//!
//! | Mode | Packs | Schema slot 0 | Schema slot 1 |
//! |---|---|---|---|
//! | `K` | 1 | key | n/a |
//! | `V` | 1 | value | n/a |
//! | `KV` | 2 | key | value |
//!
//! Anything else is a `SchemaMismatch`, and `SchemaMismatch` is forever. 🦆

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::common::StructuredRecord;
use crate::error::BridgeError;
use crate::schema::{FieldSchema, RecordSchema};

/// 🎛️ Which halves of the tuple make it into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum OutputMode {
    /// `K`: the key, alone.
    KeyOnly,
    /// `V`: the value, alone.
    ValueOnly,
    /// `KV`: key then value.
    KeyValue,
}

impl OutputMode {
    /// 🔢 How many fields every record of this mode carries.
    pub const fn arity(&self) -> usize {
        match self {
            OutputMode::KeyOnly | OutputMode::ValueOnly => 1,
            OutputMode::KeyValue => 2,
        }
    }

    /// 🏷️ The short code: `K`, `V`, `KV`.
    pub const fn code(&self) -> &'static str {
        match self {
            OutputMode::KeyOnly => "K",
            OutputMode::ValueOnly => "V",
            OutputMode::KeyValue => "KV",
        }
    }

    pub(crate) const fn record_prefix(&self) -> &'static str {
        match self {
            OutputMode::KeyOnly => "Key",
            OutputMode::ValueOnly => "Value",
            OutputMode::KeyValue => "KeyValue",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for OutputMode {
    type Err = String;

    /// 🔤 Accepts `K`/`V`/`KV` and the long spellings, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "K" | "KEY" | "KEY_ONLY" => Ok(OutputMode::KeyOnly),
            "V" | "VALUE" | "VALUE_ONLY" => Ok(OutputMode::ValueOnly),
            "KV" | "KEY_VALUE" => Ok(OutputMode::KeyValue),
            _ => Err(format!(
                "unknown output mode '{s}'. Valid values: 'K', 'V', 'KV' (or KEY_ONLY, VALUE_ONLY, KEY_VALUE)"
            )),
        }
    }
}

impl TryFrom<String> for OutputMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 🧩 The strategy seam: turn one tuple into records for a given mode.
///
/// # Contract 📜
/// - `validate(mode)` fails with `SchemaMismatch` iff `assemble(mode, ..)` always would.
/// - `assemble` returns records in the order they must reach the sink.
/// - No side effects beyond allocating the returned records.
pub trait ModeResolver: Send + Sync {
    /// ✅ Check that the target schema has a slot layout for `mode`.
    fn validate(&self, mode: OutputMode) -> Result<(), BridgeError>;

    /// 🏗️ Pack `key` and `value` into records according to `mode`.
    fn assemble(
        &self,
        mode: OutputMode,
        key: &str,
        value: &str,
    ) -> Result<Vec<StructuredRecord>, BridgeError>;
}

/// 📐 A resolved slot: the field definition plus a shareable copy of its name.
#[derive(Debug, Clone)]
struct Slot {
    name: Arc<str>,
    field: FieldSchema,
}

/// 🎯 Packs tuples into records shaped by a [`RecordSchema`].
#[derive(Debug, Clone)]
pub struct SchemaResolver {
    schema_name: Arc<str>,
    slots: Vec<Slot>,
}

impl SchemaResolver {
    pub fn new(schema: RecordSchema) -> Self {
        let slots = schema
            .fields
            .into_iter()
            .map(|field| Slot {
                name: Arc::from(field.name.as_str()),
                field,
            })
            .collect();
        Self {
            schema_name: Arc::from(schema.name),
            slots,
        }
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    fn mismatch(&self, mode: OutputMode) -> BridgeError {
        BridgeError::SchemaMismatch {
            mode,
            schema: self.schema_name.to_string(),
            expected: mode.arity(),
            actual: self.slots.len(),
        }
    }
}

impl ModeResolver for SchemaResolver {
    fn validate(&self, mode: OutputMode) -> Result<(), BridgeError> {
        if self.slots.len() == mode.arity() {
            Ok(())
        } else {
            Err(self.mismatch(mode))
        }
    }

    fn assemble(
        &self,
        mode: OutputMode,
        key: &str,
        value: &str,
    ) -> Result<Vec<StructuredRecord>, BridgeError> {
        let mut record = StructuredRecord::with_capacity(self.schema_name.clone(), mode.arity());
        match (mode, self.slots.as_slice()) {
            (OutputMode::KeyOnly, [key_slot]) => {
                record.push(key_slot.name.clone(), key_slot.field.coerce(key)?);
            }
            (OutputMode::ValueOnly, [value_slot]) => {
                record.push(value_slot.name.clone(), value_slot.field.coerce(value)?);
            }
            (OutputMode::KeyValue, [key_slot, value_slot]) => {
                record.push(key_slot.name.clone(), key_slot.field.coerce(key)?);
                record.push(value_slot.name.clone(), value_slot.field.coerce(value)?);
            }
            _ => return Err(self.mismatch(mode)),
        }
        Ok(vec![record])
    }
}
