// ai
//! 📐 Record schemas: the shape every record must take before a sink will look at it.
//!
//! 🎬 COLD OPEN. INT. CUSTOMS OFFICE, 4:12 AM
//!
//! A tuple arrives. Two strings, no luggage, no passport. "Key: `a`. Value: `1`."
//! The officer checks the manifest. "Field `k`, type string. Field `v`, type string."
//! Stamp. Stamp. Welcome to the typed world, kid. Don't make it weird.
//!
//! This module defines [`RecordSchema`], its [`FieldSchema`] slots, and the
//! [`FieldType`]s text gets coerced into. Schemas come from three places:
//! inline TOML, a JSON record-schema file (`{"type":"record","name":..,"fields":[..]}`),
//! or a default derived from the output mode when nobody bothered to write one.
//!
//! ## Knowledge Graph 🧠
//! - Used by: `modes::SchemaResolver` (slot layout + coercion), `app_config` (loading)
//! - Field order is significant. It IS the record's field order. Do not sort. Ever.
//! - Nullable unions (`["null", "string"]`) are accepted and become `optional = true`.
//!
//! ⚠️ Schema evolution is somebody else's problem. This module only knows "now". 🦆

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::common::FieldValue;
use crate::error::BridgeError;
use crate::modes::OutputMode;

/// 🔢 The primitive types a text slot can be coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Bytes,
    Int,
    Long,
    Float,
    Double,
    Boolean,
}

impl FieldType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::Int => "int",
            FieldType::Long => "long",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Boolean => "boolean",
        }
    }

    /// 🔄 Coerce raw text into a typed value. `None` means "that text is not one of me".
    ///
    /// Numbers and booleans forgive surrounding whitespace. Strings and bytes forgive nothing,
    /// because for them whitespace is data.
    pub fn coerce(&self, raw: &str) -> Option<FieldValue> {
        match self {
            FieldType::String => Some(FieldValue::String(raw.to_owned())),
            FieldType::Bytes => Some(FieldValue::Bytes(raw.as_bytes().to_vec())),
            FieldType::Int => raw.trim().parse().ok().map(FieldValue::Int),
            FieldType::Long => raw.trim().parse().ok().map(FieldValue::Long),
            // -- 🚫 NaN, inf and out-of-range text have no JSON form and would land as null
            FieldType::Float => raw
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|x| x.is_finite())
                .map(FieldValue::Float),
            FieldType::Double => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .map(FieldValue::Double),
            FieldType::Boolean => {
                let trimmed = raw.trim();
                if trimmed.eq_ignore_ascii_case("true") {
                    Some(FieldValue::Boolean(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Some(FieldValue::Boolean(false))
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(FieldType::String),
            "bytes" => Ok(FieldType::Bytes),
            "int" => Ok(FieldType::Int),
            "long" => Ok(FieldType::Long),
            "float" => Ok(FieldType::Float),
            "double" => Ok(FieldType::Double),
            "boolean" => Ok(FieldType::Boolean),
            other => Err(format!("unsupported field type '{other}'")),
        }
    }
}

/// 🏷️ `type = "string"` or `type = ["null", "string"]`. Serde picks whichever fits.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TypeSpec {
    Plain(FieldType),
    Union(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct RawFieldSchema {
    name: String,
    #[serde(rename = "type")]
    type_spec: TypeSpec,
    #[serde(default)]
    optional: bool,
}

/// 📦 One named, typed slot in a record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawFieldSchema")]
pub struct FieldSchema {
    pub name: String,
    pub field_type: FieldType,
    /// 🕳️ Empty text becomes `Null` instead of being coerced.
    pub optional: bool,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// 🔄 Coerce one piece of text into this slot, or explain loudly why not.
    pub fn coerce(&self, raw: &str) -> Result<FieldValue, BridgeError> {
        if self.optional && raw.is_empty() {
            return Ok(FieldValue::Null);
        }
        self.field_type
            .coerce(raw)
            .ok_or_else(|| BridgeError::InvalidValue {
                field: self.name.clone(),
                expected: self.field_type,
                raw: raw.to_owned(),
            })
    }
}

impl TryFrom<RawFieldSchema> for FieldSchema {
    type Error = String;

    fn try_from(raw: RawFieldSchema) -> Result<Self, Self::Error> {
        let (field_type, nullable) = match raw.type_spec {
            TypeSpec::Plain(field_type) => (field_type, false),
            TypeSpec::Union(branches) => {
                // -- 🧮 exactly one "null" plus exactly one real type. Anything fancier is evolution.
                let nullable = branches.iter().any(|b| b == "null");
                let mut concrete = branches.iter().filter(|b| *b != "null");
                match (concrete.next(), concrete.next()) {
                    (Some(only), None) => (only.parse::<FieldType>()?, nullable),
                    _ => {
                        return Err(format!(
                            "field '{}' has union {:?}; only [\"null\", <type>] unions are supported",
                            raw.name, branches
                        ));
                    }
                }
            }
        };
        Ok(Self {
            name: raw.name,
            field_type,
            optional: raw.optional || nullable,
        })
    }
}

/// 📐 A named record layout. Field order is the record's field order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordSchema {
    /// 🏷️ JSON schema files say `"type": "record"`. If they say anything else, we object.
    #[serde(rename = "type", default)]
    kind: Option<String>,
    pub name: String,
    pub fields: Vec<FieldSchema>,
}

impl RecordSchema {
    /// 🏗️ Build and validate a schema in one go.
    pub fn new(name: impl Into<String>, fields: Vec<FieldSchema>) -> Result<Self, BridgeError> {
        let schema = Self {
            kind: None,
            name: name.into(),
            fields,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// 🎯 The schema you get when you didn't write one: `key`, `value`, or both, as strings.
    pub fn default_for(mode: OutputMode) -> Self {
        let fields = match mode {
            OutputMode::KeyOnly => vec![FieldSchema::new("key", FieldType::String)],
            OutputMode::ValueOnly => vec![FieldSchema::new("value", FieldType::String)],
            OutputMode::KeyValue => vec![
                FieldSchema::new("key", FieldType::String),
                FieldSchema::new("value", FieldType::String),
            ],
        };
        Self {
            kind: None,
            name: format!("{}Record", mode.record_prefix()),
            fields,
        }
    }

    /// 📄 Parse a JSON record-schema document and validate it.
    pub fn from_json(json: &str) -> Result<Self, BridgeError> {
        let schema: RecordSchema = serde_json::from_str(json)
            .map_err(|e| BridgeError::InvalidSchema(e.to_string()))?;
        schema.validate()?;
        Ok(schema)
    }

    /// ✅ Non-empty name, at least one field, unique non-empty field names, `type` is `record`.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if let Some(kind) = self.kind.as_deref() {
            if kind != "record" {
                return Err(BridgeError::InvalidSchema(format!(
                    "expected a record schema, got type '{kind}'"
                )));
            }
        }
        if self.name.trim().is_empty() {
            return Err(BridgeError::InvalidSchema("schema name is empty".into()));
        }
        if self.fields.is_empty() {
            return Err(BridgeError::InvalidSchema(format!(
                "schema '{}' declares no fields",
                self.name
            )));
        }
        for (i, field) in self.fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(BridgeError::InvalidSchema(format!(
                    "schema '{}' field #{i} has an empty name",
                    self.name
                )));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(BridgeError::InvalidSchema(format!(
                    "schema '{}' declares field '{}' twice",
                    self.name, field.name
                )));
            }
        }
        Ok(())
    }
}
