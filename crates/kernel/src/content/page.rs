//! Page documents and raw block records.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::null_as_default;

/// A page or service page as stored in the CMS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDocument {
    /// Store identifier (numeric ids are converted to strings).
    #[serde(default, deserialize_with = "id_string")]
    pub id: String,

    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,

    /// Ordered block records.
    #[serde(default, deserialize_with = "null_as_default")]
    pub layout: Vec<BlockRecord>,

    #[serde(default)]
    pub meta: Option<PageMeta>,

    /// Only present on service pages.
    #[serde(default, rename = "serviceType")]
    pub service_type: Option<ServiceType>,
}

/// SEO metadata group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    Insurance,
    Accounting,
    WealthManagement,
    HealthcarePlanning,
    Property,
}

impl PageDocument {
    /// `<title>` text: the SEO override if set, else `"{title} | {site_name}"`.
    pub fn document_title(&self, site_name: &str) -> String {
        match self.meta.as_ref().and_then(|m| non_empty(m.title.as_deref())) {
            Some(t) => t.to_string(),
            None => format!("{} | {site_name}", self.title),
        }
    }

    /// Meta description, if the editor set one.
    pub fn description(&self) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|m| non_empty(m.description.as_deref()))
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// One entry of a page's `layout`.
///
/// Records are kept untyped until rendering so that an unknown tag or a
/// malformed block can never fail decoding of the page as a whole. Any JSON
/// value is accepted; a non-object or a missing `blockType` yields an empty
/// tag, which no renderer claims.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct BlockRecord {
    block_type: String,
    fields: Map<String, Value>,
}

impl BlockRecord {
    /// Build a record from a tag and its fields.
    pub fn new(block_type: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            block_type: block_type.into(),
            fields,
        }
    }

    /// The `blockType` tag, or `""` when absent.
    pub fn block_type(&self) -> &str {
        &self.block_type
    }

    /// The block's own fields (everything except the tag).
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Value> for BlockRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut fields) => {
                let block_type = match fields.remove("blockType") {
                    Some(Value::String(tag)) => tag,
                    _ => String::new(),
                };
                Self { block_type, fields }
            }
            _ => Self::default(),
        }
    }
}

impl From<BlockRecord> for Value {
    fn from(record: BlockRecord) -> Self {
        let mut fields = record.fields;
        fields.insert("blockType".to_string(), Value::String(record.block_type));
        Value::Object(fields)
    }
}
