//! Template variable data model.
//!
//! A [`Template`] is a named, typed placeholder (`:name:`) usable inside stored
//! queries. Its candidate values are [`TemplateValue`]s, each tagged with a
//! [`TemplateValueType`] that decides how the renderer quotes it.
//!
//! The serialized form matches the dashboard JSON the surrounding application
//! stores, so template files can be read straight from an export:
//!
//! ```json
//! {
//!   "id": "1",
//!   "tempVar": ":host:",
//!   "type": "tagValues",
//!   "label": "",
//!   "query": {
//!     "influxql": "SHOW TAG VALUES ON :database: FROM :measurement: WITH KEY=:tagKey:",
//!     "db": "telegraf",
//!     "measurement": "cpu",
//!     "tagKey": "host"
//!   },
//!   "values": [
//!     {"value": "srv", "type": "tagValue", "selected": true, "localSelected": false}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a template.
///
/// Literal kinds carry their values inline; query-backed kinds obtain them by
/// running [`TemplateQuery::influxql`] against a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplateType {
    /// Free text typed by the user
    Text,
    /// Fixed list of literal values
    Csv,
    /// Fixed list of key → value pairs
    Map,
    /// Built-in literal values, e.g. dashboard time ranges
    Constant,
    /// Custom metadata query
    #[serde(rename = "influxql")]
    MetaQuery,
    /// `SHOW FIELD KEYS`
    FieldKeys,
    /// `SHOW MEASUREMENTS`
    Measurements,
    /// `SHOW TAG KEYS`
    TagKeys,
    /// `SHOW TAG VALUES`
    TagValues,
    /// `SHOW DATABASES`
    Databases,
}

impl TemplateType {
    /// Whether values for this kind come from executing a metadata query.
    pub const fn is_query_backed(self) -> bool {
        matches!(
            self,
            Self::MetaQuery
                | Self::FieldKeys
                | Self::Measurements
                | Self::TagKeys
                | Self::TagValues
                | Self::Databases
        )
    }

    /// The value kind given to values produced for this template kind.
    pub const fn value_type(self) -> TemplateValueType {
        match self {
            Self::Text | Self::Constant => TemplateValueType::Constant,
            Self::Csv => TemplateValueType::Csv,
            Self::Map => TemplateValueType::Map,
            Self::MetaQuery => TemplateValueType::MetaQuery,
            Self::FieldKeys => TemplateValueType::FieldKey,
            Self::Measurements => TemplateValueType::Measurement,
            Self::TagKeys => TemplateValueType::TagKey,
            Self::TagValues => TemplateValueType::TagValue,
            Self::Databases => TemplateValueType::Database,
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Csv => "csv",
            Self::Map => "map",
            Self::Constant => "constant",
            Self::MetaQuery => "influxql",
            Self::FieldKeys => "fieldKeys",
            Self::Measurements => "measurements",
            Self::TagKeys => "tagKeys",
            Self::TagValues => "tagValues",
            Self::Databases => "databases",
        };
        f.write_str(name)
    }
}

/// The kind of a single template value. Governs quoting when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplateValueType {
    TagKey,
    TagValue,
    FieldKey,
    Measurement,
    Database,
    TimeStamp,
    Constant,
    Map,
    Csv,
    #[serde(rename = "influxql")]
    MetaQuery,
}

/// Stored query definition of a query-backed template.
///
/// `db`, `measurement` and `tag_key` hold the choices made in the template
/// editor; they fill the `:database:`, `:measurement:` and `:tagKey:` slots
/// of the built-in `SHOW ...` queries. A `flux` script may be stored
/// alongside or instead of `influxql`; it is read for dependencies but never
/// executed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateQuery {
    /// The query text, possibly referencing other templates
    #[serde(default)]
    pub influxql: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flux: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_key: Option<String>,
}

impl TemplateQuery {
    /// A query with only its text set.
    pub fn new(influxql: impl Into<String>) -> Self {
        Self {
            influxql: influxql.into(),
            ..Self::default()
        }
    }
}

/// One candidate value of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateValue {
    /// The literal substituted into queries
    pub value: String,
    /// Human label, only present for map templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "type")]
    pub value_type: TemplateValueType,
    /// Persisted default choice
    #[serde(default)]
    pub selected: bool,
    /// Choice made in the current session
    #[serde(default)]
    pub local_selected: bool,
}

impl TemplateValue {
    /// An unselected value.
    pub fn new(value: impl Into<String>, value_type: TemplateValueType) -> Self {
        Self {
            value: value.into(),
            key: None,
            value_type,
            selected: false,
            local_selected: false,
        }
    }

    /// An unselected map entry.
    pub fn map_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new(value, TemplateValueType::Map)
        }
    }

    #[must_use]
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    #[must_use]
    pub fn local_selected(mut self, local_selected: bool) -> Self {
        self.local_selected = local_selected;
        self
    }
}

/// A named, typed placeholder usable inside stored queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Opaque unique identifier
    pub id: String,
    /// Token text, always of the form `:name:`
    pub temp_var: String,
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<TemplateQuery>,
    /// Last known candidate values, in display order
    #[serde(default)]
    pub values: Vec<TemplateValue>,
    /// Data source the query runs against; the hydration default is used when absent
    #[serde(default, rename = "sourceID", skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl Template {
    /// Create a template with no query and no values.
    ///
    /// `name` is normalized with [`format_temp_var`], so both `host` and
    /// `:host:` yield the token `:host:`.
    pub fn new(id: impl Into<String>, name: &str, template_type: TemplateType) -> Self {
        Self {
            id: id.into(),
            temp_var: format_temp_var(name),
            template_type,
            label: String::new(),
            query: None,
            values: Vec::new(),
            source_id: None,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: TemplateQuery) -> Self {
        self.query = Some(query);
        self
    }

    #[must_use]
    pub fn with_values(mut self, values: Vec<TemplateValue>) -> Self {
        self.values = values;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// The query text, if this template has a non-empty one.
    pub fn query_text(&self) -> Option<&str> {
        self.query.as_ref().map(|q| q.influxql.as_str()).filter(|q| !q.is_empty())
    }

    /// The stored Flux script, if non-empty.
    pub fn flux_text(&self) -> Option<&str> {
        self.query.as_ref().and_then(|q| q.flux.as_deref()).filter(|q| !q.is_empty())
    }

    /// The persisted selection, if any.
    pub fn selected_value(&self) -> Option<&TemplateValue> {
        self.values.iter().find(|v| v.selected)
    }

    /// The session selection, if any.
    pub fn local_selected_value(&self) -> Option<&TemplateValue> {
        self.values.iter().find(|v| v.local_selected)
    }

    /// The value used when rendering: session selection first, then the persisted one.
    pub fn active_value(&self) -> Option<&TemplateValue> {
        self.local_selected_value().or_else(|| self.selected_value())
    }
}

/// Normalize a template name into its `:name:` token.
///
/// Colons and whitespace are stripped before wrapping.
///
/// ```
/// use tempvar_engine::models::format_temp_var;
///
/// assert_eq!(format_temp_var("my host"), ":myhost:");
/// assert_eq!(format_temp_var(":host:"), ":host:");
/// ```
pub fn format_temp_var(name: &str) -> String {
    let bare: String = name.chars().filter(|c| *c != ':' && !c.is_whitespace()).collect();
    format!(":{bare}:")
}

/// Token a caller-supplied name refers to.
///
/// A full `:name:` token is kept as written, so names with inner spaces stay
/// reachable; anything else goes through [`format_temp_var`].
pub fn reference_token(name: &str) -> String {
    if name.len() > 1 && name.starts_with(':') && name.ends_with(':') {
        name.to_string()
    } else {
        format_temp_var(name)
    }
}
