//! Fact extraction: turning one [`RawRecord`] into a `(group key, author)`
//! observation for a single product attribute.
//!
//! Every league table is driven by a [`FieldSpec`] rather than a dedicated
//! type per attribute. A spec names the nested paths that form the group key,
//! an optional secondary grouping field, optional filters restricting it to a
//! product subset, and how to format the display name.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::record::RawRecord;

/// Identity of one aggregated entity.
///
/// Ordering is lexicographic over the key values, then the secondary value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub values: Vec<String>,
    pub secondary: Option<String>,
}

/// One auxiliary column carried on an entity (brand, model, fiber, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub label: String,
    pub value: String,
}

/// A single observation extracted from one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFact {
    pub group_key: GroupKey,
    pub author: String,
}

/// A labelled nested path into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyField {
    pub label: String,
    pub path: Vec<String>,
}

impl KeyField {
    pub fn new(label: &str, path: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            path: path.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Restricts a spec to records whose value at `path` equals `value`
/// (trimmed, ASCII case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub path: Vec<String>,
    pub value: String,
}

impl Filter {
    fn matches(&self, record: &RawRecord) -> bool {
        record
            .lookup(self.path.as_slice())
            .is_some_and(|v| v.eq_ignore_ascii_case(self.value.trim()))
    }
}

/// How the display name is built from the group key values.
#[derive(Debug, Clone, Copy)]
pub enum NameFormat {
    /// Joins the non-empty key values with the separator.
    Joined(&'static str),
    /// Arbitrary formatter over the key values, in declaration order.
    Custom(fn(&[String]) -> String),
}

impl NameFormat {
    pub fn format(&self, values: &[String]) -> String {
        match self {
            NameFormat::Joined(sep) => values
                .iter()
                .filter(|v| !v.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(*sep),
            NameFormat::Custom(f) => f(values),
        }
    }
}

/// Pulls facts out of records for one attribute type.
pub trait Extractor {
    /// Returns the fact for `record`, or `None` if the record carries no
    /// usable value for this attribute.
    fn extract(&self, record: &RawRecord) -> Option<ExtractedFact>;

    /// Display name for an entity.
    fn entity_name(&self, key: &GroupKey) -> String;

    /// Attribute columns copied from the group key.
    fn attributes(&self, key: &GroupKey) -> Vec<Attribute>;
}

/// Declarative description of one league table's grouping.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    category: String,
    key: Vec<KeyField>,
    secondary: Option<KeyField>,
    filters: Vec<Filter>,
    name_format: NameFormat,
}

impl FieldSpec {
    pub fn builder(category: &str) -> FieldSpecBuilder {
        FieldSpecBuilder {
            category: category.to_string(),
            key: Vec::new(),
            secondary: None,
            filters: Vec::new(),
            name_format: NameFormat::Joined(" "),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }
}

impl Extractor for FieldSpec {
    fn extract(&self, record: &RawRecord) -> Option<ExtractedFact> {
        if !self.filters.iter().all(|f| f.matches(record)) {
            return None;
        }

        let author = record.author()?;

        let values = self
            .key
            .iter()
            .map(|field| record.lookup(field.path.as_slice()))
            .collect::<Option<Vec<_>>>()?;

        let secondary = match &self.secondary {
            Some(field) => Some(record.lookup(field.path.as_slice())?),
            None => None,
        };

        Some(ExtractedFact {
            group_key: GroupKey { values, secondary },
            author,
        })
    }

    /// A non-empty secondary value is appended in parentheses, keeping names
    /// unique within a table.
    fn entity_name(&self, key: &GroupKey) -> String {
        let name = self.name_format.format(&key.values);
        match key.secondary.as_deref() {
            Some(secondary) if !secondary.is_empty() => format!("{name} ({secondary})"),
            _ => name,
        }
    }

    fn attributes(&self, key: &GroupKey) -> Vec<Attribute> {
        let mut attrs: Vec<Attribute> = self
            .key
            .iter()
            .zip(&key.values)
            .map(|(field, value)| Attribute {
                label: field.label.clone(),
                value: value.clone(),
            })
            .collect();

        if let (Some(field), Some(value)) = (&self.secondary, &key.secondary) {
            attrs.push(Attribute {
                label: field.label.clone(),
                value: value.clone(),
            });
        }

        attrs
    }
}

/// Builder for [`FieldSpec`]; validation happens in [`FieldSpecBuilder::build`].
#[derive(Debug)]
pub struct FieldSpecBuilder {
    category: String,
    key: Vec<KeyField>,
    secondary: Option<KeyField>,
    filters: Vec<Filter>,
    name_format: NameFormat,
}

impl FieldSpecBuilder {
    pub fn key(mut self, label: &str, path: &[&str]) -> Self {
        self.key.push(KeyField::new(label, path));
        self
    }

    pub fn secondary(mut self, label: &str, path: &[&str]) -> Self {
        self.secondary = Some(KeyField::new(label, path));
        self
    }

    pub fn filter(mut self, path: &[&str], value: &str) -> Self {
        self.filters.push(Filter {
            path: path.iter().map(|s| s.to_string()).collect(),
            value: value.to_string(),
        });
        self
    }

    pub fn name_format(mut self, format: NameFormat) -> Self {
        self.name_format = format;
        self
    }

    pub fn build(self) -> Result<FieldSpec, ConfigError> {
        if self.key.is_empty() {
            return Err(ConfigError::EmptyKey {
                category: self.category,
            });
        }

        let labelled_paths = self
            .key
            .iter()
            .chain(self.secondary.iter())
            .map(|f| (f.label.as_str(), &f.path))
            .chain(self.filters.iter().map(|f| ("filter", &f.path)));

        for (label, path) in labelled_paths {
            if path.is_empty() || path.iter().any(|s| s.trim().is_empty()) {
                return Err(ConfigError::EmptyPath {
                    category: self.category.clone(),
                    label: label.to_string(),
                });
            }
        }

        Ok(FieldSpec {
            category: self.category,
            key: self.key,
            secondary: self.secondary,
            filters: self.filters,
            name_format: self.name_format,
        })
    }
}
