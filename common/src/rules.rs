//! # Firewall Rule Records
//!
//! Typed view over the rule definitions found in a rule file.
//!
//! A rule file is a YAML mapping with optional `ingress` and `egress` keys,
//! each mapping a rule name to a rule definition:
//!
//! ```yaml
//! ingress:
//!   allow-web:
//!     subnet_name: app-subnet
//!     subnet_region: europe-west1
//!     destination_ranges: ["10.10.0.0/24"]
//! ```
//!
//! Rule definitions are not deserialized into a strict struct. Every field the
//! gate cares about is captured as a [`FieldValue`] so that an absent key and a
//! key with the wrong shape become distinct, reportable defects.

use std::fmt;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

/// Traffic direction a firewall rule governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleDirection {
    Ingress,
    Egress,
}

impl RuleDirection {
    pub const ALL: [RuleDirection; 2] = [RuleDirection::Ingress, RuleDirection::Egress];

    /// Name of the range list that must be present for this direction.
    pub fn ranges_field(&self) -> &'static str {
        match self {
            RuleDirection::Ingress => "destination_ranges",
            RuleDirection::Egress => "source_ranges",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleDirection::Ingress => "ingress",
            RuleDirection::Egress => "egress",
        }
    }
}

impl fmt::Display for RuleDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a single field inside a rule definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<T> {
    /// Key absent (or explicitly `null`).
    Missing,
    /// Key present but the value has the wrong YAML type.
    WrongType,
    Present(T),
}

impl<T> FieldValue<T> {
    pub fn present(&self) -> Option<&T> {
        match self {
            FieldValue::Present(v) => Some(v),
            _ => None,
        }
    }
}

/// The fields of a rule definition that validation depends on.
///
/// Other keys (`allow`, `priority`, `target_tags`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRule {
    pub subnet_name: FieldValue<String>,
    pub subnet_region: FieldValue<String>,
    pub destination_ranges: FieldValue<Vec<String>>,
    pub source_ranges: FieldValue<Vec<String>>,
}

impl RawRule {
    /// Extracts the known fields from a rule definition.
    ///
    /// Returns `None` when the definition is not a mapping.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_mapping()?;
        Some(Self {
            subnet_name: string_field(map, "subnet_name"),
            subnet_region: string_field(map, "subnet_region"),
            destination_ranges: string_list_field(map, "destination_ranges"),
            source_ranges: string_list_field(map, "source_ranges"),
        })
    }

    /// The range list that governs `direction`.
    pub fn ranges(&self, direction: RuleDirection) -> &FieldValue<Vec<String>> {
        match direction {
            RuleDirection::Ingress => &self.destination_ranges,
            RuleDirection::Egress => &self.source_ranges,
        }
    }
}

fn string_field(map: &Mapping, key: &str) -> FieldValue<String> {
    match map.get(key) {
        None | Some(Value::Null) => FieldValue::Missing,
        Some(Value::String(s)) => FieldValue::Present(s.clone()),
        Some(_) => FieldValue::WrongType,
    }
}

fn string_list_field(map: &Mapping, key: &str) -> FieldValue<Vec<String>> {
    let seq = match map.get(key) {
        None | Some(Value::Null) => return FieldValue::Missing,
        Some(Value::Sequence(seq)) => seq,
        Some(_) => return FieldValue::WrongType,
    };

    let entries: Option<Vec<String>> = seq
        .iter()
        .map(|entry| entry.as_str().map(str::to_string))
        .collect();

    match entries {
        Some(entries) => FieldValue::Present(entries),
        None => FieldValue::WrongType,
    }
}

/// Contents of one rule file.
///
/// Rule order follows the source mapping order.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct RuleFile {
    #[serde(default)]
    pub ingress: Option<Mapping>,
    #[serde(default)]
    pub egress: Option<Mapping>,
}

impl RuleFile {
    /// Parses a rule file. An empty document yields a file without rules.
    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        let value: Value = serde_yaml::from_str(text)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(value)
    }

    /// Iterates `(rule name, definition)` pairs for one direction.
    pub fn rules(&self, direction: RuleDirection) -> impl Iterator<Item = (String, &Value)> {
        let section = match direction {
            RuleDirection::Ingress => self.ingress.as_ref(),
            RuleDirection::Egress => self.egress.as_ref(),
        };
        section
            .into_iter()
            .flat_map(|map| map.iter())
            .map(|(name, rule)| (rule_name(name), rule))
    }

    pub fn rule_count(&self) -> usize {
        self.ingress.as_ref().map_or(0, Mapping::len) + self.egress.as_ref().map_or(0, Mapping::len)
    }
}

fn rule_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "<unnamed>".to_string()),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
