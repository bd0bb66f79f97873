//! Family identity: validated name, help text, kind and label names.

use std::collections::HashSet;

use crate::error::{Result, VigilError};

/// Type hint emitted alongside a family. Purely advisory: both kinds read
/// through to a live callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// Identity of a metric family: name, help text, ordered label names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    name: String,
    help: String,
    kind: MetricKind,
    label_names: Vec<String>,
}

impl MetricDescriptor {
    /// Validate and build a descriptor.
    ///
    /// Names follow the Prometheus data model. Label names must be unique and
    /// must not use the reserved `__` prefix.
    pub fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        kind: MetricKind,
        label_names: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();
        if !is_valid_metric_name(&name) {
            return Err(VigilError::InvalidName(format!("metric name {name:?}")));
        }

        let mut seen = HashSet::with_capacity(label_names.len());
        for label in &label_names {
            if !is_valid_label_name(label) {
                return Err(VigilError::InvalidName(format!(
                    "label {label:?} in family {name}"
                )));
            }
            if !seen.insert(label.as_str()) {
                return Err(VigilError::InvalidName(format!(
                    "duplicate label {label:?} in family {name}"
                )));
            }
        }

        Ok(Self {
            name,
            help: help.into(),
            kind,
            label_names,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
