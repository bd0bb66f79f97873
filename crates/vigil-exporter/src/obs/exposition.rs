use std::fmt::Write;

use vigil_core::{FamilySnapshot, MetricKind, Snapshot};

pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
pub const OPENMETRICS_CONTENT_TYPE: &str =
    "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    OpenMetrics,
}

impl Format {
    /// Pick a format from the scraper's `Accept` header.
    pub fn negotiate(accept: Option<&str>) -> Self {
        match accept {
            Some(a) if a.contains("application/openmetrics-text") => Format::OpenMetrics,
            _ => Format::Text,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Format::Text => TEXT_CONTENT_TYPE,
            Format::OpenMetrics => OPENMETRICS_CONTENT_TYPE,
        }
    }
}

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str, format: Format) -> String {
    let s = v.replace('\\', "\\\\").replace('\n', "\\n");
    match format {
        Format::Text => s,
        Format::OpenMetrics => s.replace('"', "\\\""),
    }
}

fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v == f64::INFINITY {
        "+Inf".into()
    } else if v == f64::NEG_INFINITY {
        "-Inf".into()
    } else {
        v.to_string()
    }
}

/// Render every healthy family of a snapshot. Failed families were already
/// dropped by the registry and are not mentioned.
pub fn render(snapshot: &Snapshot<'_>, format: Format) -> String {
    let mut out = String::new();
    for family in &snapshot.families {
        render_family(family, format, &mut out);
    }
    if format == Format::OpenMetrics {
        out.push_str("# EOF\n");
    }
    out
}

fn render_family(family: &FamilySnapshot<'_>, format: Format, out: &mut String) {
    let d = family.descriptor;
    let name = d.name();

    // OpenMetrics names the counter family without `_total` and puts the
    // suffix on the sample.
    let (family_name, sample_name) = match (format, d.kind()) {
        (Format::OpenMetrics, MetricKind::Counter) => {
            let base = name.strip_suffix("_total").unwrap_or(name);
            (base.to_string(), format!("{base}_total"))
        }
        _ => (name.to_string(), name.to_string()),
    };

    if !d.help().is_empty() {
        let _ = writeln!(out, "# HELP {} {}", family_name, escape_help(d.help(), format));
    }
    let _ = writeln!(out, "# TYPE {} {}", family_name, d.kind().as_str());

    for s in &family.samples {
        let label_str = d
            .label_names()
            .iter()
            .zip(s.label_values.iter())
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
            .collect::<Vec<_>>()
            .join(",");
        if label_str.is_empty() {
            let _ = writeln!(out, "{} {}", sample_name, fmt_value(s.value));
        } else {
            let _ = writeln!(out, "{}{{{}}} {}", sample_name, label_str, fmt_value(s.value));
        }
    }
}
