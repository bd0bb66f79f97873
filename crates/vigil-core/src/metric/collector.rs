//! The `Collector` seam and the callback-backed scalar/vector collectors.

use std::sync::Arc;

use crate::error::{Result, VigilError};

use super::descriptor::{MetricDescriptor, MetricKind};
use super::source::ValueSource;

/// One materialized value of a family.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Same order and arity as the descriptor's label names. Empty for
    /// scalar families.
    pub label_values: Arc<[String]>,
    pub value: f64,
}

/// Something that can describe and materialize one metric family.
///
/// `collect` is called concurrently from parallel scrapes and must read its
/// sources fresh on every call.
pub trait Collector: Send + Sync {
    fn describe(&self) -> &MetricDescriptor;
    fn collect(&self) -> Result<Vec<Sample>>;
}

/// One concrete time series within a vector family.
#[derive(Debug, Clone)]
pub struct LabeledInstance {
    descriptor: Arc<MetricDescriptor>,
    label_values: Arc<[String]>,
    source: ValueSource,
}

impl LabeledInstance {
    fn new(
        descriptor: Arc<MetricDescriptor>,
        label_values: Vec<String>,
        source: ValueSource,
    ) -> Result<Self> {
        let expected = descriptor.label_names().len();
        if label_values.len() != expected {
            return Err(VigilError::LabelArity {
                family: descriptor.name().to_string(),
                expected,
                actual: label_values.len(),
            });
        }
        Ok(Self {
            descriptor,
            label_values: label_values.into(),
            source,
        })
    }

    pub fn descriptor(&self) -> &MetricDescriptor {
        &self.descriptor
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    fn sample(&self) -> Result<Sample> {
        Ok(Sample {
            label_values: Arc::clone(&self.label_values),
            value: self.source.read()?,
        })
    }
}

#[derive(Debug)]
enum Series {
    Scalar(ValueSource),
    Vector(Vec<LabeledInstance>),
}

/// Read-through collector backing the built-in counter and gauge variants,
/// scalar or vector.
#[derive(Debug)]
pub struct CallbackCollector {
    descriptor: Arc<MetricDescriptor>,
    series: Series,
}

impl CallbackCollector {
    pub fn counter(name: &str, help: &str, source: ValueSource) -> Result<Self> {
        Self::scalar(name, help, MetricKind::Counter, source)
    }

    pub fn gauge(name: &str, help: &str, source: ValueSource) -> Result<Self> {
        Self::scalar(name, help, MetricKind::Gauge, source)
    }

    pub fn counter_vec<I>(name: &str, help: &str, label_names: &[&str], entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Vec<String>, ValueSource)>,
    {
        Self::vector(name, help, MetricKind::Counter, label_names, entries)
    }

    pub fn gauge_vec<I>(name: &str, help: &str, label_names: &[&str], entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Vec<String>, ValueSource)>,
    {
        Self::vector(name, help, MetricKind::Gauge, label_names, entries)
    }

    fn scalar(name: &str, help: &str, kind: MetricKind, source: ValueSource) -> Result<Self> {
        let descriptor = MetricDescriptor::new(name, help, kind, Vec::new())?;
        Ok(Self {
            descriptor: Arc::new(descriptor),
            series: Series::Scalar(source),
        })
    }

    /// All entries are validated before anything is returned; one bad entry
    /// rejects the whole family.
    fn vector<I>(
        name: &str,
        help: &str,
        kind: MetricKind,
        label_names: &[&str],
        entries: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (Vec<String>, ValueSource)>,
    {
        let labels = label_names.iter().map(|s| s.to_string()).collect();
        let descriptor = Arc::new(MetricDescriptor::new(name, help, kind, labels)?);

        let instances = entries
            .into_iter()
            .map(|(values, source)| LabeledInstance::new(Arc::clone(&descriptor), values, source))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            descriptor,
            series: Series::Vector(instances),
        })
    }

    pub fn instances(&self) -> &[LabeledInstance] {
        match &self.series {
            Series::Scalar(_) => &[],
            Series::Vector(v) => v,
        }
    }
}

impl Collector for CallbackCollector {
    fn describe(&self) -> &MetricDescriptor {
        &self.descriptor
    }

    fn collect(&self) -> Result<Vec<Sample>> {
        match &self.series {
            Series::Scalar(source) => Ok(vec![Sample {
                label_values: Arc::from(Vec::<String>::new()),
                value: source.read()?,
            }]),
            Series::Vector(instances) => instances.iter().map(LabeledInstance::sample).collect(),
        }
    }
}
