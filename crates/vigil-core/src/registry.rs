//! Registry of metric families and the scrape entry point.
//!
//! The collector set is built during setup (`&mut self`) and only read
//! afterwards, so `gather` needs no lock and may run from many threads at
//! once.

use std::collections::HashSet;
use std::sync::Arc;

use crate::baseline;
use crate::error::{Result, VigilError};
use crate::metric::{CallbackCollector, Collector, MetricDescriptor, Sample, ValueSource};

/// Current values of one family.
#[derive(Debug, Clone)]
pub struct FamilySnapshot<'a> {
    pub descriptor: &'a MetricDescriptor,
    pub samples: Vec<Sample>,
}

/// A family whose collection failed during this scrape.
#[derive(Debug)]
pub struct ScrapeFailure {
    pub family: String,
    pub error: VigilError,
}

/// Result of one scrape: healthy families in registration order, plus the
/// families that were left out.
#[derive(Debug, Default)]
pub struct Snapshot<'a> {
    pub families: Vec<FamilySnapshot<'a>>,
    pub failures: Vec<ScrapeFailure>,
}

#[derive(Default)]
pub struct Registry {
    collectors: Vec<Arc<dyn Collector>>,
    names: HashSet<String>,
}

impl Registry {
    /// Registry preloaded with the process and runtime baseline families.
    pub fn new() -> Self {
        let mut registry = Self::bare();
        for c in baseline::collectors() {
            if let Err(e) = registry.register(c) {
                tracing::warn!(error = %e, "baseline collector not registered");
            }
        }
        registry
    }

    /// Registry without baseline families.
    pub fn bare() -> Self {
        Self::default()
    }

    /// Add a family. Fails without side effects if the name is taken.
    pub fn register<C>(&mut self, collector: C) -> Result<()>
    where
        C: Collector + 'static,
    {
        self.register_arc(Arc::new(collector))
    }

    pub fn register_arc(&mut self, collector: Arc<dyn Collector>) -> Result<()> {
        let name = collector.describe().name().to_string();
        if self.names.contains(&name) {
            return Err(VigilError::DuplicateFamily(name));
        }
        tracing::debug!(family = %name, "metric family registered");
        self.names.insert(name);
        self.collectors.push(collector);
        Ok(())
    }

    pub fn create_counter(&mut self, name: &str, help: &str, source: ValueSource) -> Result<()> {
        self.register(CallbackCollector::counter(name, help, source)?)
    }

    pub fn create_gauge(&mut self, name: &str, help: &str, source: ValueSource) -> Result<()> {
        self.register(CallbackCollector::gauge(name, help, source)?)
    }

    pub fn create_counter_vec<I>(
        &mut self,
        name: &str,
        help: &str,
        label_names: &[&str],
        entries: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = (Vec<String>, ValueSource)>,
    {
        self.register(CallbackCollector::counter_vec(name, help, label_names, entries)?)
    }

    pub fn create_gauge_vec<I>(
        &mut self,
        name: &str,
        help: &str,
        label_names: &[&str],
        entries: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = (Vec<String>, ValueSource)>,
    {
        self.register(CallbackCollector::gauge_vec(name, help, label_names, entries)?)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Family names in registration order.
    pub fn family_names(&self) -> Vec<&str> {
        self.collectors.iter().map(|c| c.describe().name()).collect()
    }

    /// Collect every family in registration order. A failing family is
    /// reported in `failures` and does not stop the others.
    pub fn gather(&self) -> Snapshot<'_> {
        let mut snapshot = Snapshot::default();
        for c in &self.collectors {
            let descriptor = c.describe();
            match c.collect() {
                Ok(samples) => snapshot.families.push(FamilySnapshot {
                    descriptor,
                    samples,
                }),
                Err(error) => {
                    tracing::warn!(
                        family = %descriptor.name(),
                        error = %error,
                        "metric family omitted from scrape"
                    );
                    snapshot.failures.push(ScrapeFailure {
                        family: descriptor.name().to_string(),
                        error,
                    });
                }
            }
        }
        snapshot
    }
}
