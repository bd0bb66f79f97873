//! Live value callbacks read at scrape time.

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, VigilError};

type SourceFn = dyn Fn() -> Result<f64> + Send + Sync;

/// Live callback supplying a metric's current value.
///
/// Invoked synchronously inside every scrape, possibly from several threads
/// at once. Sources must be cheap and must not block on I/O.
#[derive(Clone)]
pub struct ValueSource {
    f: Arc<SourceFn>,
}

impl ValueSource {
    /// Wrap an infallible callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        Self {
            f: Arc::new(move || Ok(f())),
        }
    }

    /// Wrap a callback that may fail. The error fails only the family the
    /// source belongs to.
    pub fn fallible<F, E>(f: F) -> Self
    where
        F: Fn() -> std::result::Result<f64, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self {
            f: Arc::new(move || f().map_err(|e| VigilError::Source(e.to_string()))),
        }
    }

    /// Read the current value.
    pub fn read(&self) -> Result<f64> {
        (self.f)()
    }
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueSource(..)")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn every_read_invokes_the_callback() {
        let calls = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&calls);
        let src = ValueSource::new(move || (c.fetch_add(1, Ordering::Relaxed) + 1) as f64);

        assert_eq!(src.read().unwrap(), 1.0);
        assert_eq!(src.read().unwrap(), 2.0);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn fallible_errors_become_source_errors() {
        let src = ValueSource::fallible(|| Err::<f64, _>("sensor offline"));
        match src.read() {
            Err(VigilError::Source(msg)) => assert_eq!(msg, "sensor offline"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
