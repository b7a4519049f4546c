//! Runtime backend selection.
//!
//! A platform provides an ordered list of context strategies, preferred path
//! first. Entries that are not available on the platform are `None`.

use std::fmt;

use crate::driver::DriverError;
use crate::error::Error;

/// One way of constructing a context, e.g. "hardware adapter".
pub struct ContextStrategy<C> {
    name: &'static str,
    create: Box<dyn FnOnce() -> Result<C, DriverError> + Send>,
}

impl<C> ContextStrategy<C> {
    pub fn new(
        name: &'static str,
        create: impl FnOnce() -> Result<C, DriverError> + Send + 'static,
    ) -> Self {
        Self {
            name,
            create: Box::new(create),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<C> fmt::Debug for ContextStrategy<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextStrategy")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Tries each configured strategy in order and returns the first context
/// that could be created.
///
/// When every configured strategy fails the first failure is reported, since
/// earlier strategies are the preferred ones. With nothing configured the
/// result is [`Error::NoBackend`].
pub fn select_context<C>(strategies: Vec<Option<ContextStrategy<C>>>) -> Result<C, Error> {
    let mut first_error: Option<DriverError> = None;
    for strategy in strategies.into_iter().flatten() {
        let name = strategy.name;
        tracing::debug!("trying context strategy {name}");
        match (strategy.create)() {
            Ok(context) => {
                tracing::info!("using context strategy {name}");
                return Ok(context);
            }
            Err(err) => {
                tracing::warn!("context strategy {name} failed: {err}");
                first_error.get_or_insert(err);
            }
        }
    }
    Err(first_error.map_or(Error::NoBackend, Error::Backend))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn failing(name: &'static str, message: &'static str) -> Option<ContextStrategy<&'static str>> {
        Some(ContextStrategy::new(name, move || Err(message.into())))
    }

    fn succeeding(name: &'static str) -> Option<ContextStrategy<&'static str>> {
        Some(ContextStrategy::new(name, move || Ok(name)))
    }

    #[test]
    fn fallback_used_when_primary_fails() {
        let context = select_context(vec![failing("primary", "no gpu"), succeeding("fallback")]);
        assert_eq!(context.unwrap(), "fallback");
    }

    #[test]
    fn primary_wins_and_fallback_is_not_tried() {
        let tried = Arc::new(AtomicUsize::new(0));
        let counter = tried.clone();
        let fallback = ContextStrategy::new("fallback", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("fallback")
        });
        let context = select_context(vec![succeeding("primary"), Some(fallback)]);
        assert_eq!(context.unwrap(), "primary");
        assert_eq!(tried.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn first_error_is_reported() {
        let result = select_context(vec![
            None,
            failing("primary", "primary broke"),
            failing("fallback", "fallback broke"),
        ]);
        match result {
            Err(Error::Backend(err)) => assert_eq!(err.to_string(), "primary broke"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn absent_strategies_mean_no_backend() {
        let result = select_context::<&'static str>(vec![None, None]);
        assert!(matches!(result, Err(Error::NoBackend)));
        let result = select_context::<&'static str>(Vec::new());
        assert!(matches!(result, Err(Error::NoBackend)));
    }

    #[test]
    fn absent_primary_is_skipped() {
        let context = select_context(vec![None, succeeding("fallback")]);
        assert_eq!(context.unwrap(), "fallback");
    }
}
