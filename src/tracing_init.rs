use crate::{Error, Result, Slogger};

/// Route `tracing` events from the whole process through `logger`.
///
/// Events that don't come from the facade have no recorded caller and show
/// their own `file:line` instead. Fails if a global subscriber is already set.
pub fn init_tracing(logger: &Slogger) -> Result<()> {
    tracing::dispatcher::set_global_default(logger.dispatch().clone())
        .map_err(|e| Error::Init(e.to_string()))
}
