//! Thin wrapper over the async runtime used by network-backed sources.

use std::future::Future;

use crate::error::MercatorError;

/// Spawns the future on the ambient tokio runtime.
///
/// Returns an error instead of panicking when called outside of a runtime context, so that
/// sources can report a failed submission through their normal response channel.
pub(crate) fn spawn<T>(future: T) -> Result<(), MercatorError>
where
    T: Future + Send + 'static,
    T::Output: Send + 'static,
{
    let handle = tokio::runtime::Handle::try_current()
        .map_err(|_| MercatorError::Other("no async runtime available".to_string()))?;
    handle.spawn(future);
    Ok(())
}
