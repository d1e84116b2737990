//! Resource manager context ownership

use pcsc::Scope;
use tracing::{debug, info, instrument, warn};

use crate::backend::{ReaderContext, ResourceManager};
use crate::{Error, Result};

/// Owns an established context and releases it exactly once
///
/// Release happens through [`ContextManager::release`] or, failing that, on drop.
#[derive(Debug)]
pub struct ContextManager<X: ReaderContext> {
    context: Option<X>,
}

impl<X: ReaderContext> ContextManager<X> {
    /// Establish a context with the resource manager
    #[instrument(level = "debug", skip_all)]
    pub fn establish<M>(manager: &M, scope: Scope) -> Result<Self>
    where
        M: ResourceManager<Context = X>,
    {
        let context = manager.establish(scope).map_err(Error::Context)?;
        info!("Context established");
        Ok(Self {
            context: Some(context),
        })
    }

    /// The established context
    pub fn context(&self) -> Result<&X> {
        self.context.as_ref().ok_or(Error::ContextReleased)
    }

    /// Whether the context is still held
    pub const fn is_established(&self) -> bool {
        self.context.is_some()
    }

    /// Release the context
    pub fn release(mut self) -> Result<()> {
        self.release_context()
    }

    fn release_context(&mut self) -> Result<()> {
        let Some(context) = self.context.take() else {
            return Ok(());
        };

        debug!("Releasing context");
        context.release().map_err(Error::ContextRelease)?;
        info!("Context released");
        Ok(())
    }
}

impl<X: ReaderContext> Drop for ContextManager<X> {
    fn drop(&mut self) {
        if let Err(e) = self.release_context() {
            warn!(error = %e, "Failed to release context on drop");
        }
    }
}
