use crate::error::ServiceError;

/// Optional hooks invoked from the connection manager's own task
///
/// Handlers run after the event stream and state cells have been updated, so
/// they observe the new state. Keep them short: they block the manager while
/// they run.
#[derive(Default)]
pub struct LifecycleHandlers {
    /// Called after a bind completes and the transport is usable
    pub on_connected: Option<Box<dyn Fn() + Send + Sync>>,

    /// Called when the binding is lost (suspended, destroyed, failed or released)
    pub on_disconnected: Option<Box<dyn Fn() + Send + Sync>>,

    /// Called for every connection-level error
    pub on_error: Option<Box<dyn Fn(ServiceError) + Send + Sync>>,
}

impl LifecycleHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connected<F>(mut self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_connected = Some(Box::new(handler));
        self
    }

    pub fn with_disconnected<F>(mut self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_disconnected = Some(Box::new(handler));
        self
    }

    pub fn with_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(ServiceError) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(handler));
        self
    }

    pub(crate) fn connected(&self) {
        if let Some(ref handler) = self.on_connected {
            guard("connected", || handler());
        }
    }

    pub(crate) fn disconnected(&self) {
        if let Some(ref handler) = self.on_disconnected {
            guard("disconnected", || handler());
        }
    }

    pub(crate) fn error(&self, error: ServiceError) {
        if let Some(ref handler) = self.on_error {
            guard("error", || handler(error));
        }
    }
}

fn guard<F: FnOnce()>(name: &str, f: F) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
    if result.is_err() {
        log::error!("Lifecycle handler '{}' panicked", name);
    }
}

impl std::fmt::Debug for LifecycleHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleHandlers")
            .field("on_connected", &self.on_connected.is_some())
            .field("on_disconnected", &self.on_disconnected.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
