use super::interface::LifecycleHandlers;
use super::manager::{ConnectionManager, Message};
use super::types::ConnectionConfig;
use crate::error::{Result, ServiceError};
use crate::transport::MediaBrowser;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Builder for [`ConnectionManager`] instances
///
/// # Example
///
/// ```rust,no_run
/// use musicservice::connection::ConnectionBuilder;
/// # use musicservice::transport::MediaBrowser;
/// # use std::sync::Arc;
/// # async fn run(browser: Arc<dyn MediaBrowser>) -> musicservice::Result<()> {
/// let manager = ConnectionBuilder::new(browser)
///     .with_root_id("__ROOT__")
///     .start()?;
///
/// manager.wait_connected().await?;
/// manager.play().await?;
/// # Ok(())
/// # }
/// ```
pub struct ConnectionBuilder {
    browser: Arc<dyn MediaBrowser>,
    config: ConnectionConfig,
    root_id: Option<String>,
    event_buffer_size: Option<usize>,
    lifecycle_handlers: LifecycleHandlers,
    runtime: Option<tokio::runtime::Handle>,
}

impl std::fmt::Debug for ConnectionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionBuilder")
            .field("config", &self.config)
            .field("root_id", &self.root_id)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("lifecycle_handlers", &self.lifecycle_handlers)
            .finish()
    }
}

impl ConnectionBuilder {
    /// Create a builder with the default configuration
    ///
    /// Defaults: root id `"root_id"`, an event buffer of 64 and an immediate
    /// bind once the manager starts.
    pub fn new(browser: Arc<dyn MediaBrowser>) -> Self {
        Self {
            browser,
            config: ConnectionConfig::default(),
            root_id: None,
            event_buffer_size: None,
            lifecycle_handlers: LifecycleHandlers::default(),
            runtime: None,
        }
    }

    /// Replace the whole configuration; later `with_*` calls still apply on top
    pub fn with_config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_root_id(mut self, root_id: impl Into<String>) -> Self {
        self.root_id = Some(root_id.into());
        self
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Whether to bind as soon as the manager starts (default: true)
    pub fn with_auto_connect(mut self, auto_connect: bool) -> Self {
        self.config.auto_connect = auto_connect;
        self
    }

    pub fn with_lifecycle_handlers(mut self, handlers: LifecycleHandlers) -> Self {
        self.lifecycle_handlers = handlers;
        self
    }

    /// Run the manager on a specific runtime instead of the current one
    pub fn with_runtime(mut self, runtime: tokio::runtime::Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Spawn the manager task and return its handle
    ///
    /// Must be called from within a tokio runtime unless one was supplied with
    /// [`with_runtime`](Self::with_runtime).
    pub fn start(self) -> Result<ConnectionManager> {
        let config = self.build_config()?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => tokio::runtime::Handle::try_current()
                .map_err(|e| ServiceError::NoRuntime(e.to_string()))?,
        };

        let auto_connect = config.auto_connect;
        log::debug!("Starting connection manager (root '{}')", config.root_id);
        let manager =
            ConnectionManager::spawn(self.browser, config, self.lifecycle_handlers, &runtime);

        if auto_connect {
            // Outcome is reported on the event stream
            let (reply, _) = oneshot::channel();
            manager.send(Message::Connect { reply })?;
        }

        Ok(manager)
    }

    fn build_config(&self) -> Result<ConnectionConfig> {
        let mut config = self.config.clone();

        if let Some(ref root_id) = self.root_id {
            config = config
                .with_root_id(root_id.clone())
                .map_err(ServiceError::Configuration)?;
        }

        if let Some(size) = self.event_buffer_size {
            config = config
                .with_event_buffer_size(size)
                .map_err(ServiceError::Configuration)?;
        }

        config.validate().map_err(ServiceError::Configuration)?;
        Ok(config)
    }
}
