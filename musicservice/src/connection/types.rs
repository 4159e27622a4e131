/// Well-known id of the top-level browsing node
pub const DEFAULT_ROOT_ID: &str = "root_id";

/// Configuration for a connection manager
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Catalog node that is browsed without starting playback
    pub root_id: String,
    /// Capacity of the connection event stream; slow receivers lag past this
    pub event_buffer_size: usize,
    /// Bind to the service as soon as the manager starts
    pub auto_connect: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            root_id: DEFAULT_ROOT_ID.to_string(),
            event_buffer_size: 64,
            auto_connect: true,
        }
    }
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the catalog root id with validation
    pub fn with_root_id(mut self, root_id: impl Into<String>) -> Result<Self, String> {
        let root_id = root_id.into();
        if root_id.trim().is_empty() {
            return Err("Root id must not be empty".to_string());
        }
        self.root_id = root_id;
        Ok(self)
    }

    /// Set the event buffer size with validation
    pub fn with_event_buffer_size(mut self, size: usize) -> Result<Self, String> {
        if size == 0 {
            return Err("Event buffer size must be greater than 0".to_string());
        }
        if size > 10_000 {
            return Err("Event buffer size too large (max 10,000)".to_string());
        }
        self.event_buffer_size = size;
        Ok(self)
    }

    pub fn with_auto_connect(mut self, auto_connect: bool) -> Self {
        self.auto_connect = auto_connect;
        self
    }

    pub fn is_root(&self, parent_id: &str) -> bool {
        parent_id == self.root_id
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.root_id.trim().is_empty() {
            return Err("Root id must not be empty".to_string());
        }
        if self.event_buffer_size == 0 || self.event_buffer_size > 10_000 {
            return Err(format!(
                "Event buffer size {} out of range (1..=10,000)",
                self.event_buffer_size
            ));
        }
        Ok(())
    }
}
