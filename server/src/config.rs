use std::{default::Default, time::Duration};

use crate::transport::DispatcherAddr;

/// Contains Config properties which will be used by the dispatcher client
#[derive(Clone, Debug)]
pub struct DispatcherClientConfig {
    /// Host the dispatcher process listens on
    pub host: String,
    /// Port the dispatcher process listens on
    pub port: u16,
    /// Fixed pause after a failed dial or a broken connection before the
    /// next attempt. Retries never back off and never give up.
    pub reconnect_delay: Duration,
}

impl DispatcherClientConfig {
    pub fn addr(&self) -> DispatcherAddr {
        DispatcherAddr::new(&self.host, self.port)
    }
}

impl Default for DispatcherClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 13000,
            reconnect_delay: Duration::from_secs(1),
        }
    }
}
