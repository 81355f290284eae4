use std::time::Duration;


#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Interval between anti-entropy rounds, i.e. between pushes of every channel's full
    ///  gossip state to all current neighbours.
    pub gossip_interval: Duration,
}

impl RouterConfig {
    pub fn new() -> RouterConfig {
        RouterConfig {
            gossip_interval: Duration::from_secs(30),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig::new()
    }
}
