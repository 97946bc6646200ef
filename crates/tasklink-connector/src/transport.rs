use tasklink_bus::is_bus_address;

/// How a payload reaches its endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
  /// In-process message bus.
  Bus,
  /// HTTP POST.
  Http,
}

impl Transport {
  /// Classify an endpoint address by its scheme prefix. No probing.
  pub fn for_endpoint(endpoint: &str) -> Self {
    if is_bus_address(endpoint) {
      Transport::Bus
    } else {
      Transport::Http
    }
  }
}
