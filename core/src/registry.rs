//! Keyed set of configured devices.
//!
//! # Design
//! One coordinator owns the registry; there is no process-wide state. Keys
//! are derived from host and name, so reloading the same configuration maps
//! every entry onto the device it described last time.

use std::collections::BTreeMap;
use std::fmt;

use tracing::info;
use uuid::Uuid;

use crate::client::SlideClient;
use crate::config::SlideConfig;
use crate::transport::UreqTransport;

const KEY_PREFIX: &str = "slide-local";

/// Stable identifier of a device: UUID v5 over `slide-local:{host}:{name}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceKey(Uuid);

impl DeviceKey {
    pub fn new(host: &str, name: &str) -> Self {
        let seed = format!("{KEY_PREFIX}:{host}:{name}");
        DeviceKey(Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()))
    }

    pub fn for_config(config: &SlideConfig) -> Self {
        Self::new(&config.host, &config.name)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A configured device and the client built from its config.
#[derive(Debug, Clone)]
pub struct Device {
    pub config: SlideConfig,
    pub client: SlideClient<UreqTransport>,
}

impl Device {
    fn from_config(config: SlideConfig) -> Self {
        let client = config.client();
        Self { config, client }
    }
}

/// Outcome of `DeviceRegistry::upsert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted(DeviceKey),
    Updated(DeviceKey),
}

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<DeviceKey, Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a device, or replace the config and client of the one already
    /// registered under the same key.
    pub fn upsert(&mut self, config: SlideConfig) -> Upsert {
        let key = DeviceKey::for_config(&config);
        let (name, host) = (config.name.clone(), config.host.clone());
        match self.devices.insert(key, Device::from_config(config)) {
            Some(_) => {
                info!(%key, %name, %host, "updated slide");
                Upsert::Updated(key)
            }
            None => {
                info!(%key, %name, %host, "registered slide");
                Upsert::Inserted(key)
            }
        }
    }

    pub fn get(&self, key: &DeviceKey) -> Option<&Device> {
        self.devices.get(key)
    }

    pub fn remove(&mut self, key: &DeviceKey) -> Option<Device> {
        self.devices.remove(key)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DeviceKey, &Device)> {
        self.devices.iter()
    }
}
