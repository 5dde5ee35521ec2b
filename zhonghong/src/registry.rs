//! Callback and device registries
//!
//! Both maps are keyed by [`Address`] and only ever grow. Callbacks are cloned
//! out of the lock before they run, so a callback may register further
//! callbacks without deadlocking the listener.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use zhonghong_core::StatusRecord;
use zhonghong_types::{Address, Attribute};

/// Called with every status record reported for an address
pub type StatusCallback = Arc<dyn Fn(&StatusRecord) + Send + Sync>;

/// Called with every attribute the gateway confirms for an address
pub type EchoCallback = Arc<dyn Fn(Address, Attribute) + Send + Sync>;

/// A unit object owned by the application
///
/// When the gateway echoes a control command, the attribute is applied to
/// the registered handle directly instead of waiting for the next status
/// report.
pub trait DeviceHandle: Send + Sync {
    fn apply_attribute(&self, attribute: Attribute);
}

/// Per-address callbacks and device handles
#[derive(Default)]
pub struct Registry {
    status: RwLock<HashMap<Address, Vec<StatusCallback>>>,
    echo: RwLock<HashMap<Address, Vec<EchoCallback>>>,
    devices: RwLock<HashMap<Address, Arc<dyn DeviceHandle>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_status_callback(&self, address: Address, callback: StatusCallback) {
        debug!("{} adding status callback", address);
        self.status.write().entry(address).or_default().push(callback);
    }

    pub fn add_echo_callback(&self, address: Address, callback: EchoCallback) {
        debug!("{} adding echo callback", address);
        self.echo.write().entry(address).or_default().push(callback);
    }

    /// Register a device, returning the handle it replaced
    pub fn add_device(
        &self,
        address: Address,
        device: Arc<dyn DeviceHandle>,
    ) -> Option<Arc<dyn DeviceHandle>> {
        debug!("{} device registered", address);
        self.devices.write().insert(address, device)
    }

    pub fn device(&self, address: Address) -> Option<Arc<dyn DeviceHandle>> {
        self.devices.read().get(&address).cloned()
    }

    pub fn status_callbacks(&self, address: Address) -> Vec<StatusCallback> {
        self.status.read().get(&address).cloned().unwrap_or_default()
    }

    pub fn echo_callbacks(&self, address: Address) -> Vec<EchoCallback> {
        self.echo.read().get(&address).cloned().unwrap_or_default()
    }

    /// Run every status callback of the record's address, in registration
    /// order. Returns how many ran.
    pub fn dispatch_status(&self, record: &StatusRecord) -> usize {
        let callbacks = self.status_callbacks(record.address);

        for callback in &callbacks {
            callback(record);
        }

        callbacks.len()
    }

    /// Apply a confirmed attribute to the device at `address` and run its
    /// echo callbacks. Returns `false` if no device is registered there.
    pub fn dispatch_echo(&self, address: Address, attribute: Attribute) -> bool {
        for callback in self.echo_callbacks(address) {
            callback(address, attribute);
        }

        match self.device(address) {
            Some(device) => {
                device.apply_attribute(attribute);
                true
            }
            None => {
                warn!("{} echoed {} but no device is registered", address, attribute);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use zhonghong_types::{FanMode, Operation, Switch};

    fn record(address: Address) -> StatusRecord {
        StatusRecord {
            address,
            switch: Switch::On,
            target_temperature: 24,
            operation: Operation::Cool,
            fan_mode: FanMode::Mid,
            room_temperature: 26,
            error_code: 0,
            reserved: [0, 0],
        }
    }

    #[test]
    fn test_status_callbacks_in_registration_order() {
        let registry = Registry::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second"] {
            let calls = calls.clone();
            registry.add_status_callback(
                Address::new(1, 2),
                Arc::new(move |_: &StatusRecord| calls.lock().push(name)),
            );
        }

        assert_eq!(registry.dispatch_status(&record(Address::new(1, 2))), 2);
        assert_eq!(registry.dispatch_status(&record(Address::new(1, 3))), 0);
        assert_eq!(*calls.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_callback_may_register_callback() {
        let registry = Arc::new(Registry::new());
        let inner = registry.clone();

        registry.add_status_callback(
            Address::new(1, 1),
            Arc::new(move |record: &StatusRecord| {
                inner.add_status_callback(record.address, Arc::new(|_: &StatusRecord| {}));
            }),
        );

        registry.dispatch_status(&record(Address::new(1, 1)));
        assert_eq!(registry.status_callbacks(Address::new(1, 1)).len(), 2);
    }

    struct Recorder(Mutex<Vec<Attribute>>);

    impl DeviceHandle for Recorder {
        fn apply_attribute(&self, attribute: Attribute) {
            self.0.lock().push(attribute);
        }
    }

    #[test]
    fn test_echo_applies_to_device() {
        let registry = Registry::new();
        let device = Arc::new(Recorder(Mutex::new(Vec::new())));
        registry.add_device(Address::new(1, 2), device.clone());

        assert!(registry.dispatch_echo(Address::new(1, 2), Attribute::Power(Switch::Off)));
        assert!(!registry.dispatch_echo(Address::new(9, 9), Attribute::Power(Switch::Off)));

        assert_eq!(*device.0.lock(), vec![Attribute::Power(Switch::Off)]);
    }

    #[test]
    fn test_echo_callbacks_run_without_device() {
        let registry = Registry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        registry.add_echo_callback(
            Address::new(2, 1),
            Arc::new(move |address, attribute| sink.lock().push((address, attribute))),
        );

        registry.dispatch_echo(Address::new(2, 1), Attribute::TargetTemperature(22));
        assert_eq!(
            *seen.lock(),
            vec![(Address::new(2, 1), Attribute::TargetTemperature(22))]
        );
    }

    #[test]
    fn test_add_device_replaces() {
        let registry = Registry::new();
        let address = Address::new(1, 1);

        assert!(registry.add_device(address, Arc::new(Recorder(Mutex::new(Vec::new())))).is_none());
        assert!(registry.add_device(address, Arc::new(Recorder(Mutex::new(Vec::new())))).is_some());
        assert!(registry.device(address).is_some());
    }
}
