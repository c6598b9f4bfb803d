//! In-memory configuration store
//!
//! Holds singleton and factory configuration data keyed by PID and notifies
//! listeners synchronously, outside the store lock, after every change.

use crate::constants::FACTORY_PID_SEPARATOR;
use parking_lot::Mutex;
use scr_domain::constants::{SERVICE_FACTORY_PID, SERVICE_PID};
use scr_domain::ports::{
    ConfigurationEvent, ConfigurationEventKind, ConfigurationListener, ConfigurationProvider,
    ListenerId,
};
use scr_domain::Properties;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

struct Entry {
    factory_pid: Option<String>,
    properties: Properties,
}

#[derive(Default)]
struct StoreState {
    entries: BTreeMap<String, Entry>,
    listeners: BTreeMap<ListenerId, Arc<dyn ConfigurationListener>>,
}

/// Process-local configuration store
pub struct InMemoryConfigurationStore {
    state: Mutex<StoreState>,
    next_listener: AtomicU64,
    next_factory_instance: AtomicU64,
}

impl InMemoryConfigurationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            next_listener: AtomicU64::new(1),
            next_factory_instance: AtomicU64::new(1),
        }
    }

    /// Create or replace the configuration data of `pid`
    ///
    /// A PID created through [`create_factory_configuration`](Self::create_factory_configuration)
    /// keeps its factory PID.
    pub fn update(&self, pid: &str, properties: Properties) {
        let (factory_pid, listeners) = {
            let mut state = self.state.lock();
            let factory_pid = state.entries.get(pid).and_then(|e| e.factory_pid.clone());
            let properties = stamped(pid, factory_pid.as_deref(), properties);
            state.entries.insert(
                pid.to_string(),
                Entry {
                    factory_pid: factory_pid.clone(),
                    properties,
                },
            );
            (factory_pid, snapshot(&state))
        };
        debug!(pid, factory_pid = ?factory_pid, "configuration updated");
        notify(
            &listeners,
            &ConfigurationEvent {
                pid: pid.to_string(),
                factory_pid,
                kind: ConfigurationEventKind::Updated,
            },
        );
    }

    /// Create a new configuration for `factory_pid`; returns its generated PID
    pub fn create_factory_configuration(&self, factory_pid: &str, properties: Properties) -> String {
        let n = self.next_factory_instance.fetch_add(1, Ordering::SeqCst);
        let pid = format!("{factory_pid}{FACTORY_PID_SEPARATOR}{n}");
        let listeners = {
            let mut state = self.state.lock();
            state.entries.insert(
                pid.clone(),
                Entry {
                    factory_pid: Some(factory_pid.to_string()),
                    properties: stamped(&pid, Some(factory_pid), properties),
                },
            );
            snapshot(&state)
        };
        debug!(pid = %pid, factory_pid, "factory configuration created");
        notify(
            &listeners,
            &ConfigurationEvent {
                pid: pid.clone(),
                factory_pid: Some(factory_pid.to_string()),
                kind: ConfigurationEventKind::Updated,
            },
        );
        pid
    }

    /// Remove the configuration data of `pid`; false if there was none
    pub fn delete(&self, pid: &str) -> bool {
        let (entry, listeners) = {
            let mut state = self.state.lock();
            let Some(entry) = state.entries.remove(pid) else {
                return false;
            };
            (entry, snapshot(&state))
        };
        debug!(pid, "configuration deleted");
        notify(
            &listeners,
            &ConfigurationEvent {
                pid: pid.to_string(),
                factory_pid: entry.factory_pid,
                kind: ConfigurationEventKind::Deleted,
            },
        );
        true
    }

    /// Every stored PID
    pub fn pids(&self) -> Vec<String> {
        self.state.lock().entries.keys().cloned().collect()
    }
}

impl Default for InMemoryConfigurationStore {
    fn default() -> Self {
        Self::new()
    }
}

fn stamped(pid: &str, factory_pid: Option<&str>, mut properties: Properties) -> Properties {
    properties.insert(SERVICE_PID, pid);
    match factory_pid {
        Some(factory_pid) => properties.insert(SERVICE_FACTORY_PID, factory_pid),
        None => properties.remove(SERVICE_FACTORY_PID),
    };
    properties
}

fn snapshot(state: &StoreState) -> Vec<Arc<dyn ConfigurationListener>> {
    state.listeners.values().cloned().collect()
}

fn notify(listeners: &[Arc<dyn ConfigurationListener>], event: &ConfigurationEvent) {
    for listener in listeners {
        listener.configuration_changed(event);
    }
}

impl ConfigurationProvider for InMemoryConfigurationStore {
    fn get(&self, pid: &str) -> Option<Properties> {
        self.state
            .lock()
            .entries
            .get(pid)
            .filter(|e| e.factory_pid.is_none())
            .map(|e| e.properties.clone())
    }

    fn list(&self, factory_pid: &str) -> Vec<Properties> {
        self.state
            .lock()
            .entries
            .values()
            .filter(|e| e.factory_pid.as_deref() == Some(factory_pid))
            .map(|e| e.properties.clone())
            .collect()
    }

    fn add_configuration_listener(&self, listener: Arc<dyn ConfigurationListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst));
        self.state.lock().listeners.insert(id, listener);
        id
    }

    fn remove_configuration_listener(&self, id: ListenerId) {
        self.state.lock().listeners.remove(&id);
    }
}
