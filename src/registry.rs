//! Region-keyed registry of named networks.
//!
//! One process typically works several regions at once, each with its own
//! train and road networks. The registry keys every network by
//! `(region, name)`, hands out shared `Arc` handles, and refuses to silently
//! replace a live network: adding under a taken key gives the handle back to
//! the caller instead.
//!
//! A process-wide instance is available through [`Registry::global`], but the
//! type is an ordinary value; tests and embedders create their own.

use std::sync::{Arc, OnceLock};

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::network::{RoadNetwork, RoadNetworkConfig, TrainNetwork};

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    TrainNetworkAdded { region: String, name: String },
    TrainNetworkRemoved { region: String, name: String },
    RoadNetworkAdded { region: String, name: String },
    RoadNetworkRemoved { region: String, name: String },
}

pub trait RegistryObserver: Send + Sync {
    fn on_registry_event(&self, event: &RegistryEvent);
}

impl<F> RegistryObserver for F
where
    F: Fn(&RegistryEvent) + Send + Sync,
{
    fn on_registry_event(&self, event: &RegistryEvent) {
        self(event)
    }
}

// ============================================================================
// Registry
// ============================================================================

type Shelf<T> = RwLock<HashMap<String, HashMap<String, Arc<T>>>>;

/// Concurrent map of `(region, name)` → network handle.
pub struct Registry {
    trains: Shelf<TrainNetwork>,
    roads: Shelf<RoadNetworkConfig>,
    observers: Mutex<Vec<Arc<dyn RegistryObserver>>>,
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

impl Registry {
    pub fn new() -> Self {
        Self {
            trains: RwLock::new(HashMap::new()),
            roads: RwLock::new(HashMap::new()),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }

    // ========================================================================
    // Train networks
    // ========================================================================

    /// Register a train network under `(region, name)`.
    ///
    /// If the key is taken the registry is left untouched and the handle
    /// comes back as the error, so the caller decides what to do with it.
    pub fn add_train_network(
        &self,
        region: &str,
        name: &str,
        network: Arc<TrainNetwork>,
    ) -> Result<(), Arc<TrainNetwork>> {
        {
            let mut trains = self.trains.write();
            let slot = trains.entry(region.to_owned()).or_default();
            if slot.contains_key(name) {
                return Err(network);
            }
            slot.insert(name.to_owned(), network);
        }
        info!(region, name, "train network registered");
        self.emit(&RegistryEvent::TrainNetworkAdded {
            region: region.to_owned(),
            name: name.to_owned(),
        });
        Ok(())
    }

    /// Shared handle to a registered train network.
    pub fn train_network(&self, region: &str, name: &str) -> Option<Arc<TrainNetwork>> {
        self.trains.read().get(region).and_then(|m| m.get(name)).cloned()
    }

    pub fn remove_train_network(&self, region: &str, name: &str) -> bool {
        let removed = {
            let mut trains = self.trains.write();
            match trains.get_mut(region) {
                Some(slot) => {
                    let went = slot.remove(name).is_some();
                    if went && slot.is_empty() {
                        trains.remove(region);
                    }
                    went
                }
                None => false,
            }
        };
        if removed {
            info!(region, name, "train network removed");
            self.emit(&RegistryEvent::TrainNetworkRemoved {
                region: region.to_owned(),
                name: name.to_owned(),
            });
        }
        removed
    }

    /// Name and handle of every train network in a region, sorted by name.
    ///
    /// The listing is captured under a single read lock: the pairs form one
    /// coherent view even while other threads add and remove.
    pub fn train_networks_in_region(&self, region: &str) -> Vec<(String, Arc<TrainNetwork>)> {
        let mut entries: Vec<(String, Arc<TrainNetwork>)> = self
            .trains
            .read()
            .get(region)
            .map(|m| m.iter().map(|(n, net)| (n.clone(), net.clone())).collect())
            .unwrap_or_default();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn train_network_count(&self) -> usize {
        self.trains.read().values().map(|m| m.len()).sum()
    }

    // ========================================================================
    // Road networks
    // ========================================================================

    /// Register a road network (with its config) under `(region, name)`.
    pub fn add_road_network_config(
        &self,
        region: &str,
        name: &str,
        config: Arc<RoadNetworkConfig>,
    ) -> Result<(), Arc<RoadNetworkConfig>> {
        {
            let mut roads = self.roads.write();
            let slot = roads.entry(region.to_owned()).or_default();
            if slot.contains_key(name) {
                return Err(config);
            }
            slot.insert(name.to_owned(), config);
        }
        info!(region, name, "road network registered");
        self.emit(&RegistryEvent::RoadNetworkAdded {
            region: region.to_owned(),
            name: name.to_owned(),
        });
        Ok(())
    }

    pub fn road_network_config(&self, region: &str, name: &str) -> Option<Arc<RoadNetworkConfig>> {
        self.roads.read().get(region).and_then(|m| m.get(name)).cloned()
    }

    /// The network half of a registered config pair.
    pub fn road_network(&self, region: &str, name: &str) -> Option<Arc<RoadNetwork>> {
        self.road_network_config(region, name).map(|c| c.network())
    }

    pub fn remove_road_network_config(&self, region: &str, name: &str) -> bool {
        let removed = {
            let mut roads = self.roads.write();
            match roads.get_mut(region) {
                Some(slot) => {
                    let went = slot.remove(name).is_some();
                    if went && slot.is_empty() {
                        roads.remove(region);
                    }
                    went
                }
                None => false,
            }
        };
        if removed {
            info!(region, name, "road network removed");
            self.emit(&RegistryEvent::RoadNetworkRemoved {
                region: region.to_owned(),
                name: name.to_owned(),
            });
        }
        removed
    }

    /// Name and handle of every road network config in a region, sorted by
    /// name. Captured under a single read lock, like the train listing.
    pub fn road_network_configs_in_region(
        &self,
        region: &str,
    ) -> Vec<(String, Arc<RoadNetworkConfig>)> {
        let mut entries: Vec<(String, Arc<RoadNetworkConfig>)> = self
            .roads
            .read()
            .get(region)
            .map(|m| m.iter().map(|(n, cfg)| (n.clone(), cfg.clone())).collect())
            .unwrap_or_default();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn road_network_count(&self) -> usize {
        self.roads.read().values().map(|m| m.len()).sum()
    }

    // ========================================================================
    // Regions and observers
    // ========================================================================

    /// Every region with at least one network of either kind, sorted.
    pub fn regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = self.trains.read().keys().cloned().collect();
        regions.extend(self.roads.read().keys().cloned());
        regions.sort_unstable();
        regions.dedup();
        regions
    }

    pub fn subscribe(&self, observer: Arc<dyn RegistryObserver>) {
        self.observers.lock().push(observer);
    }

    fn emit(&self, event: &RegistryEvent) {
        let observers = self.observers.lock().clone();
        for observer in &observers {
            observer.on_registry_event(event);
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("train_networks", &self.train_network_count())
            .field("road_networks", &self.road_network_count())
            .finish()
    }
}
