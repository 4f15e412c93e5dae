// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Named constructors for publishers, task backends and transports.
//!
//! Connection properties name their building blocks by string
//! (`dataport.subscription_type = "periodic"`, `thread_type = "default"`,
//! `dataport.interface_type = "udp"`). A [`Runtime`] maps those names to
//! constructors. Ports hold an `Arc<Runtime>`; there is no global registry,
//! so tests can run isolated runtimes side by side.
//!
//! # Example
//!
//! ```rust
//! use dataport::publisher::PublisherFlush;
//! use dataport::Runtime;
//!
//! let runtime = Runtime::new();
//! assert!(runtime.publishers.register("sync", || Box::new(PublisherFlush::new())));
//! assert!(runtime.publishers.create("sync").is_ok());
//! assert_eq!(runtime.publishers.names(), vec!["sync".to_string()]);
//! ```

use crate::error::{Error, Result};
use crate::publisher::{PublisherBase, PublisherFlush, PublisherPeriodic};
use crate::task::{PeriodicTask, PeriodicTaskBase};
use crate::transport::{
    InPortConsumer, InPortProvider, LocalEndpointTable, LocalInPortConsumer, LocalInPortProvider,
    LocalOutPortConsumer, LocalOutPortProvider, OutPortConsumer, OutPortProvider,
};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Constructor<T> = Arc<dyn Fn() -> Box<T> + Send + Sync>;

/// Name to constructor map for one kind of object.
pub struct FactoryRegistry<T: ?Sized> {
    kind: &'static str,
    factories: DashMap<String, Constructor<T>>,
}

impl<T: ?Sized> FactoryRegistry<T> {
    /// `kind` appears in [`Error::UnknownFactory`].
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            factories: DashMap::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Register `factory` under `name`. An existing entry is kept and
    /// `false` returned.
    pub fn register<F>(&self, name: impl Into<String>, factory: F) -> bool
    where
        F: Fn() -> Box<T> + Send + Sync + 'static,
    {
        let name = name.into();
        match self.factories.entry(name) {
            dashmap::mapref::entry::Entry::Occupied(e) => {
                log::warn!("{} factory '{}' already registered", self.kind, e.key());
                false
            }
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(Arc::new(factory));
                true
            }
        }
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.factories.remove(name).is_some()
    }

    /// Build a new object.
    ///
    /// # Errors
    /// [`Error::UnknownFactory`] when nothing is registered under `name`.
    pub fn create(&self, name: &str) -> Result<Box<T>> {
        // Clone out so the constructor runs without a shard lock.
        let factory = self
            .factories
            .get(name)
            .map(|f| Arc::clone(f.value()))
            .ok_or_else(|| Error::UnknownFactory {
                kind: self.kind,
                name: name.to_string(),
            })?;
        Ok(factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn clear(&self) {
        self.factories.clear();
    }
}

/// Task backends keyed by `thread_type`.
pub type TaskFactory = FactoryRegistry<dyn PeriodicTaskBase>;

/// Every registry a port needs, plus the in-process endpoint table.
pub struct Runtime {
    pub tasks: Arc<TaskFactory>,
    pub publishers: FactoryRegistry<dyn PublisherBase>,
    pub inport_providers: FactoryRegistry<dyn InPortProvider>,
    pub inport_consumers: FactoryRegistry<dyn InPortConsumer>,
    pub outport_providers: FactoryRegistry<dyn OutPortProvider>,
    pub outport_consumers: FactoryRegistry<dyn OutPortConsumer>,
    pub local: Arc<LocalEndpointTable>,
}

impl Runtime {
    /// Runtime with empty registries.
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(FactoryRegistry::new("task")),
            publishers: FactoryRegistry::new("publisher"),
            inport_providers: FactoryRegistry::new("inport_provider"),
            inport_consumers: FactoryRegistry::new("inport_consumer"),
            outport_providers: FactoryRegistry::new("outport_provider"),
            outport_consumers: FactoryRegistry::new("outport_consumer"),
            local: Arc::new(LocalEndpointTable::new()),
        }
    }

    /// Runtime with the bundled implementations registered: task backend
    /// `default`, publishers `periodic` and `flush`, transports `local` and
    /// (feature `udp`) `udp`.
    pub fn with_defaults() -> Self {
        let runtime = Self::new();

        let task_seq = Arc::new(AtomicU64::new(0));
        runtime.tasks.register("default", move || -> Box<dyn PeriodicTaskBase> {
            let n = task_seq.fetch_add(1, Ordering::Relaxed);
            Box::new(PeriodicTask::new(format!("publisher-{}", n)))
        });

        let tasks = Arc::clone(&runtime.tasks);
        runtime.publishers.register("periodic", move || -> Box<dyn PublisherBase> {
            Box::new(PublisherPeriodic::new(Arc::clone(&tasks)))
        });
        runtime
            .publishers
            .register("flush", || -> Box<dyn PublisherBase> { Box::new(PublisherFlush::new()) });

        let local = Arc::clone(&runtime.local);
        runtime
            .inport_providers
            .register("local", move || -> Box<dyn InPortProvider> {
                Box::new(LocalInPortProvider::new(Arc::clone(&local)))
            });
        let local = Arc::clone(&runtime.local);
        runtime
            .inport_consumers
            .register("local", move || -> Box<dyn InPortConsumer> {
                Box::new(LocalInPortConsumer::new(Arc::clone(&local)))
            });
        let local = Arc::clone(&runtime.local);
        runtime
            .outport_providers
            .register("local", move || -> Box<dyn OutPortProvider> {
                Box::new(LocalOutPortProvider::new(Arc::clone(&local)))
            });
        let local = Arc::clone(&runtime.local);
        runtime
            .outport_consumers
            .register("local", move || -> Box<dyn OutPortConsumer> {
                Box::new(LocalOutPortConsumer::new(Arc::clone(&local)))
            });

        #[cfg(feature = "udp")]
        {
            use crate::transport::{UdpInPortConsumer, UdpInPortProvider};
            runtime
                .inport_providers
                .register("udp", || -> Box<dyn InPortProvider> {
                    Box::new(UdpInPortProvider::new())
                });
            runtime
                .inport_consumers
                .register("udp", || -> Box<dyn InPortConsumer> {
                    Box::new(UdpInPortConsumer::new())
                });
        }

        log::debug!(
            "runtime ready: publishers={:?} transports={:?}",
            runtime.publishers.names(),
            runtime.inport_providers.names()
        );
        runtime
    }

    /// Drop every registration and local endpoint.
    ///
    /// Ports already built keep working; new connections fail to resolve.
    pub fn shutdown(&self) {
        self.tasks.clear();
        self.publishers.clear();
        self.inport_providers.clear();
        self.inport_consumers.clear();
        self.outport_providers.clear();
        self.outport_consumers.clear();
        self.local.clear();
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::with_defaults()
    }
}
