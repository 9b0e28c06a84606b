//! Gateway - module host
//!
//! Drives every module through its lifecycle:
//!
//! 1. GetApi negotiation at the host's highest supported version
//! 2. Create with a fresh broker handle and the instance configuration
//! 3. Delivery of broker messages to Receive on worker threads
//! 4. Start once all configured modules are wired
//! 5. Destroy after the module has been detached and its delivery worker has
//!    finished, in reverse creation order on shutdown
//!
//! A module that fails negotiation or Create is never attached to delivery.

use crate::broker::{Broker, BrokerHandle};
use crate::gateway::config::GatewayConfig;
use crate::gateway::delivery::spawn_delivery;
use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::events::{EventBus, GatewayEvent, GatewayEventType};
use crate::gateway::instance::ModuleInstance;
use crate::gateway::lifecycle::ModuleState;
use crate::module::{find_static_module, ModuleApi, ModuleApiVersion, ModuleConfig, ModuleGetApiFn};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Identifier of a loaded module instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u64);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct LoadedModule {
    id: ModuleId,
    instance: Arc<ModuleInstance>,
    subscriber_id: u64,
    delivery: Option<JoinHandle<u64>>,
}

pub struct Gateway {
    broker: Arc<Broker>,
    events: EventBus,
    requested_version: ModuleApiVersion,
    /// Creation order
    modules: Vec<LoadedModule>,
    next_id: u64,
    started: bool,
    shut_down: bool,
}

impl Gateway {
    pub fn new(broker_capacity: usize) -> Self {
        Self::with_broker(Broker::create(broker_capacity))
    }

    pub fn with_broker(broker: Arc<Broker>) -> Self {
        Self {
            broker,
            events: EventBus::new(),
            requested_version: ModuleApiVersion::CURRENT,
            modules: Vec::new(),
            next_id: 1,
            started: false,
            shut_down: false,
        }
    }

    /// Version passed to GetApi; defaults to the highest this host supports
    ///
    /// Lower versions pin the gateway to an older table. A version above
    /// [`ModuleApiVersion::CURRENT`] is accepted only so a host can be made to
    /// send a forward request; negotiation then fails for every module.
    pub fn with_requested_version(mut self, version: ModuleApiVersion) -> Self {
        if version > ModuleApiVersion::CURRENT {
            log::warn!(
                "Requesting module API {} above the highest this host understands ({}); \
                 modules will not negotiate",
                version,
                ModuleApiVersion::CURRENT
            );
        }
        self.requested_version = version;
        self
    }

    pub fn requested_version(&self) -> ModuleApiVersion {
        self.requested_version
    }

    /// Build a gateway and create every configured module
    ///
    /// Stops at the first module that cannot be loaded; modules created
    /// before it are destroyed again.
    pub async fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;
        let mut gateway = Self::new(config.broker.capacity);
        for entry in &config.modules {
            let module_config = entry.module_config();
            if let Err(e) =
                gateway.add_static_module(&entry.name, &entry.module, module_config.as_ref())
            {
                gateway.shutdown().await;
                return Err(e);
            }
        }
        Ok(gateway)
    }

    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    /// Handle for publishing into the broker from outside any module
    pub fn publisher(&self) -> BrokerHandle {
        self.broker.publisher("gateway")
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<GatewayEvent> {
        self.events.subscribe()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Instance names in creation order
    pub fn module_names(&self) -> Vec<String> {
        self.modules
            .iter()
            .map(|loaded| loaded.instance.name().to_string())
            .collect()
    }

    pub fn module_state(&self, name: &str) -> Option<ModuleState> {
        self.find(name).map(|loaded| loaded.instance.state())
    }

    pub fn module_id(&self, name: &str) -> Option<ModuleId> {
        self.find(name).map(|loaded| loaded.id)
    }

    fn find(&self, name: &str) -> Option<&LoadedModule> {
        self.modules
            .iter()
            .find(|loaded| loaded.instance.name() == name)
    }

    /// Load a statically linked module type by name
    pub fn add_static_module(
        &mut self,
        name: &str,
        module: &str,
        config: Option<&ModuleConfig>,
    ) -> GatewayResult<ModuleId> {
        let entry = find_static_module(module).ok_or_else(|| GatewayError::UnknownModule {
            module: module.to_string(),
        })?;
        self.add_module(name, module, entry.get_api, config)
    }

    /// Negotiate, create and wire one module instance
    ///
    /// Must be called from within a Tokio runtime. If the gateway is already
    /// started the new instance is started immediately.
    pub fn add_module(
        &mut self,
        name: &str,
        module: &str,
        get_api: ModuleGetApiFn,
        config: Option<&ModuleConfig>,
    ) -> GatewayResult<ModuleId> {
        if self.shut_down {
            return Err(GatewayError::ShutDown);
        }
        if self.find(name).is_some() {
            return Err(GatewayError::DuplicateInstance {
                name: name.to_string(),
            });
        }
        tokio::runtime::Handle::try_current().map_err(|e| GatewayError::Internal {
            message: format!("module delivery needs a Tokio runtime: {}", e),
        })?;

        let api = match ModuleApi::negotiate(get_api, self.requested_version) {
            Ok(api) => api,
            Err(source) => {
                log::warn!("Module '{}' ({}): negotiation failed: {}", name, module, source);
                self.events.publish(GatewayEvent::with_message(
                    GatewayEventType::NegotiationFailed,
                    name,
                    source.to_string(),
                ));
                return Err(GatewayError::Negotiation {
                    module: name.to_string(),
                    source,
                });
            }
        };

        let (handle, subscription) = self.broker.attach(name)?;
        let subscriber_id = subscription.subscriber_id();
        let instance = match ModuleInstance::create(name, module, api, handle, config) {
            Ok(instance) => Arc::new(instance),
            Err(e) => {
                // Dropping the subscription detaches the failed module
                drop(subscription);
                log::warn!("{}", e);
                self.events.publish(GatewayEvent::with_message(
                    GatewayEventType::CreateFailed,
                    name,
                    e.to_string(),
                ));
                return Err(e);
            }
        };

        let delivery = spawn_delivery(Arc::clone(&instance), subscription);
        let id = ModuleId(self.next_id);
        self.next_id += 1;
        self.modules.push(LoadedModule {
            id,
            instance: Arc::clone(&instance),
            subscriber_id,
            delivery: Some(delivery),
        });
        log::info!("Loaded module '{}' ({}) as {}", name, module, id);
        self.events
            .publish(GatewayEvent::new(GatewayEventType::ModuleCreated, name));

        if self.started {
            self.start_instance(&instance);
        }
        Ok(id)
    }

    fn start_instance(&self, instance: &ModuleInstance) {
        match instance.start() {
            Ok(()) => self.events.publish(GatewayEvent::new(
                GatewayEventType::ModuleStarted,
                instance.name(),
            )),
            Err(e) => log::warn!("{}", e),
        }
    }

    /// Start every loaded module in creation order
    pub fn start(&mut self) -> GatewayResult<()> {
        if self.shut_down {
            return Err(GatewayError::ShutDown);
        }
        if self.started {
            return Ok(());
        }
        for loaded in &self.modules {
            self.start_instance(&loaded.instance);
        }
        self.started = true;
        log::info!("Gateway started with {} modules", self.modules.len());
        Ok(())
    }

    /// Detach, drain and destroy one module instance
    pub async fn remove_module(&mut self, name: &str) -> GatewayResult<()> {
        let index = self
            .modules
            .iter()
            .position(|loaded| loaded.instance.name() == name)
            .ok_or_else(|| GatewayError::InstanceNotFound {
                name: name.to_string(),
            })?;
        let loaded = self.modules.remove(index);
        self.teardown(loaded).await
    }

    async fn teardown(&self, mut loaded: LoadedModule) -> GatewayResult<()> {
        let name = loaded.instance.name().to_string();
        self.broker.detach(loaded.subscriber_id)?;

        // No Receive may be running once Destroy is called
        if let Some(delivery) = loaded.delivery.take() {
            match delivery.await {
                Ok(count) => log::debug!("Module '{}' received {} messages", name, count),
                Err(e) => log::error!("Delivery task for module '{}' failed: {}", name, e),
            }
        }

        loaded.instance.destroy()?;
        self.events
            .publish(GatewayEvent::new(GatewayEventType::ModuleDestroyed, &name));
        log::info!("Unloaded module '{}'", name);
        Ok(())
    }

    /// Destroy every module in reverse creation order
    pub async fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        while let Some(loaded) = self.modules.pop() {
            let name = loaded.instance.name().to_string();
            if let Err(e) = self.teardown(loaded).await {
                log::warn!("Error while unloading module '{}': {}", name, e);
            }
        }
        log::info!("Gateway shut down");
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        if self.modules.is_empty() {
            return;
        }
        log::warn!(
            "Gateway dropped with {} modules still loaded; call shutdown() first",
            self.modules.len()
        );
        // Stop delivery; each instance is destroyed when its last reference goes
        for loaded in self.modules.drain(..).rev() {
            let _ = self.broker.detach(loaded.subscriber_id);
            if let Some(delivery) = loaded.delivery {
                delivery.abort();
            }
        }
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("modules", &self.module_names())
            .field("requested_version", &self.requested_version)
            .field("started", &self.started)
            .field("shut_down", &self.shut_down)
            .finish()
    }
}
