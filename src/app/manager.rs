// LogWire - app/manager.rs
//
// Process-wide registry of active handlers, handler/stream factories, and
// named handlers created on behalf of remote configuration. Also the single
// dispatch point the system log hook calls for every message.
//
// Concurrency:
//   - One coarse mutex guards every registry list.
//   - Dispatch copies the live handler list under the lock, releases it, and
//     only then calls into sinks. A slow sink never blocks other loggers or
//     registry changes, and every dispatch sees one consistent snapshot.
//   - Factories create and destroy outside the lock. A new named handler is
//     checked again when it is inserted.
//
// Ownership:
//   - Externally supplied handlers are held as `Weak`: the caller keeps the
//     handler alive, and one that has been dropped is skipped and pruned.
//   - Named handlers and their streams are owned here until removed.

use crate::app::factory::{DefaultHandlerFactory, DefaultStreamFactory, HandlerFactory, StreamFactory};
use crate::core::handler::{LogHandler, OutputStream};
use crate::core::model::{Level, LogAttributes};
use crate::core::protocol::NamedHandlerConfig;
use crate::util::constants::{DEFAULT_MAX_ACTIVE_HANDLERS, DISPATCH_INLINE_HANDLERS};
use crate::util::error::RegistryError;
use smallvec::SmallVec;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

type HandlerSnapshot = SmallVec<[Arc<LogHandler>; DISPATCH_INLINE_HANDLERS]>;

static INSTANCE: OnceLock<LogManager> = OnceLock::new();

/// Address identity, ignoring any trait-object metadata.
fn same_object<T: ?Sized>(a: *const T, b: *const T) -> bool {
    a.cast::<()>() == b.cast::<()>()
}

enum ActiveHandler {
    External(Weak<LogHandler>),
    Named(Arc<LogHandler>),
}

impl ActiveHandler {
    fn get(&self) -> Option<Arc<LogHandler>> {
        match self {
            Self::External(weak) => weak.upgrade(),
            Self::Named(arc) => Some(Arc::clone(arc)),
        }
    }

    fn is_alive(&self) -> bool {
        match self {
            Self::External(weak) => weak.strong_count() > 0,
            Self::Named(_) => true,
        }
    }

    fn points_to(&self, handler: *const LogHandler) -> bool {
        match self {
            Self::External(weak) => same_object(weak.as_ptr(), handler),
            Self::Named(arc) => same_object(Arc::as_ptr(arc), handler),
        }
    }
}

/// A stream created for a named handler together with the factory that
/// must destroy it.
struct OwnedStream {
    stream: Arc<dyn OutputStream>,
    factory: Arc<dyn StreamFactory>,
}

impl OwnedStream {
    fn destroy(self) {
        self.factory.destroy_stream(self.stream);
    }
}

struct NamedHandler {
    id: String,
    handler: Arc<LogHandler>,
    factory: Arc<dyn HandlerFactory>,
    stream: Option<OwnedStream>,
}

impl NamedHandler {
    /// Handler first, then the stream it writes to.
    fn destroy(self) {
        self.factory.destroy_handler(self.handler);
        if let Some(stream) = self.stream {
            stream.destroy();
        }
    }
}

struct Registry {
    active: Vec<ActiveHandler>,
    handler_factories: Vec<Arc<dyn HandlerFactory>>,
    stream_factories: Vec<Arc<dyn StreamFactory>>,
    named: Vec<NamedHandler>,
    max_active: usize,
}

impl Registry {
    fn prune(&mut self) {
        self.active.retain(ActiveHandler::is_alive);
    }

    fn live(&self) -> impl Iterator<Item = Arc<LogHandler>> + '_ {
        self.active.iter().filter_map(ActiveHandler::get)
    }

    /// Id and capacity checks for a new named handler.
    fn admit(&mut self, id: &str) -> Result<(), RegistryError> {
        if self.named.iter().any(|h| h.id == id) {
            return Err(RegistryError::DuplicateId { id: id.to_string() });
        }
        self.prune();
        if self.active.len() >= self.max_active {
            return Err(RegistryError::CapacityExceeded {
                max: self.max_active,
            });
        }
        Ok(())
    }

    /// Register a fully built named handler. The checks are repeated because
    /// the registry may have changed while the factories ran; a rejected
    /// handler is handed back for cleanup.
    fn insert_named(&mut self, named: NamedHandler) -> Result<(), (RegistryError, NamedHandler)> {
        if let Err(e) = self.admit(&named.id) {
            return Err((e, named));
        }
        self.active.push(ActiveHandler::Named(Arc::clone(&named.handler)));
        self.named.push(named);
        Ok(())
    }
}

/// Registry of log handlers and the dispatch point for log messages.
///
/// Use [`LogManager::instance`] for the process-wide registry. Independent
/// managers can be created with [`LogManager::new`], which is mostly useful
/// for tests and for hosts running several isolated log domains.
pub struct LogManager {
    registry: Mutex<Registry>,
}

impl LogManager {
    /// Empty manager with no factories and the default handler cap.
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                active: Vec::new(),
                handler_factories: Vec::new(),
                stream_factories: Vec::new(),
                named: Vec::new(),
                max_active: DEFAULT_MAX_ACTIVE_HANDLERS,
            }),
        }
    }

    /// Manager with the built-in handler and stream factories registered.
    pub fn with_default_factories() -> Self {
        let manager = Self::new();
        {
            let mut reg = manager.lock();
            reg.handler_factories.push(Arc::new(DefaultHandlerFactory));
            reg.stream_factories.push(Arc::new(DefaultStreamFactory));
        }
        manager
    }

    /// The process-wide manager, created with the default factories on first
    /// use and alive until process exit.
    pub fn instance() -> &'static LogManager {
        INSTANCE.get_or_init(|| {
            tracing::debug!("Creating process-wide log manager");
            Self::with_default_factories()
        })
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the active-handler cap. Handlers already registered are kept
    /// even if they exceed the new cap.
    pub fn set_max_active_handlers(&self, max: usize) {
        self.lock().max_active = max;
    }

    // -------------------------------------------------------------------------
    // External handlers
    // -------------------------------------------------------------------------

    /// Register an externally owned handler for dispatch.
    ///
    /// The manager keeps only a weak reference; dropping the last `Arc` is
    /// enough to stop delivery, though `remove_handler` is cleaner.
    pub fn add_handler(&self, handler: &Arc<LogHandler>) -> Result<(), RegistryError> {
        let mut reg = self.lock();
        reg.prune();
        if reg.active.iter().any(|a| a.points_to(Arc::as_ptr(handler))) {
            return Err(RegistryError::AlreadyRegistered);
        }
        if reg.active.len() >= reg.max_active {
            return Err(RegistryError::CapacityExceeded {
                max: reg.max_active,
            });
        }
        reg.active.push(ActiveHandler::External(Arc::downgrade(handler)));
        tracing::debug!(active = reg.active.len(), "Handler registered");
        Ok(())
    }

    /// Unregister an externally owned handler. No-op if it is not registered.
    ///
    /// Named handlers are not affected; use `remove_named_handler` for those.
    pub fn remove_handler(&self, handler: &LogHandler) {
        let mut reg = self.lock();
        let before = reg.active.len();
        reg.active.retain(|a| {
            !(matches!(a, ActiveHandler::External(_)) && a.points_to(handler as *const LogHandler))
        });
        if reg.active.len() != before {
            tracing::debug!(active = reg.active.len(), "Handler unregistered");
        }
    }

    // -------------------------------------------------------------------------
    // Factories
    // -------------------------------------------------------------------------

    /// Register a handler factory. Later registrations are tried later.
    pub fn add_handler_factory(&self, factory: Arc<dyn HandlerFactory>) -> Result<(), RegistryError> {
        let mut reg = self.lock();
        if reg
            .handler_factories
            .iter()
            .any(|f| same_object(Arc::as_ptr(f), Arc::as_ptr(&factory)))
        {
            return Err(RegistryError::DuplicateFactory);
        }
        reg.handler_factories.push(factory);
        Ok(())
    }

    /// Unregister a handler factory. Named handlers it already created keep
    /// a reference to it and are still destroyed through it.
    pub fn remove_handler_factory(&self, factory: &Arc<dyn HandlerFactory>) {
        self.lock()
            .handler_factories
            .retain(|f| !same_object(Arc::as_ptr(f), Arc::as_ptr(factory)));
    }

    /// Register a stream factory. Later registrations are tried later.
    pub fn add_stream_factory(&self, factory: Arc<dyn StreamFactory>) -> Result<(), RegistryError> {
        let mut reg = self.lock();
        if reg
            .stream_factories
            .iter()
            .any(|f| same_object(Arc::as_ptr(f), Arc::as_ptr(&factory)))
        {
            return Err(RegistryError::DuplicateFactory);
        }
        reg.stream_factories.push(factory);
        Ok(())
    }

    /// Unregister a stream factory.
    pub fn remove_stream_factory(&self, factory: &Arc<dyn StreamFactory>) {
        self.lock()
            .stream_factories
            .retain(|f| !same_object(Arc::as_ptr(f), Arc::as_ptr(factory)));
    }

    pub fn handler_factory_count(&self) -> usize {
        self.lock().handler_factories.len()
    }

    pub fn stream_factory_count(&self) -> usize {
        self.lock().stream_factories.len()
    }

    // -------------------------------------------------------------------------
    // Named handlers
    // -------------------------------------------------------------------------

    /// Create a handler (and its stream, if any) through the registered
    /// factories and register it under `config.id`.
    ///
    /// Fails on a duplicate id, a full registry, or when no factory accepts
    /// the requested types. Factories run without the registry lock held, so
    /// a slow stream open never stalls dispatch. Anything created for a
    /// request that fails is destroyed again before returning.
    pub fn add_named_handler(&self, config: &NamedHandlerConfig) -> Result<(), RegistryError> {
        match self.create_named(config) {
            Ok(()) => {
                tracing::info!(
                    id = %config.id,
                    handler_type = %config.handler.type_name,
                    stream_type = config.stream.as_ref().map(|s| s.type_name.as_str()),
                    level = %config.level,
                    filters = config.filters.len(),
                    "Named handler added"
                );
                Ok(())
            }
            Err(err) => {
                tracing::warn!(id = %config.id, error = %err, "Named handler rejected");
                Err(err)
            }
        }
    }

    fn create_named(&self, config: &NamedHandlerConfig) -> Result<(), RegistryError> {
        let (handler_factories, stream_factories) = {
            let mut reg = self.lock();
            reg.admit(&config.id)?;
            (reg.handler_factories.clone(), reg.stream_factories.clone())
        };

        let stream = match config.stream.as_ref().filter(|s| !s.type_name.is_empty()) {
            Some(wanted) => {
                let created = stream_factories.iter().find_map(|factory| {
                    factory
                        .create_stream(&wanted.type_name, &wanted.params)
                        .map(|stream| OwnedStream {
                            stream,
                            factory: Arc::clone(factory),
                        })
                });
                Some(created.ok_or_else(|| RegistryError::UnknownStreamType {
                    stream_type: wanted.type_name.clone(),
                })?)
            }
            None => None,
        };

        let sink_stream = stream.as_ref().map(|s| Arc::clone(&s.stream));
        let created = handler_factories.iter().find_map(|factory| {
            factory
                .create_handler(
                    &config.handler.type_name,
                    &config.handler.params,
                    sink_stream.clone(),
                    config.level,
                    &config.filters,
                )
                .map(|handler| (handler, Arc::clone(factory)))
        });
        let Some((handler, factory)) = created else {
            if let Some(stream) = stream {
                stream.destroy();
            }
            return Err(RegistryError::UnknownHandlerType {
                handler_type: config.handler.type_name.clone(),
            });
        };

        let named = NamedHandler {
            id: config.id.clone(),
            handler: Arc::new(handler),
            factory,
            stream,
        };
        let inserted = self.lock().insert_named(named);
        inserted.map_err(|(err, rejected)| {
            rejected.destroy();
            err
        })
    }

    /// Unregister and destroy a named handler. No-op if `id` is unknown.
    pub fn remove_named_handler(&self, id: &str) {
        let removed = {
            let mut reg = self.lock();
            let Some(pos) = reg.named.iter().position(|h| h.id == id) else {
                return;
            };
            let named = reg.named.remove(pos);
            let ptr = Arc::as_ptr(&named.handler);
            reg.active.retain(|a| !a.points_to(ptr));
            named
        };
        removed.destroy();
        tracing::info!(id, "Named handler removed");
    }

    /// Call `callback` once per named handler id.
    ///
    /// The ids are copied before the first call, so the callback sees a
    /// stable list and may itself add or remove handlers.
    pub fn enum_named_handlers<F: FnMut(&str)>(&self, mut callback: F) {
        for id in self.named_handler_ids() {
            callback(&id);
        }
    }

    /// Ids of the current named handlers, in creation order.
    pub fn named_handler_ids(&self) -> Vec<String> {
        self.lock().named.iter().map(|h| h.id.clone()).collect()
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    fn snapshot(&self) -> HandlerSnapshot {
        let mut reg = self.lock();
        reg.prune();
        reg.live().collect()
    }

    /// Deliver a message to every active handler exactly once.
    pub fn dispatch(&self, msg: &str, level: Level, category: Option<&str>, attr: &LogAttributes) {
        for handler in self.snapshot() {
            handler.message(msg, level, category, attr);
        }
    }

    /// Deliver raw bytes to every active handler exactly once.
    pub fn dispatch_write(&self, data: &[u8], level: Level, category: Option<&str>) {
        for handler in self.snapshot() {
            handler.write(data, level, category);
        }
    }

    /// Returns true if at least one active handler would accept a message
    /// at `level` in `category`. Call sites use this to skip composing
    /// messages nobody will see.
    pub fn is_enabled(&self, level: Level, category: Option<&str>) -> bool {
        self.lock().live().any(|h| h.accepts(level, category))
    }

    /// Lowest level any active handler accepts for `category`, or
    /// `Level::None` when there are no handlers.
    pub fn threshold(&self, category: Option<&str>) -> Level {
        self.lock()
            .live()
            .map(|h| h.level_for(category))
            .min()
            .unwrap_or(Level::None)
    }

    /// Number of live active handlers (external and named).
    pub fn active_handler_count(&self) -> usize {
        self.lock().active.iter().filter(|a| a.is_alive()).count()
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
