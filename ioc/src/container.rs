//! The `Container` struct: registration, build and resolution.

use std::any::{type_name, Any};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::initializer;
use crate::literal::LiteralProvider;
use crate::registry::Registry;
use crate::resolver::Wiring;
use crate::shape::Component;
use crate::types::{normalize, BeanType, Injectable, Instance};

/// A bean container.
///
/// Beans are registered under case-insensitive identifiers while the container
/// is open. The first successful [`build`](Container::build) instantiates and
/// wires every bean, runs initializers, and closes the container: from then on
/// registration fails and resolution only reads.
///
/// The container is `Send + Sync`; registration, build and resolution may be
/// called from any thread.
pub struct Container {
  build_lock: Mutex<()>,
  registry: RwLock<Registry>,
  closed: AtomicBool,
  literals: ArcSwapOption<Box<dyn LiteralProvider>>,
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl Container {
  /// Creates a new, empty and open `Container`.
  pub fn new() -> Self {
    Self {
      build_lock: Mutex::new(()),
      registry: RwLock::new(Registry::default()),
      closed: AtomicBool::new(false),
      literals: ArcSwapOption::empty(),
    }
  }

  /// Creates a container with a literal provider already installed.
  pub fn with_literal_provider<P: LiteralProvider + 'static>(provider: P) -> Self {
    let container = Self::new();
    container.set_literal_provider(provider);
    container
  }

  // --- PRIVATE HELPERS ---

  fn canonical_id(id: &str) -> Result<String> {
    if id.is_empty() {
      return Err(Error::EmptyBeanId);
    }
    Ok(id.to_lowercase())
  }

  fn ensure_open(&self) -> Result<()> {
    if self.closed.load(Ordering::Acquire) {
      return Err(Error::RegistrationClosed);
    }
    Ok(())
  }

  fn insert(&self, id: String, ty: BeanType, instance: Option<Instance>) -> Result<()> {
    let mut registry = self.registry.write();
    // A build may have closed the container while we waited for the lock.
    self.ensure_open()?;
    registry.register(id, ty, instance);
    Ok(())
  }

  fn finalize(registry: &mut Registry, literals: Option<&dyn LiteralProvider>) -> Result<()> {
    registry.validate(literals.is_some())?;
    let created = registry.instantiate();
    debug!(created, "Instantiated beans");
    Wiring::new(registry, literals).run()?;
    let initialized = initializer::run(registry)?;
    debug!(initialized, "Ran initializers");
    Ok(())
  }

  // --- PUBLIC API ---

  // --- Literal Providers ---

  /// Installs the provider queried for string dependencies no bean satisfies.
  ///
  /// The provider is read once at the start of each build.
  pub fn set_literal_provider<P: LiteralProvider + 'static>(&self, provider: P) {
    let provider: Box<dyn LiteralProvider> = Box::new(provider);
    self.literals.store(Some(Arc::new(provider)));
  }

  pub fn clear_literal_provider(&self) {
    self.literals.store(None);
  }

  pub fn has_literal_provider(&self) -> bool {
    self.literals.load().is_some()
  }

  // --- Registration ---

  /// Registers a component type under `id`. The build allocates its instance.
  ///
  /// Both `BeanType::component::<T>()` and `BeanType::reference::<T>()` are
  /// accepted; scalar and contract types are rejected.
  pub fn register(&self, id: &str, ty: BeanType) -> Result<()> {
    let id = Self::canonical_id(id)?;
    self.ensure_open()?;
    let ty = normalize(ty)?;
    self.insert(id, ty, None)
  }

  /// Shorthand for `register(id, BeanType::component::<C>())`.
  pub fn register_component<C: Component>(&self, id: &str) -> Result<()> {
    self.register(id, BeanType::component::<C>())
  }

  /// Registers a ready value under `id`.
  ///
  /// Components are moved into a new `Arc`. A registered `Arc` that has
  /// dependencies must not be shared elsewhere, or injecting into it fails.
  pub fn register_instance<T: Injectable>(&self, id: &str, value: T) -> Result<()> {
    let id = Self::canonical_id(id)?;
    self.ensure_open()?;
    let (ty, instance) = value.into_bean();
    self.insert(id, ty, Some(instance))
  }

  // --- Build ---

  /// Instantiates, wires and initializes every bean, then closes the container.
  ///
  /// Calling it again after a success is a no-op. On failure the container
  /// stays open and drops the instances this build created, so the caller can
  /// fix the registrations and build again.
  pub fn build(&self) -> Result<()> {
    let _build = self.build_lock.lock();
    if self.closed.load(Ordering::Acquire) {
      return Ok(());
    }

    let literals = self.literals.load_full();
    let mut registry = self.registry.write();
    debug!(beans = registry.len(), "Building container");

    match Self::finalize(&mut registry, literals.as_deref().map(|provider| &**provider)) {
      Ok(()) => {
        self.closed.store(true, Ordering::Release);
        debug!(
          beans = registry.len(),
          singletons = registry.singletons(),
          "Container built"
        );
        Ok(())
      }
      Err(err) => {
        warn!(error = %err, "Container build failed");
        registry.rollback();
        Err(err)
      }
    }
  }

  pub fn is_built(&self) -> bool {
    self.closed.load(Ordering::Acquire)
  }

  // --- Resolution ---

  /// Returns the instance registered under `id`, building the container first if needed.
  pub fn resolve_safe(&self, id: &str) -> Result<Instance> {
    let id = Self::canonical_id(id)?;
    if !self.is_built() {
      self.build()?;
    }
    let registry = self.registry.read();
    let bean = registry
      .get(&id)
      .ok_or_else(|| Error::BeanNotFound { id: id.clone() })?;
    bean.instance.clone().ok_or(Error::NotInitialized { id })
  }

  /// Like [`resolve_safe`](Container::resolve_safe), for callers that treat a
  /// missing bean as a bug.
  ///
  /// # Panics
  ///
  /// Panics if the bean cannot be resolved.
  pub fn resolve(&self, id: &str) -> Instance {
    match self.resolve_safe(id) {
      Ok(instance) => instance,
      Err(err) => panic!("Failed to resolve required bean '{}': {}", id, err),
    }
  }

  /// Resolves `id` as a concrete type: a component, `String` or primitive.
  pub fn resolve_as<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>> {
    let instance = self.resolve_safe(id)?;
    instance.downcast::<T>().map_err(|_| Error::NotOfRequestedType {
      id: id.to_lowercase(),
      requested: type_name::<T>(),
    })
  }

  /// Resolves `id` through a contract its component declares, e.g. `dyn Greeter`.
  pub fn resolve_contract<I: ?Sized + 'static>(&self, id: &str) -> Result<Arc<I>> {
    let instance = self.resolve_safe(id)?;
    let not_of_type = || Error::NotOfRequestedType {
      id: id.to_lowercase(),
      requested: type_name::<I>(),
    };
    let registry = self.registry.read();
    let shape = registry
      .get(&id.to_lowercase())
      .and_then(|bean| bean.ty.shape().cloned())
      .ok_or_else(not_of_type)?;
    drop(registry);
    shape.view::<I>(instance).ok_or_else(not_of_type)
  }

  // --- Introspection ---

  pub fn contains(&self, id: &str) -> bool {
    self.registry.read().contains(&id.to_lowercase())
  }

  pub fn len(&self) -> usize {
    self.registry.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Registered identifiers in ascending order.
  pub fn bean_ids(&self) -> Vec<String> {
    self.registry.read().ids()
  }
}
