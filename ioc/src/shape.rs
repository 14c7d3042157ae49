//! Per-type descriptor tables ("shapes") for components.
//!
//! A component describes its annotated fields, the contracts it satisfies and
//! its optional initializer once, through [`Component::describe`]. The
//! resulting [`Shape`] is cached per type and drives dependency scanning and
//! field injection as plain table lookups.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::error::BoxError;
use crate::initializer::Initializer;
use crate::inject::{Dependency, Rule};
use crate::types::{Instance, TypeInfo};

// Shapes are built on first use and shared by every container in the process.
static SHAPES: Lazy<DashMap<TypeId, Arc<Shape>>> = Lazy::new(DashMap::new);

/// A type the container can instantiate and inject into.
///
/// Usually implemented through the [`component!`](crate::component) macro.
/// The zero value handed out by `build()` is `Default::default()`.
pub trait Component: Any + Send + Sync + Default + Clone {
  fn describe(shape: &mut ShapeBuilder<Self>);
}

/// The category of an injectable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
  /// `Option<Arc<T>>` of a component.
  Ref,
  /// `Option<Arc<dyn Trait>>`.
  Contract,
  /// A component held by value.
  Value,
  /// `String`.
  Str,
  /// Any other primitive scalar.
  Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldType {
  pub kind: FieldKind,
  pub info: TypeInfo,
}

impl FieldType {
  pub fn reference<C: Component>() -> Self {
    Self {
      kind: FieldKind::Ref,
      info: TypeInfo::of::<C>(),
    }
  }

  pub fn contract<I: ?Sized + 'static>() -> Self {
    Self {
      kind: FieldKind::Contract,
      info: TypeInfo::of::<I>(),
    }
  }

  pub fn value<C: Component>() -> Self {
    Self {
      kind: FieldKind::Value,
      info: TypeInfo::of::<C>(),
    }
  }

  pub fn string() -> Self {
    Self {
      kind: FieldKind::Str,
      info: TypeInfo::of::<String>(),
    }
  }

  pub fn scalar<S: 'static>() -> Self {
    Self {
      kind: FieldKind::Other,
      info: TypeInfo::of::<S>(),
    }
  }
}

/// A field type that can receive a dependency.
pub trait Slot: Send + Sync + 'static {
  fn field_type() -> FieldType;

  /// Applies `rule` with `dependency` as the source. Returns `false` and leaves
  /// the field untouched when the dependency cannot be viewed as this type.
  fn assign(&mut self, rule: Rule, dependency: &Dependency<'_>) -> bool;
}

/// The pointee of an `Option<Arc<_>>` slot: a component or a contract.
///
/// Contracts opt in through the [`contract!`](crate::contract) macro.
pub trait Target: Send + Sync + 'static {
  fn target_type() -> FieldType;

  fn from_dependency(rule: Rule, dependency: &Dependency<'_>) -> Option<Arc<Self>>;
}

impl<C: Component> Target for C {
  fn target_type() -> FieldType {
    FieldType::reference::<C>()
  }

  fn from_dependency(rule: Rule, dependency: &Dependency<'_>) -> Option<Arc<Self>> {
    match rule {
      Rule::Assign => dependency.instance().clone().downcast::<C>().ok(),
      Rule::Fresh => dependency.fresh()?.downcast::<C>().ok(),
      Rule::Boxed => dependency
        .instance()
        .downcast_ref::<C>()
        .map(|value| Arc::new(value.clone())),
      Rule::Contract | Rule::Deref => None,
    }
  }
}

impl<T: ?Sized + Target> Slot for Option<Arc<T>> {
  fn field_type() -> FieldType {
    T::target_type()
  }

  fn assign(&mut self, rule: Rule, dependency: &Dependency<'_>) -> bool {
    match T::from_dependency(rule, dependency) {
      Some(value) => {
        *self = Some(value);
        true
      }
      None => false,
    }
  }
}

impl Slot for String {
  fn field_type() -> FieldType {
    FieldType::string()
  }

  fn assign(&mut self, rule: Rule, dependency: &Dependency<'_>) -> bool {
    assign_cloned(self, rule, dependency)
  }
}

macro_rules! scalar_slot {
  ($($t:ty),* $(,)?) => {
    $(
      impl Slot for $t {
        fn field_type() -> FieldType {
          FieldType::scalar::<$t>()
        }

        fn assign(&mut self, rule: Rule, dependency: &Dependency<'_>) -> bool {
          assign_cloned(self, rule, dependency)
        }
      }
    )*
  };
}

scalar_slot!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

fn assign_cloned<T: Any + Clone>(slot: &mut T, rule: Rule, dependency: &Dependency<'_>) -> bool {
  if rule != Rule::Assign {
    return false;
  }
  match dependency.instance().downcast_ref::<T>() {
    Some(value) => {
      *slot = value.clone();
      true
    }
    None => false,
  }
}

/// `Slot::assign` for a component held by value; used by `component!`.
#[doc(hidden)]
pub fn assign_value<C: Component>(slot: &mut C, rule: Rule, dependency: &Dependency<'_>) -> bool {
  match rule {
    Rule::Assign | Rule::Deref => match dependency.instance().downcast_ref::<C>() {
      Some(value) => {
        *slot = value.clone();
        true
      }
      None => false,
    },
    _ => false,
  }
}

type Setter = Box<dyn Fn(&mut (dyn Any + Send + Sync), Rule, &Dependency<'_>) -> bool + Send + Sync>;
type Cast = Box<dyn Fn(Instance) -> Option<Box<dyn Any>> + Send + Sync>;
type Hook = Box<dyn Fn(&(dyn Any + Send + Sync)) -> Option<Result<(), BoxError>> + Send + Sync>;

/// One annotated field of a component.
pub struct FieldSpec {
  name: &'static str,
  id: String,
  visible: bool,
  ty: FieldType,
  setter: Setter,
}

impl FieldSpec {
  pub fn name(&self) -> &'static str {
    self.name
  }

  /// The lowercased dependency identifier from the field's annotation.
  pub fn id(&self) -> &str {
    &self.id
  }

  /// Whether the container may write this field.
  pub fn is_visible(&self) -> bool {
    self.visible
  }

  pub fn field_type(&self) -> FieldType {
    self.ty
  }

  pub(crate) fn assign(
    &self,
    target: &mut (dyn Any + Send + Sync),
    rule: Rule,
    dependency: &Dependency<'_>,
  ) -> bool {
    (self.setter)(target, rule, dependency)
  }
}

impl fmt::Debug for FieldSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FieldSpec")
      .field("name", &self.name)
      .field("id", &self.id)
      .field("visible", &self.visible)
      .field("ty", &self.ty)
      .finish()
  }
}

struct ContractCast {
  contract: TypeId,
  cast: Cast,
}

/// Collects a component's descriptor table inside [`Component::describe`].
pub struct ShapeBuilder<C> {
  fields: Vec<FieldSpec>,
  contracts: Vec<ContractCast>,
  initializer: Option<Hook>,
  _marker: PhantomData<fn() -> C>,
}

impl<C: Component> ShapeBuilder<C> {
  fn new() -> Self {
    Self {
      fields: Vec::new(),
      contracts: Vec::new(),
      initializer: None,
      _marker: PhantomData,
    }
  }

  /// Declares a field annotated with dependency `id`.
  ///
  /// Fields that are not `visible` are recorded but never scanned nor written.
  /// An empty `id` counts as no annotation.
  pub fn field<F, A>(&mut self, name: &'static str, id: &str, visible: bool, accessor: A) -> &mut Self
  where
    F: Slot,
    A: Fn(&mut C) -> &mut F + Send + Sync + 'static,
  {
    if id.is_empty() {
      return self;
    }
    let setter: Setter = Box::new(
      move |target: &mut (dyn Any + Send + Sync), rule: Rule, dependency: &Dependency<'_>| {
        match target.downcast_mut::<C>() {
          Some(component) => accessor(component).assign(rule, dependency),
          None => false,
        }
      },
    );
    self.fields.push(FieldSpec {
      name,
      id: id.to_lowercase(),
      visible,
      ty: F::field_type(),
      setter,
    });
    self
  }

  /// Declares that `C` satisfies the contract `I`.
  pub fn provides<I: ?Sized + 'static>(&mut self, cast: fn(Arc<C>) -> Arc<I>) -> &mut Self {
    let cast: Cast = Box::new(move |instance| {
      let component = instance.downcast::<C>().ok()?;
      Some(Box::new(cast(component)) as Box<dyn Any>)
    });
    self.contracts.push(ContractCast {
      contract: TypeId::of::<I>(),
      cast,
    });
    self
  }

  /// Declares that `C` runs [`Initializer::initialize`] after the build injected it.
  pub fn initializer(&mut self) -> &mut Self
  where
    C: Initializer,
  {
    let hook: Hook = Box::new(|instance: &(dyn Any + Send + Sync)| {
      instance
        .downcast_ref::<C>()
        .map(|component| component.initialize())
    });
    self.initializer = Some(hook);
    self
  }
}

/// The cached descriptor table of one component type.
pub struct Shape {
  info: TypeInfo,
  fields: Vec<FieldSpec>,
  contracts: Vec<ContractCast>,
  initializer: Option<Hook>,
  zero: fn() -> Instance,
  duplicate: fn(&(dyn Any + Send + Sync)) -> Option<Instance>,
  zero_sized: bool,
}

impl Shape {
  /// Returns the shape of `C`, describing it on first use.
  pub fn of<C: Component>() -> Arc<Shape> {
    let key = TypeId::of::<C>();
    if let Some(shape) = SHAPES.get(&key) {
      return shape.value().clone();
    }
    SHAPES
      .entry(key)
      .or_insert_with(|| Arc::new(Shape::describe::<C>()))
      .value()
      .clone()
  }

  fn describe<C: Component>() -> Shape {
    let mut builder = ShapeBuilder::<C>::new();
    C::describe(&mut builder);
    Shape {
      info: TypeInfo::of::<C>(),
      fields: builder.fields,
      contracts: builder.contracts,
      initializer: builder.initializer,
      zero: zero::<C>,
      duplicate: duplicate::<C>,
      zero_sized: std::mem::size_of::<C>() == 0,
    }
  }

  pub fn type_info(&self) -> TypeInfo {
    self.info
  }

  pub fn fields(&self) -> &[FieldSpec] {
    &self.fields
  }

  pub fn provides(&self, contract: TypeId) -> bool {
    self.contracts.iter().any(|c| c.contract == contract)
  }

  pub fn has_initializer(&self) -> bool {
    self.initializer.is_some()
  }

  pub fn is_zero_sized(&self) -> bool {
    self.zero_sized
  }

  /// A freshly allocated zero value of the component.
  pub(crate) fn zero(&self) -> Instance {
    (self.zero)()
  }

  /// A new, unshared copy of `instance`, or `None` if it is not this component.
  pub(crate) fn duplicate(&self, instance: &(dyn Any + Send + Sync)) -> Option<Instance> {
    (self.duplicate)(instance)
  }

  /// Views `instance` as `Arc<I>` for a contract this shape provides.
  pub(crate) fn view<I: ?Sized + 'static>(&self, instance: Instance) -> Option<Arc<I>> {
    let contract = TypeId::of::<I>();
    let entry = self.contracts.iter().find(|c| c.contract == contract)?;
    let boxed = (entry.cast)(instance)?;
    boxed.downcast::<Arc<I>>().ok().map(|view| *view)
  }

  /// Runs the initializer, if one was declared.
  pub(crate) fn initialize(&self, instance: &(dyn Any + Send + Sync)) -> Option<Result<(), BoxError>> {
    self.initializer.as_ref().and_then(|hook| hook(instance))
  }
}

impl fmt::Debug for Shape {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Shape")
      .field("type", &self.info.type_name)
      .field("fields", &self.fields)
      .field("contracts", &self.contracts.len())
      .field("initializer", &self.initializer.is_some())
      .finish()
  }
}

fn zero<C: Component>() -> Instance {
  Arc::new(C::default())
}

fn duplicate<C: Component>(instance: &(dyn Any + Send + Sync)) -> Option<Instance> {
  instance
    .downcast_ref::<C>()
    .map(|component| Arc::new(component.clone()) as Instance)
}
