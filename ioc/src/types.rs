//! Type descriptors for beans and the normalizer that canonicalizes them.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::shape::{Component, Shape};

/// A shared, type-erased bean instance as stored by the container.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Type name and type id of a Rust type.
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
  pub type_name: &'static str,
  pub type_id: TypeId,
}

impl TypeInfo {
  pub fn of<T: ?Sized + 'static>() -> Self {
    Self {
      type_name: std::any::type_name::<T>(),
      type_id: TypeId::of::<T>(),
    }
  }
}

impl fmt::Display for TypeInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.type_name)
  }
}

impl fmt::Debug for TypeInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TypeInfo({})", self.type_name)
  }
}

/// The broad category a bean type falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeanKind {
  /// A component held by value.
  Struct,
  /// A shared reference (`Arc<T>`) to a component.
  Ref,
  /// A `String` or primitive value.
  Scalar,
  /// A capability contract (`dyn Trait`).
  Contract,
}

/// Runtime descriptor of a bean's declared type.
///
/// For `Struct` and `Ref` kinds `info` names the component itself, not the
/// `Arc` around it, and the component's [`Shape`] is attached. Two descriptors
/// are equal when their kind and element type agree.
#[derive(Clone)]
pub struct BeanType {
  kind: BeanKind,
  info: TypeInfo,
  shape: Option<Arc<Shape>>,
}

impl BeanType {
  /// The declared type of any value that can be registered as an instance.
  pub fn of<T: Injectable>() -> Self {
    T::bean_type()
  }

  /// A component held by value.
  pub fn component<C: Component>() -> Self {
    Self {
      kind: BeanKind::Struct,
      info: TypeInfo::of::<C>(),
      shape: Some(Shape::of::<C>()),
    }
  }

  /// A shared reference to a component.
  pub fn reference<C: Component>() -> Self {
    Self {
      kind: BeanKind::Ref,
      info: TypeInfo::of::<C>(),
      shape: Some(Shape::of::<C>()),
    }
  }

  pub fn scalar<S: Any + Send + Sync>() -> Self {
    Self::from_parts(BeanKind::Scalar, TypeInfo::of::<S>())
  }

  pub fn contract<I: ?Sized + 'static>() -> Self {
    Self::from_parts(BeanKind::Contract, TypeInfo::of::<I>())
  }

  pub(crate) fn from_parts(kind: BeanKind, info: TypeInfo) -> Self {
    Self {
      kind,
      info,
      shape: None,
    }
  }

  pub fn kind(&self) -> BeanKind {
    self.kind
  }

  /// The element type: the component for `Struct`/`Ref`, the value type for
  /// `Scalar`, the trait object for `Contract`.
  pub fn info(&self) -> TypeInfo {
    self.info
  }

  pub fn is_scalar(&self) -> bool {
    self.kind == BeanKind::Scalar
  }

  pub fn shape(&self) -> Option<&Arc<Shape>> {
    self.shape.as_ref()
  }

  /// Whether the concrete component behind this type satisfies `contract`.
  pub fn satisfies(&self, contract: TypeId) -> bool {
    self
      .shape
      .as_ref()
      .is_some_and(|shape| shape.provides(contract))
  }
}

impl PartialEq for BeanType {
  fn eq(&self, other: &Self) -> bool {
    self.kind == other.kind && self.info == other.info
  }
}

impl Eq for BeanType {}

impl fmt::Display for BeanType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.kind {
      BeanKind::Ref => write!(f, "Arc<{}>", self.info),
      _ => write!(f, "{}", self.info),
    }
  }
}

impl fmt::Debug for BeanType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BeanType")
      .field("kind", &self.kind)
      .field("type", &self.info.type_name)
      .finish()
  }
}

/// Canonicalizes a type for the type-based registration path.
///
/// References are accepted as-is and components held by value become
/// references to the same component. Scalars and contracts cannot be
/// instantiated from a type alone and are rejected.
pub(crate) fn normalize(ty: BeanType) -> Result<BeanType> {
  match ty.kind {
    BeanKind::Ref => Ok(ty),
    BeanKind::Struct => Ok(BeanType {
      kind: BeanKind::Ref,
      ..ty
    }),
    BeanKind::Scalar | BeanKind::Contract => Err(Error::UnsupportedBeanType(ty.info.type_name)),
  }
}

/// Values accepted by `Container::register_instance`.
///
/// Components and `Arc`s of components become `Ref` beans, `String`,
/// `&'static str` and primitive values become `Scalar` beans.
pub trait Injectable: Send + Sync + 'static {
  /// The declared type of this value, before normalization.
  fn bean_type() -> BeanType;

  /// Splits the value into its normalized type and a shared instance.
  fn into_bean(self) -> (BeanType, Instance);
}

impl<C: Component> Injectable for C {
  fn bean_type() -> BeanType {
    BeanType::component::<C>()
  }

  fn into_bean(self) -> (BeanType, Instance) {
    (BeanType::reference::<C>(), Arc::new(self))
  }
}

impl<C: Component> Injectable for Arc<C> {
  fn bean_type() -> BeanType {
    BeanType::reference::<C>()
  }

  fn into_bean(self) -> (BeanType, Instance) {
    (BeanType::reference::<C>(), self)
  }
}

impl Injectable for String {
  fn bean_type() -> BeanType {
    BeanType::scalar::<String>()
  }

  fn into_bean(self) -> (BeanType, Instance) {
    (BeanType::scalar::<String>(), Arc::new(self))
  }
}

// String literals are stored as owned `String`s so they match `String` fields.
impl Injectable for &'static str {
  fn bean_type() -> BeanType {
    BeanType::scalar::<String>()
  }

  fn into_bean(self) -> (BeanType, Instance) {
    (BeanType::scalar::<String>(), Arc::new(self.to_owned()))
  }
}

macro_rules! scalar_injectable {
  ($($t:ty),* $(,)?) => {
    $(
      impl Injectable for $t {
        fn bean_type() -> BeanType {
          BeanType::scalar::<$t>()
        }

        fn into_bean(self) -> (BeanType, Instance) {
          (BeanType::scalar::<$t>(), Arc::new(self))
        }
      }
    )*
  };
}

scalar_injectable!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
