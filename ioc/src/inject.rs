//! Field injection: choosing how a dependency lands in an annotated field.

use std::any::Any;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::resolver::cycle_path;
use crate::shape::{FieldKind, FieldType};
use crate::types::{BeanKind, BeanType, Instance};

/// How a dependency is written into a matched field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
  /// Field and dependency have the same type; share the instance.
  Assign,
  /// Same type, but the dependency is a zero-sized component; allocate a new one
  /// so distinct beans are never aliased.
  Fresh,
  /// The field is a contract the dependency satisfies.
  Contract,
  /// The field is a reference, the dependency the value it points to.
  Boxed,
  /// The field holds a value, the dependency is a reference to it.
  Deref,
}

/// A dependency as seen by a field during injection.
pub struct Dependency<'a> {
  id: &'a str,
  ty: &'a BeanType,
  instance: &'a Instance,
}

impl<'a> Dependency<'a> {
  pub(crate) fn new(id: &'a str, ty: &'a BeanType, instance: &'a Instance) -> Self {
    Self { id, ty, instance }
  }

  pub fn id(&self) -> &str {
    self.id
  }

  pub fn bean_type(&self) -> &BeanType {
    self.ty
  }

  pub fn instance(&self) -> &Instance {
    self.instance
  }

  /// A new zero value of the dependency's component type.
  pub fn fresh(&self) -> Option<Instance> {
    self.ty.shape().map(|shape| shape.zero())
  }

  /// The dependency viewed through contract `I`, if its component provides it.
  pub fn cast<I: ?Sized + 'static>(&self) -> Option<Arc<I>> {
    self.ty.shape()?.view::<I>(self.instance.clone())
  }
}

/// Picks the injection rule for a field of type `field` receiving a bean of type `dependency`.
///
/// Registry beans are never `BeanKind::Struct`, since registration normalizes
/// components to `Ref`. The `Struct` arms keep the table complete for callers
/// that plan against an unnormalized `BeanType`.
pub(crate) fn plan(field: &FieldType, dependency: &BeanType) -> Option<Rule> {
  let same_element = field.info == dependency.info();
  let rule = match (field.kind, dependency.kind()) {
    (FieldKind::Ref, BeanKind::Ref) if same_element => {
      if dependency.shape().is_some_and(|shape| shape.is_zero_sized()) {
        Rule::Fresh
      } else {
        Rule::Assign
      }
    }
    (FieldKind::Value, BeanKind::Struct)
    | (FieldKind::Contract, BeanKind::Contract)
    | (FieldKind::Str, BeanKind::Scalar)
    | (FieldKind::Other, BeanKind::Scalar)
      if same_element =>
    {
      Rule::Assign
    }
    (FieldKind::Contract, _) if dependency.satisfies(field.info.type_id) => Rule::Contract,
    (FieldKind::Ref, BeanKind::Struct) if same_element => Rule::Boxed,
    (FieldKind::Value, BeanKind::Ref) if same_element => Rule::Deref,
    _ => return None,
  };
  Some(rule)
}

/// Writes `dependency` into every visible field of `target` annotated with its id.
///
/// Returns the number of fields written. Fields whose type admits no rule are
/// left untouched.
pub(crate) fn inject_into(
  receiver_id: &str,
  receiver_ty: &BeanType,
  target: &mut (dyn Any + Send + Sync),
  dependency: &Dependency<'_>,
  path: &[String],
) -> Result<usize> {
  if path.iter().any(|id| id == dependency.id()) {
    return Err(Error::Cycle {
      path: cycle_path(path, dependency.id()),
    });
  }

  let shape = receiver_ty.shape().ok_or_else(|| Error::NotAComponent {
    id: receiver_id.to_owned(),
  })?;

  let mut written = 0;
  for field in shape.fields() {
    if !field.is_visible() || field.id() != dependency.id() {
      continue;
    }
    let Some(rule) = plan(&field.field_type(), dependency.bean_type()) else {
      trace!(
        bean = receiver_id,
        field = field.name(),
        dependency = dependency.id(),
        "No injection rule applies; field left untouched"
      );
      continue;
    };
    if field.assign(target, rule, dependency) {
      debug!(
        bean = receiver_id,
        field = field.name(),
        dependency = dependency.id(),
        ?rule,
        "Injected dependency"
      );
      written += 1;
    }
  }
  Ok(written)
}
