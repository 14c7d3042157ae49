//! The bean registry: descriptors keyed by lowercase identifier, plus the
//! required-dependency map collected while scanning.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::scanner;
use crate::types::{BeanKind, BeanType, Instance};

/// Where a bean's instance comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
  /// Registered by type; the build allocates the instance.
  Type,
  /// Registered with a ready instance.
  Instance,
  /// Synthesized from a literal provider during injection.
  Literal,
}

#[derive(Debug)]
pub(crate) struct Bean {
  pub(crate) ty: BeanType,
  pub(crate) instance: Option<Instance>,
  /// Unwired copy of a registered instance that receives injection.
  pristine: Option<Instance>,
  pub(crate) singleton: bool,
  pub(crate) has_dependencies: bool,
  pub(crate) dependencies: Vec<String>,
  pub(crate) origin: Origin,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
  beans: BTreeMap<String, Bean>,
  required: BTreeMap<String, BeanType>,
}

impl Registry {
  /// Stores a descriptor under `id`, replacing any earlier one.
  pub(crate) fn register(&mut self, id: String, ty: BeanType, instance: Option<Instance>) {
    let (has_dependencies, dependencies) = scanner::scan(&ty, &mut self.required);
    let origin = if instance.is_some() {
      Origin::Instance
    } else {
      Origin::Type
    };
    debug!(
      bean = %id,
      ty = %ty,
      dependencies = ?dependencies,
      "Registering bean"
    );
    let pristine = match (&instance, ty.shape()) {
      (Some(instance), Some(shape)) if has_dependencies => shape.duplicate(&**instance),
      _ => None,
    };
    let bean = Bean {
      singleton: instance.is_some(),
      ty,
      instance,
      pristine,
      has_dependencies,
      dependencies,
      origin,
    };
    if self.beans.insert(id.clone(), bean).is_some() {
      debug!(bean = %id, "Replaced earlier registration");
    }
  }

  pub(crate) fn get(&self, id: &str) -> Option<&Bean> {
    self.beans.get(id)
  }

  pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Bean> {
    self.beans.get_mut(id)
  }

  pub(crate) fn contains(&self, id: &str) -> bool {
    self.beans.contains_key(id)
  }

  /// All identifiers, ascending.
  pub(crate) fn ids(&self) -> Vec<String> {
    self.beans.keys().cloned().collect()
  }

  pub(crate) fn len(&self) -> usize {
    self.beans.len()
  }

  pub(crate) fn singletons(&self) -> usize {
    self.beans.values().filter(|bean| bean.singleton).count()
  }

  /// The type some component expects to receive under `id`.
  pub(crate) fn expected(&self, id: &str) -> Option<&BeanType> {
    self.required.get(id)
  }

  /// Adds a bean holding a value supplied by a literal provider.
  pub(crate) fn insert_literal(&mut self, id: &str, value: String) {
    self.beans.insert(
      id.to_owned(),
      Bean {
        ty: BeanType::scalar::<String>(),
        instance: Some(Arc::new(value)),
        pristine: None,
        singleton: true,
        has_dependencies: false,
        dependencies: Vec::new(),
        origin: Origin::Literal,
      },
    );
  }

  /// Checks every required dependency against the bean registered for it.
  ///
  /// A missing scalar is deferred when a literal provider is installed; it is
  /// looked up during injection instead.
  pub(crate) fn validate(&self, literals_installed: bool) -> Result<()> {
    for (id, expected) in &self.required {
      match self.beans.get(id) {
        Some(bean) => check_compatible(id, expected, &bean.ty)?,
        None if expected.is_scalar() && literals_installed => {
          debug!(bean = %id, "Deferring missing scalar to the literal provider");
        }
        None => return Err(Error::MissingBean { id: id.clone() }),
      }
    }
    Ok(())
  }

  /// Allocates a zero value for every component bean that has no instance yet.
  pub(crate) fn instantiate(&mut self) -> usize {
    let mut created = 0;
    for (id, bean) in self.beans.iter_mut() {
      if bean.instance.is_some() || bean.ty.kind() != BeanKind::Ref {
        continue;
      }
      if let Some(shape) = bean.ty.shape() {
        bean.instance = Some(shape.zero());
        bean.singleton = true;
        created += 1;
        debug!(bean = %id, ty = %bean.ty, "Instantiated bean");
      }
    }
    created
  }

  /// Discards everything a failed build produced so the next build starts over.
  ///
  /// Registered instances that received injection are replaced by copies of
  /// their unwired state, which drops every clone the failed build handed out.
  pub(crate) fn rollback(&mut self) {
    self.beans.retain(|_, bean| bean.origin != Origin::Literal);
    for (id, bean) in self.beans.iter_mut() {
      match bean.origin {
        Origin::Type => {
          bean.instance = None;
          bean.singleton = false;
        }
        Origin::Instance => {
          let restored = match (&bean.pristine, bean.ty.shape()) {
            (Some(pristine), Some(shape)) => shape.duplicate(&**pristine),
            _ => None,
          };
          if let Some(restored) = restored {
            debug!(bean = %id, "Restored registered instance");
            bean.instance = Some(restored);
          }
        }
        Origin::Literal => {}
      }
    }
  }
}

fn check_compatible(id: &str, expected: &BeanType, registered: &BeanType) -> Result<()> {
  let compatible = match expected.kind() {
    BeanKind::Struct => registered.kind() == BeanKind::Ref && registered.info() == expected.info(),
    BeanKind::Contract => registered == expected || registered.satisfies(expected.info().type_id),
    BeanKind::Ref | BeanKind::Scalar => registered == expected,
  };
  if compatible {
    Ok(())
  } else {
    Err(Error::TypeMismatch {
      id: id.to_owned(),
      required: expected.to_string(),
      registered: registered.to_string(),
    })
  }
}
