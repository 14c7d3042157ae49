//! Depth-first wiring of the bean graph.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::inject::{inject_into, Dependency};
use crate::literal::LiteralProvider;
use crate::registry::{Bean, Registry};

const PATH_SEP: &str = " -> ";

/// Renders the cycle that re-enters `id`, starting from its first occurrence on `path`.
pub(crate) fn cycle_path(path: &[String], id: &str) -> String {
  let start = path.iter().position(|entry| entry == id).unwrap_or(0);
  let mut cycle: Vec<&str> = path[start..].iter().map(String::as_str).collect();
  cycle.push(id);
  cycle.join(PATH_SEP)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
  OnPath,
  Visited,
}

/// One injection pass over a registry.
///
/// Every bean is visited once; its dependencies are visited (and so fully
/// injected) before being written into it.
pub(crate) struct Wiring<'a> {
  registry: &'a mut Registry,
  literals: Option<&'a dyn LiteralProvider>,
  marks: HashMap<String, Mark>,
  path: Vec<String>,
}

impl<'a> Wiring<'a> {
  pub(crate) fn new(registry: &'a mut Registry, literals: Option<&'a dyn LiteralProvider>) -> Self {
    Self {
      registry,
      literals,
      marks: HashMap::new(),
      path: Vec::new(),
    }
  }

  pub(crate) fn run(mut self) -> Result<()> {
    for id in self.registry.ids() {
      self.visit(&id)?;
    }
    Ok(())
  }

  fn visit(&mut self, id: &str) -> Result<()> {
    match self.marks.get(id) {
      Some(Mark::OnPath) => {
        return Err(Error::Cycle {
          path: cycle_path(&self.path, id),
        })
      }
      Some(Mark::Visited) => return Ok(()),
      None => {}
    }

    self.marks.insert(id.to_owned(), Mark::OnPath);
    self.path.push(id.to_owned());
    trace!(bean = id, depth = self.path.len(), "Visiting bean");

    let dependencies = match self.registry.get(id) {
      Some(bean) if bean.has_dependencies => bean.dependencies.clone(),
      _ => Vec::new(),
    };
    for dependency in &dependencies {
      self.ensure_present(dependency, id)?;
      self.visit(dependency)?;
      self.inject(id, dependency)?;
    }

    self.path.pop();
    self.marks.insert(id.to_owned(), Mark::Visited);
    trace!(bean = id, "Bean wired");
    Ok(())
  }

  /// Makes sure `dependency` is registered, asking the literal provider for
  /// missing scalars.
  fn ensure_present(&mut self, dependency: &str, dependent: &str) -> Result<()> {
    if self.registry.contains(dependency) {
      return Ok(());
    }

    let expected = self.registry.expected(dependency).filter(|ty| ty.is_scalar()).cloned();
    if let (Some(expected), Some(literals)) = (expected, self.literals) {
      match literals.provide(dependency, &expected) {
        Ok(Some(value)) => {
          debug!(bean = dependency, "Using literal value from provider");
          self.registry.insert_literal(dependency, value);
          return Ok(());
        }
        Ok(None) => {
          debug!(bean = dependency, "Literal provider has no value");
        }
        Err(source) => {
          warn!(bean = dependency, error = %source, "Literal provider failed");
          return Err(Error::LiteralProvider {
            id: dependency.to_owned(),
            source,
          });
        }
      }
    }

    Err(Error::DependencyNotFound {
      dependency: dependency.to_owned(),
      dependent: dependent.to_owned(),
    })
  }

  fn inject(&mut self, receiver: &str, dependency: &str) -> Result<()> {
    let (dependency_ty, dependency_instance) = match self.registry.get(dependency) {
      Some(Bean {
        ty,
        instance: Some(instance),
        ..
      }) => (ty.clone(), instance.clone()),
      _ => {
        return Err(Error::NotInstantiated {
          id: dependency.to_owned(),
        })
      }
    };

    let bean = self
      .registry
      .get_mut(receiver)
      .ok_or_else(|| Error::BeanNotFound {
        id: receiver.to_owned(),
      })?;
    let receiver_ty = bean.ty.clone();
    let instance = bean.instance.as_mut().ok_or_else(|| Error::NotInstantiated {
      id: receiver.to_owned(),
    })?;
    let target = Arc::get_mut(instance).ok_or_else(|| Error::SharedInstance {
      id: receiver.to_owned(),
    })?;

    let source = Dependency::new(dependency, &dependency_ty, &dependency_instance);
    inject_into(receiver, &receiver_ty, target, &source, &self.path)?;
    Ok(())
  }
}
