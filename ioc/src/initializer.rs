//! Post-injection hooks, run in dependency order.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{BoxError, Error, Result};
use crate::registry::Registry;

/// Optional hook a component runs once the build has injected all of its
/// dependencies, and after the hooks of those dependencies ran.
///
/// A component opts in by implementing this trait and declaring it in its shape
/// (`impl Initializer;` in [`component!`](crate::component)). The hook runs while
/// the container is still building and must not call back into it.
pub trait Initializer {
  fn initialize(&self) -> Result<(), BoxError>;
}

/// Orders every bean after its dependencies.
pub(crate) fn order(registry: &Registry) -> Result<Vec<String>> {
  let mut sorter = Sorter {
    registry,
    on_path: HashSet::new(),
    done: HashSet::new(),
    order: Vec::with_capacity(registry.len()),
  };
  for id in registry.ids() {
    sorter.visit(&id)?;
  }
  Ok(sorter.order)
}

struct Sorter<'a> {
  registry: &'a Registry,
  on_path: HashSet<String>,
  done: HashSet<String>,
  order: Vec<String>,
}

impl Sorter<'_> {
  fn visit(&mut self, id: &str) -> Result<()> {
    if self.done.contains(id) {
      return Ok(());
    }
    if !self.on_path.insert(id.to_owned()) {
      return Err(Error::InitializerOrder(format!("cycle through bean '{id}'")));
    }

    let bean = self.registry.get(id).ok_or_else(|| {
      Error::InitializerOrder(format!("bean '{id}' is not registered"))
    })?;
    for dependency in &bean.dependencies {
      if !self.registry.contains(dependency) {
        return Err(Error::InitializerOrder(format!(
          "dependency '{dependency}' required by '{id}' is not registered"
        )));
      }
      self.visit(dependency)?;
    }

    self.on_path.remove(id);
    self.done.insert(id.to_owned());
    self.order.push(id.to_owned());
    Ok(())
  }
}

/// Runs every declared initializer in dependency order, stopping at the first failure.
pub(crate) fn run(registry: &Registry) -> Result<usize> {
  let mut ran = 0;
  for id in order(registry)? {
    let Some(bean) = registry.get(&id) else {
      continue;
    };
    let (Some(shape), Some(instance)) = (bean.ty.shape(), bean.instance.as_ref()) else {
      continue;
    };
    if let Some(outcome) = shape.initialize(&**instance) {
      outcome.map_err(|source| Error::Initializer {
        id: id.clone(),
        source,
      })?;
      debug!(bean = %id, "Initializer ran");
      ran += 1;
    }
  }
  Ok(ran)
}
