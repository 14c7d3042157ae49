//! Literal providers: fallback values for string dependencies nobody registered.

use std::collections::HashMap;
use std::env::{self, VarError};
use std::fmt;

use crate::error::BoxError;
use crate::types::BeanType;

/// Supplies values for missing scalar dependencies.
///
/// `Ok(Some(value))` means found, `Ok(None)` means not found (the build then
/// fails with a missing-dependency error), and `Err` aborts the build with the
/// error attached.
pub trait LiteralProvider: Send + Sync {
  fn provide(&self, id: &str, expected: &BeanType) -> Result<Option<String>, BoxError>;
}

impl<F> LiteralProvider for F
where
  F: Fn(&str, &BeanType) -> Result<Option<String>, BoxError> + Send + Sync,
{
  fn provide(&self, id: &str, expected: &BeanType) -> Result<Option<String>, BoxError> {
    self(id, expected)
  }
}

/// Wraps a closure as a [`LiteralProvider`], pinning down its signature.
///
/// ```
/// use fibre_beans::literal;
///
/// let provider = literal::from_fn(|id, _expected| Ok(Some(format!("value-of-{id}"))));
/// # let _ = provider;
/// ```
pub fn from_fn<F>(f: F) -> F
where
  F: Fn(&str, &BeanType) -> Result<Option<String>, BoxError> + Send + Sync + 'static,
{
  f
}

/// Reads literals from environment variables.
///
/// The variable name is the identifier uppercased, with every character that is
/// not ASCII alphanumeric replaced by `_`, optionally preceded by `PREFIX_`.
/// `workdir` becomes `WORKDIR`, or `APP_WORKDIR` with prefix `APP`.
#[derive(Debug, Clone, Default)]
pub struct EnvLiteralProvider {
  prefix: Option<String>,
}

impl EnvLiteralProvider {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_prefix(prefix: impl Into<String>) -> Self {
    Self {
      prefix: Some(prefix.into()),
    }
  }

  pub fn variable_name(&self, id: &str) -> String {
    let key: String = id
      .chars()
      .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
      .collect();
    match &self.prefix {
      Some(prefix) => format!("{prefix}_{key}"),
      None => key,
    }
  }
}

impl LiteralProvider for EnvLiteralProvider {
  fn provide(&self, id: &str, _expected: &BeanType) -> Result<Option<String>, BoxError> {
    match env::var(self.variable_name(id)) {
      Ok(value) => Ok(Some(value)),
      Err(VarError::NotPresent) => Ok(None),
      Err(err) => Err(Box::new(err)),
    }
  }
}

/// Serves literals from an in-memory map.
#[derive(Clone, Default)]
pub struct MapLiteralProvider {
  values: HashMap<String, String>,
}

impl MapLiteralProvider {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a value, builder style.
  pub fn with(mut self, id: &str, value: impl Into<String>) -> Self {
    self.insert(id, value);
    self
  }

  pub fn insert(&mut self, id: &str, value: impl Into<String>) -> Option<String> {
    self.values.insert(id.to_lowercase(), value.into())
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for MapLiteralProvider {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut provider = Self::new();
    for (id, value) in iter {
      provider.insert(id.as_ref(), value);
    }
    provider
  }
}

impl fmt::Debug for MapLiteralProvider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut ids: Vec<&String> = self.values.keys().collect();
    ids.sort();
    f.debug_struct("MapLiteralProvider").field("ids", &ids).finish()
  }
}

impl LiteralProvider for MapLiteralProvider {
  fn provide(&self, id: &str, _expected: &BeanType) -> Result<Option<String>, BoxError> {
    Ok(self.values.get(&id.to_lowercase()).cloned())
  }
}
