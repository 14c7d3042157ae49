//! Dependency discovery from a component's annotated fields.

use std::collections::BTreeMap;

use tracing::trace;

use crate::shape::FieldKind;
use crate::types::{BeanKind, BeanType};

/// Records every injectable annotated field of `ty` into `required`.
///
/// Only visible fields holding a component reference, a `String` or a contract
/// count. Returns whether any were found and their identifiers in declaration
/// order, without duplicates.
pub(crate) fn scan(ty: &BeanType, required: &mut BTreeMap<String, BeanType>) -> (bool, Vec<String>) {
  let Some(shape) = ty.shape() else {
    return (false, Vec::new());
  };

  let mut ids: Vec<String> = Vec::new();
  for field in shape.fields() {
    if !field.is_visible() {
      trace!(field = field.name(), "Skipping field the container cannot write");
      continue;
    }
    let field_type = field.field_type();
    let expected = match field_type.kind {
      FieldKind::Ref => BeanType::from_parts(BeanKind::Struct, field_type.info),
      FieldKind::Str => BeanType::scalar::<String>(),
      FieldKind::Contract => BeanType::from_parts(BeanKind::Contract, field_type.info),
      FieldKind::Value | FieldKind::Other => continue,
    };
    required.insert(field.id().to_owned(), expected);
    if !ids.iter().any(|id| id == field.id()) {
      ids.push(field.id().to_owned());
    }
  }
  (!ids.is_empty(), ids)
}
