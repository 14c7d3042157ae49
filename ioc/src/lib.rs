//! # Fibre Beans
//!
//! A runtime object-graph builder for Rust.
//!
//! Components ("beans") are registered under case-insensitive identifiers.
//! Each component declares, per field, the identifier of the bean that field
//! should receive. [`Container::build`] instantiates every component, injects
//! declared dependencies into matching fields, rejects dependency cycles and
//! finally runs post-injection initializers in dependency order.
//!
//! ## Core Concepts
//!
//! - **Container**: registry and build pipeline. Open for registration until
//!   the first successful build, read-only afterwards.
//! - **Components**: structs declared with [`component!`], whose annotated fields
//!   (`=> "id"`) receive beans. Only fields the container may write (those with a
//!   visibility qualifier) are injected, and a field without an annotation is
//!   never touched.
//! - **Contracts**: traits a component `provides`, injectable into
//!   `Option<Arc<dyn Trait>>` fields once declared with [`contract!`].
//! - **Literal providers**: a fallback for string dependencies that no bean
//!   satisfies, such as [`EnvLiteralProvider`].
//! - **Global Container**: a process-wide container, accessible via [`global()`]
//!   and read by the [`resolve!`] macros.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_beans::{component, contract, resolve_from, Container, Initializer, BoxError};
//! use std::sync::Arc;
//!
//! pub trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//! contract!(dyn Greeter);
//!
//! component! {
//!     pub struct EnglishGreeter {
//!         pub message: String => "greeting",
//!     }
//!     provides dyn Greeter;
//! }
//!
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         self.message.clone()
//!     }
//! }
//!
//! component! {
//!     pub struct Frontend {
//!         pub greeter: Option<Arc<dyn Greeter>> => "greeter",
//!     }
//!     impl Initializer;
//! }
//!
//! impl Initializer for Frontend {
//!     fn initialize(&self) -> Result<(), BoxError> {
//!         match &self.greeter {
//!             Some(_) => Ok(()),
//!             None => Err("no greeter injected".into()),
//!         }
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_component::<EnglishGreeter>("greeter").unwrap();
//! container.register_component::<Frontend>("frontend").unwrap();
//! container.register_instance("greeting", "Hello, World!").unwrap();
//! container.build().unwrap();
//!
//! let greeter = resolve_from!(container, trait Greeter, "greeter");
//! assert_eq!(greeter.greet(), "Hello, World!");
//!
//! let frontend = resolve_from!(container, Frontend, "frontend");
//! assert_eq!(frontend.greeter.as_ref().unwrap().greet(), "Hello, World!");
//! ```

mod container;
mod error;
mod global;
mod initializer;
mod inject;
pub mod literal;
mod macros;
mod registry;
mod resolver;
mod scanner;
mod shape;
mod types;

pub use container::Container;
pub use error::{BoxError, Error, Result};
pub use global::global;
pub use initializer::Initializer;
pub use inject::{Dependency, Rule};
pub use literal::{EnvLiteralProvider, LiteralProvider, MapLiteralProvider};
pub use shape::{Component, FieldKind, FieldSpec, FieldType, Shape, ShapeBuilder, Slot, Target};
pub use types::{BeanKind, BeanType, Injectable, Instance, TypeInfo};

#[doc(hidden)]
pub use shape::assign_value;
