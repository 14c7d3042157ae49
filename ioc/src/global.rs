//! The process-wide container.

use crate::container::Container;
use once_cell::sync::Lazy;

// Created on first access, in a thread-safe manner.
static GLOBAL_CONTAINER: Lazy<Container> = Lazy::new(Container::default);

/// Returns the process-wide container.
///
/// It behaves like any other [`Container`]: register beans from anywhere during
/// startup, install a literal provider if needed, then build once. The
/// `resolve!` family of macros reads from it.
///
/// # Examples
///
/// ```no_run
/// use fibre_beans::{global, EnvLiteralProvider};
///
/// global().set_literal_provider(EnvLiteralProvider::with_prefix("APP"));
/// global().register_instance("greeting", "Hello from global!").unwrap();
/// global().build().unwrap();
/// ```
pub fn global() -> &'static Container {
  &GLOBAL_CONTAINER
}
