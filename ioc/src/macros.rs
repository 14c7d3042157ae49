//! Public macros for declaring components and resolving beans.

/// Declares a component struct together with its shape.
///
/// Annotate a field with `=> "id"` to have the container inject the bean
/// registered under `id` into it. Only fields with a visibility qualifier
/// (`pub`, `pub(crate)`, ...) are written by the container; private fields keep
/// their annotation but are ignored. The struct derives `Default` and `Clone`.
///
/// Optional trailing clauses:
/// - `provides dyn Trait, ...;` declares the contracts the component satisfies,
/// - `impl Initializer;` runs its [`Initializer`](crate::Initializer) hook after injection.
///
/// # Examples
///
/// ```
/// use fibre_beans::{component, Container};
/// use std::sync::Arc;
///
/// component! {
///     pub struct Config {
///         pub dir: String => "workdir",
///     }
/// }
///
/// component! {
///     pub struct Service {
///         pub config: Option<Arc<Config>> => "cfg",
///     }
/// }
///
/// let container = Container::new();
/// container.register_component::<Service>("service").unwrap();
/// container.register_component::<Config>("cfg").unwrap();
/// container.register_instance("workdir", "/var/app").unwrap();
///
/// let service = container.resolve_as::<Service>("service").unwrap();
/// assert_eq!(service.config.as_ref().unwrap().dir, "/var/app");
/// ```
#[macro_export]
macro_rules! component {
    (@field $shape:ident, $field:ident, $field_ty:ty, $visible:expr) => {};

    (@field $shape:ident, $field:ident, $field_ty:ty, $visible:expr, $id:literal) => {
        $shape.field::<$field_ty, _>(stringify!($field), $id, $visible, |c| &mut c.$field);
    };

    (@hook $shape:ident, Initializer) => {
        $shape.initializer();
    };

    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_attr:meta])*
                $field_vis:vis $field:ident : $field_ty:ty $(=> $id:literal)?
            ),* $(,)?
        }
        $(provides $($contract:ty),+ ;)?
        $(impl $hook:ident ;)?
    ) => {
        $(#[$attr])*
        #[derive(Default, Clone)]
        $vis struct $name {
            $(
                $(#[$field_attr])*
                $field_vis $field: $field_ty,
            )*
        }

        impl $crate::Component for $name {
            #[allow(unused_variables)]
            fn describe(shape: &mut $crate::ShapeBuilder<Self>) {
                $(
                    $crate::component!(
                        @field shape, $field, $field_ty, (!stringify!($field_vis).is_empty()) $(, $id)?
                    );
                )*
                $($(
                    shape.provides::<$contract>(|c| c as ::std::sync::Arc<$contract>);
                )+)?
                $(
                    $crate::component!(@hook shape, $hook);
                )?
            }
        }

        impl $crate::Slot for $name {
            fn field_type() -> $crate::FieldType {
                $crate::FieldType::value::<$name>()
            }

            fn assign(&mut self, rule: $crate::Rule, dependency: &$crate::Dependency<'_>) -> bool {
                $crate::assign_value(self, rule, dependency)
            }
        }
    };
}

/// Makes trait objects usable as contract-typed fields (`Option<Arc<dyn Trait>>`).
///
/// The trait must be `Send + Sync` (usually as supertraits).
///
/// ```
/// use fibre_beans::contract;
///
/// pub trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// contract!(dyn Greeter);
/// ```
#[macro_export]
macro_rules! contract {
    ($(dyn $contract:ident),+ $(,)?) => {
        $(
            impl $crate::Target for dyn $contract {
                fn target_type() -> $crate::FieldType {
                    $crate::FieldType::contract::<dyn $contract>()
                }

                fn from_dependency(
                    rule: $crate::Rule,
                    dependency: &$crate::Dependency<'_>,
                ) -> ::std::option::Option<::std::sync::Arc<Self>> {
                    match rule {
                        $crate::Rule::Assign | $crate::Rule::Contract => {
                            dependency.cast::<dyn $contract>()
                        }
                        _ => ::std::option::Option::None,
                    }
                }
            }
        )+
    };
}

/// Resolves a bean from the global container.
///
/// # Panics
///
/// Panics if the bean cannot be resolved. For a non-panicking version, use
/// [`maybe_resolve!`].
///
/// # Examples
///
/// ```no_run
/// use fibre_beans::{global, resolve};
///
/// global().register_instance("greeting", "hello").unwrap();
///
/// let greeting = resolve!(String, "greeting");
/// assert_eq!(*greeting, "hello");
/// ```
#[macro_export]
macro_rules! resolve {
    // resolve!(trait Greeter, "id")
    (trait $trait_ident:ident, $id:expr) => {
        $crate::resolve_from!($crate::global(), trait $trait_ident, $id)
    };

    // resolve!(Service, "id")
    ($type:ty, $id:expr) => {
        $crate::resolve_from!($crate::global(), $type, $id)
    };
}

/// Resolves a bean from the given container, panicking on failure.
#[macro_export]
macro_rules! resolve_from {
    ($container:expr, trait $trait_ident:ident, $id:expr) => {{
        let id: &str = $id;
        $container
            .resolve_contract::<dyn $trait_ident>(id)
            .unwrap_or_else(|err| panic!("Failed to resolve required bean '{}': {}", id, err))
    }};

    ($container:expr, $type:ty, $id:expr) => {{
        let id: &str = $id;
        $container
            .resolve_as::<$type>(id)
            .unwrap_or_else(|err| panic!("Failed to resolve required bean '{}': {}", id, err))
    }};
}

/// Resolves a bean from the global container, returning a `Result`.
#[macro_export]
macro_rules! maybe_resolve {
    (trait $trait_ident:ident, $id:expr) => {
        $crate::maybe_resolve_from!($crate::global(), trait $trait_ident, $id)
    };

    ($type:ty, $id:expr) => {
        $crate::maybe_resolve_from!($crate::global(), $type, $id)
    };
}

/// Resolves a bean from the given container, returning a `Result`.
#[macro_export]
macro_rules! maybe_resolve_from {
    ($container:expr, trait $trait_ident:ident, $id:expr) => {
        $container.resolve_contract::<dyn $trait_ident>($id)
    };

    ($container:expr, $type:ty, $id:expr) => {
        $container.resolve_as::<$type>($id)
    };
}
