use thiserror::Error;

/// Boxed error returned by user callbacks (literal providers, initializers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The error type for registration, build and resolution.
#[derive(Debug, Error)]
pub enum Error {
  #[error("bean id parameter is empty")]
  EmptyBeanId,

  #[error("bean type '{0}' is not supported; register scalar values as instances")]
  UnsupportedBeanType(&'static str),

  #[error("container already built; registration is closed")]
  RegistrationClosed,

  #[error("bean '{id}' is required but not registered")]
  MissingBean { id: String },

  #[error("bean '{id}' type mismatch: required {required}, registered {registered}")]
  TypeMismatch {
    id: String,
    required: String,
    registered: String,
  },

  #[error("dependency bean '{dependency}' for '{dependent}' receiver bean not found")]
  DependencyNotFound { dependency: String, dependent: String },

  #[error("literal provider error for '{id}': {source}")]
  LiteralProvider {
    id: String,
    #[source]
    source: BoxError,
  },

  #[error("dependency cycle detected: {path}")]
  Cycle { path: String },

  #[error("bean '{id}' is not instantiated")]
  NotInstantiated { id: String },

  #[error("bean '{id}' is shared outside the container and cannot receive injection")]
  SharedInstance { id: String },

  #[error("receiver bean '{id}' is not a component")]
  NotAComponent { id: String },

  #[error("initializer order: {0}")]
  InitializerOrder(String),

  #[error("initializer for bean '{id}' failed: {source}")]
  Initializer {
    id: String,
    #[source]
    source: BoxError,
  },

  #[error("bean '{id}' not found")]
  BeanNotFound { id: String },

  #[error("bean '{id}' is not initialized")]
  NotInitialized { id: String },

  #[error("bean '{id}' is not of requested type {requested}")]
  NotOfRequestedType { id: String, requested: &'static str },
}

/// A specialized `Result` type for `fibre_beans` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
