use fibre_beans::{component, contract, literal, BoxError, Container, Error, Initializer, MapLiteralProvider};
use pretty_assertions::assert_eq;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc, Mutex,
};
use std::thread;

// --- Advanced Test Fixtures ---

component! {
  #[derive(Debug)]
  pub struct Config {
    pub dir: String => "workdir",
  }
}

component! {
  pub struct Service {
    pub config: Option<Arc<Config>> => "cfg",
  }
}

// Cycles
component! {
  pub struct CycleA {
    pub b: Option<Arc<CycleB>> => "b",
  }
}

component! {
  pub struct CycleB {
    pub a: Option<Arc<CycleA>> => "a",
  }
}

component! {
  pub struct RingX {
    pub y: Option<Arc<RingY>> => "y",
  }
}

component! {
  pub struct RingY {
    pub z: Option<Arc<RingZ>> => "z",
  }
}

component! {
  pub struct RingZ {
    pub x: Option<Arc<RingX>> => "x",
  }
}

component! {
  pub struct Narcissus {
    pub me: Option<Arc<Narcissus>> => "me",
  }
}

// Field selection
component! {
  pub struct Partial {
    pub tagged: Option<Arc<Config>> => "cfg",
    pub untagged: Option<Arc<Config>>,
    hidden: Option<Arc<Config>> => "cfg",
  }
}

component! {
  pub struct Logger {}
}

component! {
  pub struct Pipeline {
    pub audit: Option<Arc<Logger>> => "audit",
    pub access: Option<Arc<Logger>> => "access",
  }
}

component! {
  pub struct Snapshot {
    pub live: Option<Arc<Config>> => "cfg",
    pub copy: Config => "cfg",
  }
}

// Contracts
pub trait Greeter: Send + Sync {
  fn greet(&self) -> String;
}

contract!(dyn Greeter);

component! {
  pub struct EnglishGreeter {
    pub name: String => "name",
  }
  provides dyn Greeter;
}

impl Greeter for EnglishGreeter {
  fn greet(&self) -> String {
    format!("Hello, {}!", self.name)
  }
}

component! {
  pub struct Frontend {
    pub greeter: Option<Arc<dyn Greeter>> => "greeter",
  }
}

// Initializers
component! {
  pub struct Recorder {
    pub entries: Arc<Mutex<Vec<&'static str>>>,
  }
}

impl Recorder {
  fn record(&self, entry: &'static str) {
    self.entries.lock().unwrap().push(entry);
  }
}

fn record(recorder: &Option<Arc<Recorder>>, entry: &'static str) -> Result<(), BoxError> {
  recorder.as_ref().ok_or("recorder not injected")?.record(entry);
  Ok(())
}

component! {
  pub struct StageA {
    pub b: Option<Arc<StageB>> => "b",
    pub recorder: Option<Arc<Recorder>> => "recorder",
  }
  impl Initializer;
}

impl Initializer for StageA {
  fn initialize(&self) -> Result<(), BoxError> {
    assert!(self.b.is_some());
    record(&self.recorder, "a")
  }
}

component! {
  pub struct StageB {
    pub recorder: Option<Arc<Recorder>> => "recorder",
  }
  impl Initializer;
}

impl Initializer for StageB {
  fn initialize(&self) -> Result<(), BoxError> {
    record(&self.recorder, "b")
  }
}

component! {
  pub struct StageC {
    pub a: Option<Arc<StageA>> => "a",
    pub recorder: Option<Arc<Recorder>> => "recorder",
  }
  impl Initializer;
}

impl Initializer for StageC {
  fn initialize(&self) -> Result<(), BoxError> {
    record(&self.recorder, "c")
  }
}

component! {
  pub struct Faulty {
    pub recorder: Option<Arc<Recorder>> => "recorder",
  }
  impl Initializer;
}

impl Initializer for Faulty {
  fn initialize(&self) -> Result<(), BoxError> {
    record(&self.recorder, "faulty")?;
    Err("disk full".into())
  }
}

component! {
  pub struct AfterFaulty {
    pub faulty: Option<Arc<Faulty>> => "faulty",
    pub recorder: Option<Arc<Recorder>> => "recorder",
  }
  impl Initializer;
}

impl Initializer for AfterFaulty {
  fn initialize(&self) -> Result<(), BoxError> {
    record(&self.recorder, "after")
  }
}

fn recorder_into(container: &Container) -> Arc<Mutex<Vec<&'static str>>> {
  let entries = Arc::new(Mutex::new(Vec::new()));
  container
    .register_instance(
      "recorder",
      Recorder {
        entries: entries.clone(),
      },
    )
    .unwrap();
  entries
}

// --- Cycle Detection ---

#[test]
fn test_two_node_cycle_is_reported() {
  // Arrange
  let container = Container::new();
  container.register_component::<CycleA>("a").unwrap();
  container.register_component::<CycleB>("b").unwrap();

  // Act
  let err = container.build().unwrap_err();

  // Assert
  assert!(matches!(err, Error::Cycle { .. }));
  assert_eq!(err.to_string(), "dependency cycle detected: a -> b -> a");
  assert!(!container.is_built());
}

#[test]
fn test_indirect_cycle_is_reported() {
  // Arrange
  let container = Container::new();
  container.register_component::<RingX>("x").unwrap();
  container.register_component::<RingY>("y").unwrap();
  container.register_component::<RingZ>("z").unwrap();

  // Act
  let err = container.build().unwrap_err();

  // Assert
  assert_eq!(err.to_string(), "dependency cycle detected: x -> y -> z -> x");
}

#[test]
fn test_self_dependency_is_a_cycle() {
  // Arrange
  let container = Container::new();
  container.register_component::<Narcissus>("me").unwrap();

  // Act
  let err = container.build().unwrap_err();

  // Assert
  assert_eq!(err.to_string(), "dependency cycle detected: me -> me");
}

// --- Field Selection ---

#[test]
fn test_only_annotated_visible_fields_are_injected() {
  // Arrange
  let container = Container::new();
  container.register_component::<Partial>("partial").unwrap();
  container.register_component::<Config>("cfg").unwrap();
  container.register_instance("workdir", "/var/app").unwrap();

  // Act
  let partial = container.resolve_as::<Partial>("partial").unwrap();

  // Assert
  assert!(partial.tagged.is_some());
  assert!(partial.untagged.is_none());
  assert!(partial.hidden.is_none());
}

#[test]
fn test_same_shaped_dependencies_are_not_aliased() {
  // Arrange
  let container = Container::new();
  container.register_component::<Pipeline>("pipeline").unwrap();
  container.register_component::<Logger>("audit").unwrap();
  container.register_component::<Logger>("access").unwrap();

  // Act
  let pipeline = container.resolve_as::<Pipeline>("pipeline").unwrap();

  // Assert
  let audit = pipeline.audit.as_ref().unwrap();
  let access = pipeline.access.as_ref().unwrap();
  assert!(!Arc::ptr_eq(audit, access));
}

#[test]
fn test_distinct_configs_land_in_their_fields() {
  // Arrange
  component! {
    pub struct Mirror {
      pub left: Option<Arc<Config>> => "left",
      pub right: Option<Arc<Config>> => "right",
    }
  }
  let container = Container::new();
  container.register_component::<Mirror>("mirror").unwrap();
  container
    .register_instance("left", Config { dir: "/left".into() })
    .unwrap();
  container
    .register_instance("right", Config { dir: "/right".into() })
    .unwrap();
  container.register_instance("workdir", "/shared").unwrap();

  // Act
  let mirror = container.resolve_as::<Mirror>("mirror").unwrap();

  // Assert
  let left = mirror.left.as_ref().unwrap();
  let right = mirror.right.as_ref().unwrap();
  assert!(!Arc::ptr_eq(left, right));
  // Both configs also received their own "workdir" dependency.
  assert_eq!(left.dir, "/shared");
  assert_eq!(right.dir, "/shared");
}

#[test]
fn test_value_fields_receive_a_copy() {
  // Arrange
  let container = Container::new();
  container.register_component::<Snapshot>("snapshot").unwrap();
  container.register_component::<Config>("cfg").unwrap();
  container.register_instance("workdir", "/var/app").unwrap();

  // Act
  let snapshot = container.resolve_as::<Snapshot>("snapshot").unwrap();

  // Assert
  assert_eq!(snapshot.live.as_ref().unwrap().dir, "/var/app");
  assert_eq!(snapshot.copy.dir, "/var/app");
}

#[test]
fn test_shared_instances_cannot_receive_injection() {
  // Arrange
  let container = Container::new();
  let service = Arc::new(Service::default());
  container.register_instance("service", service.clone()).unwrap();
  container.register_component::<Config>("cfg").unwrap();
  container.register_instance("workdir", "/var/app").unwrap();

  // Act
  let err = container.build().unwrap_err();

  // Assert
  assert!(matches!(err, Error::SharedInstance { ref id } if id == "service"));
  drop(service);
}

// --- Contracts ---

#[test]
fn test_contract_fields_receive_implementations() {
  // Arrange
  let container = Container::new();
  container.register_component::<Frontend>("frontend").unwrap();
  container.register_component::<EnglishGreeter>("greeter").unwrap();
  container.register_instance("name", "World").unwrap();

  // Act
  let frontend = container.resolve_as::<Frontend>("frontend").unwrap();
  let greeter = container.resolve_contract::<dyn Greeter>("greeter").unwrap();

  // Assert
  assert_eq!(frontend.greeter.as_ref().unwrap().greet(), "Hello, World!");
  assert_eq!(greeter.greet(), "Hello, World!");
}

#[test]
fn test_contract_not_satisfied_is_a_type_mismatch() {
  // Arrange
  let container = Container::new();
  container.register_component::<Frontend>("frontend").unwrap();
  container.register_component::<Config>("greeter").unwrap();
  container.register_instance("workdir", "/var/app").unwrap();

  // Act
  let err = container.build().unwrap_err();

  // Assert
  assert!(matches!(err, Error::TypeMismatch { ref id, .. } if id == "greeter"));
}

#[test]
fn test_resolving_an_undeclared_contract_fails() {
  let container = Container::new();
  container.register_component::<Config>("cfg").unwrap();
  container.register_instance("workdir", "/var/app").unwrap();

  let err = container.resolve_contract::<dyn Greeter>("cfg").err().unwrap();

  assert!(matches!(err, Error::NotOfRequestedType { .. }));
}

// --- Literal Providers ---

fn counting_provider(
  calls: Arc<AtomicUsize>,
  value: Option<&'static str>,
) -> impl fibre_beans::LiteralProvider {
  literal::from_fn(move |_id, _expected| {
    calls.fetch_add(1, Ordering::SeqCst);
    Ok(value.map(String::from))
  })
}

#[test]
fn test_registered_scalar_takes_precedence_over_provider() {
  // Arrange
  let calls = Arc::new(AtomicUsize::new(0));
  let container = Container::with_literal_provider(counting_provider(calls.clone(), Some("/provided")));
  container.register_component::<Config>("cfg").unwrap();
  container.register_instance("workdir", "/registered").unwrap();

  // Act
  let config = container.resolve_as::<Config>("cfg").unwrap();

  // Assert
  assert_eq!(config.dir, "/registered");
  assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_provider_supplies_missing_scalar() {
  // Arrange
  let calls = Arc::new(AtomicUsize::new(0));
  let container = Container::new();
  container.set_literal_provider(counting_provider(calls.clone(), Some("/provided")));
  container.register_component::<Service>("service").unwrap();
  container.register_component::<Config>("cfg").unwrap();

  // Act
  let service = container.resolve_as::<Service>("service").unwrap();

  // Assert
  assert_eq!(service.config.as_ref().unwrap().dir, "/provided");
  assert_eq!(calls.load(Ordering::SeqCst), 1);
  // The literal stays resolvable once the build succeeded.
  assert_eq!(*container.resolve_as::<String>("workdir").unwrap(), "/provided");
}

#[test]
fn test_provider_without_value_fails_build() {
  // Arrange
  let calls = Arc::new(AtomicUsize::new(0));
  let container = Container::with_literal_provider(counting_provider(calls.clone(), None));
  container.register_component::<Config>("cfg").unwrap();

  // Act
  let err = container.build().unwrap_err();

  // Assert
  assert!(matches!(
    &err,
    Error::DependencyNotFound { dependency, dependent } if dependency == "workdir" && dependent == "cfg"
  ));
  assert_eq!(
    err.to_string(),
    "dependency bean 'workdir' for 'cfg' receiver bean not found"
  );
  assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_provider_error_is_wrapped() {
  // Arrange
  let container = Container::with_literal_provider(literal::from_fn(|_id, _expected| {
    Err("vault unreachable".into())
  }));
  container.register_component::<Config>("cfg").unwrap();

  // Act
  let err = container.build().unwrap_err();

  // Assert
  assert!(matches!(err, Error::LiteralProvider { ref id, .. } if id == "workdir"));
  assert_eq!(
    err.to_string(),
    "literal provider error for 'workdir': vault unreachable"
  );
  assert!(!container.contains("workdir"));
}

#[test]
fn test_missing_scalar_without_provider_fails_validation() {
  let container = Container::new();
  container.register_component::<Config>("cfg").unwrap();

  let err = container.build().unwrap_err();

  assert!(matches!(err, Error::MissingBean { ref id } if id == "workdir"));
}

#[test]
fn test_provider_is_not_consulted_for_components() {
  // Arrange
  let calls = Arc::new(AtomicUsize::new(0));
  let container = Container::with_literal_provider(counting_provider(calls.clone(), Some("/x")));
  container.register_component::<Service>("service").unwrap();

  // Act
  let err = container.build().unwrap_err();

  // Assert
  assert!(matches!(err, Error::MissingBean { ref id } if id == "cfg"));
  assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_map_provider_and_clearing() {
  // Arrange
  let container = Container::new();
  container.set_literal_provider(MapLiteralProvider::new().with("WORKDIR", "/from/map"));
  container.clear_literal_provider();
  container.register_component::<Config>("cfg").unwrap();

  // Act & Assert: no provider installed any more.
  assert!(!container.has_literal_provider());
  assert!(matches!(container.build(), Err(Error::MissingBean { .. })));

  container.set_literal_provider(MapLiteralProvider::new().with("WORKDIR", "/from/map"));
  let config = container.resolve_as::<Config>("cfg").unwrap();
  assert_eq!(config.dir, "/from/map");
}

// --- Initializers ---

#[test]
fn test_initializers_run_in_dependency_order() {
  // Arrange
  let container = Container::new();
  let entries = recorder_into(&container);
  container.register_component::<StageC>("c").unwrap();
  container.register_component::<StageA>("a").unwrap();
  container.register_component::<StageB>("b").unwrap();

  // Act
  container.build().unwrap();

  // Assert
  assert_eq!(*entries.lock().unwrap(), vec!["b", "a", "c"]);

  // A second build runs nothing again.
  container.build().unwrap();
  assert_eq!(entries.lock().unwrap().len(), 3);
}

#[test]
fn test_initializer_failure_stops_the_build() {
  // Arrange
  let container = Container::new();
  let entries = recorder_into(&container);
  container.register_component::<AfterFaulty>("after").unwrap();
  container.register_component::<Faulty>("faulty").unwrap();

  // Act
  let err = container.build().unwrap_err();

  // Assert
  assert!(matches!(err, Error::Initializer { ref id, .. } if id == "faulty"));
  assert_eq!(
    err.to_string(),
    "initializer for bean 'faulty' failed: disk full"
  );
  assert_eq!(*entries.lock().unwrap(), vec!["faulty"]);
  assert!(!container.is_built());
}

// --- Concurrency ---

#[test]
fn test_concurrent_registration() {
  // Arrange
  let container = Arc::new(Container::new());

  // Act
  let handles: Vec<_> = (0..8u32)
    .map(|i| {
      let container = container.clone();
      thread::spawn(move || container.register_instance(&format!("value{i}"), i))
    })
    .collect();
  for handle in handles {
    handle.join().unwrap().unwrap();
  }

  // Assert
  assert_eq!(container.len(), 8);
  assert_eq!(*container.resolve_as::<u32>("value5").unwrap(), 5);
}

#[test]
fn test_concurrent_resolution_builds_once() {
  // Arrange
  let container = Arc::new(Container::new());
  container.register_component::<Service>("service").unwrap();
  container.register_component::<Config>("cfg").unwrap();
  container.register_instance("workdir", "/var/app").unwrap();

  // Act
  let handles: Vec<_> = (0..8)
    .map(|_| {
      let container = container.clone();
      thread::spawn(move || container.resolve_as::<Service>("service").unwrap())
    })
    .collect();
  let services: Vec<Arc<Service>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

  // Assert
  for service in &services {
    assert!(Arc::ptr_eq(service, &services[0]));
  }
  assert_eq!(services[0].config.as_ref().unwrap().dir, "/var/app");
}
