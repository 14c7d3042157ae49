use fibre_beans::{component, contract, resolve_from, BoxError, Container, Initializer};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// 1. Define the abstraction (the contract)
pub trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

contract!(dyn Logger);

// 2. A concrete implementation, configured with a prefix bean
component! {
  pub struct ConsoleLogger {
    pub prefix: String => "log_prefix",
  }
  provides dyn Logger;
}

impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[{}]: {}", self.prefix, message);
  }
}

component! {
  #[derive(Debug)]
  pub struct Database {
    pub url: String => "database_url",
  }
}

// 3. A service depending on both, checked once wiring is done
component! {
  pub struct ReportService {
    pub logger: Option<Arc<dyn Logger>> => "logger",
    pub database: Option<Arc<Database>> => "database",
  }
  impl Initializer;
}

impl Initializer for ReportService {
  fn initialize(&self) -> Result<(), BoxError> {
    let database = self.database.as_ref().ok_or("no database wired")?;
    if database.url.is_empty() {
      return Err("database url is empty".into());
    }
    Ok(())
  }
}

impl ReportService {
  fn generate_report(&self) {
    let Some(logger) = &self.logger else {
      return;
    };
    logger.log("Starting report generation.");
    if let Some(database) = &self.database {
      logger.log(&format!("Reading from {}", database.url));
    }
    logger.log("Finished report generation.");
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fibre_beans=debug")))
    .init();

  // --- Registration ---
  let container = Container::new();
  container.register_component::<ReportService>("reports").unwrap();
  container.register_component::<ConsoleLogger>("logger").unwrap();
  container.register_component::<Database>("database").unwrap();
  container.register_instance("log_prefix", "REPORT").unwrap();
  container.register_instance("database_url", "postgres://localhost/reports").unwrap();

  // --- Build ---
  if let Err(err) = container.build() {
    eprintln!("build failed: {err}");
    return;
  }

  // --- Resolution ---
  let reports = resolve_from!(&container, ReportService, "reports");
  reports.generate_report();

  let logger = resolve_from!(&container, trait Logger, "logger");
  logger.log(&format!("{} beans wired: {:?}", container.len(), container.bean_ids()));
}
