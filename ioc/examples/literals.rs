use fibre_beans::{component, global, literal, resolve, EnvLiteralProvider, Error, LiteralProvider, MapLiteralProvider};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

component! {
  #[derive(Debug)]
  pub struct ServerConfig {
    pub host: String => "host",
    pub data_dir: String => "data_dir",
  }
}

component! {
  #[derive(Debug)]
  pub struct Server {
    pub config: Option<Arc<ServerConfig>> => "config",
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fibre_beans=debug")))
    .init();

  // Environment first (DEMO_HOST, DEMO_DATA_DIR), then in-memory defaults.
  let env = EnvLiteralProvider::with_prefix("DEMO");
  let defaults = MapLiteralProvider::new()
    .with("host", "127.0.0.1")
    .with("data_dir", "/tmp/demo");
  println!("looking up {} and {}", env.variable_name("host"), env.variable_name("data_dir"));

  global().set_literal_provider(literal::from_fn(move |id, expected| {
    match env.provide(id, expected)? {
      Some(value) => Ok(Some(value)),
      None => defaults.provide(id, expected),
    }
  }));

  global().register_component::<Server>("server").unwrap();
  global().register_component::<ServerConfig>("config").unwrap();
  // A registered scalar always wins over the provider.
  global().register_instance("data_dir", "/var/lib/demo").unwrap();

  match global().build() {
    Ok(()) => {
      let server = resolve!(Server, "server");
      println!("server config: {:?}", server.config);
    }
    Err(Error::LiteralProvider { id, source }) => eprintln!("could not read '{id}': {source}"),
    Err(err) => eprintln!("build failed: {err}"),
  }
}
