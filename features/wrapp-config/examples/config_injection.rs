use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use wrapp_config::{Config, ConfigProvider};
use wrapp_inject::{Construct, DynError, ServiceRegistry};

#[derive(Clone)]
struct AppConfig {
    host: String,
    port: u16,
    app_name: String,
}

struct Server {
    config: Config<AppConfig>,
}
impl Construct for Server {
    type Dependencies = (Config<AppConfig>,);

    fn construct((config,): Self::Dependencies) -> Result<Self, DynError> {
        Ok(Server { config })
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let app_config = AppConfig {
        host: "localhost".to_string(),
        port: 8080_u16,
        app_name: "My Awesome App".to_string(),
    };

    let mut config_provider = ConfigProvider::new();
    if let Err(e) = config_provider.add_config(app_config.clone()) {
        eprintln!("{e}");
        return;
    }

    let mut registry = ServiceRegistry::new();
    registry
        .bind_self_from_instance(config_provider)
        .bind_self::<Server>();

    let container = match registry.build() {
        Ok(container) => container,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };

    let server: Arc<Server> = match container.resolve() {
        Ok(server) => server,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };

    assert_eq!(app_config.host, server.config.host);
    assert_eq!(app_config.port, server.config.port);
    println!(
        "{} listening on {}:{}",
        server.config.app_name, server.config.host, server.config.port
    );
}
