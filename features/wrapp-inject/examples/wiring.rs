use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use wrapp_inject::{Construct, DynError, ServiceRegistry};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let mut registry = ServiceRegistry::new();
    registry
        .bind_self_from_instance("postgres://localhost/app".to_string())
        .bind::<dyn Repository, SqlRepository>(|repository| repository)
        .bind_self::<UserService>();

    let app = match registry.build() {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };

    println!("{:?}", app);
    print!("{}", app.graph());

    let users = app.resolve::<UserService>().unwrap();
    println!("{:?}", users.describe())
}

trait Repository: Send + Sync {
    fn source(&self) -> &str;
}

struct SqlRepository {
    url: Arc<String>,
}
impl Repository for SqlRepository {
    fn source(&self) -> &str {
        &self.url
    }
}
impl Construct for SqlRepository {
    type Dependencies = (Arc<String>,);

    fn construct((url,): Self::Dependencies) -> Result<Self, DynError> {
        Ok(SqlRepository { url })
    }
}

struct UserService {
    repository: Arc<dyn Repository>,
}
impl UserService {
    fn describe(&self) -> String {
        format!("users stored in {}", self.repository.source())
    }
}
impl Construct for UserService {
    type Dependencies = (Arc<dyn Repository>,);

    fn construct((repository,): Self::Dependencies) -> Result<Self, DynError> {
        Ok(UserService { repository })
    }
}
