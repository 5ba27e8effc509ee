use crate::core::change_feed::{ChangeFeed, InProcessChangeFeed};
use crate::core::config::StorageBackend;
use crate::core::jwt_auth::JwtKeys;
use crate::core::{AppConfig, EmailService};
use crate::db::{LibraryStore, MemoryLibraryStore, MySqlLibraryStore};
use crate::jobs::start_fine_refresher;
use crate::routes::library_routes;
use crate::services::AdminNotifications;
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{dev::Server, web::Data, App, HttpServer};
use sqlx::mysql::MySqlPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use tracing_actix_web::TracingLogger;

pub struct LibraryWebServer {
    port: u16,
    server: Server,
}

impl LibraryWebServer {
    pub async fn build(configuration: AppConfig) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.library_server_config.host, configuration.library_server_config.port
        );

        let store = build_store(&configuration).await?;

        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let server = run(listener, store, configuration)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

async fn build_store(configuration: &AppConfig) -> Result<Arc<dyn LibraryStore>, anyhow::Error> {
    match configuration.storage.backend {
        StorageBackend::Mysql => {
            let mysql_pool = MySqlPoolOptions::new()
                .acquire_timeout(Duration::from_secs(5))
                .connect_lazy_with(configuration.mysql.connect());

            if configuration.mysql.run_migrations {
                sqlx::migrate!("./migrations").run(&mysql_pool).await?;
                tracing::info!("database migrations applied");
            }
            Ok(Arc::new(MySqlLibraryStore::new(mysql_pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("using the in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryLibraryStore::new()))
        }
    }
}

pub fn run(
    listener: TcpListener,
    store: Arc<dyn LibraryStore>,
    configuration: AppConfig,
) -> Result<Server, anyhow::Error> {
    let feed: Arc<dyn ChangeFeed> = Arc::new(InProcessChangeFeed::new());
    let notifications = Data::new(AdminNotifications::subscribe(feed.as_ref()));

    let refresh_every = configuration.library.fine_refresh_interval_secs;
    if refresh_every > 0 {
        start_fine_refresher(store.clone(), feed.clone(), Duration::from_secs(refresh_every));
    }

    let email_service = Data::new(EmailService::new(configuration.email.clone())?);
    let jwt_keys = Data::new(JwtKeys::new(&configuration.jwt_auth_config));
    let policy = Data::new(configuration.library.clone());
    let store: Data<dyn LibraryStore> = Data::from(store);
    let feed: Data<dyn ChangeFeed> = Data::from(feed);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .supports_credentials();
        App::new()
            .wrap(TracingLogger::default())
            .configure(library_routes)
            .app_data(store.clone())
            .app_data(feed.clone())
            .app_data(notifications.clone())
            .app_data(email_service.clone())
            .app_data(jwt_keys.clone())
            .app_data(policy.clone())
            .wrap(cors)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
