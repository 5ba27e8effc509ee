use std::fmt::{Debug, Display};

use colored::*;
use library_portal::core::{get_subscriber, init_subscriber, AppConfig};
use library_portal::library_web_server::LibraryWebServer;
use tokio::task::JoinError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let file_appender = tracing_appender::rolling::daily("/var/tmp/log/library_portal", "app");

    let subscriber = get_subscriber("library_portal".into(), "info".into(), file_appender);
    init_subscriber(subscriber);

    let config = match AppConfig::new() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Invalid configuration:".red(), e);
            tracing::error!(error.message = %e, "failed to load configuration");
            return Err(e.into());
        }
    };

    let library_web_server = LibraryWebServer::build(config.clone()).await?;
    let port = library_web_server.port();

    let server_task = tokio::spawn(library_web_server.run_until_stopped());

    println!("{}", "-----------------------------------------".green());
    println!(
        "📚 Library portal started on Addr: {}:{}",
        config.library_server_config.host, port
    );
    println!("{}", "-----------------------------------------".green());

    tokio::select! {
        outcome = server_task => report_exit("library_web_server", outcome),
    }
    Ok(())
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name)
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} failed",
                task_name
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} task failed to complete",
                task_name
            )
        }
    }
}
