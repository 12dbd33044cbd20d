use std::{process, sync::Arc};

use quorum::{
    application::{
        context::{AccountPolicy, AppContext, Principal},
        error::AppError,
        queries::{QuerySubverse, QueryUserInformation, QueryUserPreferences, QueryUserSaves},
        query::CacheableQuery,
        repos::Repositories,
    },
    cache::{CacheConfig, CacheHandler, spawn_sweeper},
    config::{self, Command},
    infra::{db::PostgresRepositories, error::InfraError, telemetry},
};
use serde::Serialize;
use sqlx::postgres::PgPool;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        Command::Migrate => run_migrate(&settings).await,
        command => run_inspect(&settings, command).await,
    }
}

async fn connect(settings: &config::Settings) -> Result<PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))
}

async fn run_migrate(settings: &config::Settings) -> Result<(), AppError> {
    let pool = connect(settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!("Database migrations applied");
    Ok(())
}

async fn run_inspect(settings: &config::Settings, command: Command) -> Result<(), AppError> {
    let pool = connect(settings).await?;
    let repositories = Repositories::from_adapter(Arc::new(PostgresRepositories::new(pool)));
    let cache = Arc::new(CacheHandler::new(CacheConfig::from(&settings.cache)));
    let app = AppContext::new(repositories, Arc::clone(&cache))
        .with_account_policy(AccountPolicy::from(&settings.accounts));

    let sweeper = spawn_sweeper(Arc::clone(&cache));
    let outcome = inspect(&app, command).await;

    sweeper.abort();
    cache.clear();
    outcome
}

async fn inspect(app: &AppContext, command: Command) -> Result<(), AppError> {
    let ctx = app.anonymous();
    match command {
        Command::Migrate => Ok(()),
        Command::Subverse(args) => {
            let subverse = QuerySubverse::new(args.name)
                .cached()
                .execute(&ctx)
                .await?
                .ok_or(AppError::NotFound)?;
            print_json(&subverse)
        }
        Command::Preferences(args) => {
            let preferences = QueryUserPreferences::new(args.name)
                .cached()
                .execute(&ctx)
                .await?;
            print_json(&preferences)
        }
        Command::Info(args) => {
            let information = QueryUserInformation::new(args.name)
                .cached()
                .execute(&ctx)
                .await?
                .ok_or(AppError::NotFound)?;
            print_json(&information)
        }
        Command::Saves(args) => {
            let ctx = app.request(Principal::user(args.user));
            let saved = QueryUserSaves::new(args.content_type)
                .cached()
                .execute(&ctx)
                .await?;
            print_json(&saved)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
