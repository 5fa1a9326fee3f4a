use std::{process, sync::Arc};

use tokio::signal;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

use torchio::{
    application::{
        compile::CompileService, engine::CompileEngine, error::AppError, sync::PositionMapper,
        wordcount::WordCounter,
    },
    config,
    infra::{
        activity::RecentProjects,
        engine::RemoteEngine,
        error::InfraError,
        http::{self, AllowedImages, HttpState},
        telemetry,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    serve(settings).await
}

async fn serve(settings: config::Settings) -> Result<(), AppError> {
    let client = reqwest::Client::builder()
        .timeout(settings.engine.request_timeout)
        .build()
        .map_err(|err| AppError::unexpected(format!("failed to build engine client: {err}")))?;
    let engine: Arc<dyn CompileEngine> =
        Arc::new(RemoteEngine::new(client, settings.engine.url.clone()));
    let activity = Arc::new(RecentProjects::new());

    let compile = Arc::new(CompileService::new(
        Arc::clone(&engine),
        activity,
        settings.compile.timeout,
        settings.compile.output_base_url.clone(),
    ));
    let mapper = Arc::new(PositionMapper::new(Arc::clone(&engine)));
    let word_counter = Arc::new(WordCounter::new(engine));

    let state = HttpState {
        compile,
        mapper,
        word_counter,
        allowed_images: Arc::new(AllowedImages::new(settings.images.allowed.clone())),
        output_url_prefix: settings.compile.output_url_prefix.clone(),
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.listen_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        addr = %settings.server.listen_addr,
        engine = %settings.engine.url,
        "torchio listening"
    );

    let grace = settings.server.graceful_shutdown;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!(drain = ?grace, "shutdown signal received; draining connections");
        })
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "failed to install shutdown signal handler");
    }
}
