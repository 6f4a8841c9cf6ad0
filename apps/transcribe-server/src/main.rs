use anyhow::{Context, Result};
use clap::Parser;
use prometheus::Registry;
use speech_stream::SpeechClient;
use std::sync::Arc;
use task_queue::{TaskExecutor, TaskMetrics};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use transcribe_server::{observability, routes, Config};
use transcription::{Collaborators, FfmpegConverter, HttpFetcher, SmtpNotifier, TranscriptionService};

#[tokio::main]
async fn main() -> Result<()> {
	dotenvy::dotenv().ok();

	let config = Config::parse();
	config.validate().map_err(anyhow::Error::msg)?;

	observability::init_tracing(&config);

	let (client_config, credentials) = config.speech_client();
	let collaborators = Collaborators {
		fetcher: Arc::new(HttpFetcher::new(reqwest::Client::new(), &config.work_dir)),
		converter: Arc::new(FfmpegConverter::new(&config.ffmpeg_path)),
		transcriber: Arc::new(SpeechClient::new(client_config, credentials)),
		notifier: Arc::new(SmtpNotifier::new(&config.smtp()).context("failed to configure mail relay")?),
	};

	let registry = Registry::new();
	let metrics = TaskMetrics::register(&registry).context("failed to register task metrics")?;
	let executor = TaskExecutor::with_metrics(config.tasks.clone(), metrics);
	let shutdown_token = CancellationToken::new();
	let sweeper = executor.spawn_expiry_sweeper(shutdown_token.child_token());

	let app = routes::router(TranscriptionService::new(executor, collaborators), registry);

	let listener = TcpListener::bind(config.bind_address()).await.with_context(|| format!("could not bind {}", config.bind_address()))?;
	info!(address = %listener.local_addr()?, work_dir = %config.work_dir.display(), "Listening");

	let server_token = shutdown_token.clone();
	axum::serve(listener, app)
		.with_graceful_shutdown(async move {
			wait_for_shutdown_signal().await;
			info!("Shutdown signal received");
			server_token.cancel();
		})
		.await?;

	shutdown_token.cancel();
	sweeper.await.ok();
	info!("Server stopped");
	Ok(())
}

async fn wait_for_shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			tracing::error!(error = %e, "Failed to listen for Ctrl+C");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			}
			Err(e) => {
				tracing::error!(error = %e, "Failed to install SIGTERM handler");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}
}
