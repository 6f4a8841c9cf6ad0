use crate::credentials::Credentials;
use crate::error::StreamError;
use crate::messages::{NoOp, RecognizeResponse, StartRequest};
use crate::result::TranscriptionResult;
use futures_util::{
	sink::SinkExt,
	stream::{SplitSink, SplitStream, StreamExt},
	Sink, Stream,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::{
	fs::File,
	io::AsyncReadExt,
	sync::Mutex,
	task::JoinHandle,
	time::{self, Instant, MissedTickBehavior},
};
use tokio_tungstenite::{
	connect_async,
	tungstenite::{self, client::IntoClientRequest, http::header::AUTHORIZATION, http::HeaderValue, Message},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const DEFAULT_URL: &str = "wss://stream.watsonplatform.net/speech-to-text/api/v1/recognize?model=en-US_BroadbandModel";
pub const DEFAULT_CONTENT_TYPE: &str = "audio/flac";
/// Size of every upload frame except the last one.
pub const FRAME_SIZE: usize = 2048;
/// The service drops sockets after ~30s without traffic.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

type SharedSink<S> = Arc<Mutex<SplitSink<S, Message>>>;

#[derive(Debug, Clone)]
pub struct ClientConfig {
	pub url: String,
	pub content_type: String,
	pub frame_size: usize,
	pub keepalive_interval: Duration,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_URL.to_string(),
			content_type: DEFAULT_CONTENT_TYPE.to_string(),
			frame_size: FRAME_SIZE,
			keepalive_interval: KEEPALIVE_INTERVAL,
		}
	}
}

#[derive(Debug, Clone)]
pub struct SpeechClient {
	config: ClientConfig,
	credentials: Credentials,
}

impl SpeechClient {
	pub fn new(config: ClientConfig, credentials: Credentials) -> Self {
		Self { config, credentials }
	}

	pub const fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Opens an authenticated connection and transcribes the file at `path`.
	pub async fn transcribe(&self, path: &Path, keywords: &[String]) -> Result<TranscriptionResult, StreamError> {
		let mut request = self.config.url.as_str().into_client_request().map_err(|e| StreamError::Request(e.to_string()))?;
		let auth = HeaderValue::from_str(&self.credentials.basic_auth()).map_err(|e| StreamError::Request(e.to_string()))?;
		request.headers_mut().insert(AUTHORIZATION, auth);

		let (ws_stream, _) = connect_async(request).await.map_err(StreamError::Connect)?;
		debug!(url = %self.config.url, "Connected to speech service");

		self.transcribe_over(ws_stream, path, keywords).await
	}

	/// Runs one recognition session over an already open websocket.
	///
	/// The keepalive task is started once the session is open and is always
	/// stopped and joined before this returns.
	pub async fn transcribe_over<S>(&self, ws: S, path: &Path, keywords: &[String]) -> Result<TranscriptionResult, StreamError>
	where
		S: Stream<Item = Result<Message, tungstenite::Error>> + Sink<Message, Error = tungstenite::Error> + Send + Unpin + 'static,
	{
		let (sink, mut stream) = ws.split();
		let sink: SharedSink<S> = Arc::new(Mutex::new(sink));

		send_json(&sink, &StartRequest::new(&self.config.content_type, keywords)).await?;
		info!(path = %path.display(), keywords = keywords.len(), "Starting transcription");

		let cancel = CancellationToken::new();
		let keepalive = spawn_keepalive(Arc::clone(&sink), self.config.keepalive_interval, cancel.clone());

		let outcome = async {
			let frames = upload_file(&sink, path, self.config.frame_size).await?;
			debug!(path = %path.display(), frames, "Uploaded audio");
			read_result(&mut stream).await
		}
		.await;

		cancel.cancel();
		if let Err(e) = keepalive.await {
			debug!(error = %e, "Keepalive task ended abnormally");
		}

		// Best effort; the outcome is already decided.
		let _ = time::timeout(CLOSE_TIMEOUT, async { sink.lock().await.close().await }).await;

		outcome
	}
}

async fn send_json<S, T>(sink: &SharedSink<S>, message: &T) -> Result<(), StreamError>
where
	S: Sink<Message, Error = tungstenite::Error> + Unpin,
	T: Serialize,
{
	let text = serde_json::to_string(message)?;
	sink.lock().await.send(Message::text(text)).await.map_err(StreamError::Send)
}

/// Streams `path` as `frame_size` binary frames followed by an empty frame
/// marking end of audio. Returns the number of data frames sent.
async fn upload_file<S>(sink: &SharedSink<S>, path: &Path, frame_size: usize) -> Result<usize, StreamError>
where
	S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
	let mut file = File::open(path).await.map_err(StreamError::Upload)?;
	let mut buffer = vec![0u8; frame_size.max(1)];
	let mut frames = 0;

	loop {
		let n = fill_frame(&mut file, &mut buffer).await.map_err(StreamError::Upload)?;
		if n == 0 {
			break;
		}
		sink.lock().await.send(Message::binary(buffer[..n].to_vec())).await.map_err(StreamError::Send)?;
		frames += 1;
		if n < buffer.len() {
			break;
		}
	}

	sink.lock().await.send(Message::binary(Vec::new())).await.map_err(StreamError::Send)?;
	Ok(frames)
}

/// Reads until `buffer` is full or the file ends.
async fn fill_frame(file: &mut File, buffer: &mut [u8]) -> std::io::Result<usize> {
	let mut filled = 0;
	while filled < buffer.len() {
		let n = file.read(&mut buffer[filled..]).await?;
		if n == 0 {
			break;
		}
		filled += n;
	}
	Ok(filled)
}

/// Waits for the first frame carrying results. Acknowledgement and other
/// result-less frames are skipped.
async fn read_result<S>(stream: &mut SplitStream<S>) -> Result<TranscriptionResult, StreamError>
where
	S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
	while let Some(message) = stream.next().await {
		match message.map_err(StreamError::Receive)? {
			Message::Text(text) => {
				let response: RecognizeResponse = serde_json::from_str(text.as_str())?;
				if let Some(error) = response.error {
					return Err(StreamError::Service(error));
				}
				if response.has_results() {
					debug!(results = response.results.len(), "Speech service returned results");
					return Ok(TranscriptionResult::from_response(&response));
				}
				debug!("Skipping frame without results");
			}
			Message::Close(frame) => {
				let reason = frame.map_or_else(|| "no close frame".to_string(), |f| format!("{} {}", f.code, f.reason));
				return Err(StreamError::Closed(reason));
			}
			_ => {}
		}
	}

	Err(StreamError::Closed("stream ended".to_string()))
}

/// Sends a `no-op` action every `period` until `cancel` fires or a send fails.
fn spawn_keepalive<S>(sink: SharedSink<S>, period: Duration, cancel: CancellationToken) -> JoinHandle<()>
where
	S: Sink<Message, Error = tungstenite::Error> + Send + Unpin + 'static,
{
	tokio::spawn(async move {
		let mut ticker = time::interval_at(Instant::now() + period, period);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				() = cancel.cancelled() => break,
				_ = ticker.tick() => {
					if let Err(e) = send_json(&sink, &NoOp::default()).await {
						debug!(error = %e, "Keepalive send failed, stopping");
						break;
					}
				}
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use tokio::io::DuplexStream;
	use tokio_tungstenite::{tungstenite::protocol::Role, WebSocketStream};

	async fn socket_pair() -> (WebSocketStream<DuplexStream>, WebSocketStream<DuplexStream>) {
		let (client_io, service_io) = tokio::io::duplex(64 * 1024);
		let client = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;
		let service = WebSocketStream::from_raw_socket(service_io, Role::Server, None).await;
		(client, service)
	}

	#[tokio::test(start_paused = true)]
	async fn test_keepalive_stops_when_cancelled() {
		let (client, mut service) = socket_pair().await;
		let (sink, _stream) = client.split();
		let sink = Arc::new(Mutex::new(sink));
		let cancel = CancellationToken::new();

		let handle = spawn_keepalive(Arc::clone(&sink), Duration::from_millis(10), cancel.clone());
		for _ in 0..3 {
			let frame = service.next().await.unwrap().unwrap();
			assert_eq!(frame, Message::text(r#"{"action":"no-op"}"#));
		}

		cancel.cancel();
		time::timeout(Duration::from_secs(1), handle).await.expect("keepalive outlived its cancellation").unwrap();
		assert_eq!(Arc::strong_count(&sink), 1, "keepalive task still holds the sink");

		// Ten more periods pass without another frame.
		assert!(time::timeout(Duration::from_millis(100), service.next()).await.is_err());
	}
}
