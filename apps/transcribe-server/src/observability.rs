use crate::config::Config;
use std::str::FromStr;
use tracing_subscriber::{filter::EnvFilter, fmt::format::JsonFields, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Installs the global subscriber. An unparsable `RUST_LOG` falls back to `info`;
/// `LOG_JSON` switches to flattened JSON lines.
pub fn init_tracing(config: &Config) {
	let filter = EnvFilter::from_str(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info"));

	let layer = if config.log_json {
		tracing_subscriber::fmt::layer()
			.fmt_fields(JsonFields::default())
			.event_format(tracing_subscriber::fmt::format().json().flatten_event(true).with_span_list(false))
			.with_filter(filter)
			.boxed()
	} else {
		tracing_subscriber::fmt::layer().event_format(tracing_subscriber::fmt::format().pretty()).with_filter(filter).boxed()
	};

	tracing_subscriber::registry().with(layer).init();
}
