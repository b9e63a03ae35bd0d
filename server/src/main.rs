use std::process::ExitCode;

use frameping::AppBuilder;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.init();

	let mut builder = AppBuilder::new();
	if let Err(e) = frameping::config::from_env(&mut builder) {
		error!("FATAL: {}", e);
		return ExitCode::FAILURE;
	}

	match frameping::run(builder).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("FATAL: {}", e);
			ExitCode::FAILURE
		}
	}
}

// vim: ts=4
