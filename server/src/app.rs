//! Application startup

use std::sync::Arc;

use crate::prelude::*;
use crate::routes;
use frameping_core::AppBuilder;
use frameping_core::app::VERSION;
use frameping_credential_adapter_fs::CredentialAdapterFs;

/// Registers the feature modules and builds the app state
pub fn build_app(mut builder: AppBuilder) -> ClResult<App> {
	frameping_push::register(&mut builder);
	frameping_webhook::register(&mut builder);
	builder.build()
}

/// Opens the credential store in `data_dir`, then serves until shutdown
pub async fn run(mut builder: AppBuilder) -> ClResult<()> {
	info!("Frameping V{}", VERSION);

	rustls::crypto::CryptoProvider::install_default(rustls::crypto::aws_lc_rs::default_provider())
		.map_err(|e| {
			error!("FATAL: Failed to install default crypto provider: {:?}", e);
			Error::Internal("Failed to install default crypto provider".to_string())
		})?;

	let data_dir = builder.opts().data_dir.clone();
	let adapter = CredentialAdapterFs::new(data_dir.clone()).await.map_err(|e| {
		error!("FATAL: Cannot open credential store in {}: {}", data_dir.display(), e);
		e
	})?;
	builder.credential_adapter(Arc::new(adapter));

	let app = build_app(builder)?;
	frameping_push::init(&app).await?;
	app.scheduler.start(app.clone());

	let listener = tokio::net::TcpListener::bind(app.opts.listen.as_ref()).await?;
	info!("Listening on HTTP {}", app.opts.listen);
	axum::serve(listener, routes::init(app.clone()))
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	info!("Shut down");
	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		warn!("Cannot listen for shutdown signal: {}", e);
		std::future::pending::<()>().await;
	}
}

// vim: ts=4
