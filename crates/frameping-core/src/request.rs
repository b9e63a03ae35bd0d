//! Outbound HTTP client
//!
//! Thin wrapper around a pooled hyper client. Every call carries an explicit
//! timeout so a stuck endpoint cannot stall the caller indefinitely.

use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, StatusCode, header};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use serde::Serialize;

use crate::prelude::*;

/// Status and raw body of a completed request
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub body: Bytes,
}

impl Response {
	pub fn body_text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

#[derive(Debug, Clone)]
pub struct Request {
	client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl Request {
	pub fn new() -> ClResult<Self> {
		let connector = HttpsConnectorBuilder::new()
			.with_provider_and_webpki_roots(rustls::crypto::aws_lc_rs::default_provider())
			.map_err(|e| Error::Internal(format!("TLS error: {}", e)))?
			.https_or_http()
			.enable_http1()
			.enable_http2()
			.build();

		let client = Client::builder(TokioExecutor::new()).build(connector);
		Ok(Self { client })
	}

	/// POSTs a JSON body
	pub async fn post_json(
		&self,
		url: &str,
		data: &impl Serialize,
		timeout: Duration,
	) -> ClResult<Response> {
		let body = serde_json::to_vec(data)?;
		let request = hyper::Request::builder()
			.method(Method::POST)
			.uri(url)
			.header(header::CONTENT_TYPE, "application/json")
			.header(header::ACCEPT, "application/json")
			.body(Full::new(Bytes::from(body)))
			.map_err(|e| Error::ValidationError(format!("invalid request: {}", e)))?;

		self.send(request, timeout).await
	}

	/// Issues a GET with extra headers
	pub async fn get(
		&self,
		url: &str,
		headers: &[(&str, &str)],
		timeout: Duration,
	) -> ClResult<Response> {
		let mut builder = hyper::Request::builder()
			.method(Method::GET)
			.uri(url)
			.header(header::ACCEPT, "application/json");
		for (name, value) in headers {
			builder = builder.header(*name, *value);
		}
		let request = builder
			.body(Full::new(Bytes::new()))
			.map_err(|e| Error::ValidationError(format!("invalid request: {}", e)))?;

		self.send(request, timeout).await
	}

	async fn send(
		&self,
		request: hyper::Request<Full<Bytes>>,
		timeout: Duration,
	) -> ClResult<Response> {
		let uri = request.uri().clone();
		let exchange = async {
			let response = self
				.client
				.request(request)
				.await
				.map_err(|e| Error::NetworkError(format!("{}: {}", uri, e)))?;
			let status = response.status();
			let body = response
				.into_body()
				.collect()
				.await
				.map_err(|e| Error::NetworkError(format!("{}: body: {}", uri, e)))?
				.to_bytes();
			Ok::<_, Error>(Response { status, body })
		};

		match tokio::time::timeout(timeout, exchange).await {
			Ok(res) => res,
			Err(_) => {
				warn!("request to {} timed out after {:?}", uri, timeout);
				Err(Error::Timeout)
			}
		}
	}
}

// vim: ts=4
