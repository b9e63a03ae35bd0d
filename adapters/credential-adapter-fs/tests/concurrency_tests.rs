//! Credential adapter concurrency tests
//!
//! Readers racing a writer must only ever see complete records

use frameping_credential_adapter_fs::CredentialAdapterFs;
use frameping_types::credential_adapter::{CredentialAdapter, NotificationCredential};
use frameping_types::error::Error;
use frameping_types::types::{Fid, Timestamp};
use std::sync::Arc;
use tempfile::TempDir;

async fn create_test_adapter() -> (Arc<CredentialAdapterFs>, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = CredentialAdapterFs::new(temp_dir.path().into())
		.await
		.expect("Failed to create adapter");
	(Arc::new(adapter), temp_dir)
}

fn credential(n: usize) -> NotificationCredential {
	NotificationCredential {
		url: "https://api.example.com/notify".into(),
		token: format!("token-{:04}", n),
		enabled: true,
		last_updated: Timestamp(1_700_000_000),
	}
}

#[tokio::test]
async fn test_concurrent_writes_different_users() {
	let (adapter, _temp) = create_test_adapter().await;
	let mut handles = vec![];

	for i in 0..8 {
		let adapter_clone = Arc::clone(&adapter);
		handles.push(tokio::spawn(async move {
			adapter_clone
				.write_credential(Fid(i), &credential(usize::try_from(i).unwrap_or_default()))
				.await
				.unwrap_or_else(|_| panic!("Failed to write credential {}", i));
		}));
	}
	for handle in handles {
		handle.await.expect("Task panicked");
	}

	assert_eq!(adapter.list_fids().await.expect("list").len(), 8);
}

#[tokio::test]
async fn test_readers_never_see_partial_record() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.write_credential(Fid(1), &credential(0)).await.expect("initial write");

	let writer = {
		let adapter = Arc::clone(&adapter);
		tokio::spawn(async move {
			for n in 1..50 {
				adapter.write_credential(Fid(1), &credential(n)).await.expect("write");
			}
		})
	};

	let reader = {
		let adapter = Arc::clone(&adapter);
		tokio::spawn(async move {
			for _ in 0..50 {
				match adapter.read_credential(Fid(1)).await {
					Ok(cred) => assert!(cred.token.starts_with("token-")),
					Err(Error::Corrupt(e)) => panic!("observed partial record: {}", e),
					Err(e) => panic!("unexpected error: {}", e),
				}
			}
		})
	};

	writer.await.expect("writer panicked");
	reader.await.expect("reader panicked");
}

// vim: ts=4
