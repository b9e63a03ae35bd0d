//! Filesystem credential adapter.
//!
//! Every user gets its own directory under the base directory, holding a
//! single `credential.json`. Writes go to a temporary file in the same
//! directory which is then renamed over the record, so readers see either the
//! old or the new credential, never a partial one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{
	fs::{File, create_dir_all, read, read_dir, remove_dir, remove_file, rename},
	io::AsyncWriteExt,
};

use frameping_types::{
	credential_adapter::{CredentialAdapter, NotificationCredential},
	prelude::*,
	utils::random_id,
};

pub const CREDENTIAL_FILE: &str = "credential.json";

fn user_dir(base_dir: &Path, fid: Fid) -> PathBuf {
	base_dir.join(fid.to_string())
}

fn credential_path(base_dir: &Path, fid: Fid) -> PathBuf {
	user_dir(base_dir, fid).join(CREDENTIAL_FILE)
}

fn tmp_path(base_dir: &Path, fid: Fid) -> PathBuf {
	user_dir(base_dir, fid).join(format!("tmp-{}", random_id()))
}

#[derive(Debug)]
pub struct CredentialAdapterFs {
	base_dir: Box<Path>,
}

impl CredentialAdapterFs {
	pub async fn new(base_dir: Box<Path>) -> ClResult<Self> {
		create_dir_all(&base_dir).await.map_err(Error::Io)?;
		Ok(Self { base_dir })
	}
}

#[async_trait]
impl CredentialAdapter for CredentialAdapterFs {
	async fn read_credential(&self, fid: Fid) -> ClResult<NotificationCredential> {
		let data = read(credential_path(&self.base_dir, fid)).await?;
		serde_json::from_slice(&data).map_err(|e| Error::Corrupt(format!("fid {}: {}", fid, e)))
	}

	async fn write_credential(
		&self,
		fid: Fid,
		credential: &NotificationCredential,
	) -> ClResult<()> {
		create_dir_all(user_dir(&self.base_dir, fid)).await.map_err(Error::Io)?;
		let data = serde_json::to_vec_pretty(credential)?;

		let tmp = tmp_path(&self.base_dir, fid);
		let res = async {
			let mut file = File::create(&tmp).await?;
			file.write_all(&data).await?;
			file.sync_all().await?;
			rename(&tmp, credential_path(&self.base_dir, fid)).await?;
			Ok::<(), std::io::Error>(())
		}
		.await;

		if let Err(e) = res {
			warn!(fid = %fid, error = %e, "credential write failed, removing tmpfile");
			let _ = remove_file(&tmp).await;
			return Err(Error::Io(e));
		}
		debug!(fid = %fid, "credential written");
		Ok(())
	}

	async fn delete_credential(&self, fid: Fid) -> ClResult<()> {
		match remove_file(credential_path(&self.base_dir, fid)).await {
			Ok(()) => {
				debug!(fid = %fid, "credential deleted");
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => (),
			Err(e) => return Err(Error::Io(e)),
		}
		// Only succeeds once the directory is empty
		let _ = remove_dir(user_dir(&self.base_dir, fid)).await;
		Ok(())
	}

	async fn list_fids(&self) -> ClResult<Vec<Fid>> {
		let mut entries = read_dir(&self.base_dir).await.map_err(Error::Io)?;
		let mut fids = Vec::new();

		while let Some(entry) = entries.next_entry().await.map_err(Error::Io)? {
			let name = entry.file_name();
			let Some(fid) = name.to_str().and_then(|s| s.parse::<Fid>().ok()) else {
				debug!("skipping foreign entry in credential dir: {:?}", name);
				continue;
			};
			if tokio::fs::metadata(entry.path().join(CREDENTIAL_FILE)).await.is_ok() {
				fids.push(fid);
			}
		}

		Ok(fids)
	}
}


// vim: ts=4
