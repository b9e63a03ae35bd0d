//! Per-user notification credential store
//!
//! Sits in front of a `CredentialAdapter` and owns every mutation of the
//! stored credentials. Mutations for one user are serialized through a
//! per-user async lock created on demand; reads go straight to the adapter,
//! which guarantees they never observe a partial write.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::prelude::*;
use frameping_types::credential_adapter::{CredentialAdapter, NotificationCredential};

type UserLock = Arc<tokio::sync::Mutex<()>>;

#[derive(Debug)]
pub struct CredentialStore {
	adapter: Arc<dyn CredentialAdapter>,
	locks: Mutex<HashMap<Fid, UserLock>>,
}

impl CredentialStore {
	pub fn new(adapter: Arc<dyn CredentialAdapter>) -> Self {
		Self { adapter, locks: Mutex::new(HashMap::new()) }
	}

	/// Reads a credential, distinguishing missing (`NotFound`) from corrupt records
	pub async fn read(&self, fid: Fid) -> ClResult<NotificationCredential> {
		self.adapter.read_credential(fid).await
	}

	/// Reads a credential, treating every failure as absence
	pub async fn get(&self, fid: Fid) -> Option<NotificationCredential> {
		match self.read(fid).await {
			Ok(credential) => Some(credential),
			Err(Error::NotFound) => None,
			Err(Error::Corrupt(e)) => {
				warn!(fid = %fid, error = %e, "corrupt notification credential");
				None
			}
			Err(e) => {
				error!(fid = %fid, error = %e, "failed to read notification credential");
				None
			}
		}
	}

	/// Read-modify-persist under the user's lock
	///
	/// `f` receives the current credential (a corrupt record is passed as
	/// `None`) and returns the new snapshot. A returned credential is written,
	/// replacing a corrupt record. `None` deletes a valid record and leaves a
	/// corrupt one in place.
	pub async fn modify<F>(&self, fid: Fid, f: F) -> ClResult<Option<NotificationCredential>>
	where
		F: FnOnce(Option<NotificationCredential>) -> ClResult<Option<NotificationCredential>>
			+ Send,
	{
		self.modify_with(fid, f, false).await
	}

	async fn modify_with<F>(
		&self,
		fid: Fid,
		f: F,
		delete_corrupt: bool,
	) -> ClResult<Option<NotificationCredential>>
	where
		F: FnOnce(Option<NotificationCredential>) -> ClResult<Option<NotificationCredential>>
			+ Send,
	{
		let user_lock = self.user_lock(fid);
		let res = {
			let _guard = user_lock.lock().await;
			self.modify_locked(fid, f, delete_corrupt).await
		};
		drop(user_lock);
		self.prune_lock(fid);
		res
	}

	async fn modify_locked<F>(
		&self,
		fid: Fid,
		f: F,
		delete_corrupt: bool,
	) -> ClResult<Option<NotificationCredential>>
	where
		F: FnOnce(Option<NotificationCredential>) -> ClResult<Option<NotificationCredential>>,
	{
		let (current, corrupt) = match self.read(fid).await {
			Ok(credential) => (Some(credential), false),
			Err(Error::NotFound) => (None, false),
			Err(Error::Corrupt(e)) => {
				warn!(fid = %fid, error = %e, "corrupt notification credential");
				(None, true)
			}
			Err(e) => return Err(e),
		};
		let existed = current.is_some();

		let next = f(current)?;
		match &next {
			Some(credential) => {
				credential.validate()?;
				self.adapter.write_credential(fid, credential).await?;
			}
			None if existed || (corrupt && delete_corrupt) => {
				self.adapter.delete_credential(fid).await?;
			}
			None => (),
		}
		Ok(next)
	}

	/// Replaces the user's credential
	pub async fn upsert(&self, fid: Fid, credential: NotificationCredential) -> ClResult<()> {
		self.modify(fid, move |_| Ok(Some(credential))).await?;
		Ok(())
	}

	/// Disables delivery for the user, keeping the record. Returns whether a record existed.
	pub async fn disable(&self, fid: Fid) -> ClResult<bool> {
		let mut existed = false;
		self.modify(fid, |current| {
			existed = current.is_some();
			Ok(current.map(NotificationCredential::disabled))
		})
		.await?;
		Ok(existed)
	}

	/// Removes the user's credential, corrupt or not
	pub async fn remove(&self, fid: Fid) -> ClResult<()> {
		self.modify_with(fid, |_| Ok(None), true).await?;
		Ok(())
	}

	/// Lists every enabled credential in ascending fid order, skipping unreadable records
	pub async fn list_enabled(&self) -> ClResult<Vec<(Fid, NotificationCredential)>> {
		let mut fids = self.adapter.list_fids().await?;
		fids.sort_unstable();
		let mut enabled = Vec::with_capacity(fids.len());

		for fid in fids {
			match self.read(fid).await {
				Ok(credential) if credential.enabled => enabled.push((fid, credential)),
				Ok(_) | Err(Error::NotFound) => (),
				Err(e) => {
					warn!(fid = %fid, error = %e, "skipping unreadable notification credential");
				}
			}
		}

		Ok(enabled)
	}

	fn user_lock(&self, fid: Fid) -> UserLock {
		self.locks.lock().entry(fid).or_default().clone()
	}

	fn prune_lock(&self, fid: Fid) {
		let mut locks = self.locks.lock();
		if locks.get(&fid).is_some_and(|l| Arc::strong_count(l) == 1) {
			locks.remove(&fid);
		}
	}

	#[cfg(test)]
	fn tracked_locks(&self) -> usize {
		self.locks.lock().len()
	}
}


// vim: ts=4
