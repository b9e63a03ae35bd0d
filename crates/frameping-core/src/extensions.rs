//! Feature state attached to the app
//!
//! Feature crates keep their own state here, keyed by type, so `AppState`
//! does not have to know about push batches or webhook verifiers.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Debug;

struct Entry {
	name: &'static str,
	value: Box<dyn Any + Send + Sync>,
}

#[derive(Default)]
pub struct Extensions {
	entries: HashMap<TypeId, Entry>,
}

impl Extensions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `val`, returning true when it replaced a value of the same type
	pub fn insert<T: Send + Sync + 'static>(&mut self, val: T) -> bool {
		let entry = Entry { name: std::any::type_name::<T>(), value: Box::new(val) };
		self.entries.insert(TypeId::of::<T>(), entry).is_some()
	}

	pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
		self.entries.get(&TypeId::of::<T>())?.value.downcast_ref::<T>()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl Debug for Extensions {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_set().entries(self.entries.values().map(|e| e.name)).finish()
	}
}


// vim: ts=4
