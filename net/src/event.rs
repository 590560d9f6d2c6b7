// SPDX-License-Identifier: GPL-2.0

//! Broadcast event subscription, kicked by the reserved `EVENT` interrupt.

use std::sync::{Arc, Mutex};

/// Opaque argument captured at subscription time and handed back to the
/// handler on every broadcast.
pub type EventArg = Arc<dyn std::any::Any + Send + Sync>;

pub type EventHandler = Box<dyn Fn(&EventArg) + Send + Sync>;

struct EventEntry {
	handler: EventHandler,
	arg: EventArg,
}

pub(crate) struct EventRegistry {
	subscribers: Mutex<Vec<EventEntry>>,
}

impl EventRegistry {
	pub(crate) fn new() -> Self {
		Self {
			subscribers: Mutex::new(Vec::new()),
		}
	}

	/// Prepends a subscriber - the registration order is tracked so
	/// broadcast can walk it in reverse, matching the original's
	/// head-inserted list traversal.
	pub(crate) fn subscribe(&self, handler: EventHandler, arg: EventArg) {
		self.subscribers.lock().unwrap().push(EventEntry { handler, arg });
	}

	/// Calls every subscriber in registration-reverse order. No return
	/// value is propagated.
	pub(crate) fn broadcast(&self) {
		let subscribers = self.subscribers.lock().unwrap();
		for entry in subscribers.iter().rev() {
			(entry.handler)(&entry.arg);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex as StdMutex;

	#[test]
	fn broadcasts_in_reverse_registration_order() {
		let registry = EventRegistry::new();
		let order: Arc<StdMutex<Vec<i32>>> = Arc::new(StdMutex::new(Vec::new()));
		let o1 = order.clone();
		registry.subscribe(Box::new(move |_| o1.lock().unwrap().push(1)), Arc::new(()));
		let o2 = order.clone();
		registry.subscribe(Box::new(move |_| o2.lock().unwrap().push(2)), Arc::new(()));
		registry.broadcast();
		assert_eq!(*order.lock().unwrap(), vec![2, 1]);
	}
}
