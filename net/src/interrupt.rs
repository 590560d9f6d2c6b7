// SPDX-License-Identifier: GPL-2.0

//! Interrupt dispatch: the single worker that demultiplexes asynchronous
//! notifications into IRQ handlers and into the soft-IRQ entry point.
//!
//! The original C core backs this with POSIX signals (`sigwait` /
//! `pthread_kill`) on a dedicated pthread. Per the "signal-driven
//! interrupts" design note this is abstracted behind a portable interrupt
//! source: `raise_irq` is a channel send, the worker's wait loop is a
//! channel receive, and `run`'s barrier rendezvous is a condvar pair.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Condvar, Mutex};
use std::thread::JoinHandle;

use crate::device::DeviceId;
use crate::error::{NetError, Result};

/// Reserved interrupt IDs, lowest of the subscription set. A caller-supplied
/// IRQ must never collide with these.
pub const TERMINATE: u32 = 0;
pub const SOFTIRQ: u32 = 1;
pub const EVENT: u32 = 2;
pub const TIMER: u32 = 3;

const RESERVED: [u32; 4] = [TERMINATE, SOFTIRQ, EVENT, TIMER];

bitflags::bitflags! {
	/// IRQ registration flags.
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub struct IrqFlags: u32 {
		/// Two entries may share an IRQ number only if both set this flag.
		const SHARED = 0b0000_0001;
	}
}

/// `(irq, dev) -> return code`, matching the C signature
/// `int (*handler)(unsigned int irq, void *dev)`. The return value is
/// logged, never acted on.
pub type IrqHandler = Box<dyn Fn(u32, Option<DeviceId>) -> i32 + Send + Sync>;

struct IrqEntry {
	irq: u32,
	handler: IrqHandler,
	flags: IrqFlags,
	name: String,
	dev: Option<DeviceId>,
}

/// The interrupt dispatcher: an IRQ table plus the channel that stands in
/// for the host's interrupt source.
pub(crate) struct Dispatcher {
	sender: Sender<u32>,
	receiver: Mutex<Option<Receiver<u32>>>,
	irqs: Mutex<Vec<IrqEntry>>,
	subscribed: Mutex<HashSet<u32>>,
	worker: Mutex<Option<JoinHandle<()>>>,
	running: AtomicBool,
	startup: (Mutex<bool>, Condvar),
	user_irq_base: u32,
}

impl Dispatcher {
	pub(crate) fn new(user_irq_base: u32) -> Self {
		let (sender, receiver) = mpsc::channel();
		let mut subscribed = HashSet::new();
		subscribed.extend(RESERVED);
		Self {
			sender,
			receiver: Mutex::new(Some(receiver)),
			irqs: Mutex::new(Vec::new()),
			subscribed: Mutex::new(subscribed),
			worker: Mutex::new(None),
			running: AtomicBool::new(false),
			startup: (Mutex::new(false), Condvar::new()),
			user_irq_base,
		}
	}

	pub(crate) fn is_running(&self) -> bool {
		self.running.load(Ordering::Acquire)
	}

	/// Register an IRQ handler. Fails when `irq` is one of the four reserved
	/// IDs or below `user_irq_base`, and when an entry already exists for
	/// `irq` and either side did not request `SHARED` — the corrected
	/// reading of the original's `flags ^ INTR_IRQ_SHARED` check, which was
	/// nonzero (and so rejected registration) whenever `flags != SHARED`,
	/// not only when SHARED was unset on one side. The fix uses bitwise AND.
	pub(crate) fn request_irq(
		&self,
		irq: u32,
		handler: IrqHandler,
		flags: IrqFlags,
		name: impl Into<String>,
		dev: Option<DeviceId>,
	) -> Result<()> {
		if RESERVED.contains(&irq) || irq < self.user_irq_base {
			return Err(NetError::ReservedIrq {
				irq,
				user_irq_base: self.user_irq_base,
			});
		}
		let mut irqs = self.irqs.lock().unwrap();
		for entry in irqs.iter().filter(|e| e.irq == irq) {
			let both_shared = entry.flags.contains(IrqFlags::SHARED) && flags.contains(IrqFlags::SHARED);
			if !both_shared {
				return Err(NetError::IrqConflict { irq });
			}
		}
		let name = name.into();
		log::info!("irq registered: irq={irq}, name={name}");
		irqs.push(IrqEntry {
			irq,
			handler,
			flags,
			name,
			dev,
		});
		self.subscribed.lock().unwrap().insert(irq);
		Ok(())
	}

	/// Asynchronously notify the worker that `irq` fired. Safe to call from
	/// any thread; does not wait for the worker to act on it. Fails with
	/// `NotRunning` if the dispatcher worker has no receiver left to notify.
	pub(crate) fn raise_irq(&self, irq: u32) -> Result<()> {
		if self.sender.send(irq).is_err() {
			log::warn!("raise_irq({irq}) dropped: dispatcher worker is not running");
			return Err(NetError::NotRunning);
		}
		Ok(())
	}

	/// Invoke every handler registered for a non-reserved `irq`, in
	/// reverse-registration order (the order the original's head-inserted
	/// linked list would yield).
	pub(crate) fn dispatch_user_irq(&self, irq: u32) {
		let irqs = self.irqs.lock().unwrap();
		let mut matched = false;
		for entry in irqs.iter().filter(|e| e.irq == irq).rev() {
			matched = true;
			let ret = (entry.handler)(entry.irq, entry.dev);
			log::debug!("irq={irq}, name={}, return={ret}", entry.name);
		}
		if !matched {
			log::trace!("irq={irq}: no handler registered");
		}
	}

	pub(crate) fn take_receiver(&self) -> Option<Receiver<u32>> {
		self.receiver.lock().unwrap().take()
	}

	pub(crate) fn mark_started(&self) {
		self.running.store(true, Ordering::Release);
		let (lock, cvar) = &self.startup;
		let mut started = lock.lock().unwrap();
		*started = true;
		cvar.notify_one();
	}

	/// Block until the worker has signalled that it is about to enter its
	/// wait loop (the barrier rendezvous of `intr_run`).
	pub(crate) fn wait_for_startup(&self) {
		let (lock, cvar) = &self.startup;
		let mut started = lock.lock().unwrap();
		while !*started {
			started = cvar.wait(started).unwrap();
		}
	}

	pub(crate) fn set_worker(&self, handle: JoinHandle<()>) {
		*self.worker.lock().unwrap() = Some(handle);
	}

	pub(crate) fn join_worker(&self) {
		if let Some(handle) = self.worker.lock().unwrap().take() {
			let _ = handle.join();
		}
		self.running.store(false, Ordering::Release);
		*self.startup.0.lock().unwrap() = false;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;

	#[test]
	fn conflicting_non_shared_irq_is_rejected_without_mutating_table() {
		let dispatcher = Dispatcher::new(4);
		dispatcher
			.request_irq(64, Box::new(|_, _| 0), IrqFlags::empty(), "first", None)
			.unwrap();
		let err = dispatcher
			.request_irq(64, Box::new(|_, _| 0), IrqFlags::empty(), "second", None)
			.unwrap_err();
		assert!(matches!(err, NetError::IrqConflict { irq: 64 }));
		// The failed registration must not have been appended.
		assert_eq!(dispatcher.irqs.lock().unwrap().len(), 1);
	}

	#[test]
	fn shared_irq_handlers_fire_in_reverse_registration_order() {
		let dispatcher = Dispatcher::new(4);
		let order = Arc::new(Mutex::new(Vec::new()));
		let o1 = order.clone();
		dispatcher
			.request_irq(70, Box::new(move |_, _| { o1.lock().unwrap().push(1); 0 }), IrqFlags::SHARED, "a", None)
			.unwrap();
		let o2 = order.clone();
		dispatcher
			.request_irq(70, Box::new(move |_, _| { o2.lock().unwrap().push(2); 0 }), IrqFlags::SHARED, "b", None)
			.unwrap();
		dispatcher.dispatch_user_irq(70);
		assert_eq!(*order.lock().unwrap(), vec![2, 1]);
	}

	#[test]
	fn mixed_shared_flags_conflict() {
		let dispatcher = Dispatcher::new(4);
		dispatcher
			.request_irq(80, Box::new(|_, _| 0), IrqFlags::SHARED, "a", None)
			.unwrap();
		let err = dispatcher
			.request_irq(80, Box::new(|_, _| 0), IrqFlags::empty(), "b", None)
			.unwrap_err();
		assert!(matches!(err, NetError::IrqConflict { irq: 80 }));
	}

	#[test]
	fn reserved_and_below_base_irqs_are_rejected() {
		let dispatcher = Dispatcher::new(4);
		for irq in [TERMINATE, SOFTIRQ, EVENT, TIMER] {
			let err = dispatcher
				.request_irq(irq, Box::new(|_, _| 0), IrqFlags::empty(), "n", None)
				.unwrap_err();
			assert!(matches!(err, NetError::ReservedIrq { user_irq_base: 4, .. }));
		}
		assert!(dispatcher.irqs.lock().unwrap().is_empty());
	}

	#[test]
	fn below_configured_base_is_rejected_even_past_the_four_reserved_ids() {
		let dispatcher = Dispatcher::new(10);
		let err = dispatcher
			.request_irq(5, Box::new(|_, _| 0), IrqFlags::empty(), "n", None)
			.unwrap_err();
		assert!(matches!(err, NetError::ReservedIrq { irq: 5, user_irq_base: 10 }));
		dispatcher
			.request_irq(10, Box::new(|_, _| 0), IrqFlags::empty(), "n", None)
			.unwrap();
	}

	#[test]
	fn raise_irq_fails_once_no_receiver_is_listening() {
		let dispatcher = Dispatcher::new(4);
		drop(dispatcher.take_receiver());
		assert!(matches!(dispatcher.raise_irq(SOFTIRQ), Err(NetError::NotRunning)));
	}
}
