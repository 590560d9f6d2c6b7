// SPDX-License-Identifier: GPL-2.0

//! Protocol registry and input queue: receive handlers keyed by a 16-bit
//! ethertype-like tag, each backed by its own bounded FIFO, drained on
//! soft-IRQ.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::config::{QueueOverflowPolicy, StackConfig};
use crate::device::DeviceId;
use crate::error::{NetError, Result};
use crate::interrupt::Dispatcher;

/// `(data, device) -> ()`. The handler owns neither the buffer nor the
/// device reference beyond the call.
pub type ProtocolHandler = Box<dyn Fn(&[u8], DeviceId) + Send + Sync>;

struct QueueEntry {
	dev: DeviceId,
	data: Vec<u8>,
}

struct ProtocolSlot {
	ptype: u16,
	handler: ProtocolHandler,
	queue: VecDeque<QueueEntry>,
}

pub(crate) struct ProtocolRegistry {
	slots: Mutex<Vec<ProtocolSlot>>,
	queue_capacity: usize,
	overflow_policy: QueueOverflowPolicy,
}

impl ProtocolRegistry {
	pub(crate) fn new(config: &StackConfig) -> Self {
		Self {
			slots: Mutex::new(Vec::new()),
			queue_capacity: config.queue_capacity,
			overflow_policy: config.overflow_policy,
		}
	}

	pub(crate) fn register(&self, ptype: u16, handler: ProtocolHandler) -> Result<()> {
		let mut slots = self.slots.lock().unwrap();
		if slots.iter().any(|s| s.ptype == ptype) {
			log::error!("already registered, type=0x{ptype:04x}");
			return Err(NetError::DuplicateProtocol(ptype));
		}
		log::info!("registered, type=0x{ptype:04x}");
		slots.push(ProtocolSlot {
			ptype,
			handler,
			queue: VecDeque::new(),
		});
		Ok(())
	}

	/// Called by device drivers when a frame of link-layer `type` arrives.
	/// Silently drops frames for which no protocol is registered - that is
	/// not an error. Raises `SOFTIRQ` after a successful enqueue.
	pub(crate) fn input(&self, ptype: u16, data: &[u8], dev: DeviceId, dispatcher: &Dispatcher) {
		let mut slots = self.slots.lock().unwrap();
		let Some(slot) = slots.iter_mut().find(|s| s.ptype == ptype) else {
			return;
		};
		if slot.queue.len() >= self.queue_capacity {
			match self.overflow_policy {
				QueueOverflowPolicy::DropTail => {
					log::error!(
						"queue full (cap={}), dropping frame, dev={:?}, type=0x{ptype:04x}, len={}",
						self.queue_capacity,
						dev,
						data.len()
					);
					return;
				}
			}
		}
		slot.queue.push_back(QueueEntry {
			dev,
			data: data.to_vec(),
		});
		log::debug!(
			"queue pushed (num={}), dev={:?}, type=0x{ptype:04x}, len={}",
			slot.queue.len(),
			dev,
			data.len()
		);
		drop(slots);
		let _ = dispatcher.raise_irq(crate::interrupt::SOFTIRQ);
	}

	/// Drain every protocol's queue, in registration order, with no
	/// interleaving between protocols within this single call.
	pub(crate) fn softirq(&self) {
		let mut slots = self.slots.lock().unwrap();
		for slot in slots.iter_mut() {
			while let Some(entry) = slot.queue.pop_front() {
				log::debug!(
					"queue popped (num={}), dev={:?}, type=0x{:04x}, len={}",
					slot.queue.len(),
					entry.dev,
					slot.ptype,
					entry.data.len()
				);
				(slot.handler)(&entry.data, entry.dev);
			}
		}
	}
}
