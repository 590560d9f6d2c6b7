// SPDX-License-Identifier: GPL-2.0

//! Stack lifecycle: `init`/`run`/`shutdown` orchestration and the façade
//! that ties the device, protocol, timer, event and interrupt registries
//! into the single explicit value the rest of the crate hangs off of.

use std::sync::Arc;
use std::thread;

use crate::config::StackConfig;
use crate::device::{DeviceConfig, DeviceId, DeviceRegistry};
use crate::error::{NetError, Result};
use crate::event::{EventArg, EventHandler, EventRegistry};
use crate::iface::{AddressFamily, Interface};
use crate::interrupt::{self, Dispatcher, IrqFlags, IrqHandler};
use crate::protocol::{ProtocolHandler, ProtocolRegistry};
use crate::timer::{Interval, TimerHandler, TimerRegistry};

/// A sub-protocol's init hook, run in order by [`NetStack::init`]. Each is
/// expected to self-register with the protocol registry, matching
/// `arp_init`/`ip_init`/`icmp_init`/`udp_init` in the original - those
/// protocols themselves are out of scope for this core.
pub type SubProtocolInit = fn(&NetStack) -> Result<()>;

struct Inner {
	devices: DeviceRegistry,
	protocols: ProtocolRegistry,
	timers: TimerRegistry,
	events: EventRegistry,
	dispatcher: Dispatcher,
}

/// The protocol-processing engine. Cheap to clone (an `Arc` underneath) so
/// the dispatcher worker and the owning caller can share it without any
/// hidden global state - see the "no process-wide singletons" design note.
#[derive(Clone)]
pub struct NetStack(Arc<Inner>);

impl NetStack {
	/// `net_init`: initializes the interrupt dispatcher, then every
	/// sub-protocol in the order given.
	pub fn init(config: StackConfig, sub_protocols: &[SubProtocolInit]) -> Result<Self> {
		let stack = Self(Arc::new(Inner {
			devices: DeviceRegistry::new(),
			protocols: ProtocolRegistry::new(&config),
			timers: TimerRegistry::new(),
			events: EventRegistry::new(),
			dispatcher: Dispatcher::new(config.user_irq_base),
		}));
		for init in sub_protocols {
			init(&stack)?;
		}
		log::info!("initialized");
		Ok(stack)
	}

	// -- device registry -----------------------------------------------

	pub fn device_register(&self, config: DeviceConfig) -> DeviceId {
		self.0.devices.register(config)
	}

	pub fn device_open(&self, id: DeviceId) -> Result<()> {
		self.0.devices.open(id)
	}

	pub fn device_close(&self, id: DeviceId) -> Result<()> {
		self.0.devices.close(id)
	}

	pub fn device_output(&self, id: DeviceId, proto: u16, data: &[u8], dst: Option<&[u8]>) -> Result<()> {
		self.0.devices.output(id, proto, data, dst)
	}

	pub fn device_add_iface(&self, id: DeviceId, family: AddressFamily) -> Result<()> {
		self.0.devices.add_iface(id, Interface::new(family, id))
	}

	pub fn device_get_iface(&self, id: DeviceId, family: AddressFamily) -> Option<Interface> {
		self.0.devices.get_iface(id, family)
	}

	pub fn device_name(&self, id: DeviceId) -> Option<String> {
		self.0.devices.name_of(id)
	}

	// -- protocol registry + input queue ---------------------------------

	pub fn protocol_register(&self, ptype: u16, handler: ProtocolHandler) -> Result<()> {
		self.0.protocols.register(ptype, handler)
	}

	/// Called by device drivers when they receive a frame. Dispatch to the
	/// matching protocol's queue happens synchronously on the caller's
	/// thread; delivery to the handler happens later, on the dispatcher,
	/// when `SOFTIRQ` is serviced.
	pub fn input_handler(&self, ptype: u16, data: &[u8], dev: DeviceId) {
		self.0.protocols.input(ptype, data, dev, &self.0.dispatcher);
	}

	// -- timers -----------------------------------------------------------

	pub fn timer_register(&self, interval: Interval, handler: TimerHandler) {
		self.0.timers.register(interval, handler);
	}

	// -- events -------------------------------------------------------------

	pub fn event_subscribe(&self, handler: EventHandler, arg: EventArg) {
		self.0.events.subscribe(handler, arg);
	}

	pub fn raise_event(&self) -> Result<()> {
		self.0.dispatcher.raise_irq(interrupt::EVENT)
	}

	// -- interrupts -----------------------------------------------------

	pub fn request_irq(
		&self,
		irq: u32,
		handler: IrqHandler,
		flags: IrqFlags,
		name: impl Into<String>,
		dev: Option<DeviceId>,
	) -> Result<()> {
		self.0.dispatcher.request_irq(irq, handler, flags, name, dev)
	}

	pub fn raise_irq(&self, irq: u32) -> Result<()> {
		self.0.dispatcher.raise_irq(irq)
	}

	// -- lifecycle --------------------------------------------------------

	/// `net_run`: starts the dispatcher worker, then opens every registered
	/// device. Per-device open failures are logged, not propagated - one bad
	/// driver does not keep the rest of the stack from coming up.
	pub fn run(&self) -> Result<()> {
		if self.0.dispatcher.is_running() {
			return Err(NetError::AlreadyRunning);
		}
		let receiver = self.0.dispatcher.take_receiver().ok_or(NetError::AlreadyRunning)?;
		let inner = self.0.clone();
		let handle = thread::spawn(move || {
			inner.dispatcher.mark_started();
			loop {
				match receiver.recv() {
					Ok(interrupt::TERMINATE) => break,
					Ok(interrupt::SOFTIRQ) => inner.protocols.softirq(),
					Ok(interrupt::EVENT) => inner.events.broadcast(),
					Ok(interrupt::TIMER) => inner.timers.sweep(),
					Ok(other) => inner.dispatcher.dispatch_user_irq(other),
					Err(_) => break,
				}
			}
			log::debug!("dispatcher terminated");
		});
		self.0.dispatcher.set_worker(handle);
		self.0.dispatcher.wait_for_startup();

		log::debug!("open all devices...");
		for id in self.0.devices.all_ids() {
			if let Err(e) = self.0.devices.open(id) {
				log::error!("failed to open device {id:?}: {e}");
			}
		}
		log::debug!("running...");
		Ok(())
	}

	/// `net_shutdown`: closes every registered device, then terminates the
	/// dispatcher.
	pub fn shutdown(&self) {
		log::debug!("closing all devices...");
		for id in self.0.devices.all_ids() {
			if let Err(e) = self.0.devices.close(id) {
				log::error!("failed to close device {id:?}: {e}");
			}
		}
		if self.0.dispatcher.is_running() {
			let _ = self.0.dispatcher.raise_irq(interrupt::TERMINATE);
			self.0.dispatcher.join_worker();
		}
		log::debug!("shutting down");
	}
}
