// SPDX-License-Identifier: GPL-2.0

//! Device registry: the ordered list of registered devices, their UP/DOWN
//! lifecycle, and transmit.

use std::sync::{Arc, Mutex};

use crate::error::{NetError, Result};
use crate::iface::{AddressFamily, Interface};

/// Opaque, non-owning handle to a registered device. Devices live in the
/// registry's arena for the lifetime of the stack (never freed); callers and
/// IRQ/protocol handlers address a device through this handle rather than a
/// raw pointer, per the arena-of-handles design note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub(crate) usize);

impl DeviceId {
	pub fn index(&self) -> usize {
		self.0
	}
}

/// Device type tag, used only for display/diagnostics - nothing in the core
/// branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
	Loopback,
	Ethernet,
	Dummy,
}

bitflags::bitflags! {
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub struct DeviceFlags: u32 {
		const UP = 0b0000_0001;
	}
}

/// Fixed-capacity hardware address, at most 16 bytes; only the first `len`
/// are meaningful (mirrors `dev->addr`/`dev->alen`).
#[derive(Debug, Clone, Copy)]
pub struct HardwareAddress {
	bytes: [u8; 16],
	len: u8,
}

impl HardwareAddress {
	pub fn new(bytes: &[u8]) -> Self {
		assert!(bytes.len() <= 16, "hardware address longer than 16 bytes");
		let mut buf = [0u8; 16];
		buf[..bytes.len()].copy_from_slice(bytes);
		Self {
			bytes: buf,
			len: bytes.len() as u8,
		}
	}

	pub fn empty() -> Self {
		Self::new(&[])
	}

	pub fn as_slice(&self) -> &[u8] {
		&self.bytes[..self.len as usize]
	}
}

/// Device operations vtable. `open`/`close` are optional hooks (default to
/// success); `transmit` is required.
pub trait DeviceOps: Send + Sync {
	fn open(&self, _dev: &Device) -> Result<()> {
		Ok(())
	}

	fn close(&self, _dev: &Device) -> Result<()> {
		Ok(())
	}

	/// `dst` is the link-layer destination address, when the caller has one.
	fn transmit(&self, dev: &Device, proto: u16, data: &[u8], dst: Option<&[u8]>) -> Result<()>;
}

/// Parameters filled in before a device is registered - the Rust analogue of
/// `net_device_alloc` followed by the driver populating fields.
pub struct DeviceConfig {
	pub device_type: DeviceType,
	pub mtu: u16,
	pub hlen: u8,
	pub alen: u8,
	pub addr: HardwareAddress,
	pub ops: Arc<dyn DeviceOps>,
}

/// A registered link-layer device.
pub struct Device {
	id: DeviceId,
	name: String,
	device_type: DeviceType,
	mtu: u16,
	hlen: u8,
	alen: u8,
	addr: HardwareAddress,
	flags: DeviceFlags,
	ops: Arc<dyn DeviceOps>,
	ifaces: Vec<Interface>,
}

impl Device {
	pub fn id(&self) -> DeviceId {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn device_type(&self) -> DeviceType {
		self.device_type
	}

	pub fn mtu(&self) -> u16 {
		self.mtu
	}

	pub fn hlen(&self) -> u8 {
		self.hlen
	}

	pub fn alen(&self) -> u8 {
		self.alen
	}

	pub fn addr(&self) -> &HardwareAddress {
		&self.addr
	}

	pub fn is_up(&self) -> bool {
		self.flags.contains(DeviceFlags::UP)
	}
}

/// The device registry. One coarse mutex, per the recommended locking
/// discipline.
pub(crate) struct DeviceRegistry {
	devices: Mutex<Vec<Device>>,
}

impl DeviceRegistry {
	pub(crate) fn new() -> Self {
		Self {
			devices: Mutex::new(Vec::new()),
		}
	}

	/// `device_alloc` + `device_register` collapsed into one call: the index
	/// is assigned monotonically and the name derived as `net{index}`.
	pub(crate) fn register(&self, config: DeviceConfig) -> DeviceId {
		let mut devices = self.devices.lock().unwrap();
		let index = devices.len();
		let id = DeviceId(index);
		let name = format!("net{index}");
		log::info!("registered, dev={name}, type={:?}", config.device_type);
		devices.push(Device {
			id,
			name,
			device_type: config.device_type,
			mtu: config.mtu,
			hlen: config.hlen,
			alen: config.alen,
			addr: config.addr,
			flags: DeviceFlags::empty(),
			ops: config.ops,
			ifaces: Vec::new(),
		});
		id
	}

	fn with_device<T>(&self, id: DeviceId, f: impl FnOnce(&mut Device) -> Result<T>) -> Result<T> {
		let mut devices = self.devices.lock().unwrap();
		let dev = devices.get_mut(id.0).ok_or(NetError::DeviceNotFound(id.0))?;
		f(dev)
	}

	pub(crate) fn open(&self, id: DeviceId) -> Result<()> {
		self.with_device(id, |dev| {
			if dev.is_up() {
				log::error!("already opened, dev={}", dev.name);
				return Err(NetError::DeviceAlreadyUp(id.0));
			}
			let ops = dev.ops.clone();
			ops.open(dev).map_err(|_| NetError::DriverFailure(id.0))?;
			dev.flags.insert(DeviceFlags::UP);
			log::info!("dev={}, state=up", dev.name);
			Ok(())
		})
	}

	pub(crate) fn close(&self, id: DeviceId) -> Result<()> {
		self.with_device(id, |dev| {
			if !dev.is_up() {
				log::error!("not opened, dev={}", dev.name);
				return Err(NetError::DeviceNotUp(id.0));
			}
			let ops = dev.ops.clone();
			ops.close(dev).map_err(|_| NetError::DriverFailure(id.0))?;
			dev.flags.remove(DeviceFlags::UP);
			log::info!("dev={}, state=down", dev.name);
			Ok(())
		})
	}

	/// MTU adjustment is the upper layer's responsibility; this only
	/// enforces `len <= mtu` and UP-ness.
	pub(crate) fn output(&self, id: DeviceId, proto: u16, data: &[u8], dst: Option<&[u8]>) -> Result<()> {
		self.with_device(id, |dev| {
			if !dev.is_up() {
				log::error!("not opened, dev={}", dev.name);
				return Err(NetError::DeviceNotUp(id.0));
			}
			if data.len() > dev.mtu as usize {
				log::error!("too long, dev={}, mtu={}, len={}", dev.name, dev.mtu, data.len());
				return Err(NetError::FrameTooLong {
					len: data.len(),
					mtu: dev.mtu,
				});
			}
			log::debug!("dev={}, type=0x{:04x}, len={}", dev.name, proto, data.len());
			let ops = dev.ops.clone();
			ops.transmit(dev, proto, data, dst).map_err(|_| NetError::DriverFailure(id.0))
		})
	}

	pub(crate) fn add_iface(&self, id: DeviceId, iface: Interface) -> Result<()> {
		self.with_device(id, |dev| {
			if dev.ifaces.iter().any(|i| i.family() == iface.family()) {
				log::error!("already exists, dev={}, family={:?}", dev.name, iface.family());
				return Err(NetError::DuplicateInterface(match iface.family() {
					AddressFamily::Ipv4 => 1,
					AddressFamily::Ipv6 => 2,
					AddressFamily::Other(tag) => tag,
				}));
			}
			dev.ifaces.push(iface);
			Ok(())
		})
	}

	pub(crate) fn get_iface(&self, id: DeviceId, family: AddressFamily) -> Option<Interface> {
		let devices = self.devices.lock().unwrap();
		devices
			.get(id.0)
			.and_then(|dev| dev.ifaces.iter().find(|i| i.family() == family).cloned())
	}

	/// Snapshot of every registered device's id, in registration order. Taken
	/// as a `Vec` rather than held under the lock so callers are free to call
	/// back into `open`/`close` per id without deadlocking on this mutex.
	pub(crate) fn all_ids(&self) -> Vec<DeviceId> {
		self.devices.lock().unwrap().iter().map(|d| d.id).collect()
	}

	pub(crate) fn name_of(&self, id: DeviceId) -> Option<String> {
		self.devices.lock().unwrap().get(id.0).map(|d| d.name.clone())
	}
}
