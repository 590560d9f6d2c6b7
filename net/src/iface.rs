// SPDX-License-Identifier: GPL-2.0

//! Interface binding: logical per-address-family endpoints attached to a
//! device. At most one interface exists per `(device, family)` pair.

use crate::device::DeviceId;

/// Address family tag. `Other` covers anything the core doesn't need to
/// special-case - family only ever gates interface lookup, it never drives
/// behavior here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
	Ipv4,
	Ipv6,
	Other(u16),
}

/// A logical interface attached to a device.
#[derive(Debug, Clone)]
pub struct Interface {
	family: AddressFamily,
	device: DeviceId,
}

impl Interface {
	pub fn new(family: AddressFamily, device: DeviceId) -> Self {
		Self { family, device }
	}

	pub fn family(&self) -> AddressFamily {
		self.family
	}

	pub fn device(&self) -> DeviceId {
		self.device
	}
}
