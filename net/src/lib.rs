// SPDX-License-Identifier: GPL-2.0

//! Core of a userspace network protocol stack.
//!
//! This crate is the "top half" of a toy TCP/IP stack: an interrupt/soft-IRQ
//! dispatcher, a device registry, a protocol registry with per-protocol
//! input queues, a periodic timer facility and a broadcast event channel.
//! Protocol logic proper (ARP, IP, ICMP, UDP) hangs off these registries
//! through [`NetStack::protocol_register`] but is not implemented here -
//! only the interface it attaches through is.

pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod iface;
pub mod interrupt;
pub mod protocol;
mod stack;
pub mod timer;

pub use config::{QueueOverflowPolicy, StackConfig};
pub use device::{Device, DeviceConfig, DeviceFlags, DeviceId, DeviceOps, DeviceType, HardwareAddress};
pub use error::{NetError, Result};
pub use event::{EventArg, EventHandler};
pub use iface::{AddressFamily, Interface};
pub use interrupt::{IrqFlags, IrqHandler};
pub use protocol::ProtocolHandler;
pub use stack::{NetStack, SubProtocolInit};
pub use timer::{Interval, TimerHandler};
