// SPDX-License-Identifier: GPL-2.0

//! Error types for the network stack core.

use thiserror::Error;

/// Stack error type.
///
/// Mirrors the three categories from the error-handling design: configuration
/// errors (duplicate registration, conflicting IRQ, bad MTU, ...), resource
/// exhaustion (queue full), and driver errors (a hook or `transmit`
/// returning failure). The core never panics on any of these; every failure
/// is either returned to the caller or logged on the dispatcher's background
/// path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetError {
	#[error("device {0} is already up")]
	DeviceAlreadyUp(usize),

	#[error("device {0} is not up")]
	DeviceNotUp(usize),

	#[error("device {0} not found")]
	DeviceNotFound(usize),

	#[error("payload length {len} exceeds mtu {mtu}")]
	FrameTooLong { len: usize, mtu: u16 },

	#[error("interface for family {0:?} already attached to this device")]
	DuplicateInterface(u16),

	#[error("protocol type 0x{0:04x} already registered")]
	DuplicateProtocol(u16),

	#[error("irq {irq} conflicts with an existing non-shared registration")]
	IrqConflict { irq: u32 },

	#[error("irq {irq} is reserved (user IRQs start at {user_irq_base})")]
	ReservedIrq { irq: u32, user_irq_base: u32 },

	#[error("driver hook failed for device {0}")]
	DriverFailure(usize),

	#[error("dispatcher is already running")]
	AlreadyRunning,

	#[error("dispatcher is not running")]
	NotRunning,
}

/// Stack result type.
pub type Result<T> = core::result::Result<T, NetError>;
