// SPDX-License-Identifier: GPL-2.0

//! Stack-wide configuration.

/// What a protocol queue does when `input_handler` would push past its
/// capacity. `DropTail` is the only policy implemented: the incoming frame
/// is dropped and the enqueue failure is logged, matching the
/// resource-exhaustion category of the error design (the drop is not
/// reported to the driver as an error - `input_handler` still returns
/// success).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOverflowPolicy {
	DropTail,
}

/// Configuration passed to [`crate::NetStack::init`].
#[derive(Debug, Clone)]
pub struct StackConfig {
	/// Maximum number of queued frames per protocol before
	/// [`QueueOverflowPolicy`] kicks in. The original C implementation left
	/// this unbounded; a production core must pick a policy.
	pub queue_capacity: usize,
	pub overflow_policy: QueueOverflowPolicy,
	/// Lowest IRQ number a caller may request; passed to the dispatcher and
	/// enforced by `request_irq`. IDs below this - and always the four
	/// reserved IDs `TERMINATE`/`SOFTIRQ`/`EVENT`/`TIMER`, regardless of this
	/// value - are rejected with `NetError::ReservedIrq`.
	pub user_irq_base: u32,
}

impl Default for StackConfig {
	fn default() -> Self {
		Self {
			queue_capacity: 256,
			overflow_policy: QueueOverflowPolicy::DropTail,
			user_irq_base: crate::interrupt::TIMER + 1,
		}
	}
}
