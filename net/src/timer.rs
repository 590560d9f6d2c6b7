// SPDX-License-Identifier: GPL-2.0

//! Periodic timer facility: callbacks fire when their interval has elapsed,
//! checked on a lexicographic `(seconds, microseconds)` comparison of
//! elapsed time against the interval - just like `timercmp`/`timersub` in
//! the original.

use std::sync::Mutex;
use std::time::Instant;

/// Wall-clock interval expressed as whole seconds plus microseconds,
/// normalized so `micros < 1_000_000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval {
	pub secs: u64,
	pub micros: u32,
}

impl Interval {
	pub fn new(secs: u64, micros: u32) -> Self {
		let extra_secs = micros / 1_000_000;
		Self {
			secs: secs + extra_secs as u64,
			micros: micros % 1_000_000,
		}
	}

	pub fn from_millis(millis: u64) -> Self {
		Self::new(millis / 1_000, ((millis % 1_000) * 1_000) as u32)
	}

	fn from_duration(d: std::time::Duration) -> Self {
		Self::new(d.as_secs(), d.subsec_micros())
	}
}

/// Zero-arg callback invoked when a timer fires.
pub type TimerHandler = Box<dyn FnMut() + Send>;

struct TimerEntry {
	interval: Interval,
	last: Instant,
	handler: TimerHandler,
}

pub(crate) struct TimerRegistry {
	timers: Mutex<Vec<TimerEntry>>,
}

impl TimerRegistry {
	pub(crate) fn new() -> Self {
		Self {
			timers: Mutex::new(Vec::new()),
		}
	}

	pub(crate) fn register(&self, interval: Interval, handler: TimerHandler) {
		log::info!("registered: interval={{{}, {}}}", interval.secs, interval.micros);
		self.timers.lock().unwrap().push(TimerEntry {
			interval,
			last: Instant::now(),
			handler,
		});
	}

	/// Invoked by the dispatcher on `TIMER`. For each timer, fires when the
	/// elapsed time strictly exceeds its interval (strict, not `<=`, so a
	/// timer registered at the instant of a sweep does not fire before its
	/// own interval has actually elapsed).
	pub(crate) fn sweep(&self) {
		let mut timers = self.timers.lock().unwrap();
		let now = Instant::now();
		for timer in timers.iter_mut() {
			let diff = Interval::from_duration(now.duration_since(timer.last));
			if timer.interval < diff {
				(timer.handler)();
				timer.last = now;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;
	use std::thread::sleep;
	use std::time::Duration;

	#[test]
	fn interval_normalizes_overflow_micros() {
		let i = Interval::new(1, 1_500_000);
		assert_eq!(i, Interval { secs: 2, micros: 500_000 });
	}

	#[test]
	fn does_not_fire_before_interval_elapses() {
		let registry = TimerRegistry::new();
		let count = Arc::new(AtomicUsize::new(0));
		let c = count.clone();
		registry.register(Interval::from_millis(1_000), Box::new(move || {
			c.fetch_add(1, Ordering::SeqCst);
		}));
		registry.sweep();
		assert_eq!(count.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn fires_once_interval_has_elapsed() {
		let registry = TimerRegistry::new();
		let count = Arc::new(AtomicUsize::new(0));
		let c = count.clone();
		registry.register(Interval::from_millis(20), Box::new(move || {
			c.fetch_add(1, Ordering::SeqCst);
		}));
		sleep(Duration::from_millis(40));
		registry.sweep();
		assert_eq!(count.load(Ordering::SeqCst), 1);
	}
}
