mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use net::{Interval, NetStack, StackConfig};
use support::init_logging;

/// Registers a 100ms timer, drives the stack's `TIMER` interrupt every 40ms
/// for about a second, and expects roughly ten firings - tolerant of the
/// jitter inherent in sleeping and scheduling on a shared test machine.
#[test]
fn timer_fires_on_every_elapsed_interval() {
    init_logging();
    let stack = NetStack::init(StackConfig::default(), &[]).unwrap();

    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    stack.timer_register(Interval::from_millis(100), Box::new(move || {
        c.fetch_add(1, Ordering::SeqCst);
    }));

    stack.run().unwrap();
    for _ in 0..25 {
        stack.raise_irq(net::interrupt::TIMER).unwrap();
        std::thread::sleep(Duration::from_millis(40));
    }
    stack.shutdown();

    let fired = count.load(Ordering::SeqCst);
    assert!((7..=12).contains(&fired), "expected roughly 10 firings, got {fired}");
}
