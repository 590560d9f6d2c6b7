mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use net::{DeviceConfig, DeviceType, HardwareAddress, IrqFlags, NetStack, StackConfig};
use support::{init_logging, wait_until, DummyOps};

/// Mirrors `test/step1.c`: register a dummy device, start the stack, push a
/// frame through `device_output` and observe the driver's ISR fire exactly
/// once with the bytes it was handed.
#[test]
fn dummy_output_round_trips_through_its_own_irq() {
    init_logging();
    let config = StackConfig {
        user_irq_base: 64,
        ..StackConfig::default()
    };
    let irq = config.user_irq_base;
    let stack = NetStack::init(config, &[]).unwrap();

    let ops = DummyOps::new(stack.clone(), irq);
    let id = stack.device_register(DeviceConfig {
        device_type: DeviceType::Dummy,
        mtu: u16::MAX,
        hlen: 0,
        alen: 0,
        addr: HardwareAddress::empty(),
        ops: ops.clone(),
    });

    let isr_calls = Arc::new(AtomicUsize::new(0));
    let counter = isr_calls.clone();
    stack
        .request_irq(
            irq,
            Box::new(move |_irq, _dev| {
                counter.fetch_add(1, Ordering::SeqCst);
                0
            }),
            IrqFlags::empty(),
            "dummy",
            Some(id),
        )
        .unwrap();

    stack.run().unwrap();
    stack.device_output(id, 0x0800, b"HELLO", None).unwrap();

    assert!(wait_until(|| isr_calls.load(Ordering::SeqCst) == 1));
    assert_eq!(ops.sent.lock().unwrap().as_slice(), &[b"HELLO".to_vec()]);

    stack.shutdown();
}
