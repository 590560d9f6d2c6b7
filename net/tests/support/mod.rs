use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use net::{Device, DeviceOps, NetStack, Result};

static LOGGING: AtomicBool = AtomicBool::new(false);

/// Initializes `env_logger` exactly once per test binary.
pub fn init_logging() {
    if !LOGGING.swap(true, Ordering::SeqCst) {
        let _ = env_logger::builder().is_test(true).try_init();
    }
}

/// Test-only driver mirroring `driver/dummy.c`: `transmit` records the frame
/// it was given and raises its own IRQ, standing in for a real NIC kicking
/// the receive path.
pub struct DummyOps {
    pub stack: NetStack,
    pub irq: u32,
    pub sent: Mutex<Vec<Vec<u8>>>,
}

impl DummyOps {
    pub fn new(stack: NetStack, irq: u32) -> Arc<Self> {
        Arc::new(Self {
            stack,
            irq,
            sent: Mutex::new(Vec::new()),
        })
    }
}

impl DeviceOps for DummyOps {
    fn transmit(&self, _dev: &Device, _proto: u16, data: &[u8], _dst: Option<&[u8]>) -> Result<()> {
        self.sent.lock().unwrap().push(data.to_vec());
        self.stack.raise_irq(self.irq)?;
        Ok(())
    }
}

/// Spin-waits for `condition` to become true, up to a short timeout - used
/// because delivery to the dispatcher's worker thread is asynchronous.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    condition()
}
