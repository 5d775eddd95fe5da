//! SIGINT/SIGTERM handling for the long-running watch loop.

use std::sync::atomic::{AtomicBool, Ordering};

use log::info;
use snafu::ResultExt;

use crate::error::{Result, SignalSnafu};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Routes Ctrl+C and SIGTERM to the interrupt flag.
pub fn install_interrupt_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        INTERRUPTED.store(true, Ordering::SeqCst);
        info!("interrupt received, stopping");
    })
    .context(SignalSnafu)
}

/// True once an interrupt has been received.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_handler_installs_once() {
        assert!(!interrupted());
        install_interrupt_handler().unwrap();
        assert!(matches!(install_interrupt_handler(), Err(Error::Signal { .. })));
        assert!(!interrupted());
    }
}
