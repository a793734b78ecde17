//! Console driver - logs output frames for testing and debugging

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use super::AxisOutput;
use crate::aim::{AxisPair, OutputAxis, OutputFrame};

/// ConsoleOutput logs shaped output instead of driving a device
///
/// This is useful for:
/// - Checking aim settings without a virtual gamepad installed
/// - Watching state transitions live while moving the sticks
///
/// By default only frames that change the output are logged; set
/// `log_every_write` to see every write.
pub struct ConsoleOutput {
    log_every_write: bool,
    last: Mutex<Option<AxisPair>>,
    write_count: AtomicU64,
}

impl ConsoleOutput {
    pub fn new(log_every_write: bool) -> Self {
        Self {
            log_every_write,
            last: Mutex::new(None),
            write_count: AtomicU64::new(0),
        }
    }

    /// Number of axis writes received
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Last full frame written
    pub fn last_output(&self) -> Option<AxisPair> {
        *self.last.lock()
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new(false)
    }
}

impl AxisOutput for ConsoleOutput {
    fn write_output(&self, axis: OutputAxis, value: i16) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        if self.log_every_write {
            debug!(axis = axis.index(), value, "Axis write");
        }
    }

    fn write_frame(&self, frame: OutputFrame) {
        self.write_output(OutputAxis::X, frame.output.x);
        self.write_output(OutputAxis::Y, frame.output.y);

        let mut last = self.last.lock();
        if self.log_every_write || *last != Some(frame.output) {
            info!(
                "🎮 [{}] {} → {} ({})",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                frame.state,
                frame.output,
                frame.cause.as_str()
            );
        }
        *last = Some(frame.output);
    }
}
