//! Output drivers - where the shaped stick values go
//!
//! Transmitting to a real virtual-gamepad device belongs to the host; the
//! drivers here log frames or hand them to another task.

pub mod channel;
pub mod console;

pub use channel::{ChannelOutput, OutputMessage};
pub use console::ConsoleOutput;

use crate::aim::{OutputAxis, OutputFrame};

/// Output sink for the two shaped axes
///
/// Note: All methods take &self to support `Arc<dyn AxisOutput>` shared with
/// timer callbacks. Implementations use interior mutability for state.
/// Called with the controller lock held, so implementations must not block.
pub trait AxisOutput: Send + Sync {
    /// Apply one value to output axis 0 (X) or 1 (Y)
    fn write_output(&self, axis: OutputAxis, value: i16);

    /// Apply a full frame
    ///
    /// Default implementation writes X then Y. Drivers that care about the
    /// producing state or trigger override this.
    fn write_frame(&self, frame: OutputFrame) {
        self.write_output(OutputAxis::X, frame.output.x);
        self.write_output(OutputAxis::Y, frame.output.y);
    }
}
