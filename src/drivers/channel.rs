//! Channel driver - forwards output writes to another task

use tokio::sync::mpsc;
use tracing::warn;

use super::AxisOutput;
use crate::aim::{OutputAxis, OutputFrame};

/// One write received by [`ChannelOutput`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMessage {
    /// Full frame from the controller
    Frame(OutputFrame),
    /// Bare single-axis write, with no state or cause attached
    Axis { axis: OutputAxis, value: i16 },
}

impl OutputMessage {
    pub fn frame(self) -> Option<OutputFrame> {
        match self {
            OutputMessage::Frame(frame) => Some(frame),
            OutputMessage::Axis { .. } => None,
        }
    }
}

/// Forwards every write into an unbounded tokio channel
///
/// Unbounded so the controller never waits on the consumer while holding its
/// lock.
pub struct ChannelOutput {
    tx: mpsc::UnboundedSender<OutputMessage>,
}

impl ChannelOutput {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutputMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, message: OutputMessage) {
        if self.tx.send(message).is_err() {
            warn!("Output dropped: receiver closed");
        }
    }
}

impl AxisOutput for ChannelOutput {
    fn write_output(&self, axis: OutputAxis, value: i16) {
        self.send(OutputMessage::Axis { axis, value });
    }

    fn write_frame(&self, frame: OutputFrame) {
        self.send(OutputMessage::Frame(frame));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aim::{AimState, AxisPair, FrameCause};

    #[test]
    fn test_frames_are_forwarded_in_order() {
        let (output, mut rx) = ChannelOutput::new();
        let first = OutputFrame {
            output: AxisPair::new(32767, 0),
            state: AimState::ActiveAim,
            cause: FrameCause::Sample,
        };
        let second = OutputFrame {
            output: AxisPair::ZERO,
            state: AimState::PassiveAim,
            cause: FrameCause::Timer,
        };

        output.write_frame(first);
        output.write_frame(second);

        assert_eq!(rx.try_recv().unwrap(), OutputMessage::Frame(first));
        assert_eq!(rx.try_recv().unwrap().frame(), Some(second));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_single_axis_write_is_not_a_frame() {
        let (output, mut rx) = ChannelOutput::new();
        output.write_output(OutputAxis::Y, -42);

        let message = rx.try_recv().unwrap();
        assert_eq!(
            message,
            OutputMessage::Axis {
                axis: OutputAxis::Y,
                value: -42
            }
        );
        assert_eq!(message.frame(), None);
    }

    #[test]
    fn test_closed_receiver_does_not_panic() {
        let (output, rx) = ChannelOutput::new();
        drop(rx);
        output.write_output(OutputAxis::Y, 10);
    }
}
