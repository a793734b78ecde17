//! Scripted sample replay
//!
//! Feeds a CSV script of timed samples through a live [`AimController`] and
//! records every output frame with the time it was produced. Useful for
//! tuning settings without a controller attached and for regression traces.
//!
//! Script format (header required):
//!
//! ```text
//! t_ms,move_x,move_y,aim_x,aim_y,held
//! 0,0,0,0,0,0
//! 10,0,0,30000,0,1
//! 50,1200,-800,0,0,0
//! ```
//!
//! `held` is the raw momentary value; any nonzero value counts as held.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::aim::{AimController, OutputFrame, Sample};
use crate::config::AimSettings;
use crate::drivers::{ChannelOutput, OutputMessage};

/// One scripted sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayEvent {
    /// Offset from the start of the replay
    pub t_ms: u64,
    pub sample: Sample,
}

#[derive(Debug, Deserialize)]
struct ScriptRow {
    t_ms: u64,
    move_x: i16,
    move_y: i16,
    aim_x: i16,
    aim_y: i16,
    held: i16,
}

/// One output frame in the replay trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceRow {
    pub t_ms: u64,
    pub source: &'static str,
    pub state: &'static str,
    pub out_x: i16,
    pub out_y: i16,
}

impl TraceRow {
    fn from_frame(t_ms: u64, frame: &OutputFrame) -> Self {
        Self {
            t_ms,
            source: frame.cause.as_str(),
            state: frame.state.as_str(),
            out_x: frame.output.x,
            out_y: frame.output.y,
        }
    }
}

/// Parse a replay script
///
/// Timestamps must not go backwards.
pub fn parse_script<R: Read>(reader: R) -> Result<Vec<ReplayEvent>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut events = Vec::new();
    let mut last_t = 0;
    for (index, row) in csv_reader.deserialize::<ScriptRow>().enumerate() {
        let line = index + 2; // header is line 1
        let row = row.with_context(|| format!("Invalid replay row at line {}", line))?;
        if row.t_ms < last_t {
            bail!(
                "Replay timestamps go backwards at line {} ({} < {})",
                line,
                row.t_ms,
                last_t
            );
        }
        last_t = row.t_ms;

        events.push(ReplayEvent {
            t_ms: row.t_ms,
            sample: Sample::from_raw([row.move_x, row.move_y, row.aim_x, row.aim_y, row.held]),
        });
    }
    Ok(events)
}

/// Load a replay script from a file
pub fn load_script(path: &Path) -> Result<Vec<ReplayEvent>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open replay script: {}", path.display()))?;
    parse_script(file).with_context(|| format!("Failed to parse replay script: {}", path.display()))
}

/// Run `events` through a fresh controller in real time
///
/// After the last event the replay keeps running for one more debounce
/// window so a final timer expiry shows up in the trace.
pub async fn run_replay(events: &[ReplayEvent], settings: AimSettings) -> Result<Vec<TraceRow>> {
    let (output, mut frames) = ChannelOutput::new();
    let controller = AimController::new(settings, Arc::new(output))?;

    info!("Replaying {} samples", events.len());

    let start = Instant::now();
    let mut trace = Vec::new();

    for event in events {
        let deadline = start + Duration::from_millis(event.t_ms);
        collect_until(&mut frames, deadline, start, &mut trace).await;

        controller.update(event.sample);
        drain(&mut frames, start, &mut trace);
    }

    let settle = settings.active_aim_duration() + Duration::from_millis(1);
    collect_until(&mut frames, Instant::now() + settle, start, &mut trace).await;

    controller.on_deactivate();
    drain(&mut frames, start, &mut trace);

    debug!("Replay produced {} frames", trace.len());
    Ok(trace)
}

/// Write a trace as CSV
pub fn write_trace<W: Write>(rows: &[TraceRow], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row).context("Failed to write trace row")?;
    }
    csv_writer.flush().context("Failed to flush trace")?;
    Ok(())
}

async fn collect_until(
    frames: &mut mpsc::UnboundedReceiver<OutputMessage>,
    deadline: Instant,
    start: Instant,
    trace: &mut Vec<TraceRow>,
) {
    loop {
        tokio::select! {
            biased;
            Some(message) = frames.recv() => record(message, start, trace),
            _ = tokio::time::sleep_until(deadline) => break,
        }
    }
}

fn drain(
    frames: &mut mpsc::UnboundedReceiver<OutputMessage>,
    start: Instant,
    trace: &mut Vec<TraceRow>,
) {
    while let Ok(message) = frames.try_recv() {
        record(message, start, trace);
    }
}

fn record(message: OutputMessage, start: Instant, trace: &mut Vec<TraceRow>) {
    match message.frame() {
        Some(frame) => trace.push(TraceRow::from_frame(elapsed_ms(start), &frame)),
        None => debug!("Skipping bare axis write in replay trace"),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
