//! AimController - thread-safe host entry points for the aim state machine
//!
//! Two sources mutate the machine: the host's sampling call and the debounce
//! timer, which fires on another task or thread. Both go through one
//! `parking_lot::Mutex`, and output is written while the lock is held so the
//! host sees frames in the same order the machine produced them.
//!
//! Timer callbacks capture a `Weak` reference and the generation number they
//! were scheduled with. Restarting or cancelling the timer bumps the
//! generation, so an expiry that raced with a restart or with deactivation
//! finds a mismatch and does nothing.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::AimError;
use super::machine::{AimStateMachine, Step, TimerAction};
use super::timer::{PendingTimer, Scheduler, TokioScheduler};
use super::types::{AimState, AxisPair, FrameCause, OutputFrame, Sample};
use crate::config::AimSettings;
use crate::drivers::AxisOutput;

struct Shared {
    machine: AimStateMachine,
    timer: Option<Box<dyn PendingTimer>>,
    generation: u64,
    active: bool,
}

impl Shared {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Hold-to-aim controller owned by the host
pub struct AimController {
    shared: Arc<Mutex<Shared>>,
    scheduler: Arc<dyn Scheduler>,
    output: Arc<dyn AxisOutput>,
}

impl AimController {
    /// Create a controller using tokio timers on the current runtime
    pub fn new(settings: AimSettings, output: Arc<dyn AxisOutput>) -> Result<Self, AimError> {
        let scheduler = TokioScheduler::current()?;
        Self::with_scheduler(settings, output, Arc::new(scheduler))
    }

    /// Create a controller with a custom timer source
    pub fn with_scheduler(
        settings: AimSettings,
        output: Arc<dyn AxisOutput>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self, AimError> {
        let machine = AimStateMachine::new(settings)?;
        info!(
            "Aim controller ready ({} directions, deadzone {}%, magnitude {}%, hold {}ms)",
            settings.num_aim_directions,
            settings.aim_deadzone,
            settings.aim_magnitude,
            settings.active_aim_time_ms
        );

        Ok(Self {
            shared: Arc::new(Mutex::new(Shared {
                machine,
                timer: None,
                generation: 0,
                active: true,
            })),
            scheduler,
            output,
        })
    }

    /// Feed one sample and write the resulting output
    ///
    /// Always produces an output pair. After deactivation the sample is
    /// ignored and the movement stick is returned without being written.
    pub fn update(&self, sample: Sample) -> AxisPair {
        let mut shared = self.shared.lock();
        if !shared.active {
            debug!("Sample ignored: aim controller is deactivated");
            return AxisPair::new(sample.move_x, sample.move_y);
        }

        let step = shared.machine.on_sample(sample);
        if let TimerAction::Restart(delay) = step.timer {
            self.restart_timer(&mut shared, delay);
        }

        emit(&*self.output, &step, FrameCause::Sample);
        step.output
    }

    /// Start a new session in `Normal`
    ///
    /// Settings are kept. A pending timer is left running; if it fires
    /// outside active aim it is ignored.
    pub fn on_activate(&self) {
        let mut shared = self.shared.lock();
        shared.machine.reset();
        shared.active = true;
        info!("Aim controller activated");
    }

    /// Cancel the pending timer and stop processing
    ///
    /// Once this returns, no timer expiry can change state or write output.
    pub fn on_deactivate(&self) {
        let mut shared = self.shared.lock();
        shared.cancel_timer();
        shared.active = false;
        info!("Aim controller deactivated");
    }

    pub fn is_active(&self) -> bool {
        self.shared.lock().active
    }

    pub fn state(&self) -> AimState {
        self.shared.lock().machine.state()
    }

    pub fn settings(&self) -> AimSettings {
        *self.shared.lock().machine.settings()
    }

    /// Replace all settings at once
    pub fn apply_settings(&self, settings: AimSettings) -> Result<(), AimError> {
        let mut shared = self.shared.lock();
        if let Err(e) = shared.machine.set_settings(settings) {
            warn!("Rejected aim settings: {}", e);
            return Err(e);
        }
        debug!(?settings, "Aim settings applied");
        Ok(())
    }

    pub fn aim_magnitude(&self) -> u32 {
        self.settings().aim_magnitude
    }

    pub fn set_aim_magnitude(&self, percent: u32) -> Result<(), AimError> {
        self.modify_settings(|s| s.aim_magnitude = percent)
    }

    pub fn aim_deadzone(&self) -> u32 {
        self.settings().aim_deadzone
    }

    pub fn set_aim_deadzone(&self, percent: u32) -> Result<(), AimError> {
        self.modify_settings(|s| s.aim_deadzone = percent)
    }

    pub fn active_aim_time_ms(&self) -> f64 {
        self.settings().active_aim_time_ms
    }

    /// New duration applies from the next debounce window
    pub fn set_active_aim_time_ms(&self, millis: f64) -> Result<(), AimError> {
        self.modify_settings(|s| s.active_aim_time_ms = millis)
    }

    pub fn num_aim_directions(&self) -> u32 {
        self.settings().num_aim_directions
    }

    pub fn set_num_aim_directions(&self, count: u32) -> Result<(), AimError> {
        self.modify_settings(|s| s.num_aim_directions = count)
    }

    fn modify_settings(&self, change: impl FnOnce(&mut AimSettings)) -> Result<(), AimError> {
        let mut shared = self.shared.lock();
        let mut settings = *shared.machine.settings();
        change(&mut settings);
        if let Err(e) = shared.machine.set_settings(settings) {
            warn!("Rejected aim settings: {}", e);
            return Err(e);
        }
        Ok(())
    }

    fn restart_timer(&self, shared: &mut Shared, delay: Duration) {
        shared.cancel_timer();
        let generation = shared.generation;
        let weak = Arc::downgrade(&self.shared);
        let output = Arc::clone(&self.output);

        let timer = self.scheduler.schedule_once(
            delay,
            Box::new(move || on_timer_fired(&weak, generation, &*output)),
        );
        shared.timer = Some(timer);
        debug!(generation, "Aim timer started for {:?}", delay);
    }
}

impl Drop for AimController {
    fn drop(&mut self) {
        self.shared.lock().cancel_timer();
    }
}

fn on_timer_fired(shared: &Weak<Mutex<Shared>>, generation: u64, output: &dyn AxisOutput) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let mut shared = shared.lock();

    if !shared.active || shared.generation != generation {
        debug!(generation, current = shared.generation, "Discarding superseded aim timer");
        return;
    }
    shared.timer = None;

    if let Some(step) = shared.machine.on_timer_expired() {
        emit(output, &step, FrameCause::Timer);
    }
}

fn emit(output: &dyn AxisOutput, step: &Step, cause: FrameCause) {
    output.write_frame(OutputFrame {
        output: step.output,
        state: step.state,
        cause,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aim::timer::ManualScheduler;
    use crate::aim::types::OutputAxis;

    #[derive(Default)]
    struct Recorder {
        writes: Mutex<Vec<(OutputAxis, i16)>>,
    }

    impl Recorder {
        fn last_pair(&self) -> Option<AxisPair> {
            let writes = self.writes.lock();
            let x = writes.iter().rev().find(|(a, _)| *a == OutputAxis::X)?.1;
            let y = writes.iter().rev().find(|(a, _)| *a == OutputAxis::Y)?.1;
            Some(AxisPair::new(x, y))
        }

        fn count(&self) -> usize {
            self.writes.lock().len()
        }
    }

    impl AxisOutput for Recorder {
        fn write_output(&self, axis: OutputAxis, value: i16) {
            self.writes.lock().push((axis, value));
        }
    }

    fn setup() -> (AimController, Arc<Recorder>, ManualScheduler) {
        let recorder = Arc::new(Recorder::default());
        let scheduler = ManualScheduler::new();
        let controller = AimController::with_scheduler(
            AimSettings::default(),
            recorder.clone(),
            Arc::new(scheduler.clone()),
        )
        .unwrap();
        (controller, recorder, scheduler)
    }

    fn aim(aim_x: i16, aim_y: i16) -> Sample {
        Sample::new(111, 222, aim_x, aim_y, true)
    }

    #[test]
    fn test_update_writes_both_axes() {
        let (controller, recorder, _) = setup();
        let out = controller.update(Sample::new(10, -20, 0, 0, false));
        assert_eq!(out, AxisPair::new(10, -20));
        assert_eq!(
            *recorder.writes.lock(),
            vec![(OutputAxis::X, 10), (OutputAxis::Y, -20)]
        );
    }

    #[test]
    fn test_scenario_aim_latch_release() {
        let (controller, recorder, scheduler) = setup();

        let out = controller.update(aim(30000, 0));
        assert_eq!(out, AxisPair::new(32767, 0));
        assert_eq!(controller.state(), AimState::ActiveAim);
        assert_eq!(scheduler.pending_delays(), vec![Duration::from_millis(20)]);

        assert_eq!(scheduler.fire_all(), 1);
        assert_eq!(controller.state(), AimState::PassiveAim);
        assert_eq!(recorder.last_pair(), Some(AxisPair::ZERO));

        let out = controller.update(Sample::new(-500, 600, 30000, 0, false));
        assert_eq!(out, AxisPair::new(-500, 600));
        assert_eq!(controller.state(), AimState::Normal);
    }

    #[test]
    fn test_active_samples_do_not_restart_timer() {
        let (controller, _, scheduler) = setup();
        controller.update(aim(30000, 0));
        controller.update(aim(0, 30000));
        controller.update(aim(-30000, 0));
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_reaim_replaces_timer() {
        let (controller, _, scheduler) = setup();
        controller.update(aim(30000, 0));
        scheduler.fire_all();

        controller.update(aim(0, 30000));
        assert_eq!(controller.state(), AimState::ActiveAim);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_superseded_callback_is_ignored() {
        let (controller, recorder, scheduler) = setup();
        controller.update(aim(30000, 0));

        // Grab the callback as if it expired but has not run yet
        let stale = scheduler.take_pending();

        // New session, aim again: new window, new generation
        controller.on_activate();
        controller.update(aim(-30000, 0));
        let writes_before = recorder.count();

        for callback in stale {
            callback();
        }
        assert_eq!(controller.state(), AimState::ActiveAim);
        assert_eq!(recorder.count(), writes_before);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_deactivate_blocks_inflight_expiry() {
        let (controller, recorder, scheduler) = setup();
        controller.update(aim(30000, 0));
        let inflight = scheduler.take_pending();

        controller.on_deactivate();
        let writes_before = recorder.count();
        for callback in inflight {
            callback();
        }

        assert_eq!(controller.state(), AimState::ActiveAim);
        assert_eq!(recorder.count(), writes_before);
    }

    #[test]
    fn test_deactivate_cancels_pending_timer() {
        let (controller, _, scheduler) = setup();
        controller.update(aim(30000, 0));
        controller.on_deactivate();
        assert_eq!(scheduler.pending(), 0);
        assert!(!controller.is_active());
    }

    #[test]
    fn test_update_after_deactivate_writes_nothing() {
        let (controller, recorder, _) = setup();
        controller.on_deactivate();
        let out = controller.update(aim(30000, 0));
        assert_eq!(out, AxisPair::new(111, 222));
        assert_eq!(recorder.count(), 0);
        assert_eq!(controller.state(), AimState::Normal);
    }

    #[test]
    fn test_activate_resets_state_and_keeps_timer() {
        let (controller, _, scheduler) = setup();
        controller.set_num_aim_directions(4).unwrap();
        controller.update(aim(30000, 0));

        controller.on_activate();
        assert_eq!(controller.state(), AimState::Normal);
        assert_eq!(controller.num_aim_directions(), 4);
        assert_eq!(scheduler.pending(), 1);

        // Expiry outside active aim changes nothing
        scheduler.fire_all();
        assert_eq!(controller.state(), AimState::Normal);
    }

    #[test]
    fn test_activate_after_deactivate_resumes() {
        let (controller, _, _) = setup();
        controller.on_deactivate();
        controller.on_activate();
        assert!(controller.is_active());
        assert_eq!(controller.update(aim(30000, 0)), AxisPair::new(32767, 0));
    }

    #[test]
    fn test_setters_validate() {
        let (controller, _, _) = setup();
        assert_eq!(controller.set_num_aim_directions(0), Err(AimError::NoDirections));
        assert_eq!(controller.num_aim_directions(), 8);

        assert!(controller.set_active_aim_time_ms(f64::NAN).is_err());
        assert_eq!(controller.active_aim_time_ms(), 20.0);

        controller.set_aim_magnitude(50).unwrap();
        controller.set_aim_deadzone(10).unwrap();
        controller.set_active_aim_time_ms(45.0).unwrap();
        assert_eq!(controller.aim_magnitude(), 50);
        assert_eq!(controller.aim_deadzone(), 10);
        assert_eq!(controller.active_aim_time_ms(), 45.0);
    }

    #[test]
    fn test_new_duration_used_for_next_window() {
        let (controller, _, scheduler) = setup();
        controller.set_active_aim_time_ms(75.0).unwrap();
        controller.update(aim(30000, 0));
        assert_eq!(scheduler.pending_delays(), vec![Duration::from_millis(75)]);
    }

    #[test]
    fn test_new_requires_runtime() {
        let recorder = Arc::new(Recorder::default());
        let result = AimController::new(AimSettings::default(), recorder);
        assert!(matches!(result, Err(AimError::NoRuntime)));
    }

    #[test]
    fn test_drop_cancels_timer() {
        let (controller, _, scheduler) = setup();
        controller.update(aim(30000, 0));
        drop(controller);
        assert_eq!(scheduler.pending(), 0);
    }
}
