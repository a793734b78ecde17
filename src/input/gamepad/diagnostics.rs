//! Gamepad diagnostics tool for choosing bindings and `product_match`

use gilrs::{Axis, Event, EventType, Gilrs};
use std::thread;
use std::time::Duration;
use tracing::info;

use super::axis::axis_name;
use super::buttons::{button_name, known_buttons};

const STICK_AXES: [Axis; 6] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::LeftZ,
    Axis::RightZ,
];

/// Print detailed information about all detected gamepads
///
/// Shows each gamepad's name (for `product_match`) and any pressed buttons or
/// deflected axes by their binding names.
pub fn print_gamepad_diagnostics() {
    info!("=== Gamepad Diagnostics ===");
    info!("Platform: {}", std::env::consts::OS);

    let mut gilrs = match Gilrs::new() {
        Ok(g) => {
            info!("✅ gilrs initialized successfully");
            g
        }
        Err(e) => {
            info!("❌ Failed to initialize GilRs: {:?}", e);
            info!("This may indicate missing system libraries or permissions issues.");
            return;
        }
    };

    info!("⏳ Waiting for gamepads to connect (3 seconds)...");

    // Bluetooth gamepads only show up after their connect events are polled
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(3) {
        while let Some(Event { event, .. }) = gilrs.next_event() {
            if event == EventType::Connected {
                info!("   📶 Gamepad connection detected...");
            }
        }
        thread::sleep(Duration::from_millis(100));
    }

    let gamepads: Vec<_> = gilrs.gamepads().collect();
    if gamepads.is_empty() {
        info!("⚠️  No gamepads detected");
        return;
    }

    info!("✅ Found {} gamepad(s):", gamepads.len());
    for (id, gamepad) in gamepads {
        info!("📋 Gamepad ID: {:?}", id);
        info!("   Name: \"{}\"", gamepad.name());
        info!("   Connected: {}", gamepad.is_connected());
        info!("   📌 Config pattern suggestion: product_match: \"{}\"", gamepad.name());

        let pressed: Vec<&str> = known_buttons()
            .filter(|b| gamepad.is_pressed(*b))
            .filter_map(button_name)
            .collect();
        if pressed.is_empty() {
            info!("   🎮 Buttons: (none pressed)");
        } else {
            info!("   🎮 Buttons pressed: {}", pressed.join(", "));
        }

        let mut any_axis = false;
        for axis in STICK_AXES {
            let value = gamepad.value(axis);
            if value.abs() > 0.01 {
                info!("   🕹️  {}: {:.3}", axis_name(axis).unwrap_or("?"), value);
                any_axis = true;
            }
        }
        if !any_axis {
            info!("   🕹️  Axes: (all centered, move sticks to see values)");
        }
    }

    info!("=== End Diagnostics ===");
}
