//! Button binding names for gilrs controllers
//!
//! Names follow Xbox conventions, mapped from gilrs physical positions
//! assuming the Nintendo layout most third-party controllers report:
//!
//! ```text
//!       [X/North]           (top)
//!   [Y/West] [A/East]       (left/right)
//!       [B/South]           (bottom)
//! ```

use anyhow::{bail, Result};
use gilrs::Button;

const BUTTON_NAMES: &[(&str, Button)] = &[
    // Face buttons (Nintendo layout -> Xbox names)
    ("a", Button::East),
    ("b", Button::South),
    ("x", Button::North),
    ("y", Button::West),
    // Shoulder buttons
    ("lb", Button::LeftTrigger),
    ("rb", Button::RightTrigger),
    ("lt", Button::LeftTrigger2),
    ("rt", Button::RightTrigger2),
    // Menu buttons
    ("minus", Button::Select),
    ("plus", Button::Start),
    ("home", Button::Mode),
    // Stick clicks
    ("l3", Button::LeftThumb),
    ("r3", Button::RightThumb),
    // D-Pad
    ("up", Button::DPadUp),
    ("down", Button::DPadDown),
    ("left", Button::DPadLeft),
    ("right", Button::DPadRight),
];

/// Map a binding name to its gilrs button
pub fn button_from_name(name: &str) -> Result<Button> {
    let wanted = name.trim().to_ascii_lowercase();
    match BUTTON_NAMES.iter().find(|(n, _)| *n == wanted) {
        Some((_, button)) => Ok(*button),
        None => bail!("Unknown button binding: \"{}\"", name.trim()),
    }
}

/// Xbox-style name of a gilrs button, if it has one
pub fn button_name(button: Button) -> Option<&'static str> {
    BUTTON_NAMES
        .iter()
        .find(|(_, b)| *b == button)
        .map(|(n, _)| *n)
}

/// Every button a binding can refer to
pub fn known_buttons() -> impl Iterator<Item = Button> {
    BUTTON_NAMES.iter().map(|(_, b)| *b)
}
