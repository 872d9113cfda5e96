#![no_std]
//! A platform-agnostic calendar clock core for microcontrollers with a 4×4 matrix keypad and a
//! two-line character LCD.
//!
//! The crate keeps a [`DateTime`] running one second per [`Clock::step`], renders it as
//! `MM/DD/YYYY` over `HH:MM:SS` (or `HH:MM:SS AM|PM`), and lets the user enter a new date or time
//! from the keypad.
//!
//! # Keys
//!
//! | Key | Run mode                 | While editing               |
//! |-----|--------------------------|-----------------------------|
//! | `A` | edit the date (MMDDYYYY) | ignored                     |
//! | `B` | edit the time (HHMMSS)   | ignored                     |
//! | `C` | tick                     | erase the last digit        |
//! | `D` | toggle 24/12-hour        | ignored                     |
//! | `*` | tick                     | cancel, keep the old value  |
//! | `#` | tick                     | confirm once the field is full |
//! | 0-9 | tick                     | enter a digit               |
//!
//! # Hardware
//!
//! Keys come from any [`KeySource`]; [`MatrixKeypad`] scans a matrix over `embedded-hal` 1.0 pins
//! with debouncing. Output goes to any [`CharacterDisplay`]; [`TextBuffer`] keeps the text in
//! memory.
//!
//! # Features
//!
//! - `log`: log through the `log` crate
//! - `defmt`: log through `defmt` and derive `defmt::Format` for the public types

#[macro_use]
mod fmt;

pub mod calendar;
pub mod clock;
pub mod display;
pub mod edit;
pub mod keypad;

pub use calendar::{days_in_month, is_leap, CalendarError, DateTime};
pub use clock::{Clock, ClockError, Config, Mode};
pub use display::{CharacterDisplay, Line, TextBuffer, TimeRepresentation};
pub use edit::{EditError, EditField, EditOutcome, EditSession, FieldKind, FieldValue, SessionState};
pub use keypad::{Key, KeyCode, KeySource, KeypadConfig, KeypadError, MatrixKeypad, KEYMAP};
