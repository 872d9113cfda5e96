//! The clock controller.
//!
//! [`Clock`] owns the running [`DateTime`], the 12/24-hour display flag, the edit session, the
//! key source and the display. Each call to [`Clock::step`] polls one key, dispatches it and
//! redraws the display:
//!
//! - in [`Mode::Run`], `A` starts a date edit, `B` a time edit, `D` toggles the hour format, and
//!   anything else (or no key) advances the clock by one second
//! - in [`Mode::Editing`], every key goes to the edit session until it is cancelled or confirmed
//!
//! The caller schedules `step` once per second. The clock does not advance while a field is being
//! edited.
//!
//! # Example
//!
//! ```rust,ignore
//! use keypad_clock::{Clock, Config, DateTime, KeypadConfig, MatrixKeypad};
//!
//! let keypad = MatrixKeypad::new(rows, columns, delay, &KeypadConfig::default());
//! let now = DateTime::new(2025, 5, 7, 12, 0, 0)?;
//! let mut clock = Clock::new(keypad, lcd, now, &Config::default());
//!
//! loop {
//!     clock.step()?;
//!     wait_for_next_second();
//! }
//! ```

use crate::calendar::DateTime;
use crate::display::{date_line, show, time_line, CharacterDisplay, TimeRepresentation};
use crate::edit::{EditError, EditOutcome, EditSession, FieldKind};
use crate::keypad::{Key, KeySource};

const PROMPT_DATE: &str = "Set date:";
const PROMPT_TIME: &str = "Set time:";
const INVALID_DATE: &str = "Invalid date.";
const INVALID_TIME: &str = "Invalid time.";
const PROMPT_RETRY: &str = "Try again:";

/// Clock configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Hour format shown at start-up
    pub time_representation: TimeRepresentation,
    /// Number of consecutive polls without a key after which an edit is abandoned; `None` keeps
    /// an edit open indefinitely
    pub edit_timeout: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_representation: TimeRepresentation::TwentyFourHour,
            edit_timeout: None,
        }
    }
}

/// What the clock is doing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Run,
    Editing(FieldKind),
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError<KE, DE> {
    Keypad(KE),
    Display(DE),
}

/// Keypad-settable clock.
pub struct Clock<K: KeySource, D: CharacterDisplay> {
    keys: K,
    display: D,
    now: DateTime,
    time_representation: TimeRepresentation,
    edit_timeout: Option<u32>,
    session: EditSession,
    notice: Option<EditError>,
    retry: bool,
    idle_polls: u32,
}

impl<K: KeySource, D: CharacterDisplay> Clock<K, D> {
    /// Creates a clock in run mode, showing `now`.
    pub fn new(keys: K, display: D, now: DateTime, config: &Config) -> Self {
        Self {
            keys,
            display,
            now,
            time_representation: config.time_representation,
            edit_timeout: config.edit_timeout,
            session: EditSession::new(),
            notice: None,
            retry: false,
            idle_polls: 0,
        }
    }

    pub fn now(&self) -> DateTime {
        self.now
    }

    pub fn time_representation(&self) -> TimeRepresentation {
        self.time_representation
    }

    /// Returns the current mode.
    pub fn mode(&self) -> Mode {
        match self.session.field() {
            Some(field) => Mode::Editing(field.kind()),
            None => Mode::Run,
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Gives back the key source and the display.
    pub fn release(self) -> (K, D) {
        (self.keys, self.display)
    }

    /// Polls one key, dispatches it and redraws the display, returning the mode after the step.
    ///
    /// A failing key source or display leaves the clock consistent; the next step can proceed.
    pub fn step(&mut self) -> Result<Mode, ClockError<K::Error, D::Error>> {
        let key = self
            .keys
            .poll_key()
            .map_err(ClockError::Keypad)?
            .map(Key::from);
        self.handle(key);
        self.render().map_err(ClockError::Display)?;
        Ok(self.mode())
    }

    /// Dispatches one polled key (or its absence) without touching the display.
    pub fn handle(&mut self, key: Option<Key>) {
        match self.mode() {
            Mode::Run => self.handle_run(key),
            Mode::Editing(_) => self.handle_editing(key),
        }
    }

    fn handle_run(&mut self, key: Option<Key>) {
        match key {
            Some(Key::EditDate) => self.begin(FieldKind::Date),
            Some(Key::EditTime) => self.begin(FieldKind::Time),
            Some(Key::ToggleFormat) => {
                self.time_representation = self.time_representation.toggled();
                info!("clock: {:?} display", self.time_representation);
            }
            _ => self.now.advance_one_second(),
        }
    }

    fn begin(&mut self, kind: FieldKind) {
        self.session.begin(kind);
        self.notice = None;
        self.retry = false;
        self.idle_polls = 0;
    }

    fn handle_editing(&mut self, key: Option<Key>) {
        // the notice is shown for one step only
        self.notice = None;
        let Some(key) = key else {
            self.idle_polls = self.idle_polls.saturating_add(1);
            if self.edit_timeout.is_some_and(|limit| self.idle_polls >= limit) {
                info!("clock: edit abandoned after {} idle polls", self.idle_polls);
                self.session.handle_key(Key::Cancel, &mut self.now);
                self.finish();
            }
            return;
        };

        self.idle_polls = 0;
        match self.session.handle_key(key, &mut self.now) {
            EditOutcome::Rejected(e) => {
                self.notice = Some(e);
                self.retry = true;
            }
            EditOutcome::Cancelled | EditOutcome::Committed => self.finish(),
            EditOutcome::Updated | EditOutcome::Ignored => {}
        }
    }

    fn finish(&mut self) {
        self.session.end();
        self.notice = None;
        self.retry = false;
        debug!("clock: run {}", self.now);
    }

    /// Redraws the display for the current mode.
    pub fn render(&mut self) -> Result<(), D::Error> {
        match self.session.field() {
            Some(field) => {
                let top = match (self.notice, field.kind()) {
                    (Some(_), FieldKind::Date) => INVALID_DATE,
                    (Some(_), FieldKind::Time) => INVALID_TIME,
                    (None, _) if self.retry => PROMPT_RETRY,
                    (None, FieldKind::Date) => PROMPT_DATE,
                    (None, FieldKind::Time) => PROMPT_TIME,
                };
                show(&mut self.display, top, &field.preview())
            }
            None => show(
                &mut self.display,
                &date_line(&self.now),
                &time_line(&self.now, self.time_representation),
            ),
        }
    }
}
