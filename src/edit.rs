//! Keypad entry of a date or time.
//!
//! An [`EditSession`] collects a fixed number of digits for one field and turns them into a
//! validated value:
//!
//! | Field | Digits | Template     | Layout            |
//! |-------|--------|--------------|-------------------|
//! | Date  | 8      | `XX/XX/XXXX` | month, day, year  |
//! | Time  | 6      | `XX:XX:XX`   | hour, minute, sec |
//!
//! Digits fill the field left to right, `C` erases the last one, `*` abandons the edit and `#`
//! accepts it once every slot is filled. An accepted field that fails validation is cleared and
//! entry starts over on the same field.
//!
//! # Session States
//!
//! ```text
//!          begin                 '*'
//! Idle ------------> EnteringDigits ------> Cancelled
//!                      |  ^    |
//!       digit, 'C',    |  |    | '#' (full, valid)
//!       '#' rejected --+--+    +----------> Confirmed
//! ```

use crate::calendar::{days_in_month, DateTime, MONTHS_PER_YEAR};
use crate::display::Line;
use crate::keypad::Key;

/// Number of digits in a date field (`MMDDYYYY`).
pub const DATE_DIGITS: usize = 8;
/// Number of digits in a time field (`HHMMSS`).
pub const TIME_DIGITS: usize = 6;
/// Preview template for a date field; `X` marks a digit slot.
pub const DATE_TEMPLATE: &str = "XX/XX/XXXX";
/// Preview template for a time field; `X` marks a digit slot.
pub const TIME_TEMPLATE: &str = "XX:XX:XX";
/// Character shown in the preview for an empty slot.
pub const PLACEHOLDER: char = '_';

const SLOT: char = 'X';
const MAX_DIGITS: usize = DATE_DIGITS;

/// Which part of the clock a field edits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldKind {
    Date,
    Time,
}

impl FieldKind {
    /// Number of digits the field holds.
    pub fn digits(self) -> usize {
        match self {
            FieldKind::Date => DATE_DIGITS,
            FieldKind::Time => TIME_DIGITS,
        }
    }

    /// Preview template of the field.
    pub fn template(self) -> &'static str {
        match self {
            FieldKind::Date => DATE_TEMPLATE,
            FieldKind::Time => TIME_TEMPLATE,
        }
    }
}

/// Errors reported when an edit is confirmed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EditError {
    /// The entered digits do not form a valid date or time
    InvalidInput(FieldKind),
}

/// A validated value parsed from a full field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldValue {
    /// A calendar date
    Date { year: i32, month: u8, day: u8 },
    /// A time of day
    Time { hour: u8, minute: u8, second: u8 },
}

impl FieldValue {
    /// Writes the value into `target`, leaving the other half of it untouched.
    pub fn apply(self, target: &mut DateTime) {
        match self {
            FieldValue::Date { year, month, day } => {
                target.year = year;
                target.month = month;
                target.day = day;
            }
            FieldValue::Time {
                hour,
                minute,
                second,
            } => {
                target.hour = hour;
                target.minute = minute;
                target.second = second;
            }
        }
    }
}

/// Fixed-width digit buffer for one field.
///
/// Empty slots hold `None` and are never read as digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditField {
    kind: FieldKind,
    slots: [Option<u8>; MAX_DIGITS],
    count: usize,
}

impl EditField {
    /// Creates an empty field.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            slots: [None; MAX_DIGITS],
            count: 0,
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns the number of digits entered so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns the capacity of the field.
    pub fn len(&self) -> usize {
        self.kind.digits()
    }

    /// Returns `true` if no digit has been entered.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns `true` if every slot holds a digit.
    pub fn is_full(&self) -> bool {
        self.count == self.len()
    }

    /// Appends a digit at the cursor. Returns `false` if the field is full or `digit` is not 0-9.
    pub fn push(&mut self, digit: u8) -> bool {
        if digit > 9 || self.is_full() {
            return false;
        }
        self.slots[self.count] = Some(digit);
        self.count += 1;
        true
    }

    /// Erases the last digit. Returns `false` if the field was empty.
    pub fn pop(&mut self) -> bool {
        if self.count == 0 {
            return false;
        }
        self.count -= 1;
        self.slots[self.count] = None;
        true
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        self.slots = [None; MAX_DIGITS];
        self.count = 0;
    }

    /// Renders the field into its template, digits in their slots and [`PLACEHOLDER`] elsewhere.
    pub fn preview(&self) -> Line {
        let mut line = Line::new();
        let mut slots = self.slots.iter();
        for c in self.kind.template().chars() {
            let c = if c == SLOT {
                match slots.next() {
                    Some(Some(digit)) => char::from(b'0' + digit),
                    _ => PLACEHOLDER,
                }
            } else {
                c
            };
            // templates are far shorter than a display line
            let _ = line.push(c);
        }
        line
    }

    /// Reads slots `start..end` as a decimal number; `None` if any of them is empty.
    fn number(&self, start: usize, end: usize) -> Option<u32> {
        self.slots
            .get(start..end)?
            .iter()
            .copied()
            .try_fold(0u32, |acc, slot| slot.map(|digit| acc * 10 + u32::from(digit)))
    }

    /// Parses and validates a full field.
    ///
    /// # Errors
    /// Returns `EditError::InvalidInput` if the field is not full, or the digits are not a real
    /// date (month 1-12, day within the month) or time (hour < 24, minute < 60, second < 60).
    pub fn parse(&self) -> Result<FieldValue, EditError> {
        let invalid = EditError::InvalidInput(self.kind);
        if !self.is_full() {
            return Err(invalid);
        }
        match self.kind {
            FieldKind::Date => {
                let month = self.number(0, 2).ok_or(invalid)?;
                let day = self.number(2, 4).ok_or(invalid)?;
                let year = self.number(4, 8).ok_or(invalid)?;
                let month = u8::try_from(month).map_err(|_| invalid)?;
                let day = u8::try_from(day).map_err(|_| invalid)?;
                let year = i32::try_from(year).map_err(|_| invalid)?;
                if !(1..=MONTHS_PER_YEAR).contains(&month)
                    || day < 1
                    || day > days_in_month(month, year)
                {
                    return Err(invalid);
                }
                Ok(FieldValue::Date { year, month, day })
            }
            FieldKind::Time => {
                let hour = self.number(0, 2).ok_or(invalid)?;
                let minute = self.number(2, 4).ok_or(invalid)?;
                let second = self.number(4, 6).ok_or(invalid)?;
                if hour >= 24 || minute >= 60 || second >= 60 {
                    return Err(invalid);
                }
                Ok(FieldValue::Time {
                    hour: u8::try_from(hour).map_err(|_| invalid)?,
                    minute: u8::try_from(minute).map_err(|_| invalid)?,
                    second: u8::try_from(second).map_err(|_| invalid)?,
                })
            }
        }
    }
}

/// Where an [`EditSession`] is in its lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    Idle,
    EnteringDigits,
    Cancelled,
    Confirmed,
}

/// Result of feeding one key to an [`EditSession`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EditOutcome {
    /// A digit was added or erased; the preview changed
    Updated,
    /// The key had no effect
    Ignored,
    /// The field was full but invalid; it has been cleared for another try
    Rejected(EditError),
    /// The edit was abandoned; the target is untouched
    Cancelled,
    /// The value was written to the target
    Committed,
}

/// Keypad-driven editor for one date or time field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    state: SessionState,
    field: Option<EditField>,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSession {
    /// Creates an idle session.
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            field: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the field being edited, if any.
    pub fn field(&self) -> Option<&EditField> {
        self.field.as_ref()
    }

    /// Starts editing an empty field of `kind`, discarding any previous edit.
    pub fn begin(&mut self, kind: FieldKind) {
        debug!("edit: begin {:?}", kind);
        self.field = Some(EditField::new(kind));
        self.state = SessionState::EnteringDigits;
    }

    /// Returns the session to `Idle` after it was cancelled or confirmed.
    pub fn end(&mut self) {
        self.field = None;
        self.state = SessionState::Idle;
    }

    /// Renders the live preview of the field being edited.
    pub fn preview(&self) -> Option<Line> {
        self.field.as_ref().map(EditField::preview)
    }

    /// Feeds one key to the session.
    ///
    /// `target` is written only when a full, valid field is confirmed.
    pub fn handle_key(&mut self, key: Key, target: &mut DateTime) -> EditOutcome {
        if self.state != SessionState::EnteringDigits {
            return EditOutcome::Ignored;
        }
        let Some(field) = self.field.as_mut() else {
            return EditOutcome::Ignored;
        };

        match key {
            Key::Digit(digit) => {
                if field.push(digit) {
                    trace!("edit: digit {} ({}/{})", digit, field.count(), field.len());
                    EditOutcome::Updated
                } else {
                    EditOutcome::Ignored
                }
            }
            Key::Backspace => {
                if field.pop() {
                    EditOutcome::Updated
                } else {
                    EditOutcome::Ignored
                }
            }
            Key::Cancel => {
                debug!("edit: cancelled {:?}", field.kind());
                self.field = None;
                self.state = SessionState::Cancelled;
                EditOutcome::Cancelled
            }
            Key::Confirm => {
                if !field.is_full() {
                    return EditOutcome::Ignored;
                }
                match field.parse() {
                    Ok(value) => {
                        info!("edit: commit {:?}", value);
                        value.apply(target);
                        self.field = None;
                        self.state = SessionState::Confirmed;
                        EditOutcome::Committed
                    }
                    Err(e) => {
                        warn!("edit: rejected {:?}", e);
                        field.clear();
                        EditOutcome::Rejected(e)
                    }
                }
            }
            Key::EditDate | Key::EditTime | Key::ToggleFormat => EditOutcome::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> DateTime {
        DateTime::new(2025, 5, 7, 12, 0, 0).unwrap()
    }

    fn keys(session: &mut EditSession, target: &mut DateTime, symbols: &str) -> EditOutcome {
        let mut outcome = EditOutcome::Ignored;
        for symbol in symbols.chars() {
            outcome = session.handle_key(Key::from_symbol(symbol).unwrap(), target);
        }
        outcome
    }

    #[test]
    fn test_field_push_pop() {
        let mut field = EditField::new(FieldKind::Time);
        assert!(field.is_empty());
        assert!(!field.pop());
        for digit in [1, 2, 3, 4, 5, 6] {
            assert!(field.push(digit));
        }
        assert!(field.is_full());
        assert!(!field.push(7));
        assert_eq!(field.count(), 6);
        assert!(field.pop());
        assert_eq!(field.count(), 5);
        assert!(!field.push(10));
        assert_eq!(field.count(), 5);
    }

    #[test]
    fn test_preview() {
        let mut field = EditField::new(FieldKind::Date);
        assert_eq!(field.preview().as_str(), "__/__/____");
        for digit in [0, 1, 1] {
            field.push(digit);
        }
        assert_eq!(field.preview().as_str(), "01/1_/____");
        field.pop();
        assert_eq!(field.preview().as_str(), "01/__/____");

        let mut field = EditField::new(FieldKind::Time);
        for digit in [2, 3, 5, 9, 0, 1] {
            field.push(digit);
        }
        assert_eq!(field.preview().as_str(), "23:59:01");
    }

    #[test]
    fn test_parse_date() {
        let mut field = EditField::new(FieldKind::Date);
        for digit in [0, 2, 2, 9, 2, 0, 2, 4] {
            field.push(digit);
        }
        assert_eq!(
            field.parse(),
            Ok(FieldValue::Date {
                year: 2024,
                month: 2,
                day: 29
            })
        );

        let mut field = EditField::new(FieldKind::Date);
        for digit in [0, 2, 2, 9, 2, 0, 2, 3] {
            field.push(digit);
        }
        assert_eq!(
            field.parse(),
            Err(EditError::InvalidInput(FieldKind::Date))
        );
    }

    #[test]
    fn test_parse_rejects_partial_field() {
        let mut field = EditField::new(FieldKind::Time);
        field.push(1);
        assert_eq!(
            field.parse(),
            Err(EditError::InvalidInput(FieldKind::Time))
        );
    }

    #[test]
    fn test_parse_time_limits() {
        let parse = |digits: [u8; 6]| {
            let mut field = EditField::new(FieldKind::Time);
            for digit in digits {
                field.push(digit);
            }
            field.parse()
        };
        assert!(parse([2, 3, 5, 9, 5, 9]).is_ok());
        assert!(parse([0, 0, 0, 0, 0, 0]).is_ok());
        assert!(parse([2, 4, 0, 0, 0, 0]).is_err());
        assert!(parse([1, 2, 6, 0, 0, 0]).is_err());
        assert!(parse([1, 2, 0, 0, 6, 0]).is_err());
    }

    #[test]
    fn test_commit_date() {
        let mut now = start();
        let mut session = EditSession::new();
        session.begin(FieldKind::Date);
        assert_eq!(keys(&mut session, &mut now, "01152025"), EditOutcome::Updated);
        assert_eq!(session.preview().unwrap().as_str(), "01/15/2025");
        assert_eq!(keys(&mut session, &mut now, "#"), EditOutcome::Committed);
        assert_eq!(session.state(), SessionState::Confirmed);
        assert_eq!(now, DateTime::new(2025, 1, 15, 12, 0, 0).unwrap());

        session.end();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.field().is_none());
    }

    #[test]
    fn test_commit_time() {
        let mut now = start();
        let mut session = EditSession::new();
        session.begin(FieldKind::Time);
        assert_eq!(keys(&mut session, &mut now, "235958#"), EditOutcome::Committed);
        assert_eq!(now, DateTime::new(2025, 5, 7, 23, 59, 58).unwrap());
    }

    #[test]
    fn test_zero_date_rejected() {
        let mut now = start();
        let mut session = EditSession::new();
        session.begin(FieldKind::Date);
        assert_eq!(
            keys(&mut session, &mut now, "00000000#"),
            EditOutcome::Rejected(EditError::InvalidInput(FieldKind::Date))
        );
        assert_eq!(session.state(), SessionState::EnteringDigits);
        assert!(session.field().unwrap().is_empty());
        assert_eq!(session.preview().unwrap().as_str(), "__/__/____");
        assert_eq!(now, start());

        assert_eq!(keys(&mut session, &mut now, "12312024#"), EditOutcome::Committed);
        assert_eq!(now, DateTime::new(2024, 12, 31, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_confirm_before_full_never_commits() {
        let mut now = start();
        let mut session = EditSession::new();
        session.begin(FieldKind::Date);
        assert_eq!(keys(&mut session, &mut now, "#"), EditOutcome::Ignored);
        assert_eq!(keys(&mut session, &mut now, "0115202"), EditOutcome::Updated);
        for _ in 0..5 {
            assert_eq!(keys(&mut session, &mut now, "#"), EditOutcome::Ignored);
        }
        assert_eq!(session.state(), SessionState::EnteringDigits);
        assert_eq!(session.field().unwrap().count(), 7);
        assert_eq!(now, start());
    }

    #[test]
    fn test_cancel_leaves_target_untouched() {
        for entered in ["", "0", "0115", "0115202", "01152025"] {
            let mut now = start();
            let before = now;
            let mut session = EditSession::new();
            session.begin(FieldKind::Date);
            keys(&mut session, &mut now, entered);
            assert_eq!(keys(&mut session, &mut now, "*"), EditOutcome::Cancelled);
            assert_eq!(session.state(), SessionState::Cancelled);
            assert!(session.field().is_none());
            assert_eq!(now, before);
        }
    }

    #[test]
    fn test_backspace_at_empty_then_commit() {
        let mut now = start();
        let mut session = EditSession::new();
        session.begin(FieldKind::Date);
        assert_eq!(keys(&mut session, &mut now, "C"), EditOutcome::Ignored);
        assert_eq!(keys(&mut session, &mut now, "CC"), EditOutcome::Ignored);
        assert_eq!(keys(&mut session, &mut now, "01152025#"), EditOutcome::Committed);
        assert_eq!(now, DateTime::new(2025, 1, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_backspace_corrects_entry() {
        let mut now = start();
        let mut session = EditSession::new();
        session.begin(FieldKind::Time);
        keys(&mut session, &mut now, "139");
        assert_eq!(keys(&mut session, &mut now, "C"), EditOutcome::Updated);
        assert_eq!(session.preview().unwrap().as_str(), "13:__:__");
        assert_eq!(keys(&mut session, &mut now, "4500#"), EditOutcome::Committed);
        assert_eq!(now, DateTime::new(2025, 5, 7, 13, 45, 0).unwrap());
    }

    #[test]
    fn test_full_field_ignores_digits() {
        let mut now = start();
        let mut session = EditSession::new();
        session.begin(FieldKind::Time);
        keys(&mut session, &mut now, "101010");
        assert_eq!(keys(&mut session, &mut now, "9"), EditOutcome::Ignored);
        assert_eq!(session.preview().unwrap().as_str(), "10:10:10");
    }

    #[test]
    fn test_mode_keys_ignored_while_editing() {
        let mut now = start();
        let mut session = EditSession::new();
        session.begin(FieldKind::Time);
        assert_eq!(keys(&mut session, &mut now, "A"), EditOutcome::Ignored);
        assert_eq!(keys(&mut session, &mut now, "B"), EditOutcome::Ignored);
        assert_eq!(keys(&mut session, &mut now, "D"), EditOutcome::Ignored);
        assert_eq!(session.field().unwrap().kind(), FieldKind::Time);
    }

    #[test]
    fn test_idle_session_ignores_keys() {
        let mut now = start();
        let mut session = EditSession::new();
        assert_eq!(keys(&mut session, &mut now, "1#*"), EditOutcome::Ignored);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.preview().is_none());
    }

    #[test]
    fn test_year_accepted_as_entered() {
        let mut now = start();
        let mut session = EditSession::new();
        session.begin(FieldKind::Date);
        assert_eq!(keys(&mut session, &mut now, "02290000#"), EditOutcome::Committed);
        assert_eq!((now.year, now.month, now.day), (0, 2, 29));
    }
}
