//! Keypad layout and key acquisition.
//!
//! The clock is driven by a 4×4 matrix keypad laid out as:
//!
//! ```text
//! 1 2 3 A
//! 4 5 6 B
//! 7 8 9 C
//! * 0 # D
//! ```
//!
//! Key positions are reported as a [`KeyCode`] (row and column packed into one byte) by any
//! [`KeySource`], and mapped to a [`Key`] through the fixed row-major [`KEYMAP`].
//! [`MatrixKeypad`] is a [`KeySource`] that scans the matrix over `embedded-hal` pins.

use bitfield::bitfield;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Number of keypad rows.
pub const ROWS: usize = 4;
/// Number of keypad columns.
pub const COLUMNS: usize = 4;

/// A logical key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    /// Decimal digit (0-9)
    Digit(u8),
    /// `A`: edit the date
    EditDate,
    /// `B`: edit the time
    EditTime,
    /// `C`: erase the last entered digit
    Backspace,
    /// `D`: switch between 24-hour and 12-hour display
    ToggleFormat,
    /// `*`: abandon the edit
    Cancel,
    /// `#`: accept the edit
    Confirm,
}

/// Key for each [`KeyCode`] index, row-major.
pub const KEYMAP: [Key; ROWS * COLUMNS] = [
    Key::Digit(1),
    Key::Digit(2),
    Key::Digit(3),
    Key::EditDate,
    Key::Digit(4),
    Key::Digit(5),
    Key::Digit(6),
    Key::EditTime,
    Key::Digit(7),
    Key::Digit(8),
    Key::Digit(9),
    Key::Backspace,
    Key::Cancel,
    Key::Digit(0),
    Key::Confirm,
    Key::ToggleFormat,
];

impl Key {
    /// Returns the character printed on the key cap.
    pub fn symbol(self) -> char {
        match self {
            Key::Digit(d) => char::from_digit(u32::from(d), 10).unwrap_or('?'),
            Key::EditDate => 'A',
            Key::EditTime => 'B',
            Key::Backspace => 'C',
            Key::ToggleFormat => 'D',
            Key::Cancel => '*',
            Key::Confirm => '#',
        }
    }

    /// Looks up a key by its key cap character.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        KEYMAP.iter().copied().find(|key| key.symbol() == symbol)
    }
}

bitfield! {
    /// Position of a key in the matrix (0-15, row-major).
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct KeyCode(u8);
    impl Debug;
    pub row, set_row: 3, 2;
    pub column, set_column: 1, 0;
}

#[cfg(feature = "defmt")]
impl defmt::Format for KeyCode {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "KeyCode(r{} c{})", self.row(), self.column());
    }
}

impl KeyCode {
    /// Creates a key code from a row and column (each 0-3).
    pub fn new(row: u8, column: u8) -> Self {
        let mut code = KeyCode(0);
        code.set_row(row);
        code.set_column(column);
        code
    }

    pub fn index(self) -> usize {
        usize::from(self.row()) * COLUMNS + usize::from(self.column())
    }

    /// Returns the key at this position.
    pub fn key(self) -> Key {
        KEYMAP[self.index()]
    }

    fn mask(self) -> u16 {
        1 << self.index()
    }
}

impl From<u8> for KeyCode {
    /// Creates a `KeyCode` from a row-major index; bits above 3 are ignored.
    fn from(v: u8) -> Self {
        KeyCode(v & 0x0F)
    }
}

impl From<KeyCode> for u8 {
    fn from(v: KeyCode) -> Self {
        v.0
    }
}

impl From<KeyCode> for Key {
    fn from(code: KeyCode) -> Self {
        code.key()
    }
}

/// A source of debounced key presses.
///
/// Polling never blocks indefinitely, and each physical press is reported exactly once.
pub trait KeySource {
    /// Error reported by the underlying hardware.
    type Error;

    /// Returns the newly pressed key, or `None` if no new press is available.
    fn poll_key(&mut self) -> Result<Option<KeyCode>, Self::Error>;
}

impl<K: KeySource + ?Sized> KeySource for &mut K {
    type Error = K::Error;

    fn poll_key(&mut self) -> Result<Option<KeyCode>, Self::Error> {
        (**self).poll_key()
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeypadError<RE, CE> {
    Row(RE),
    Column(CE),
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeypadConfig {
    /// Time after driving a row low before its columns are read
    pub row_settle_us: u32,
    /// Time between the two samples of a debounced press
    pub debounce_us: u32,
}

impl Default for KeypadConfig {
    fn default() -> Self {
        Self {
            row_settle_us: 10,
            debounce_us: 10_000,
        }
    }
}

/// 4×4 matrix keypad scanned over GPIO.
///
/// Rows are outputs that idle high and are driven low one at a time; columns are inputs with
/// pull-ups, so a pressed key reads low on its column while its row is driven.
///
/// A press is accepted only if it is down in two snapshots taken `debounce_us` apart. The accepted
/// key is then ignored until a snapshot shows it released, so a held key produces one event.
pub struct MatrixKeypad<R, C, D> {
    rows: [R; ROWS],
    columns: [C; COLUMNS],
    delay: D,
    config: KeypadConfig,
    held: Option<KeyCode>,
}

impl<R: OutputPin, C: InputPin, D: DelayNs> MatrixKeypad<R, C, D> {
    /// Creates a scanner over row outputs (top to bottom) and pulled-up column inputs (left to
    /// right).
    pub fn new(rows: [R; ROWS], columns: [C; COLUMNS], delay: D, config: &KeypadConfig) -> Self {
        Self {
            rows,
            columns,
            delay,
            config: *config,
            held: None,
        }
    }

    pub fn release(self) -> ([R; ROWS], [C; COLUMNS], D) {
        (self.rows, self.columns, self.delay)
    }

    /// Reads the whole matrix; bit `row * 4 + column` is set for each key that is down.
    fn snapshot(&mut self) -> Result<u16, KeypadError<R::Error, C::Error>> {
        let mut pressed = 0u16;
        for (row, row_pin) in self.rows.iter_mut().enumerate() {
            row_pin.set_low().map_err(KeypadError::Row)?;
            self.delay.delay_us(self.config.row_settle_us);
            for (column, column_pin) in self.columns.iter_mut().enumerate() {
                if column_pin.is_low().map_err(KeypadError::Column)? {
                    pressed |= 1 << (row * COLUMNS + column);
                }
            }
            row_pin.set_high().map_err(KeypadError::Row)?;
        }
        Ok(pressed)
    }
}

impl<R: OutputPin, C: InputPin, D: DelayNs> KeySource for MatrixKeypad<R, C, D> {
    type Error = KeypadError<R::Error, C::Error>;

    fn poll_key(&mut self) -> Result<Option<KeyCode>, Self::Error> {
        let first = self.snapshot()?;

        if let Some(held) = self.held {
            if first & held.mask() != 0 {
                return Ok(None);
            }
            trace!("keypad: released {:?}", held);
            self.held = None;
        }
        if first == 0 {
            return Ok(None);
        }

        self.delay.delay_us(self.config.debounce_us);
        let stable = first & self.snapshot()?;
        if stable == 0 {
            trace!("keypad: bounce rejected {}", first);
            return Ok(None);
        }

        // lowest index wins, matching row-major scan order
        let code = KeyCode::from(stable.trailing_zeros() as u8);
        self.held = Some(code);
        debug!("keypad: pressed {:?}", code);
        Ok(Some(code))
    }
}
