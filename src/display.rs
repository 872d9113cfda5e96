//! Character display output.
//!
//! The clock renders two lines of text:
//!
//! - line 0: `MM/DD/YYYY`
//! - line 1: `HH:MM:SS` in 24-hour mode, `HH:MM:SS AM` / `HH:MM:SS PM` in 12-hour mode
//!
//! Any HD44780-style character LCD driver can be plugged in through [`CharacterDisplay`];
//! [`TextBuffer`] is an in-memory implementation.

use core::convert::Infallible;
use core::fmt::Write;

use crate::calendar::DateTime;

/// Number of character rows the clock draws on.
pub const LCD_ROWS: usize = 2;
/// Number of addressable columns per row (HD44780 DDRAM line length).
pub const LCD_COLUMNS: usize = 40;

/// One rendered display line.
pub type Line = heapless::String<LCD_COLUMNS>;

/// Hour format for the time line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeRepresentation {
    /// 24-hour format (0-23)
    TwentyFourHour,
    /// 12-hour format (1-12 + AM/PM)
    TwelveHour,
}

impl TimeRepresentation {
    /// Returns the other representation.
    pub fn toggled(self) -> Self {
        match self {
            TimeRepresentation::TwentyFourHour => TimeRepresentation::TwelveHour,
            TimeRepresentation::TwelveHour => TimeRepresentation::TwentyFourHour,
        }
    }
}

/// Formats the date line, `MM/DD/YYYY`.
pub fn date_line(dt: &DateTime) -> Line {
    let mut line = Line::new();
    // at most 17 characters even for extreme years
    let _ = write!(line, "{:02}/{:02}/{:04}", dt.month, dt.day, dt.year);
    line
}

/// Formats the time line in the given representation.
pub fn time_line(dt: &DateTime, representation: TimeRepresentation) -> Line {
    let mut line = Line::new();
    let _ = match representation {
        TimeRepresentation::TwentyFourHour => {
            write!(line, "{:02}:{:02}:{:02}", dt.hour, dt.minute, dt.second)
        }
        TimeRepresentation::TwelveHour => {
            let hour = match dt.hour % 12 {
                0 => 12,
                h => h,
            };
            let meridiem = if dt.hour < 12 { "AM" } else { "PM" };
            write!(
                line,
                "{:02}:{:02}:{:02} {}",
                hour, dt.minute, dt.second, meridiem
            )
        }
    };
    line
}

/// A character display addressed by row and column.
pub trait CharacterDisplay {
    /// Error reported by the display bus.
    type Error;

    /// Blanks the display and homes the cursor.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Moves the cursor to `row` (0-1), `column` (0-39).
    fn set_cursor(&mut self, row: u8, column: u8) -> Result<(), Self::Error>;

    /// Writes text at the cursor, advancing it.
    fn write_str(&mut self, text: &str) -> Result<(), Self::Error>;
}

impl<D: CharacterDisplay + ?Sized> CharacterDisplay for &mut D {
    type Error = D::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        (**self).clear()
    }

    fn set_cursor(&mut self, row: u8, column: u8) -> Result<(), Self::Error> {
        (**self).set_cursor(row, column)
    }

    fn write_str(&mut self, text: &str) -> Result<(), Self::Error> {
        (**self).write_str(text)
    }
}

/// Clears the display and writes `top` on line 0 and `bottom` on line 1.
pub fn show<D: CharacterDisplay>(display: &mut D, top: &str, bottom: &str) -> Result<(), D::Error> {
    display.clear()?;
    display.set_cursor(0, 0)?;
    display.write_str(top)?;
    display.set_cursor(1, 0)?;
    display.write_str(bottom)
}

/// In-memory two-line display.
///
/// Characters written past the last column are dropped; non-ASCII characters are stored as `?`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextBuffer {
    cells: [[u8; LCD_COLUMNS]; LCD_ROWS],
    row: usize,
    column: usize,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    /// Creates a blank buffer with the cursor at the origin.
    pub fn new() -> Self {
        Self {
            cells: [[b' '; LCD_COLUMNS]; LCD_ROWS],
            row: 0,
            column: 0,
        }
    }

    /// Returns the contents of `row` without trailing blanks.
    pub fn line(&self, row: usize) -> &str {
        self.cells
            .get(row)
            .and_then(|cells| core::str::from_utf8(cells).ok())
            .map_or("", str::trim_end)
    }
}

impl CharacterDisplay for TextBuffer {
    type Error = Infallible;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.cells = [[b' '; LCD_COLUMNS]; LCD_ROWS];
        self.row = 0;
        self.column = 0;
        Ok(())
    }

    fn set_cursor(&mut self, row: u8, column: u8) -> Result<(), Self::Error> {
        self.row = usize::from(row);
        self.column = usize::from(column);
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<(), Self::Error> {
        for c in text.chars() {
            if let Some(cell) = self
                .cells
                .get_mut(self.row)
                .and_then(|cells| cells.get_mut(self.column))
            {
                *cell = if c.is_ascii() { c as u8 } else { b'?' };
            }
            self.column += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(hour: u8, minute: u8, second: u8) -> DateTime {
        DateTime {
            year: 2025,
            month: 5,
            day: 7,
            hour,
            minute,
            second,
        }
    }

    #[test]
    fn test_date_line() {
        assert_eq!(date_line(&dt(0, 0, 0)).as_str(), "05/07/2025");
        let early = DateTime {
            year: 987,
            month: 12,
            day: 31,
            ..DateTime::default()
        };
        assert_eq!(date_line(&early).as_str(), "12/31/0987");
    }

    #[test]
    fn test_time_line_twenty_four_hour() {
        let repr = TimeRepresentation::TwentyFourHour;
        assert_eq!(time_line(&dt(0, 0, 0), repr).as_str(), "00:00:00");
        assert_eq!(time_line(&dt(9, 5, 3), repr).as_str(), "09:05:03");
        assert_eq!(time_line(&dt(23, 59, 59), repr).as_str(), "23:59:59");
    }

    #[test]
    fn test_time_line_twelve_hour() {
        let repr = TimeRepresentation::TwelveHour;
        assert_eq!(time_line(&dt(0, 15, 0), repr).as_str(), "12:15:00 AM");
        assert_eq!(time_line(&dt(1, 0, 0), repr).as_str(), "01:00:00 AM");
        assert_eq!(time_line(&dt(11, 59, 59), repr).as_str(), "11:59:59 AM");
        assert_eq!(time_line(&dt(12, 0, 0), repr).as_str(), "12:00:00 PM");
        assert_eq!(time_line(&dt(13, 30, 0), repr).as_str(), "01:30:00 PM");
        assert_eq!(time_line(&dt(23, 0, 1), repr).as_str(), "11:00:01 PM");
    }

    #[test]
    fn test_toggled() {
        assert_eq!(
            TimeRepresentation::TwentyFourHour.toggled(),
            TimeRepresentation::TwelveHour
        );
        assert_eq!(
            TimeRepresentation::TwelveHour.toggled(),
            TimeRepresentation::TwentyFourHour
        );
    }

    #[test]
    fn test_text_buffer_show() {
        let mut lcd = TextBuffer::new();
        show(&mut lcd, "05/07/2025", "12:00:00").unwrap();
        assert_eq!(lcd.line(0), "05/07/2025");
        assert_eq!(lcd.line(1), "12:00:00");

        show(&mut lcd, "Set time:", "").unwrap();
        assert_eq!(lcd.line(0), "Set time:");
        assert_eq!(lcd.line(1), "");
        assert_eq!(lcd.line(2), "");
    }

    #[test]
    fn test_text_buffer_cursor_and_clipping() {
        extern crate alloc;

        let mut lcd = TextBuffer::new();
        lcd.set_cursor(1, 36).unwrap();
        lcd.write_str("abcdef").unwrap();
        assert_eq!(lcd.line(1), alloc::format!("{:>40}", "abcd"));

        lcd.set_cursor(0, 2).unwrap();
        lcd.write_str("°C").unwrap();
        assert_eq!(lcd.line(0), "  ?C");

        lcd.set_cursor(5, 0).unwrap();
        lcd.write_str("lost").unwrap();
        lcd.clear().unwrap();
        assert_eq!(lcd, TextBuffer::new());
    }
}
