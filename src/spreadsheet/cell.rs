use crate::spreadsheet::reference::index_to_reference;
use chrono::DateTime;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use iso8601_duration::Duration as IsoDuration;
use std::fmt::Display;

/// Text layout of every date and date-time literal in the generated script.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Text layout of time-of-day literals.
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S";

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Epoch of serial date numbers in an Excel workbook.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum DateSystem {
    /// Serial 1 is 1900-01-01, with the Lotus 1-2-3 phantom 1900-02-29
    #[default]
    V1900,
    /// Serial 0 is 1904-01-01
    V1904,
}

impl DateSystem {
    /// Converts a serial number to a date-time, rounded to the millisecond.
    pub(crate) fn to_datetime(self, serial: f64) -> Option<NaiveDateTime> {
        if !serial.is_finite() {
            return None;
        }
        let millis = (serial * MILLIS_PER_DAY as f64).round() as i64;
        let mut days = millis.div_euclid(MILLIS_PER_DAY);
        let epoch = match self {
            DateSystem::V1900 => {
                if days < 60 {
                    days += 1;
                }
                NaiveDate::from_ymd_opt(1899, 12, 30)?
            }
            DateSystem::V1904 => NaiveDate::from_ymd_opt(1904, 1, 1)?,
        };
        epoch
            .checked_add_signed(Duration::try_days(days)?)?
            .and_hms_opt(0, 0, 0)?
            .checked_add_signed(Duration::milliseconds(millis.rem_euclid(MILLIS_PER_DAY)))
    }
}

/// Types of cell data found in workbook files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Stored as "1" / "0"
    Boolean,
    /// Plain number in decimal or scientific notation
    Number,
    /// Serial number with a date-time format
    DateTime(DateSystem),
    /// Serial number with a date-only format
    Date(DateSystem),
    /// Serial number with a time-only format
    Time(DateSystem),
    /// ISO 8601 date or date-time text
    IsoDateTime,
    /// ISO 8601 duration text, used for time-of-day values
    IsoDuration,
    /// Inline, shared or formula string
    String,
    /// Error code such as `#DIV/0!`
    Error,
}

impl CellType {
    /// Maps built-in xlsx number format ids to date and time kinds.
    pub(crate) fn parse_builtin_number_format_id(id: &str, system: DateSystem) -> Option<Self> {
        match id {
            "22" => Some(Self::DateTime(system)),
            "14" | "15" | "16" | "17" => Some(Self::Date(system)),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::Time(system)),
            _ => None,
        }
    }

    /// Scans a custom number format code for date (y, d) and time (h, s) tokens,
    /// skipping quoted literals, escapes and bracketed sections.
    pub(crate) fn parse_custom_number_format(format: &str, system: DateSystem) -> Self {
        let mut escaped = false;
        let mut literal = false;
        let mut bracket = false;
        let mut date = false;
        let mut time = false;
        for character in format.chars() {
            match character {
                _ if escaped => escaped = false,
                '_' | '\\' | '*' if !literal => escaped = true,
                '"' => literal = !literal,
                _ if literal => (),
                '[' => bracket = true,
                ']' => bracket = false,
                _ if bracket => (),
                // a section separator ends the only section that matters for type
                ';' => break,
                'Y' | 'y' | 'D' | 'd' => date = true,
                'H' | 'h' | 'S' | 's' => time = true,
                _ => (),
            }
        }
        match (date, time) {
            (true, true) => Self::DateTime(system),
            (true, false) => Self::Date(system),
            (false, true) => Self::Time(system),
            (false, false) => Self::Number,
        }
    }

    #[inline]
    pub(crate) fn is_serial_date(&self) -> bool {
        matches!(self, Self::DateTime(_) | Self::Date(_))
    }

    #[inline]
    pub(crate) fn is_time_of_day(&self) -> bool {
        matches!(self, Self::Time(_) | Self::IsoDuration)
    }
}

/// A single non-empty cell with position, type and raw value.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    /// Raw stored value; shared strings are already resolved
    pub(crate) value: String,
}

impl Cell {
    /// Excel-style reference such as "B3".
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    pub(crate) fn to_boolean(&self) -> bool {
        self.value == "1" || self.value.eq_ignore_ascii_case("true")
    }

    /// Whole-number value of a plain number cell ("3", "3.0", "1E3").
    pub(crate) fn to_integer(&self) -> Option<i64> {
        if self.kind != CellType::Number {
            return None;
        }
        let value = self.value.trim();
        if let Ok(integer) = value.parse::<i64>() {
            return Some(integer);
        }
        let number = value.parse::<f64>().ok()?;
        let in_range = number >= i64::MIN as f64 && number < i64::MAX as f64;
        (number.is_finite() && number.fract() == 0.0 && in_range).then_some(number as i64)
    }

    /// Floating point value of a plain number cell.
    pub(crate) fn to_real(&self) -> Option<f64> {
        match self.kind {
            CellType::Number => self.value.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Date-time value of date and date-time cells.
    pub(crate) fn to_timestamp(&self) -> Result<NaiveDateTime, String> {
        match self.kind {
            CellType::DateTime(system) | CellType::Date(system) | CellType::Time(system) => {
                let serial = self
                    .value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| format!("parse '{}' to serial date failed", self.value))?;
                system
                    .to_datetime(serial)
                    .ok_or_else(|| format!("serial date '{}' is out of range", self.value))
            }
            CellType::IsoDateTime => parse_iso_datetime(&self.value)
                .ok_or_else(|| format!("parse '{}' to NaiveDateTime failed", self.value)),
            _ => Err(format!("parse '{}' to timestamp failed", self.value)),
        }
    }

    /// Time-of-day value of time cells.
    pub(crate) fn to_time(&self) -> Result<NaiveTime, String> {
        match self.kind {
            CellType::IsoDuration => {
                let duration = self
                    .value
                    .parse::<IsoDuration>()
                    .map_err(|_| format!("parse '{}' to iso8601 duration failed", self.value))?;
                let seconds = duration.day as f64 * 86_400f64
                    + duration.hour as f64 * 3_600f64
                    + duration.minute as f64 * 60f64
                    + duration.second as f64;
                let millis = (seconds * 1_000f64).round() as i64;
                Ok(NaiveTime::default() + Duration::milliseconds(millis.rem_euclid(MILLIS_PER_DAY)))
            }
            _ => self.to_timestamp().map(|datetime| datetime.time()),
        }
    }
}

impl Display for Cell {
    /// Human-readable text of the cell. Unconvertible dates fall back to the raw value.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            CellType::Boolean => write!(f, "{}", self.to_boolean()),
            kind if kind.is_time_of_day() => match self.to_time() {
                Ok(time) => write!(f, "{}", time.format(TIME_FORMAT)),
                Err(_) => write!(f, "{}", self.value),
            },
            kind if kind.is_serial_date() || kind == CellType::IsoDateTime => match self.to_timestamp() {
                Ok(datetime) => write!(f, "{}", datetime.format(TIMESTAMP_FORMAT)),
                Err(_) => write!(f, "{}", self.value),
            },
            _ => write!(f, "{}", self.value),
        }
    }
}

fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").ok())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|datetime| datetime.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(kind: CellType, value: &str) -> Cell {
        Cell {
            row: 1,
            col: 2,
            kind,
            value: value.to_owned(),
        }
    }

    #[test]
    fn custom_number_formats() {
        let system = DateSystem::V1900;
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd", system), CellType::Date(system));
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd hh:mm:ss", system), CellType::DateTime(system));
        assert_eq!(CellType::parse_custom_number_format("[h]:mm:ss", system), CellType::Time(system));
        assert_eq!(CellType::parse_custom_number_format("#,##0.00 \"days\"", system), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("[Red]0.00", system), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("0.00_);[Red]\\(0.00\\)", system), CellType::Number);
        assert_eq!(CellType::parse_builtin_number_format_id("14", DateSystem::V1904), Some(CellType::Date(DateSystem::V1904)));
        assert_eq!(CellType::parse_builtin_number_format_id("2", system), None);
    }

    #[test]
    fn serial_dates_in_both_systems() {
        let stamp = |system: DateSystem, serial: f64| {
            system.to_datetime(serial).unwrap().format(TIMESTAMP_FORMAT).to_string()
        };
        assert_eq!(stamp(DateSystem::V1900, 1.0), "1900-01-01 00:00:00");
        assert_eq!(stamp(DateSystem::V1900, 61.0), "1900-03-01 00:00:00");
        assert_eq!(stamp(DateSystem::V1900, 32_874.0), "1990-01-01 00:00:00");
        assert_eq!(stamp(DateSystem::V1900, 44_927.520_833_333_3), "2023-01-01 12:30:00");
        assert_eq!(stamp(DateSystem::V1904, 0.0), "1904-01-01 00:00:00");
        assert!(DateSystem::V1900.to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn integers_and_reals() {
        assert_eq!(cell(CellType::Number, "42").to_integer(), Some(42));
        assert_eq!(cell(CellType::Number, "3.0").to_integer(), Some(3));
        assert_eq!(cell(CellType::Number, "1E3").to_integer(), Some(1000));
        assert_eq!(cell(CellType::Number, "2.5").to_integer(), None);
        assert_eq!(cell(CellType::Number, "2.5").to_real(), Some(2.5));
        assert_eq!(cell(CellType::String, "42").to_integer(), None);
    }

    #[test]
    fn display_formats_dates_and_times() {
        assert_eq!(cell(CellType::Date(DateSystem::V1900), "32874").to_string(), "1990-01-01 00:00:00");
        assert_eq!(cell(CellType::Time(DateSystem::V1900), "0.75").to_string(), "18:00:00");
        assert_eq!(cell(CellType::IsoDateTime, "2021-05-04T10:20:30").to_string(), "2021-05-04 10:20:30");
        assert_eq!(cell(CellType::IsoDateTime, "2021-05-04").to_string(), "2021-05-04 00:00:00");
        assert_eq!(cell(CellType::IsoDuration, "PT13H05M00S").to_string(), "13:05:00");
        assert_eq!(cell(CellType::Boolean, "1").to_string(), "true");
        assert_eq!(cell(CellType::Date(DateSystem::V1900), "soon").to_string(), "soon");
        assert_eq!(cell(CellType::String, "x").reference(), "C2");
    }
}
