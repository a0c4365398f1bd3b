//! Pattern-based rendering of log records
//!
//! A pattern is parsed once into a sequence of tokens; rendering a record is a
//! pure function of those tokens and the record.
//!
//! | Flag | Output |
//! |------|--------|
//! | `%Y` `%C` `%y` | year, two-digit century, two-digit year |
//! | `%m` `%d` | month, day (zero padded) |
//! | `%H` `%I` `%M` `%S` `%p` | hour (24h), hour (12h), minute, second, AM/PM |
//! | `%e` `%f` `%F` | milliseconds, microseconds, nanoseconds part |
//! | `%a` `%A` `%b` `%B` | weekday and month names, short and full |
//! | `%c` | `Thu Aug 23 15:35:46 2014` |
//! | `%D` `%T` | `08/23/14`, `15:35:46` |
//! | `%z` `%E` | UTC offset, seconds since the epoch |
//! | `%P` `%t` | process id, thread id |
//! | `%n` | logger name |
//! | `%l` `%L` | level name, short level name |
//! | `%^` `%$` | start and end of the colored range |
//! | `%v` | message |
//! | `%+` | [`DEFAULT_PATTERN`] |
//! | `%%` | a literal `%` |
//!
//! Unknown flags are emitted verbatim.

use super::error::{LoggerError, Result};
use super::log_record::LogRecord;
use chrono::{DateTime, Datelike, FixedOffset, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::ops::Range;

/// Pattern used when none is configured, and the expansion of `%+`
pub const DEFAULT_PATTERN: &str = "[%Y-%m-%d %H:%M:%S.%e] [%n] [%^%l%$] %v";

const WEEKDAYS_SHORT: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const WEEKDAYS_FULL: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const MONTHS_FULL: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Clock used when rendering time fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternTimeType {
    #[default]
    Local,
    Utc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Year,
    Century,
    ShortYear,
    Month,
    Day,
    Hour,
    Hour12,
    Minute,
    Second,
    AmPm,
    Millis,
    Micros,
    Nanos,
    WeekdayShort,
    WeekdayFull,
    MonthShort,
    MonthFull,
    DateTime,
    ShortDate,
    Clock,
    UtcOffset,
    Epoch,
    ProcessId,
    ThreadId,
    LoggerName,
    Level,
    ShortLevel,
    ColorStart,
    ColorEnd,
    Message,
}

/// Parsed pattern ready to render records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternFormatter {
    pattern: String,
    time_type: PatternTimeType,
    tokens: Vec<Token>,
}

impl PatternFormatter {
    /// Parse `pattern`, rendering time fields in local time
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidPattern`] for a misplaced `%$` or a nested `%^`.
    pub fn new(pattern: &str) -> Result<Self> {
        Self::with_time_type(pattern, PatternTimeType::Local)
    }

    /// Parse `pattern` with an explicit clock for time fields
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidPattern`] for a misplaced `%$` or a nested `%^`.
    pub fn with_time_type(pattern: &str, time_type: PatternTimeType) -> Result<Self> {
        let mut tokens = Vec::new();
        parse_into(pattern, &mut tokens);
        validate_color_range(pattern, &tokens)?;

        Ok(Self {
            pattern: pattern.to_string(),
            time_type,
            tokens,
        })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn time_type(&self) -> PatternTimeType {
        self.time_type
    }

    /// Render `record` into `buf`, returning the colored byte range if the
    /// pattern has one
    pub fn format(&self, record: &LogRecord, buf: &mut String) -> Option<Range<usize>> {
        let time: DateTime<FixedOffset> = match self.time_type {
            PatternTimeType::Local => record.timestamp.with_timezone(&Local).fixed_offset(),
            PatternTimeType::Utc => record.timestamp.fixed_offset(),
        };
        let nanos = time.nanosecond() % 1_000_000_000;

        let mut color_start = None;
        let mut color_end = None;

        // Writing into a String cannot fail, so results are ignored below
        for token in &self.tokens {
            match token {
                Token::Literal(text) => buf.push_str(text),
                Token::Year => {
                    let _ = write!(buf, "{:04}", time.year());
                }
                Token::Century => {
                    let _ = write!(buf, "{:02}", time.year() / 100);
                }
                Token::ShortYear => {
                    let _ = write!(buf, "{:02}", time.year() % 100);
                }
                Token::Month => {
                    let _ = write!(buf, "{:02}", time.month());
                }
                Token::Day => {
                    let _ = write!(buf, "{:02}", time.day());
                }
                Token::Hour => {
                    let _ = write!(buf, "{:02}", time.hour());
                }
                Token::Hour12 => {
                    let _ = write!(buf, "{:02}", time.hour12().1);
                }
                Token::Minute => {
                    let _ = write!(buf, "{:02}", time.minute());
                }
                Token::Second => {
                    let _ = write!(buf, "{:02}", time.second());
                }
                Token::AmPm => buf.push_str(if time.hour12().0 { "PM" } else { "AM" }),
                Token::Millis => {
                    let _ = write!(buf, "{:03}", nanos / 1_000_000);
                }
                Token::Micros => {
                    let _ = write!(buf, "{:06}", nanos / 1_000);
                }
                Token::Nanos => {
                    let _ = write!(buf, "{:09}", nanos);
                }
                Token::WeekdayShort => {
                    buf.push_str(WEEKDAYS_SHORT[time.weekday().num_days_from_monday() as usize]);
                }
                Token::WeekdayFull => {
                    buf.push_str(WEEKDAYS_FULL[time.weekday().num_days_from_monday() as usize]);
                }
                Token::MonthShort => buf.push_str(MONTHS_SHORT[time.month0() as usize]),
                Token::MonthFull => buf.push_str(MONTHS_FULL[time.month0() as usize]),
                Token::DateTime => {
                    let _ = write!(
                        buf,
                        "{} {} {:02} {:02}:{:02}:{:02} {:04}",
                        WEEKDAYS_SHORT[time.weekday().num_days_from_monday() as usize],
                        MONTHS_SHORT[time.month0() as usize],
                        time.day(),
                        time.hour(),
                        time.minute(),
                        time.second(),
                        time.year()
                    );
                }
                Token::ShortDate => {
                    let _ = write!(
                        buf,
                        "{:02}/{:02}/{:02}",
                        time.month(),
                        time.day(),
                        time.year() % 100
                    );
                }
                Token::Clock => {
                    let _ = write!(
                        buf,
                        "{:02}:{:02}:{:02}",
                        time.hour(),
                        time.minute(),
                        time.second()
                    );
                }
                Token::UtcOffset => {
                    let offset = time.offset().local_minus_utc();
                    let sign = if offset < 0 { '-' } else { '+' };
                    let minutes = offset.abs() / 60;
                    let _ = write!(buf, "{}{:02}:{:02}", sign, minutes / 60, minutes % 60);
                }
                Token::Epoch => {
                    let _ = write!(buf, "{}", time.timestamp());
                }
                Token::ProcessId => {
                    let _ = write!(buf, "{}", record.process_id);
                }
                Token::ThreadId => buf.push_str(&record.thread_id),
                Token::LoggerName => buf.push_str(&record.logger_name),
                Token::Level => buf.push_str(record.level.to_str()),
                Token::ShortLevel => buf.push_str(record.level.short_str()),
                Token::ColorStart => color_start = Some(buf.len()),
                Token::ColorEnd => color_end = Some(buf.len()),
                Token::Message => buf.push_str(&record.message),
            }
        }

        color_start.map(|start| start..color_end.unwrap_or(buf.len()))
    }

    /// Render `record` into a fresh string
    #[must_use]
    pub fn format_to_string(&self, record: &LogRecord) -> String {
        let mut buf = String::with_capacity(self.pattern.len() + record.message.len() + 32);
        self.format(record, &mut buf);
        buf
    }
}

impl Default for PatternFormatter {
    fn default() -> Self {
        let mut tokens = Vec::new();
        parse_into(DEFAULT_PATTERN, &mut tokens);
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            time_type: PatternTimeType::Local,
            tokens,
        }
    }
}

fn push_literal(tokens: &mut Vec<Token>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Token::Literal(last)) = tokens.last_mut() {
        last.push_str(text);
    } else {
        tokens.push(Token::Literal(text.to_string()));
    }
}

fn parse_into(pattern: &str, tokens: &mut Vec<Token>) {
    let mut chars = pattern.char_indices().peekable();
    let mut literal_start = 0;

    while let Some((pos, c)) = chars.next() {
        if c != '%' {
            continue;
        }
        push_literal(tokens, &pattern[literal_start..pos]);

        let Some((flag_pos, flag)) = chars.next() else {
            // trailing '%'
            push_literal(tokens, "%");
            literal_start = pattern.len();
            break;
        };
        literal_start = flag_pos + flag.len_utf8();

        let token = match flag {
            'Y' => Token::Year,
            'C' => Token::Century,
            'y' => Token::ShortYear,
            'm' => Token::Month,
            'd' => Token::Day,
            'H' => Token::Hour,
            'I' => Token::Hour12,
            'M' => Token::Minute,
            'S' => Token::Second,
            'p' => Token::AmPm,
            'e' => Token::Millis,
            'f' => Token::Micros,
            'F' => Token::Nanos,
            'a' => Token::WeekdayShort,
            'A' => Token::WeekdayFull,
            'b' => Token::MonthShort,
            'B' => Token::MonthFull,
            'c' => Token::DateTime,
            'D' => Token::ShortDate,
            'T' => Token::Clock,
            'z' => Token::UtcOffset,
            'E' => Token::Epoch,
            'P' => Token::ProcessId,
            't' => Token::ThreadId,
            'n' => Token::LoggerName,
            'l' => Token::Level,
            'L' => Token::ShortLevel,
            '^' => Token::ColorStart,
            '$' => Token::ColorEnd,
            'v' => Token::Message,
            '+' => {
                parse_into(DEFAULT_PATTERN, tokens);
                continue;
            }
            '%' => {
                push_literal(tokens, "%");
                continue;
            }
            other => {
                push_literal(tokens, &pattern[pos..pos + 1 + other.len_utf8()]);
                continue;
            }
        };
        tokens.push(token);
    }

    push_literal(tokens, &pattern[literal_start..]);
}

fn validate_color_range(pattern: &str, tokens: &[Token]) -> Result<()> {
    let mut open = false;
    let mut seen = false;
    for token in tokens {
        match token {
            Token::ColorStart if open || seen => {
                return Err(LoggerError::invalid_pattern(
                    pattern,
                    "only one color range is supported",
                ));
            }
            Token::ColorStart => {
                open = true;
                seen = true;
            }
            Token::ColorEnd if !open => {
                return Err(LoggerError::invalid_pattern(
                    pattern,
                    "color range end without start",
                ));
            }
            Token::ColorEnd => open = false,
            _ => {}
        }
    }
    Ok(())
}
