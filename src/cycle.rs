//! Day-offset tokens ("D3 0540") anchored on a fixed seven-day cycle.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

/// Number of days in one rotation cycle.
pub const CYCLE_DAYS: i64 = 7;

/// Outcome of decoding a day token.
///
/// Decoding never fails: a malformed token resolves to the cycle base, but is
/// tagged so callers can warn without interrupting an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedTime {
    Exact(NaiveDateTime),
    Fallback(NaiveDateTime),
}

impl DecodedTime {
    pub fn instant(self) -> NaiveDateTime {
        match self {
            DecodedTime::Exact(instant) | DecodedTime::Fallback(instant) => instant,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, DecodedTime::Fallback(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeCycle {
    base: NaiveDateTime,
}

impl Default for TimeCycle {
    fn default() -> Self {
        Self::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }
}

impl TimeCycle {
    pub fn new(base_date: NaiveDate) -> Self {
        Self {
            base: base_date.and_time(NaiveTime::MIN),
        }
    }

    pub fn base(&self) -> NaiveDateTime {
        self.base
    }

    /// Exclusive end of the nominal cycle window.
    pub fn end(&self) -> NaiveDateTime {
        self.base + TimeDelta::days(CYCLE_DAYS)
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.base && instant < self.end()
    }

    /// Decode a `"D<day> <HHMM>"` token.
    ///
    /// Only the first digit run of the day part is read and day numbers are
    /// not wrapped, so `D9` lands eight days after the base. A colon in the
    /// time part is ignored. Anything unparseable yields
    /// [`DecodedTime::Fallback`] carrying the base instant.
    pub fn decode(&self, token: Option<&str>) -> DecodedTime {
        match token.and_then(|raw| self.try_decode(raw)) {
            Some(instant) => DecodedTime::Exact(instant),
            None => DecodedTime::Fallback(self.base),
        }
    }

    pub fn decode_str(&self, token: &str) -> DecodedTime {
        self.decode(Some(token))
    }

    fn try_decode(&self, raw: &str) -> Option<NaiveDateTime> {
        let mut parts = raw.split_whitespace();
        let day_part = parts.next()?;
        let time_part = parts.next()?.replace(':', "");

        let day_offset = match first_digit_run(day_part) {
            Some(digits) => digits.parse::<i64>().ok()? - 1,
            None => 0,
        };

        let hours = digits_only(time_part.get(..2)?)?;
        let minutes = digits_only(time_part.get(2..)?)?;

        let offset = TimeDelta::try_days(day_offset)?
            .checked_add(&TimeDelta::try_hours(hours)?)?
            .checked_add(&TimeDelta::try_minutes(minutes)?)?;
        self.base.checked_add_signed(offset)
    }

    /// Encode an instant as a day token, folding the day number into `D1..D7`.
    ///
    /// Lossy outside the cycle window: nine days after base encodes as `D3`.
    pub fn encode(&self, instant: NaiveDateTime) -> String {
        let day_num = elapsed_days(instant - self.base).rem_euclid(CYCLE_DAYS) + 1;
        format!("D{} {:02}{:02}", day_num, instant.hour(), instant.minute())
    }

    pub fn encode_opt(&self, instant: Option<NaiveDateTime>) -> String {
        instant.map(|i| self.encode(i)).unwrap_or_default()
    }

    /// Instant at clock `time` on 1-based cycle day `day`.
    pub fn at(&self, day: u32, time: NaiveTime) -> NaiveDateTime {
        let day_offset = i64::from(day.max(1)) - 1;
        (self.base + TimeDelta::days(day_offset)).date().and_time(time)
    }
}

/// Whole days in `elapsed`, rounded toward negative infinity.
fn elapsed_days(elapsed: TimeDelta) -> i64 {
    let days = elapsed.num_days();
    if elapsed < TimeDelta::zero() && elapsed != TimeDelta::days(days) {
        days - 1
    } else {
        days
    }
}

fn first_digit_run(input: &str) -> Option<&str> {
    let start = input.find(|c: char| c.is_ascii_digit())?;
    let rest = &input[start..];
    let len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..len])
}

fn digits_only(input: &str) -> Option<i64> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    input.parse().ok()
}

/// Decode with the default 2024-01-01 cycle.
pub fn decode_time(token: Option<&str>) -> DecodedTime {
    TimeCycle::default().decode(token)
}

/// Encode with the default 2024-01-01 cycle.
pub fn encode_time(instant: Option<NaiveDateTime>) -> String {
    TimeCycle::default().encode_opt(instant)
}
