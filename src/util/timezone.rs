use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Tz;
use time::{Date, Month, OffsetDateTime, UtcOffset};

pub fn localized_datetime(time: OffsetDateTime, tz: Tz) -> DateTime<Tz> {
    let utc = time.to_offset(UtcOffset::UTC);
    let seconds = utc.unix_timestamp();
    let nanos: u32 = utc.nanosecond();
    let datetime_utc = DateTime::<Utc>::from_timestamp(seconds, nanos)
        .or_else(|| DateTime::<Utc>::from_timestamp(seconds, 0))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    tz.from_utc_datetime(&datetime_utc.naive_utc())
}

/// Calendar date of `time` as seen in `tz`.
pub fn localized_date(time: OffsetDateTime, tz: Tz) -> Date {
    let localized = localized_datetime(time, tz);
    Month::try_from(localized.month() as u8)
        .ok()
        .and_then(|month| {
            let day = u8::try_from(localized.day()).ok()?;
            Date::from_calendar_date(localized.year(), month, day).ok()
        })
        .unwrap_or_else(|| time.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn date_shifts_across_midnight() {
        let at = datetime!(2024-01-01 02:00 UTC);
        assert_eq!(localized_date(at, chrono_tz::America::New_York), date!(2023 - 12 - 31));
        assert_eq!(localized_date(at, chrono_tz::UTC), date!(2024 - 01 - 01));
    }
}
