//! Lazy conversion of scalar text into Rust types.
//!
//! Nothing is interpreted while parsing: a scalar only becomes a number, a
//! boolean or a duration when [`Value::to`] asks for one. Every conversion must
//! consume the whole text, otherwise it yields `None`.

use crate::value::Value;
use std::borrow::Cow;
use std::str::FromStr;
use std::time::Duration;

/// Types a [`Value`] can be converted into.
pub trait FromValue<'v>: Sized {
    fn from_value(value: &'v Value<'_>) -> Option<Self>;
}

impl<'v> FromValue<'v> for bool {
    fn from_value(value: &'v Value<'_>) -> Option<Self> {
        let text = value.as_str()?;
        if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("on") {
            Some(true)
        } else if text.eq_ignore_ascii_case("false") || text.eq_ignore_ascii_case("off") {
            Some(false)
        } else {
            None
        }
    }
}

fn parse_signed<T: FromStr>(text: &str) -> Option<T> {
    let digits = match text.strip_prefix('+') {
        Some(rest) if rest.starts_with(|c: char| c == '+' || c == '-') => return None,
        Some(rest) => rest,
        None => text,
    };
    digits.parse().ok()
}

fn parse_unsigned<T: FromStr>(text: &str, from_hex: fn(&str) -> Option<T>) -> Option<T> {
    let digits = match text.as_bytes().first()? {
        b'-' => return None,
        b'+' => &text[1..],
        _ => text,
    };
    if let Some(hex) = digits.strip_prefix("0x") {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        return from_hex(hex);
    }
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

macro_rules! signed_from_value {
    ($($ty:ty),*) => {$(
        impl<'v> FromValue<'v> for $ty {
            fn from_value(value: &'v Value<'_>) -> Option<Self> {
                parse_signed(value.as_str()?)
            }
        }
    )*};
}

macro_rules! unsigned_from_value {
    ($($ty:ty),*) => {$(
        impl<'v> FromValue<'v> for $ty {
            fn from_value(value: &'v Value<'_>) -> Option<Self> {
                parse_unsigned(value.as_str()?, |hex| <$ty>::from_str_radix(hex, 16).ok())
            }
        }
    )*};
}

macro_rules! float_from_value {
    ($($ty:ty),*) => {$(
        impl<'v> FromValue<'v> for $ty {
            fn from_value(value: &'v Value<'_>) -> Option<Self> {
                parse_signed(value.as_str()?)
            }
        }
    )*};
}

signed_from_value!(i8, i16, i32, i64, i128, isize);
unsigned_from_value!(u8, u16, u32, u64, u128, usize);
float_from_value!(f32, f64);

impl<'v> FromValue<'v> for &'v str {
    fn from_value(value: &'v Value<'_>) -> Option<Self> {
        value.as_str()
    }
}

impl<'v> FromValue<'v> for String {
    fn from_value(value: &'v Value<'_>) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl<'v> FromValue<'v> for Cow<'v, str> {
    fn from_value(value: &'v Value<'_>) -> Option<Self> {
        value.as_str().map(Cow::Borrowed)
    }
}

impl<'v, T: FromValue<'v>> FromValue<'v> for Vec<T> {
    fn from_value(value: &'v Value<'_>) -> Option<Self> {
        value.as_array()?.iter().map(T::from_value).collect()
    }
}

impl<'v> FromValue<'v> for Duration {
    /// `H:M:S`, or a count followed by a unit such as `30 seconds` or `2 weeks`.
    fn from_value(value: &'v Value<'_>) -> Option<Self> {
        let text = value.as_str()?;
        if text.contains(':') {
            let mut parts = text.split(':').map(parse_digits);
            let (hours, minutes, seconds) = (parts.next()??, parts.next()??, parts.next()??);
            if parts.next().is_some() {
                return None;
            }
            let total = hours
                .checked_mul(3600)?
                .checked_add(minutes.checked_mul(60)?)?
                .checked_add(seconds)?;
            return Some(Duration::from_secs(total));
        }

        let split = text.find(|c: char| !c.is_ascii_digit())?;
        let count = parse_digits(&text[..split])?;
        let unit_secs = match text[split..].trim_start() {
            "microsecond" | "microseconds" => return Some(Duration::from_micros(count)),
            "millisecond" | "milliseconds" => return Some(Duration::from_millis(count)),
            "second" | "seconds" => 1,
            "minute" | "minutes" => 60,
            "hour" | "hours" => 3600,
            "day" | "days" => 86_400,
            "week" | "weeks" => 604_800,
            _ => return None,
        };
        count.checked_mul(unit_secs).map(Duration::from_secs)
    }
}

fn parse_digits(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(feature = "datetime")]
mod datetime {
    use super::FromValue;
    use crate::value::Value;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

    fn parse_date(text: &str) -> Option<NaiveDate> {
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
    }

    impl<'v> FromValue<'v> for NaiveDate {
        fn from_value(value: &'v Value<'_>) -> Option<Self> {
            parse_date(value.as_str()?)
        }
    }

    impl<'v> FromValue<'v> for NaiveDateTime {
        /// A date, optionally followed by a space or `T` and `H:M:S`. A bare date is midnight.
        fn from_value(value: &'v Value<'_>) -> Option<Self> {
            let text = value.as_str()?;
            let Some(split) = text.find(|c: char| c == ' ' || c == 'T') else {
                return parse_date(text).map(|date| date.and_time(NaiveTime::default()));
            };
            let date = parse_date(&text[..split])?;
            let time = NaiveTime::parse_from_str(text[split + 1..].trim_start(), "%H:%M:%S").ok()?;
            Some(date.and_time(time))
        }
    }

    impl<'v> FromValue<'v> for DateTime<Utc> {
        fn from_value(value: &'v Value<'_>) -> Option<Self> {
            NaiveDateTime::from_value(value).map(|naive| naive.and_utc())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(text: &str) -> Value<'_> {
        Value::make_scalar(text)
    }

    #[test]
    fn test_booleans() {
        for text in ["true", "TRUE", "True", "on", "ON", "oN"] {
            assert_eq!(scalar(text).to::<bool>(), Some(true), "{text}");
        }
        for text in ["false", "FALSE", "False", "off", "OFF", "Off"] {
            assert_eq!(scalar(text).to::<bool>(), Some(false), "{text}");
        }
        for text in ["", "yes", "1", "tru", "truee", "o", "onn"] {
            assert_eq!(scalar(text).to::<bool>(), None, "{text}");
        }
    }

    #[test]
    fn test_signed() {
        assert_eq!(scalar("-2147483648").to::<i32>(), Some(i32::MIN));
        assert_eq!(scalar("+2147483647").to::<i32>(), Some(i32::MAX));
        assert_eq!(scalar("2147483648").to::<i32>(), None);
        assert_eq!(scalar("0xFCED").to::<i32>(), None);
        assert_eq!(scalar("-9223372036854775808").to::<i64>(), Some(i64::MIN));
        assert_eq!(scalar("9223372036854775807").to::<i64>(), Some(i64::MAX));
        for text in ["", "+", "-", "++1", "+-1", "1.5", "12abc", " 1"] {
            assert_eq!(scalar(text).to::<i64>(), None, "{text}");
        }
    }

    #[test]
    fn test_unsigned() {
        assert_eq!(scalar("4294967295").to::<u32>(), Some(u32::MAX));
        assert_eq!(scalar("0xFCED").to::<u32>(), Some(0xFCED));
        assert_eq!(scalar("+7").to::<u32>(), Some(7));
        assert_eq!(scalar("0").to::<u8>(), Some(0));
        assert_eq!(scalar("0x").to::<u32>(), None);
        assert_eq!(scalar("0x+1").to::<u32>(), None);
        assert_eq!(scalar("0xG1").to::<u32>(), None);
        assert_eq!(scalar("-1").to::<u32>(), None);
        assert_eq!(scalar("-0").to::<u32>(), None);
        assert_eq!(scalar("256").to::<u8>(), None);
        assert_eq!(scalar("").to::<u64>(), None);
        assert_eq!(scalar("++1").to::<u64>(), None);
    }

    #[test]
    fn test_floats() {
        assert_eq!(scalar("-3.14E+2").to::<f64>(), Some(-314.0));
        assert_eq!(scalar("+0.5").to::<f64>(), Some(0.5));
        assert_eq!(scalar("1e3").to::<f32>(), Some(1000.0));
        assert_eq!(scalar("2").to::<f64>(), Some(2.0));
        for text in ["", "+", "1.5.1", "++1", "1,5", "abc"] {
            assert_eq!(scalar(text).to::<f64>(), None, "{text}");
        }
    }

    #[test]
    fn test_strings() {
        assert_eq!(scalar("foo' bar'").to::<String>().as_deref(), Some("foo' bar'"));
        assert_eq!(scalar("").to::<&str>(), Some(""));
        assert_eq!(scalar("x").to::<Cow<str>>(), Some(Cow::Borrowed("x")));
        assert_eq!(Value::make_array().to::<String>(), None);
        assert_eq!(Value::None.to::<&str>(), None);
    }

    #[test]
    fn test_non_scalars_do_not_convert() {
        assert_eq!(Value::None.to::<bool>(), None);
        assert_eq!(Value::make_table().to::<i32>(), None);
        assert_eq!(Value::make_array().to::<f64>(), None);
    }

    #[test]
    fn test_vectors() {
        let numbers: Value = ["1", "2", "3"].into_iter().map(Value::from).collect();
        assert_eq!(numbers.to::<Vec<i32>>(), Some(vec![1, 2, 3]));
        assert_eq!(numbers.to::<Vec<String>>().map(|v| v.len()), Some(3));

        let mixed: Value = ["1", "two"].into_iter().map(Value::from).collect();
        assert_eq!(mixed.to::<Vec<i32>>(), None);
        assert_eq!(mixed.to::<Vec<&str>>(), Some(vec!["1", "two"]));

        assert_eq!(Value::make_array().to::<Vec<bool>>(), Some(vec![]));
        assert_eq!(scalar("1").to::<Vec<i32>>(), None);

        let matrix: Value = [numbers.clone(), numbers].into_iter().collect();
        assert_eq!(matrix.to::<Vec<Vec<u8>>>(), Some(vec![vec![1, 2, 3], vec![1, 2, 3]]));
    }

    #[test]
    fn test_or() {
        assert_eq!(scalar("12").or(0i32), 12);
        assert_eq!(scalar("twelve").or(0i32), 0);
        assert_eq!(Value::None.or("fallback"), "fallback");
        assert_eq!(Value::None.or(vec![-1]), vec![-1]);
    }

    #[test]
    fn test_durations() {
        assert_eq!(scalar("01:02:03").to::<Duration>(), Some(Duration::from_secs(3723)));
        assert_eq!(scalar("0:0:5").to::<Duration>(), Some(Duration::from_secs(5)));
        assert_eq!(scalar("250 milliseconds").to::<Duration>(), Some(Duration::from_millis(250)));
        assert_eq!(scalar("1 microsecond").to::<Duration>(), Some(Duration::from_micros(1)));
        assert_eq!(scalar("30 seconds").to::<Duration>(), Some(Duration::from_secs(30)));
        assert_eq!(scalar("5minutes").to::<Duration>(), Some(Duration::from_secs(300)));
        assert_eq!(scalar("2 hours").to::<Duration>(), Some(Duration::from_secs(7200)));
        assert_eq!(scalar("1 day").to::<Duration>(), Some(Duration::from_secs(86_400)));
        assert_eq!(scalar("2 weeks").to::<Duration>(), Some(Duration::from_secs(1_209_600)));
        for text in ["", "5", "five seconds", "5 fortnights", "1:2", "1:2:3:4", "1::3", "-5 seconds"] {
            assert_eq!(scalar(text).to::<Duration>(), None, "{text}");
        }
    }

    #[cfg(feature = "datetime")]
    #[test]
    fn test_dates() {
        use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(scalar("2024-02-29").to::<NaiveDate>(), Some(date));
        assert_eq!(scalar("2024/02/29").to::<NaiveDate>(), Some(date));
        assert_eq!(scalar("2023-02-29").to::<NaiveDate>(), None);

        let midnight = date.and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(scalar("2024-02-29").to::<NaiveDateTime>(), Some(midnight));

        let evening = date.and_hms_opt(18, 30, 5).unwrap();
        assert_eq!(scalar("2024-02-29 18:30:05").to::<NaiveDateTime>(), Some(evening));
        assert_eq!(scalar("2024/02/29T18:30:05").to::<NaiveDateTime>(), Some(evening));
        assert_eq!(
            scalar("2024-02-29 18:30:05").to::<DateTime<Utc>>(),
            Some(evening.and_utc())
        );
        assert_eq!(scalar("2024-02-29 25:00:00").to::<NaiveDateTime>(), None);
        assert_eq!(scalar("yesterday").to::<NaiveDateTime>(), None);
    }
}
