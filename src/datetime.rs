use crate::PdfObject;

#[cfg(feature = "chrono")]
mod chrono_impl {
    use std::time::SystemTime;

    use chrono::prelude::*;

    use crate::Value;

    impl From<DateTime<Utc>> for Value<'_> {
        fn from(date: DateTime<Utc>) -> Self {
            Value::Date(date)
        }
    }

    impl From<DateTime<Local>> for Value<'_> {
        fn from(date: DateTime<Local>) -> Self {
            Value::Date(date.with_timezone(&Utc))
        }
    }

    impl From<SystemTime> for Value<'_> {
        fn from(time: SystemTime) -> Self {
            Value::Date(DateTime::<Utc>::from(time))
        }
    }

    impl TryFrom<super::DateString> for DateTime<FixedOffset> {
        type Error = chrono::format::ParseError;

        fn try_from(value: super::DateString) -> Result<DateTime<FixedOffset>, Self::Error> {
            let from_date = |date: NaiveDate| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).fixed_offset();

            DateTime::parse_from_str(&value.0, "%Y%m%d%H%M%S%#z")
                .or_else(|_| DateTime::parse_from_str(&value.0, "%Y%m%d%H%M%#z"))
                .or_else(|_| NaiveDate::parse_from_str(&value.0, "%Y%m%d").map(from_date))
        }
    }

    impl TryFrom<super::DateString> for DateTime<Local> {
        type Error = chrono::format::ParseError;

        fn try_from(value: super::DateString) -> Result<DateTime<Local>, Self::Error> {
            DateTime::<FixedOffset>::try_from(value).map(|date| date.with_timezone(&Local))
        }
    }

    /// Date string stored for a date value. Times are written in UTC.
    pub(crate) fn format_date(date: &DateTime<Utc>) -> String {
        date.format("D:%Y%m%d%H%M%SZ").to_string()
    }
}

#[cfg(feature = "chrono")]
pub(crate) use chrono_impl::format_date;

/// The digits and offset of a PDF date string, with the `D:` prefix and the
/// apostrophes removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateString(String);

impl DateString {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PdfObject {
    /// Reads a string object as a date string; `None` for other objects.
    pub fn as_datetime(&self) -> Option<DateString> {
        let bytes = self.as_string_bytes().ok()?;
        let bytes = bytes.strip_prefix(b"D:").unwrap_or(&bytes);
        String::from_utf8(bytes.iter().filter(|&&b| b != b'\'').copied().collect())
            .ok()
            .map(DateString)
    }
}
