//! [`XmlScalar`] for std, `rust_decimal` and `chrono` types.

use crate::traits::wrong_scalar;
use crate::{impl_scalar_field, MarshalError, Result, ScalarKind, ScalarValue, XmlScalar};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! integer_scalar {
    ($($ty:ty),*) => {
        $(
            impl XmlScalar for $ty {
                const KIND: ScalarKind = ScalarKind::Integer;

                fn to_scalar(&self) -> ScalarValue {
                    ScalarValue::Integer(i64::from(*self))
                }

                fn from_scalar(value: &ScalarValue) -> Result<Self> {
                    match value {
                        ScalarValue::Integer(i) => <$ty>::try_from(*i)
                            .map_err(|_| MarshalError::coercion(ScalarKind::Integer, i.to_string())),
                        other => Err(wrong_scalar(ScalarKind::Integer, other)),
                    }
                }
            }
        )*
    };
}

integer_scalar!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! direct_scalar {
    ($($ty:ty => $kind:ident),*) => {
        $(
            impl XmlScalar for $ty {
                const KIND: ScalarKind = ScalarKind::$kind;

                fn to_scalar(&self) -> ScalarValue {
                    ScalarValue::$kind(self.clone())
                }

                fn from_scalar(value: &ScalarValue) -> Result<Self> {
                    match value {
                        ScalarValue::$kind(v) => Ok(v.clone()),
                        other => Err(wrong_scalar(ScalarKind::$kind, other)),
                    }
                }
            }
        )*
    };
}

direct_scalar!(
    Decimal => Decimal,
    f64 => Double,
    f32 => Float,
    String => String,
    bool => Boolean
);

/// Temporal values are carried as text; parse them on the way out.
fn temporal_text(kind: ScalarKind, value: &ScalarValue) -> Result<&str> {
    match value.as_str() {
        Some(text) if kind.is_temporal() && value.kind() == kind => Ok(text),
        _ => Err(wrong_scalar(kind, value)),
    }
}

impl XmlScalar for NaiveDate {
    const KIND: ScalarKind = ScalarKind::Date;

    fn to_scalar(&self) -> ScalarValue {
        ScalarValue::Date(self.format("%Y-%m-%d").to_string())
    }

    fn from_scalar(value: &ScalarValue) -> Result<Self> {
        let text = temporal_text(Self::KIND, value)?;
        NaiveDate::from_str(text).map_err(|_| MarshalError::coercion(Self::KIND, text))
    }
}

impl XmlScalar for NaiveTime {
    const KIND: ScalarKind = ScalarKind::Time;

    fn to_scalar(&self) -> ScalarValue {
        ScalarValue::Time(self.format("%H:%M:%S%.f").to_string())
    }

    fn from_scalar(value: &ScalarValue) -> Result<Self> {
        let text = temporal_text(Self::KIND, value)?;
        NaiveTime::from_str(text).map_err(|_| MarshalError::coercion(Self::KIND, text))
    }
}

impl XmlScalar for NaiveDateTime {
    const KIND: ScalarKind = ScalarKind::DateTime;

    fn to_scalar(&self) -> ScalarValue {
        ScalarValue::DateTime(self.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
    }

    fn from_scalar(value: &ScalarValue) -> Result<Self> {
        let text = temporal_text(Self::KIND, value)?;
        NaiveDateTime::from_str(text).map_err(|_| MarshalError::coercion(Self::KIND, text))
    }
}

impl XmlScalar for DateTime<Utc> {
    const KIND: ScalarKind = ScalarKind::DateTime;

    fn to_scalar(&self) -> ScalarValue {
        ScalarValue::DateTime(self.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    fn from_scalar(value: &ScalarValue) -> Result<Self> {
        let text = temporal_text(Self::KIND, value)?;
        // a dateTime without an offset is read as UTC
        DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| NaiveDateTime::from_str(text).map(|naive| naive.and_utc()))
            .map_err(|_| MarshalError::coercion(Self::KIND, text))
    }
}

/// An `xsd:duration` kept in its lexical form, e.g. `P1Y2M3DT4H5M6S`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct XsdDuration(String);

impl XsdDuration {
    /// Accepts any text of the form `[-]P...`.
    pub fn parse(text: &str) -> Result<Self> {
        let body = text.strip_prefix('-').unwrap_or(text);
        match body.strip_prefix('P') {
            Some(rest) if !rest.is_empty() => Ok(Self(text.to_string())),
            _ => Err(MarshalError::coercion(ScalarKind::Duration, text)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<std::time::Duration> for XsdDuration {
    fn from(duration: std::time::Duration) -> Self {
        let nanos = duration.subsec_nanos();
        if nanos == 0 {
            Self(format!("PT{}S", duration.as_secs()))
        } else {
            let fraction = format!("{:09}", nanos);
            Self(format!(
                "PT{}.{}S",
                duration.as_secs(),
                fraction.trim_end_matches('0')
            ))
        }
    }
}

impl fmt::Display for XsdDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl XmlScalar for XsdDuration {
    const KIND: ScalarKind = ScalarKind::Duration;

    fn to_scalar(&self) -> ScalarValue {
        ScalarValue::Duration(self.0.clone())
    }

    fn from_scalar(value: &ScalarValue) -> Result<Self> {
        Self::parse(temporal_text(Self::KIND, value)?)
    }
}

impl_scalar_field!(
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    Decimal,
    f64,
    f32,
    String,
    bool,
    NaiveDate,
    NaiveTime,
    NaiveDateTime,
    DateTime<Utc>,
    XsdDuration,
);
