//! Scalar type registry: the ten primitive kinds a record field can hold,
//! their XSD names, and coercion between lexical text and typed values.
//!
//! | kind     | XSD            | Rust value          |
//! |----------|----------------|---------------------|
//! | Integer  | `xsd:integer`  | `i64`               |
//! | Decimal  | `xsd:decimal`  | `rust_decimal::Decimal` |
//! | Double   | `xsd:double`   | `f64`               |
//! | Float    | `xsd:float`    | `f32`               |
//! | Duration | `xsd:duration` | lexical text        |
//! | Date     | `xsd:date`     | lexical text        |
//! | Time     | `xsd:time`     | lexical text        |
//! | DateTime | `xsd:dateTime` | lexical text        |
//! | String   | `xsd:string`   | `String`            |
//! | Boolean  | `xsd:boolean`  | `bool`              |

use crate::{MarshalError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Prefix bound to the XML Schema namespace in every generated document.
pub const XSD_PREFIX: &str = "xsd";

/// The XML Schema namespace URI.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

macro_rules! primitive {
    ($const_name:ident: $xsd_type:expr) => {
        pub const $const_name: &str = concat!("xsd:", $xsd_type);
    };

    ({$($const_name:ident: $xsd_type:expr),*}) => {
        $(
            primitive!($const_name: $xsd_type);
        )*
    }
}

primitive!({
    INTEGER: "integer",
    DECIMAL: "decimal",
    DOUBLE: "double",
    FLOAT: "float",
    DURATION: "duration",
    DATE: "date",
    TIME: "time",
    DATETIME: "dateTime",
    STRING: "string",
    BOOLEAN: "boolean"
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Integer,
    Decimal,
    Double,
    Float,
    Duration,
    Date,
    Time,
    DateTime,
    String,
    Boolean,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 10] = [
        ScalarKind::Integer,
        ScalarKind::Decimal,
        ScalarKind::Double,
        ScalarKind::Float,
        ScalarKind::Duration,
        ScalarKind::Date,
        ScalarKind::Time,
        ScalarKind::DateTime,
        ScalarKind::String,
        ScalarKind::Boolean,
    ];

    /// Unprefixed XSD type name, e.g. `integer`.
    pub fn xsd_name(self) -> &'static str {
        // strip the "xsd:" of the qualified constant
        &self.qualified_name()[XSD_PREFIX.len() + 1..]
    }

    /// XSD type name with the `xsd:` prefix, e.g. `xsd:integer`.
    pub fn qualified_name(self) -> &'static str {
        match self {
            ScalarKind::Integer => INTEGER,
            ScalarKind::Decimal => DECIMAL,
            ScalarKind::Double => DOUBLE,
            ScalarKind::Float => FLOAT,
            ScalarKind::Duration => DURATION,
            ScalarKind::Date => DATE,
            ScalarKind::Time => TIME,
            ScalarKind::DateTime => DATETIME,
            ScalarKind::String => STRING,
            ScalarKind::Boolean => BOOLEAN,
        }
    }

    /// Resolve an XSD type reference such as `xsd:integer`, `xs:string` or
    /// a bare `boolean`. Both `dateTime` and `datetime` map to DateTime.
    pub fn from_xsd_name(name: &str) -> Option<Self> {
        let local = match name.split_once(':') {
            Some((prefix, local)) if prefix == XSD_PREFIX || prefix == "xs" => local,
            Some(_) => return None,
            None => name,
        };
        if local == "datetime" {
            return Some(ScalarKind::DateTime);
        }
        Self::ALL.into_iter().find(|kind| kind.xsd_name() == local)
    }

    /// Whether values of this kind are kept as opaque lexical text.
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            ScalarKind::Duration | ScalarKind::Date | ScalarKind::Time | ScalarKind::DateTime
        )
    }

    /// Parse element text into a typed value.
    ///
    /// Whitespace around non-string lexical forms is ignored; strings are
    /// taken verbatim, so the empty string is a valid String value.
    pub fn coerce(self, text: &str) -> Result<ScalarValue> {
        let trimmed = text.trim();
        let fail = || MarshalError::coercion(self, text);

        let value = match self {
            ScalarKind::String => ScalarValue::String(text.to_string()),
            ScalarKind::Integer => ScalarValue::Integer(trimmed.parse().map_err(|_| fail())?),
            ScalarKind::Decimal => {
                ScalarValue::Decimal(Decimal::from_str(trimmed).map_err(|_| fail())?)
            }
            ScalarKind::Double => ScalarValue::Double(parse_double(trimmed).ok_or_else(fail)?),
            ScalarKind::Float => ScalarValue::Float(parse_float(trimmed).ok_or_else(fail)?),
            ScalarKind::Boolean => ScalarValue::Boolean(match trimmed {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return Err(fail()),
            }),
            ScalarKind::Duration
            | ScalarKind::Date
            | ScalarKind::Time
            | ScalarKind::DateTime => {
                if trimmed.is_empty() {
                    return Err(fail());
                }
                ScalarValue::temporal(self, trimmed)
            }
        };
        Ok(value)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qualified_name())
    }
}

/// XSD special floating point literals.
fn special_float(text: &str) -> Option<f64> {
    match text {
        "INF" | "+INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => None,
    }
}

// Rust also accepts "inf", "infinity" and "nan", which XSD does not
fn is_numeric_literal(text: &str) -> bool {
    !text
        .chars()
        .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
}

fn parse_double(text: &str) -> Option<f64> {
    special_float(text).or_else(|| {
        is_numeric_literal(text)
            .then(|| text.parse().ok())
            .flatten()
    })
}

fn parse_float(text: &str) -> Option<f32> {
    match special_float(text) {
        Some(special) => Some(special as f32),
        None => is_numeric_literal(text)
            .then(|| text.parse().ok())
            .flatten(),
    }
}

fn render_double(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "INF".to_string()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        value.to_string()
    }
}

/// A typed scalar value. Temporal kinds carry their lexical text unchanged.
#[derive(Clone, Debug)]
pub enum ScalarValue {
    Integer(i64),
    Decimal(Decimal),
    Double(f64),
    Float(f32),
    Duration(String),
    Date(String),
    Time(String),
    DateTime(String),
    String(String),
    Boolean(bool),
}

impl ScalarValue {
    fn temporal(kind: ScalarKind, text: &str) -> Self {
        let text = text.to_string();
        match kind {
            ScalarKind::Duration => ScalarValue::Duration(text),
            ScalarKind::Date => ScalarValue::Date(text),
            ScalarKind::Time => ScalarValue::Time(text),
            _ => ScalarValue::DateTime(text),
        }
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Integer(_) => ScalarKind::Integer,
            ScalarValue::Decimal(_) => ScalarKind::Decimal,
            ScalarValue::Double(_) => ScalarKind::Double,
            ScalarValue::Float(_) => ScalarKind::Float,
            ScalarValue::Duration(_) => ScalarKind::Duration,
            ScalarValue::Date(_) => ScalarKind::Date,
            ScalarValue::Time(_) => ScalarKind::Time,
            ScalarValue::DateTime(_) => ScalarKind::DateTime,
            ScalarValue::String(_) => ScalarKind::String,
            ScalarValue::Boolean(_) => ScalarKind::Boolean,
        }
    }

    /// Canonical, locale-independent lexical form.
    ///
    /// `kind().coerce(&value.render())` yields a value equal to `value`.
    pub fn render(&self) -> String {
        match self {
            ScalarValue::Integer(i) => i.to_string(),
            ScalarValue::Decimal(d) => d.to_string(),
            ScalarValue::Double(d) => render_double(*d),
            ScalarValue::Float(f) => {
                if f.is_finite() {
                    f.to_string()
                } else {
                    render_double(*f as f64)
                }
            }
            ScalarValue::Boolean(b) => b.to_string(),
            ScalarValue::Duration(s)
            | ScalarValue::Date(s)
            | ScalarValue::Time(s)
            | ScalarValue::DateTime(s)
            | ScalarValue::String(s) => s.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Duration(s)
            | ScalarValue::Date(s)
            | ScalarValue::Time(s)
            | ScalarValue::DateTime(s)
            | ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// floats compare by bit pattern so NaN round-trips as equal to itself
impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(l), Self::Integer(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r && l.scale() == r.scale(),
            (Self::Double(l), Self::Double(r)) => l.to_bits() == r.to_bits(),
            (Self::Float(l), Self::Float(r)) => l.to_bits() == r.to_bits(),
            (Self::Duration(l), Self::Duration(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::DateTime(l), Self::DateTime(r)) => l == r,
            (Self::String(l), Self::String(r)) => l == r,
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ScalarValue::Integer(i) => i.hash(state),
            ScalarValue::Decimal(d) => d.hash(state),
            ScalarValue::Double(d) => d.to_bits().hash(state),
            ScalarValue::Float(f) => f.to_bits().hash(state),
            ScalarValue::Boolean(b) => b.hash(state),
            ScalarValue::Duration(s)
            | ScalarValue::Date(s)
            | ScalarValue::Time(s)
            | ScalarValue::DateTime(s)
            | ScalarValue::String(s) => s.hash(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: ScalarValue) {
        let text = value.render();
        let back = value.kind().coerce(&text).unwrap();
        assert_eq!(back, value, "round trip through {:?}", text);
    }

    #[test]
    fn test_xsd_names_are_stable() {
        assert_eq!(ScalarKind::Integer.xsd_name(), "integer");
        assert_eq!(ScalarKind::DateTime.xsd_name(), "dateTime");
        assert_eq!(ScalarKind::Boolean.qualified_name(), "xsd:boolean");
        for kind in ScalarKind::ALL {
            assert_eq!(ScalarKind::from_xsd_name(kind.qualified_name()), Some(kind));
        }
    }

    #[test]
    fn test_from_xsd_name_variants() {
        assert_eq!(ScalarKind::from_xsd_name("xs:string"), Some(ScalarKind::String));
        assert_eq!(ScalarKind::from_xsd_name("xsd:datetime"), Some(ScalarKind::DateTime));
        assert_eq!(ScalarKind::from_xsd_name("decimal"), Some(ScalarKind::Decimal));
        assert_eq!(ScalarKind::from_xsd_name("tns:Person"), None);
        assert_eq!(ScalarKind::from_xsd_name("xsd:anyURI"), None);
    }

    #[test]
    fn test_integer_round_trip_boundaries() {
        for i in [0, -1, 38, i64::MAX, i64::MIN] {
            round_trip(ScalarValue::Integer(i));
        }
    }

    #[test]
    fn test_decimal_keeps_precision() {
        for text in ["0", "-12.50", "79228162514264337593543950335", "0.0000000000000000000000000001"] {
            round_trip(ScalarValue::Decimal(Decimal::from_str(text).unwrap()));
        }
        let value = ScalarKind::Decimal.coerce("-12.50").unwrap();
        assert_eq!(value.render(), "-12.50");
    }

    #[test]
    fn test_floating_round_trip() {
        for d in [0.0, -0.0, 1.5, -3.25e-10, f64::MAX, f64::MIN_POSITIVE, f64::INFINITY, f64::NAN] {
            round_trip(ScalarValue::Double(d));
        }
        for f in [0.0f32, -7.125, f32::MAX, f32::NEG_INFINITY] {
            round_trip(ScalarValue::Float(f));
        }
        assert_eq!(ScalarValue::Double(f64::NEG_INFINITY).render(), "-INF");
    }

    #[test]
    fn test_string_and_boolean_round_trip() {
        round_trip(ScalarValue::String(String::new()));
        round_trip(ScalarValue::String("  padded  ".to_string()));
        round_trip(ScalarValue::Boolean(true));
        round_trip(ScalarValue::Boolean(false));
        assert_eq!(ScalarKind::Boolean.coerce("1").unwrap().as_bool(), Some(true));
        assert_eq!(ScalarKind::Boolean.coerce(" false ").unwrap().as_bool(), Some(false));
        assert_eq!(ScalarValue::String("true".to_string()).as_bool(), None);
    }

    #[test]
    fn test_temporal_text_passes_through() {
        round_trip(ScalarValue::Date("2011-03-04".to_string()));
        round_trip(ScalarValue::Duration("P1Y2M".to_string()));
        assert!(ScalarKind::Time.coerce("   ").is_err());

        let temporal: Vec<_> = ScalarKind::ALL
            .into_iter()
            .filter(|kind| kind.is_temporal())
            .collect();
        assert_eq!(
            temporal,
            vec![
                ScalarKind::Duration,
                ScalarKind::Date,
                ScalarKind::Time,
                ScalarKind::DateTime
            ]
        );
        for kind in temporal {
            assert_eq!(kind.coerce(" x ").unwrap().as_str(), Some("x"));
        }
    }

    #[test]
    fn test_coercion_errors() {
        assert_eq!(
            ScalarKind::Integer.coerce("forty"),
            Err(MarshalError::coercion(ScalarKind::Integer, "forty"))
        );
        assert!(ScalarKind::Double.coerce("infinity").is_err());
        assert!(ScalarKind::Boolean.coerce("yes").is_err());
        assert!(ScalarKind::Decimal.coerce("").is_err());
    }
}
