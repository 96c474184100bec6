use crate::{RecordRef, ScalarKind};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper occurrence bound of a repeated element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    pub fn allows(&self, count: usize) -> bool {
        match self {
            MaxOccurs::Bounded(max) => count <= *max as usize,
            MaxOccurs::Unbounded => true,
        }
    }
}

impl fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxOccurs::Bounded(max) => write!(f, "{}", max),
            MaxOccurs::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// `minOccurs`/`maxOccurs` pair of a repeated element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurs {
    pub min: u32,
    pub max: MaxOccurs,
}

impl Occurs {
    pub fn new(min: u32, max: MaxOccurs) -> Self {
        Self { min, max }
    }

    pub fn unbounded(min: u32) -> Self {
        Self::new(min, MaxOccurs::Unbounded)
    }

    /// Whether some element count satisfies both bounds. `maxOccurs="0"`
    /// and `minOccurs` above a bounded `maxOccurs` do not.
    pub fn is_satisfiable(&self) -> bool {
        match self.max {
            MaxOccurs::Bounded(max) => max > 0 && self.min <= max,
            MaxOccurs::Unbounded => true,
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::unbounded(0)
    }
}

/// Element type of a repeated field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementType {
    Scalar(ScalarKind),
    Record(RecordRef),
}

impl ElementType {
    /// XSD type reference, `xsd:...` for scalars and `tns:...` for records.
    pub fn type_ref(&self) -> String {
        match self {
            ElementType::Scalar(kind) => kind.qualified_name().to_string(),
            ElementType::Record(record) => format!("tns:{}", record.name()),
        }
    }
}

/// What a field holds. Resolved once when the record type is declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Record(RecordRef),
    Repeated { element: ElementType, occurs: Occurs },
}

impl FieldKind {
    pub fn repeated(element: ElementType, occurs: Occurs) -> Self {
        FieldKind::Repeated { element, occurs }
    }

    pub fn is_repeated(&self) -> bool {
        matches!(self, FieldKind::Repeated { .. })
    }

    /// Nested record type referenced by this field, directly or as the
    /// repeated element type.
    pub fn nested_record(&self) -> Option<&RecordRef> {
        match self {
            FieldKind::Record(record) => Some(record),
            FieldKind::Repeated {
                element: ElementType::Record(record),
                ..
            } => Some(record),
            _ => None,
        }
    }
}

/// A named, typed slot of a record type.
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    /// optional scalar/record fields get `minOccurs="0"`
    optional: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
        }
    }

    pub fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(name, FieldKind::Scalar(kind))
    }

    pub fn record(name: impl Into<String>, record: RecordRef) -> Self {
        Self::new(name, FieldKind::Record(record))
    }

    pub fn repeated(name: impl Into<String>, element: ElementType, occurs: Occurs) -> Self {
        Self::new(name, FieldKind::repeated(element, occurs))
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Replace the occurrence bounds of a repeated field. No effect on other
    /// field kinds.
    pub fn with_occurs(mut self, min: Option<u32>, max: Option<MaxOccurs>) -> Self {
        if let FieldKind::Repeated { occurs, .. } = &mut self.kind {
            if let Some(min) = min {
                occurs.min = min;
            }
            if let Some(max) = max {
                occurs.max = max;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_occurs_only_touches_repeated_fields() {
        let scalar = FieldDescriptor::scalar("age", ScalarKind::Integer)
            .with_occurs(Some(2), Some(MaxOccurs::Bounded(3)));
        assert_eq!(scalar.kind(), &FieldKind::Scalar(ScalarKind::Integer));

        let tags = FieldDescriptor::repeated(
            "tags",
            ElementType::Scalar(ScalarKind::String),
            Occurs::default(),
        )
        .with_occurs(Some(1), None);
        assert_eq!(
            tags.kind(),
            &FieldKind::repeated(
                ElementType::Scalar(ScalarKind::String),
                Occurs::unbounded(1)
            )
        );
    }

    #[test]
    fn test_max_occurs_bounds() {
        assert!(MaxOccurs::Bounded(2).allows(2));
        assert!(!MaxOccurs::Bounded(2).allows(3));
        assert!(MaxOccurs::Unbounded.allows(usize::MAX));
        assert_eq!(MaxOccurs::Unbounded.to_string(), "unbounded");
    }

    #[test]
    fn test_unsatisfiable_occurs() {
        assert!(Occurs::new(2, MaxOccurs::Bounded(2)).is_satisfiable());
        assert!(Occurs::unbounded(7).is_satisfiable());
        assert!(!Occurs::new(0, MaxOccurs::Bounded(0)).is_satisfiable());
        assert!(!Occurs::new(3, MaxOccurs::Bounded(2)).is_satisfiable());
    }
}
