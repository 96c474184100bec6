use crate::xsd::XsdFragment;
use crate::{
    ElementType, FieldDescriptor, FieldKind, FieldValue, Item, MarshalError, Occurs,
    RecordInstance, RecordRef, Result, ScalarKind, ScalarValue,
};

/// A Rust type held as a single scalar value.
pub trait XmlScalar: Sized {
    const KIND: ScalarKind;

    fn to_scalar(&self) -> ScalarValue;

    fn from_scalar(value: &ScalarValue) -> Result<Self>;
}

/// A Rust type usable as one item of a repeated field (`Vec<T>`).
pub trait XmlElement: Sized {
    fn element_type() -> ElementType;

    fn to_item(&self) -> Item;

    fn from_item(item: &Item) -> Result<Self>;
}

/// A Rust type usable as a record field.
pub trait XmlField: Sized {
    fn field_kind() -> FieldKind;

    /// Optional fields may be absent from the document.
    fn optional() -> bool {
        false
    }

    fn to_field_value(&self) -> FieldValue;

    /// `field` names the field for error messages.
    fn from_field_value(value: &FieldValue, field: &str) -> Result<Self>;
}

/// Types with a declared record type.
pub trait ToRecordType {
    fn record_type() -> RecordRef;

    fn xsd() -> XsdFragment {
        Self::record_type().to_xsd()
    }
}

pub trait ToRecordInstance: ToRecordType {
    fn to_instance(&self) -> RecordInstance;

    fn to_xml(&self) -> String {
        self.to_instance().to_xml()
    }
}

pub trait FromRecordInstance: ToRecordType + Sized {
    fn from_instance(instance: &RecordInstance) -> Result<Self>;
}

impl FieldDescriptor {
    /// Descriptor for a field holding a `T`.
    pub fn of<T: XmlField>(name: impl Into<String>) -> Self {
        FieldDescriptor::new(name, T::field_kind()).with_optional(T::optional())
    }
}

impl RecordInstance {
    /// Read a field back into its Rust type.
    pub fn extract<T: XmlField>(&self, name: &str) -> Result<T> {
        T::from_field_value(self.get(name), name)
    }
}

pub(crate) fn wrong_scalar(expected: ScalarKind, found: &ScalarValue) -> MarshalError {
    MarshalError::schema_mismatch(format!(
        "expected {} value, found {}",
        expected,
        found.kind()
    ))
}

pub fn scalar_field_value<T: XmlScalar>(value: &FieldValue, field: &str) -> Result<T> {
    match value {
        FieldValue::Scalar(scalar) => T::from_scalar(scalar),
        FieldValue::Absent => Err(MarshalError::schema_mismatch(format!(
            "required field {} is missing",
            field
        ))),
        _ => Err(MarshalError::schema_mismatch(format!(
            "field {} does not hold a {} value",
            field,
            T::KIND
        ))),
    }
}

pub fn scalar_item<T: XmlScalar>(item: &Item) -> Result<T> {
    match item {
        Item::Scalar(scalar) => T::from_scalar(scalar),
        Item::Record(record) => Err(MarshalError::schema_mismatch(format!(
            "expected {} item, found record {}",
            T::KIND,
            record.name()
        ))),
    }
}

/// Implements [`XmlField`] and [`XmlElement`] for types that already
/// implement [`XmlScalar`].
#[macro_export]
macro_rules! impl_scalar_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::XmlField for $ty {
                fn field_kind() -> $crate::FieldKind {
                    $crate::FieldKind::Scalar(<$ty as $crate::XmlScalar>::KIND)
                }

                fn to_field_value(&self) -> $crate::FieldValue {
                    $crate::FieldValue::Scalar($crate::XmlScalar::to_scalar(self))
                }

                fn from_field_value(
                    value: &$crate::FieldValue,
                    field: &str,
                ) -> $crate::Result<Self> {
                    $crate::__private::scalar_field_value(value, field)
                }
            }

            impl $crate::XmlElement for $ty {
                fn element_type() -> $crate::ElementType {
                    $crate::ElementType::Scalar(<$ty as $crate::XmlScalar>::KIND)
                }

                fn to_item(&self) -> $crate::Item {
                    $crate::Item::Scalar($crate::XmlScalar::to_scalar(self))
                }

                fn from_item(item: &$crate::Item) -> $crate::Result<Self> {
                    $crate::__private::scalar_item(item)
                }
            }
        )*
    };
}

/// `None` writes no element. For `Option<Vec<T>>` zero elements and `None`
/// look the same on the wire, so both read back as `None`.
impl<T: XmlField> XmlField for Option<T> {
    fn field_kind() -> FieldKind {
        T::field_kind()
    }

    fn optional() -> bool {
        true
    }

    fn to_field_value(&self) -> FieldValue {
        match self {
            Some(value) => value.to_field_value(),
            None => FieldValue::Absent,
        }
    }

    fn from_field_value(value: &FieldValue, field: &str) -> Result<Self> {
        match value {
            FieldValue::Absent => Ok(None),
            FieldValue::Repeated(items) if items.is_empty() => Ok(None),
            value => T::from_field_value(value, field).map(Some),
        }
    }
}

impl<T: XmlElement> XmlField for Vec<T> {
    fn field_kind() -> FieldKind {
        FieldKind::repeated(T::element_type(), Occurs::default())
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Repeated(self.iter().map(T::to_item).collect())
    }

    fn from_field_value(value: &FieldValue, field: &str) -> Result<Self> {
        match value {
            FieldValue::Absent => Ok(Vec::new()),
            FieldValue::Repeated(items) => items.iter().map(T::from_item).collect(),
            _ => Err(MarshalError::schema_mismatch(format!(
                "field {} is not repeated",
                field
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MaxOccurs, RecordType};

    #[test]
    fn test_option_is_optional() {
        assert!(<Option<String> as XmlField>::optional());
        assert!(!<String as XmlField>::optional());
        assert_eq!(
            Option::<i64>::from_field_value(&FieldValue::Absent, "age"),
            Ok(None)
        );
        assert!(i64::from_field_value(&FieldValue::Absent, "age").is_err());
    }

    #[test]
    fn test_optional_vec_reads_no_elements_as_none() {
        let tags: Option<Vec<String>> = None;
        let record = RecordType::builder("Tagged")
            .field(FieldDescriptor::of::<Option<Vec<String>>>("tags"))
            .build()
            .unwrap();
        let mut instance = RecordInstance::new(record);
        instance.set("tags", tags.to_field_value()).unwrap();
        assert_eq!(
            Option::<Vec<String>>::from_field_value(instance.get("tags"), "tags"),
            Ok(None)
        );

        let some = Some(vec!["a".to_string()]);
        assert_eq!(
            Option::<Vec<String>>::from_field_value(&some.to_field_value(), "tags"),
            Ok(some)
        );
        let empty = Some(Vec::<String>::new()).to_field_value();
        assert_eq!(
            Option::<Vec<String>>::from_field_value(&empty, "tags"),
            Ok(None)
        );
    }

    #[test]
    fn test_vec_defaults_to_unbounded() {
        let descriptor = FieldDescriptor::of::<Vec<bool>>("flags");
        assert_eq!(
            descriptor.kind(),
            &FieldKind::repeated(
                ElementType::Scalar(ScalarKind::Boolean),
                Occurs::new(0, MaxOccurs::Unbounded)
            )
        );
        let value = vec![true, false].to_field_value();
        assert_eq!(Vec::<bool>::from_field_value(&value, "flags"), Ok(vec![true, false]));
    }
}
