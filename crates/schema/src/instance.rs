use crate::{
    ElementType, FieldDescriptor, FieldKind, MarshalError, RecordRef, RecordType, Result,
    ScalarValue,
};
use quick_xml::escape::escape;
use std::fmt;
use tracing::trace;

/// One item of a repeated field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    Scalar(ScalarValue),
    Record(RecordInstance),
}

/// The value held by one field of a record instance.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum FieldValue {
    /// nothing set, or an optional element missing from the document
    #[default]
    Absent,
    Scalar(ScalarValue),
    Record(RecordInstance),
    Repeated(Vec<Item>),
}

static ABSENT: FieldValue = FieldValue::Absent;

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            FieldValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordInstance> {
        match self {
            FieldValue::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Items of a repeated field; an absent value reads as no items.
    pub fn items(&self) -> &[Item] {
        match self {
            FieldValue::Repeated(items) => items,
            _ => &[],
        }
    }
}

impl From<ScalarValue> for FieldValue {
    fn from(value: ScalarValue) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<RecordInstance> for FieldValue {
    fn from(value: RecordInstance) -> Self {
        FieldValue::Record(value)
    }
}

impl From<Vec<Item>> for FieldValue {
    fn from(items: Vec<Item>) -> Self {
        FieldValue::Repeated(items)
    }
}

/// Populated value of a record type: one value per declared field, in
/// declaration order.
#[derive(Clone)]
pub struct RecordInstance {
    record: RecordRef,
    values: Vec<FieldValue>,
}

impl RecordInstance {
    /// An instance with every field unset: single fields absent, repeated
    /// fields empty.
    pub fn new(record: RecordRef) -> Self {
        let values = record.fields().iter().map(empty_value).collect();
        Self { record, values }
    }

    /// Build from values already known to match the record's fields.
    ///
    /// Used by derived conversions, whose values come from the same
    /// declaration the record type was built from.
    #[doc(hidden)]
    pub fn from_values_unchecked(record: RecordRef, values: Vec<FieldValue>) -> Self {
        debug_assert_eq!(record.fields().len(), values.len());
        Self { record, values }
    }

    pub fn record(&self) -> &RecordRef {
        &self.record
    }

    pub fn record_type(&self) -> &RecordType {
        &self.record
    }

    pub fn name(&self) -> &str {
        self.record.name()
    }

    /// Value of a field, `Absent` for unknown names.
    pub fn get(&self, name: &str) -> &FieldValue {
        self.record
            .position(name)
            .and_then(|index| self.values.get(index))
            .unwrap_or(&ABSENT)
    }

    /// Field descriptors paired with their values, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldDescriptor, &FieldValue)> {
        self.record.fields().iter().zip(self.values.iter())
    }

    /// Set a field after checking the value against its declared kind.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<&mut Self> {
        let index = self.record.position(name).ok_or_else(|| {
            MarshalError::schema_mismatch(format!(
                "record {} has no field named {}",
                self.record.name(),
                name
            ))
        })?;
        let field = &self.record.fields()[index];
        let value = match value.into() {
            FieldValue::Absent => empty_value(field),
            value => value,
        };
        check_value(field.kind(), name, &value)?;
        self.values[index] = value;
        Ok(self)
    }

    /// Builder-style [`RecordInstance::set`].
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Append one item to a repeated field.
    pub fn push(&mut self, name: &str, item: Item) -> Result<&mut Self> {
        let index = self.record.position(name).ok_or_else(|| {
            MarshalError::schema_mismatch(format!(
                "record {} has no field named {}",
                self.record.name(),
                name
            ))
        })?;
        match self.record.fields()[index].kind() {
            FieldKind::Repeated { element, .. } => check_item(element, name, &item)?,
            _ => {
                return Err(MarshalError::schema_mismatch(format!(
                    "field {} of {} is not repeated",
                    name,
                    self.record.name()
                )))
            }
        }
        match &mut self.values[index] {
            FieldValue::Repeated(items) => items.push(item),
            other => *other = FieldValue::Repeated(vec![item]),
        }
        Ok(self)
    }

    /// Serialize with the record type's name as the root tag.
    pub fn to_xml(&self) -> String {
        self.to_xml_named(self.record.name())
    }

    /// Serialize with an explicit root tag.
    ///
    /// Fields are written in declaration order. Absent fields are omitted and
    /// every item of a repeated field becomes its own element named after the
    /// field.
    pub fn to_xml_named(&self, root: &str) -> String {
        let mut out = String::new();
        self.write_xml(root, &mut out);
        trace!("serialized {} as <{}> ({} bytes)", self.name(), root, out.len());
        out
    }

    fn write_xml(&self, tag: &str, out: &mut String) {
        open_tag(tag, out);
        for (field, value) in self.iter() {
            let name = field.name().as_str();
            match value {
                FieldValue::Absent => {}
                FieldValue::Scalar(scalar) => write_scalar(name, scalar, out),
                FieldValue::Record(record) => record.write_xml(name, out),
                FieldValue::Repeated(items) => {
                    for item in items {
                        match item {
                            Item::Scalar(scalar) => write_scalar(name, scalar, out),
                            Item::Record(record) => record.write_xml(name, out),
                        }
                    }
                }
            }
        }
        close_tag(tag, out);
    }
}

fn empty_value(field: &FieldDescriptor) -> FieldValue {
    if field.kind().is_repeated() {
        FieldValue::Repeated(Vec::new())
    } else {
        FieldValue::Absent
    }
}

fn open_tag(tag: &str, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
}

fn close_tag(tag: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_scalar(tag: &str, value: &ScalarValue, out: &mut String) {
    open_tag(tag, out);
    out.push_str(&escape(value.render().as_str()));
    close_tag(tag, out);
}

fn check_value(kind: &FieldKind, name: &str, value: &FieldValue) -> Result<()> {
    let mismatch = || {
        MarshalError::schema_mismatch(format!(
            "value for field {} does not match its declaration",
            name
        ))
    };
    match (kind, value) {
        (_, FieldValue::Absent) => Ok(()),
        (FieldKind::Scalar(kind), FieldValue::Scalar(value)) if *kind == value.kind() => Ok(()),
        (FieldKind::Record(record), FieldValue::Record(instance))
            if record.name() == instance.name() =>
        {
            Ok(())
        }
        (FieldKind::Repeated { element, .. }, FieldValue::Repeated(items)) => items
            .iter()
            .try_for_each(|item| check_item(element, name, item)),
        _ => Err(mismatch()),
    }
}

fn check_item(element: &ElementType, name: &str, item: &Item) -> Result<()> {
    match (element, item) {
        (ElementType::Scalar(kind), Item::Scalar(value)) if *kind == value.kind() => Ok(()),
        (ElementType::Record(record), Item::Record(instance)) if record.name() == instance.name() => {
            Ok(())
        }
        _ => Err(MarshalError::schema_mismatch(format!(
            "item of repeated field {} does not match its element type",
            name
        ))),
    }
}

// value equality: same record type name and the same values
impl PartialEq for RecordInstance {
    fn eq(&self, other: &Self) -> bool {
        self.record.name() == other.record.name() && self.values == other.values
    }
}

impl Eq for RecordInstance {}

impl fmt::Debug for RecordInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct(self.record.name());
        for (field, value) in self.iter() {
            debug.field(field.name(), value);
        }
        debug.finish()
    }
}
