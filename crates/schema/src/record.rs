use crate::xsd::{self, XsdFragment};
use crate::{ElementType, FieldDescriptor, FieldKind, MarshalError, Occurs, Result, ScalarKind};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// Shared handle to an immutable record type.
pub type RecordRef = Arc<RecordType>;

/// A named, ordered set of typed fields.
///
/// The name doubles as the XSD complex type name and the default XML root
/// tag. Field order is declaration order and is what schema generation,
/// serialization and reconstruction all follow.
pub struct RecordType {
    name: String,
    fields: Vec<FieldDescriptor>,
    /// complexType text of this record alone, filled on first use
    fragment: OnceLock<String>,
}

impl RecordType {
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name() == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name() == name)
    }

    /// The `complexType` element describing only this record. Nested types
    /// are referenced by name, not inlined.
    pub fn complex_type(&self) -> &str {
        if let Some(fragment) = self.fragment.get() {
            return fragment;
        }
        // concurrent first users may both render; the loser's copy is dropped
        let _ = self.fragment.set(xsd::render_complex_type(self));
        self.fragment.get().map(String::as_str).unwrap_or_default()
    }

    /// Every distinct record type reachable from this one, this one first,
    /// in depth-first declaration order.
    pub fn record_tree(&self) -> Vec<&RecordType> {
        let mut seen = HashSet::new();
        let mut tree = Vec::new();
        collect_record_tree(self, &mut seen, &mut tree);
        tree
    }

    /// XSD for this record: its complex type, every nested complex type once,
    /// and a root element referencing the record's type.
    pub fn to_xsd(&self) -> XsdFragment {
        xsd::generate(self)
    }
}

/// Depth-first walk behind `record_tree`. `seen` holds record names; a name
/// already present is skipped with its subtree.
fn collect_record_tree<'a>(
    record: &'a RecordType,
    seen: &mut HashSet<String>,
    tree: &mut Vec<&'a RecordType>,
) {
    if !seen.insert(record.name().to_string()) {
        return;
    }
    tree.push(record);
    for field in record.fields() {
        if let Some(nested) = field.kind().nested_record() {
            collect_record_tree(nested, seen, tree);
        }
    }
}

impl Clone for RecordType {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            fields: self.fields.clone(),
            fragment: OnceLock::new(),
        }
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}

impl Eq for RecordType {}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Declares a record type field by field.
///
/// ```
/// use soapwire_schema::{RecordType, ScalarKind};
///
/// let person = RecordType::builder("Person")
///     .scalar("name", ScalarKind::String)
///     .scalar("age", ScalarKind::Integer)
///     .build()?;
/// assert_eq!(person.fields().len(), 2);
/// # Ok::<(), soapwire_schema::MarshalError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RecordTypeBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl RecordTypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn scalar(self, name: impl Into<String>, kind: ScalarKind) -> Self {
        self.field(FieldDescriptor::scalar(name, kind))
    }

    pub fn optional(self, name: impl Into<String>, kind: ScalarKind) -> Self {
        self.field(FieldDescriptor::scalar(name, kind).with_optional(true))
    }

    pub fn record(self, name: impl Into<String>, record: RecordRef) -> Self {
        self.field(FieldDescriptor::record(name, record))
    }

    pub fn repeated(self, name: impl Into<String>, element: ElementType, occurs: Occurs) -> Self {
        self.field(FieldDescriptor::repeated(name, element, occurs))
    }

    /// Check the declaration and freeze it.
    ///
    /// Fails with `InvalidDeclaration` when the record or a field is not
    /// named by an XML name, a field name repeats, a repeated field's bounds
    /// admit no element count, or two different record types reachable from
    /// this one share a name.
    pub fn build(self) -> Result<RecordRef> {
        if !is_xml_name(&self.name) {
            return Err(MarshalError::invalid_declaration(format!(
                "record name {:?} is not an XML name",
                self.name
            )));
        }

        let duplicates = self
            .fields
            .iter()
            .map(|field| field.name().as_str())
            .duplicates()
            .collect::<Vec<_>>();
        if !duplicates.is_empty() {
            return Err(MarshalError::invalid_declaration(format!(
                "record {} declares {} more than once",
                self.name,
                duplicates.iter().join(", ")
            )));
        }

        for field in &self.fields {
            if !is_xml_name(field.name()) {
                return Err(MarshalError::invalid_declaration(format!(
                    "field {:?} of record {} is not an XML name",
                    field.name(),
                    self.name
                )));
            }
            if let FieldKind::Repeated { occurs, .. } = field.kind() {
                if !occurs.is_satisfiable() {
                    return Err(MarshalError::invalid_declaration(format!(
                        "field {} of record {} has minOccurs={} maxOccurs={}",
                        field.name(),
                        self.name,
                        occurs.min,
                        occurs.max
                    )));
                }
            }
        }

        self.check_nested_names()?;

        trace!(
            "declared record type {} with fields [{}]",
            self.name,
            self.fields.iter().map(|field| field.name()).join(", ")
        );

        Ok(Arc::new(RecordType {
            name: self.name,
            fields: self.fields,
            fragment: OnceLock::new(),
        }))
    }

    /// Every record type reachable through the fields must own its name:
    /// the XSD names types, so same-named types would merge into one.
    fn check_nested_names(&self) -> Result<()> {
        let mut declared: HashMap<&str, &RecordType> = HashMap::new();
        for nested in self.fields.iter().filter_map(|field| field.kind().nested_record()) {
            for record in nested.record_tree() {
                let conflict = record.name() == self.name
                    || declared
                        .insert(record.name(), record)
                        .is_some_and(|previous| previous != record);
                if conflict {
                    return Err(MarshalError::invalid_declaration(format!(
                        "record {} reaches two different record types named {}",
                        self.name,
                        record.name()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Whether `name` can be used as an unprefixed element or type name: a
/// letter or `_`, then letters, digits, `_`, `-` or `.`.
pub fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Lazily built, process-wide cached record type for a Rust type.
///
/// Used by `#[derive(XmlRecord)]` so that each declared type is introspected
/// once. First-use races are resolved by building redundantly and keeping
/// whichever copy was stored first.
pub struct RecordTypeCell(OnceLock<RecordRef>);

impl RecordTypeCell {
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    pub fn get_or_build(&self, build: impl FnOnce() -> RecordRef) -> RecordRef {
        if let Some(record) = self.0.get() {
            return record.clone();
        }
        let built = build();
        match self.0.set(built.clone()) {
            Ok(()) => built,
            Err(_) => self.0.get().cloned().unwrap_or(built),
        }
    }
}

impl Default for RecordTypeCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MaxOccurs;

    fn address() -> RecordRef {
        RecordType::builder("Address")
            .scalar("street", ScalarKind::String)
            .scalar("city", ScalarKind::String)
            .build()
            .unwrap()
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let record = RecordType::builder("Zebra")
            .scalar("zeta", ScalarKind::String)
            .scalar("alpha", ScalarKind::Integer)
            .scalar("mu", ScalarKind::Boolean)
            .build()
            .unwrap();
        let names: Vec<_> = record.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mu"]);
        assert_eq!(record.position("mu"), Some(2));
    }

    #[test]
    fn test_duplicate_field_names_are_rejected() {
        let err = RecordType::builder("Person")
            .scalar("name", ScalarKind::String)
            .scalar("name", ScalarKind::Integer)
            .build()
            .unwrap_err();
        assert!(matches!(err, MarshalError::InvalidDeclaration(msg) if msg.contains("name")));
    }

    #[test]
    fn test_names_must_be_xml_names() {
        let err = RecordType::builder("Person")
            .scalar("first name", ScalarKind::String)
            .build()
            .unwrap_err();
        assert!(matches!(err, MarshalError::InvalidDeclaration(msg) if msg.contains("first name")));

        for bad in ["", "1st", "tns:Person", "a<b"] {
            assert!(RecordType::builder(bad).build().is_err(), "{:?} accepted", bad);
        }
        assert!(RecordType::builder("_Person-2.v1")
            .scalar("été", ScalarKind::String)
            .build()
            .is_ok());
    }

    #[test]
    fn test_unsatisfiable_occurs_are_rejected() {
        for occurs in [
            Occurs::new(3, MaxOccurs::Bounded(0)),
            Occurs::new(3, MaxOccurs::Bounded(2)),
        ] {
            let err = RecordType::builder("Readings")
                .repeated("v", ElementType::Scalar(ScalarKind::Integer), occurs)
                .build()
                .unwrap_err();
            assert!(matches!(err, MarshalError::InvalidDeclaration(_)));
        }
    }

    #[test]
    fn test_same_named_record_types_must_agree() {
        let item_x = RecordType::builder("Item")
            .scalar("x", ScalarKind::Integer)
            .build()
            .unwrap();
        let item_y = RecordType::builder("Item")
            .scalar("y", ScalarKind::String)
            .build()
            .unwrap();
        let err = RecordType::builder("Outer")
            .record("a", item_x.clone())
            .repeated("b", ElementType::Record(item_y), Occurs::default())
            .build()
            .unwrap_err();
        assert!(matches!(err, MarshalError::InvalidDeclaration(msg) if msg.contains("Item")));

        // equal declarations built separately are the same type
        let item_x_again = RecordType::builder("Item")
            .scalar("x", ScalarKind::Integer)
            .build()
            .unwrap();
        assert!(RecordType::builder("Outer")
            .record("a", item_x.clone())
            .record("b", item_x_again)
            .build()
            .is_ok());

        let err = RecordType::builder("Item")
            .record("inner", item_x)
            .build()
            .unwrap_err();
        assert!(matches!(err, MarshalError::InvalidDeclaration(_)));
    }

    #[test]
    fn test_record_tree_visits_each_type_once() {
        let address = address();
        let person = RecordType::builder("Person")
            .record("home", address.clone())
            .record("work", address.clone())
            .repeated(
                "previous",
                ElementType::Record(address),
                Occurs::new(0, MaxOccurs::Bounded(5)),
            )
            .build()
            .unwrap();
        let names: Vec<_> = person.record_tree().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, vec!["Person", "Address"]);
    }

    #[test]
    fn test_cell_builds_once() {
        let cell = RecordTypeCell::new();
        let first = cell.get_or_build(address);
        let second = cell.get_or_build(|| panic!("cell should already be populated"));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_complex_type_is_cached() {
        let record = address();
        let first = record.complex_type().as_ptr();
        assert_eq!(record.complex_type().as_ptr(), first);
    }
}
