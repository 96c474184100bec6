use crate::document::Element;
use soapwire_schema::{FieldKind, MarshalError, RecordType, Result, ScalarKind};
use std::collections::HashMap;
use tracing::debug;

/// What an element holds according to the schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexEntry {
    Primitive(ScalarKind),
    /// a nested record, by complex type name
    ComplexType(String),
}

impl IndexEntry {
    pub fn is_complex(&self) -> bool {
        matches!(self, IndexEntry::ComplexType(_))
    }

    fn from_type_ref(type_ref: &str) -> Self {
        match ScalarKind::from_xsd_name(type_ref) {
            Some(kind) => IndexEntry::Primitive(kind),
            None => {
                let local = type_ref
                    .split_once(':')
                    .map(|(_, local)| local)
                    .unwrap_or(type_ref);
                IndexEntry::ComplexType(local.to_string())
            }
        }
    }
}

/// Element name to element kind, used while flattening a document to decide
/// whether to recurse into an element or read its text.
///
/// Entries are kept per enclosing complex type, so two records may use the
/// same element name for different kinds. A lookup falls back to the global
/// table, which holds top-level elements and the first declaration seen for
/// every other name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaIndex {
    global: HashMap<String, IndexEntry>,
    scoped: HashMap<(String, String), IndexEntry>,
}

impl SchemaIndex {
    /// Build the index by scanning an XSD document (or any document that
    /// contains `complexType` and `element` declarations).
    pub fn from_xsd(xsd: &str) -> Result<Self> {
        let root = Element::parse(xsd)?;
        let mut index = SchemaIndex::default();
        index.scan(&root, None)?;
        debug!(
            "indexed {} scoped and {} global element declaration(s)",
            index.scoped.len(),
            index.global.len()
        );
        Ok(index)
    }

    fn scan(&mut self, element: &Element, scope: Option<&str>) -> Result<()> {
        match element.local_name() {
            "complexType" => {
                let name = element.attribute("name").or(scope);
                for child in element.child_elements() {
                    self.scan(child, name)?;
                }
            }
            "element" => {
                let name = element.attribute("name").ok_or_else(|| {
                    MarshalError::schema_mismatch("element declaration without a name")
                })?;
                let entry = match element.attribute("type") {
                    Some(type_ref) => IndexEntry::from_type_ref(type_ref),
                    // anonymous inline type, scoped by the element's own name
                    None if element.find("complexType").is_some() => {
                        IndexEntry::ComplexType(name.to_string())
                    }
                    None => IndexEntry::Primitive(ScalarKind::String),
                };
                self.insert(scope, name, entry);
                for child in element.child_elements() {
                    self.scan(child, Some(name))?;
                }
            }
            _ => {
                for child in element.child_elements() {
                    self.scan(child, scope)?;
                }
            }
        }
        Ok(())
    }

    /// Index a record type and every record it reaches, without going
    /// through XSD text.
    pub fn for_record(record: &RecordType) -> Self {
        let mut index = SchemaIndex::default();
        index.insert(
            None,
            record.name(),
            IndexEntry::ComplexType(record.name().to_string()),
        );
        for nested in record.record_tree() {
            for field in nested.fields() {
                let entry = match field.kind() {
                    FieldKind::Scalar(kind) => IndexEntry::Primitive(*kind),
                    FieldKind::Record(inner) => IndexEntry::ComplexType(inner.name().to_string()),
                    FieldKind::Repeated { element, .. } => IndexEntry::from_type_ref(&element.type_ref()),
                };
                index.insert(Some(nested.name()), field.name(), entry);
            }
        }
        index
    }

    /// Add an entry; scoped entries also seed the global table.
    pub fn insert(&mut self, scope: Option<&str>, name: &str, entry: IndexEntry) {
        if let Some(scope) = scope {
            self.scoped
                .insert((scope.to_string(), name.to_string()), entry.clone());
        }
        if scope.is_none() {
            self.global.insert(name.to_string(), entry);
        } else {
            self.global.entry(name.to_string()).or_insert(entry);
        }
    }

    /// Entry for `name` inside complex type `scope`, else the global one.
    pub fn lookup(&self, scope: Option<&str>, name: &str) -> Option<&IndexEntry> {
        scope
            .and_then(|scope| self.scoped.get(&(scope.to_string(), name.to_string())))
            .or_else(|| self.global.get(name))
    }

    /// Merge another index into this one, keeping existing global entries.
    pub fn extend(&mut self, other: SchemaIndex) {
        self.scoped.extend(other.scoped);
        for (name, entry) in other.global {
            self.global.entry(name).or_insert(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use soapwire_schema::{schema_document, ElementType, Occurs};

    fn team() -> soapwire_schema::RecordRef {
        let person = RecordType::builder("Person")
            .scalar("name", ScalarKind::String)
            .scalar("age", ScalarKind::Integer)
            .build()
            .unwrap();
        RecordType::builder("Team")
            .scalar("name", ScalarKind::String)
            .repeated("members", ElementType::Record(person), Occurs::unbounded(1))
            .build()
            .unwrap()
    }

    #[test]
    fn test_index_from_generated_xsd_matches_record_index() {
        let team = team();
        let xsd = schema_document(&team.to_xsd().to_string(), None);
        let parsed = SchemaIndex::from_xsd(&xsd).unwrap();
        let direct = SchemaIndex::for_record(&team);

        for (scope, name) in [
            (Some("Team"), "members"),
            (Some("Team"), "name"),
            (Some("Person"), "age"),
            (None, "Team"),
        ] {
            assert_eq!(parsed.lookup(scope, name), direct.lookup(scope, name), "{}", name);
        }
        assert_eq!(
            parsed.lookup(Some("Team"), "members"),
            Some(&IndexEntry::ComplexType("Person".to_string()))
        );
        assert_eq!(
            parsed.lookup(Some("Person"), "age"),
            Some(&IndexEntry::Primitive(ScalarKind::Integer))
        );
    }

    #[test]
    fn test_accepts_xs_prefix_and_datetime_spelling() {
        let index = SchemaIndex::from_xsd(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:complexType name="Event"><xs:sequence>
                    <xs:element name="at" type="xs:datetime"/>
                    <xs:element name="where" type="tns:Place"/>
                </xs:sequence></xs:complexType>
            </xs:schema>"#,
        )
        .unwrap();
        assert_eq!(
            index.lookup(Some("Event"), "at"),
            Some(&IndexEntry::Primitive(ScalarKind::DateTime))
        );
        assert!(index.lookup(Some("Event"), "where").unwrap().is_complex());
        assert_eq!(index.lookup(Some("Event"), "when"), None);
    }

    #[test]
    fn test_extend_keeps_existing_global_entries() {
        let mut index = SchemaIndex::for_record(&team());
        let mut other = SchemaIndex::default();
        other.insert(None, "name", IndexEntry::Primitive(ScalarKind::Integer));
        other.insert(Some("Badge"), "code", IndexEntry::Primitive(ScalarKind::Integer));
        let before = index.len();

        index.extend(other);
        assert_eq!(
            index.lookup(None, "name"),
            Some(&IndexEntry::Primitive(ScalarKind::String))
        );
        assert_eq!(
            index.lookup(Some("Badge"), "code"),
            Some(&IndexEntry::Primitive(ScalarKind::Integer))
        );
        assert_eq!(index.len(), before + 1);
    }
}
