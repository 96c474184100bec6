//! XML to record instance, in two passes: the document is flattened into
//! ordered name/value pairs guided by a [`SchemaIndex`], then the pairs are
//! rebuilt into a typed [`RecordInstance`] against the target record type.

use crate::document::Element;
use crate::schema_index::{IndexEntry, SchemaIndex};
use soapwire_schema::{
    ElementType, FieldKind, FromRecordInstance, Item, MarshalError, RecordInstance, RecordRef,
    RecordType, Result, ToRecordType,
};
use tracing::{debug, trace};

/// A flattened element value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlatValue {
    /// text of a primitive element
    Leaf(String),
    /// children of a complex element, in document order
    Nested(Vec<(String, FlatValue)>),
}

/// Locate the element for `root_name` and flatten its children.
///
/// The root is matched by local name, so a prefixed `ns:Person` is found
/// for `Person`. Every child element must be known to `index`.
pub fn flatten(
    document: &Element,
    root_name: &str,
    index: &SchemaIndex,
) -> Result<Vec<(String, FlatValue)>> {
    let root = document.find(root_name).ok_or_else(|| {
        MarshalError::schema_mismatch(format!(
            "no <{}> element in document rooted at <{}>",
            root_name,
            document.qualified_name()
        ))
    })?;
    let scope = match index.lookup(None, root_name) {
        Some(IndexEntry::ComplexType(type_name)) => type_name.as_str(),
        _ => root_name,
    };
    flatten_children(root, scope, index)
}

fn flatten_children(
    element: &Element,
    scope: &str,
    index: &SchemaIndex,
) -> Result<Vec<(String, FlatValue)>> {
    element
        .child_elements()
        .map(|child| {
            let name = child.local_name();
            let value = match index.lookup(Some(scope), name) {
                Some(IndexEntry::ComplexType(type_name)) => {
                    FlatValue::Nested(flatten_children(child, type_name, index)?)
                }
                Some(IndexEntry::Primitive(kind)) if child.has_child_elements() => {
                    return Err(MarshalError::schema_mismatch(format!(
                        "element <{}> inside {} is declared as {} but has child elements",
                        name,
                        scope,
                        kind.qualified_name()
                    )))
                }
                Some(IndexEntry::Primitive(_)) => FlatValue::Leaf(child.text()),
                None => {
                    return Err(MarshalError::schema_mismatch(format!(
                        "element <{}> inside {} is not declared in the schema",
                        name, scope
                    )))
                }
            };
            Ok((name.to_string(), value))
        })
        .collect()
}

/// Rebuild flattened pairs into an instance of `record`.
///
/// Same-named pairs accumulate into repeated fields in document order; a
/// second occurrence of a single-valued field is a mismatch. Missing
/// elements stay absent.
pub fn reconstruct(pairs: &[(String, FlatValue)], record: &RecordRef) -> Result<RecordInstance> {
    let mut instance = RecordInstance::new(record.clone());

    for (name, value) in pairs {
        let field = record.field(name).ok_or_else(|| {
            MarshalError::schema_mismatch(format!(
                "record {} has no field named {}",
                record.name(),
                name
            ))
        })?;

        if !field.kind().is_repeated() && !instance.get(name).is_absent() {
            return Err(MarshalError::schema_mismatch(format!(
                "element <{}> appears more than once in {}",
                name,
                record.name()
            )));
        }

        match (field.kind(), value) {
            (FieldKind::Scalar(kind), FlatValue::Leaf(text)) => {
                instance.set(name, kind.coerce(text)?)?;
            }
            (FieldKind::Record(nested), FlatValue::Nested(children)) => {
                instance.set(name, reconstruct(children, nested)?)?;
            }
            (
                FieldKind::Repeated {
                    element: ElementType::Scalar(kind),
                    ..
                },
                FlatValue::Leaf(text),
            ) => {
                instance.push(name, Item::Scalar(kind.coerce(text)?))?;
            }
            (
                FieldKind::Repeated {
                    element: ElementType::Record(nested),
                    ..
                },
                FlatValue::Nested(children),
            ) => {
                instance.push(name, Item::Record(reconstruct(children, nested)?))?;
            }
            _ => {
                return Err(MarshalError::schema_mismatch(format!(
                    "element <{}> of {} does not have the declared shape",
                    name,
                    record.name()
                )))
            }
        }
    }

    check_occurs(&instance, record)?;
    trace!("reconstructed {} from {} element(s)", record.name(), pairs.len());
    Ok(instance)
}

fn check_occurs(instance: &RecordInstance, record: &RecordType) -> Result<()> {
    for field in record.fields() {
        if let FieldKind::Repeated { occurs, .. } = field.kind() {
            let count = instance.get(field.name()).items().len();
            if !occurs.max.allows(count) {
                return Err(MarshalError::schema_mismatch(format!(
                    "{} holds {} <{}> element(s), at most {} allowed",
                    record.name(),
                    count,
                    field.name(),
                    occurs.max
                )));
            }
        }
    }
    Ok(())
}

/// Parse `xml` and rebuild the `record` element found in it.
pub fn from_xml(xml: &str, index: &SchemaIndex, record: &RecordRef) -> Result<RecordInstance> {
    let document = Element::parse(xml)?;
    from_element(&document, index, record)
}

/// [`from_xml`] over an already parsed document.
pub fn from_element(
    document: &Element,
    index: &SchemaIndex,
    record: &RecordRef,
) -> Result<RecordInstance> {
    let pairs = flatten(document, record.name(), index)?;
    reconstruct(&pairs, record)
}

/// Binds a record type to its schema index for repeated conversions.
#[derive(Clone, Debug)]
pub struct Marshaller {
    record: RecordRef,
    index: SchemaIndex,
}

impl Marshaller {
    /// Index derived from the record type itself.
    pub fn new(record: RecordRef) -> Self {
        let index = SchemaIndex::for_record(&record);
        Self { record, index }
    }

    /// Index read from XSD text, e.g. the `types` section of a WSDL.
    pub fn with_schema(record: RecordRef, xsd: &str) -> Result<Self> {
        let index = SchemaIndex::from_xsd(xsd)?;
        Ok(Self { record, index })
    }

    /// Marshaller for a derived record type.
    pub fn of<T: ToRecordType>() -> Self {
        Self::new(T::record_type())
    }

    pub fn record(&self) -> &RecordRef {
        &self.record
    }

    pub fn index(&self) -> &SchemaIndex {
        &self.index
    }

    pub fn from_xml(&self, xml: &str) -> Result<RecordInstance> {
        debug!("unmarshalling {} ({} bytes)", self.record.name(), xml.len());
        from_xml(xml, &self.index, &self.record)
    }

    pub fn from_element(&self, document: &Element) -> Result<RecordInstance> {
        from_element(document, &self.index, &self.record)
    }

    /// Unmarshal straight into a Rust value.
    pub fn decode<T: FromRecordInstance>(&self, xml: &str) -> Result<T> {
        T::from_instance(&self.from_xml(xml)?)
    }

    pub fn to_xml(&self, instance: &RecordInstance) -> Result<String> {
        if instance.name() != self.record.name() {
            return Err(MarshalError::schema_mismatch(format!(
                "cannot write a {} record as {}",
                instance.name(),
                self.record.name()
            )));
        }
        Ok(instance.to_xml())
    }
}

/// Parse `xml` into a `T`, indexing `T`'s own record type.
pub fn xml_to_record<T: FromRecordInstance>(xml: &str) -> Result<T> {
    Marshaller::of::<T>().decode(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use soapwire_schema::{MaxOccurs, Occurs, ScalarKind, ScalarValue};

    fn person() -> RecordRef {
        RecordType::builder("Person")
            .scalar("name", ScalarKind::String)
            .scalar("age", ScalarKind::Integer)
            .build()
            .unwrap()
    }

    #[test]
    fn test_flatten_keeps_document_order() {
        let record = RecordType::builder("Box")
            .record("owner", person())
            .repeated(
                "label",
                ElementType::Scalar(ScalarKind::String),
                Occurs::default(),
            )
            .build()
            .unwrap();
        let index = SchemaIndex::for_record(&record);
        let document = Element::parse(
            "<Box><label>b</label><owner><name>Ann</name><age>7</age></owner><label>a</label></Box>",
        )
        .unwrap();
        assert_eq!(
            flatten(&document, "Box", &index).unwrap(),
            vec![
                ("label".to_string(), FlatValue::Leaf("b".to_string())),
                (
                    "owner".to_string(),
                    FlatValue::Nested(vec![
                        ("name".to_string(), FlatValue::Leaf("Ann".to_string())),
                        ("age".to_string(), FlatValue::Leaf("7".to_string())),
                    ])
                ),
                ("label".to_string(), FlatValue::Leaf("a".to_string())),
            ]
        );
    }

    #[test]
    fn test_scalar_element_with_children_is_rejected() {
        let index = SchemaIndex::for_record(&person());
        let document =
            Element::parse("<Person><name><first>Ann</first></name><age>7</age></Person>").unwrap();
        let err = flatten(&document, "Person", &index).unwrap_err();
        assert!(
            matches!(&err, MarshalError::SchemaMismatch(msg) if msg.contains("<name>")),
            "{:?}",
            err
        );
    }

    #[test]
    fn test_reconstruct_coerces_leaves() {
        let person = person();
        let pairs = vec![
            ("age".to_string(), FlatValue::Leaf(" 38 ".to_string())),
            ("name".to_string(), FlatValue::Leaf("Steve".to_string())),
        ];
        let instance = reconstruct(&pairs, &person).unwrap();
        assert_eq!(
            instance.get("age").as_scalar(),
            Some(&ScalarValue::Integer(38))
        );

        let bad = vec![("age".to_string(), FlatValue::Leaf("old".to_string()))];
        assert!(matches!(
            reconstruct(&bad, &person),
            Err(MarshalError::TypeCoercion { .. })
        ));
    }

    #[test]
    fn test_single_field_twice_is_a_mismatch() {
        let pairs = vec![
            ("name".to_string(), FlatValue::Leaf("a".to_string())),
            ("name".to_string(), FlatValue::Leaf("b".to_string())),
        ];
        assert!(matches!(
            reconstruct(&pairs, &person()),
            Err(MarshalError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_max_occurs_is_enforced() {
        let record = RecordType::builder("Pair")
            .repeated(
                "v",
                ElementType::Scalar(ScalarKind::Integer),
                Occurs::new(0, MaxOccurs::Bounded(2)),
            )
            .build()
            .unwrap();
        let marshaller = Marshaller::new(record);
        assert!(marshaller.from_xml("<Pair><v>1</v><v>2</v></Pair>").is_ok());
        assert!(matches!(
            marshaller.from_xml("<Pair><v>1</v><v>2</v><v>3</v></Pair>"),
            Err(MarshalError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_missing_root_is_a_mismatch() {
        let marshaller = Marshaller::new(person());
        assert!(matches!(
            marshaller.from_xml("<Robot><name>R2</name></Robot>"),
            Err(MarshalError::SchemaMismatch(_))
        ));
    }
}
