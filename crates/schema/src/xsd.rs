//! XSD generation for record types.
//!
//! Output uses the `xsd` prefix for the XML Schema namespace and `tns` for the
//! target namespace, matching what the WSDL assembler binds on its
//! `definitions` element. Fragments are meant to be embedded in an
//! `xsd:schema` element; [`schema_document`] produces a standalone one.

use crate::{FieldDescriptor, FieldKind, MarshalError, Occurs, RecordType, Result, XSD_NAMESPACE};
use quick_xml::escape::escape;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Schema text for one record type and everything it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XsdFragment {
    /// one `complexType` per distinct record type, root record first
    pub complex_types: Vec<String>,
    /// the top-level `element` declaration of the root record
    pub root_element: String,
}

impl XsdFragment {
    pub fn complex_type_count(&self) -> usize {
        self.complex_types.len()
    }
}

impl fmt::Display for XsdFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for complex_type in &self.complex_types {
            f.write_str(complex_type)?;
        }
        f.write_str(&self.root_element)
    }
}

pub(crate) fn generate(record: &RecordType) -> XsdFragment {
    // names within one built tree are unique, checked by the builder
    let complex_types = record
        .record_tree()
        .into_iter()
        .map(|record| record.complex_type().to_string())
        .collect::<Vec<_>>();

    debug!(
        "generated XSD for {} with {} complex type(s)",
        record.name(),
        complex_types.len()
    );

    XsdFragment {
        complex_types,
        root_element: element_decl(
            record.name(),
            &format!("tns:{}", record.name()),
            None,
            false,
        ),
    }
}

/// Append the complex types of `record` and every record it reaches,
/// skipping any type already in `seen`, which maps type names to the
/// complexType text emitted for them.
///
/// Sharing `seen` across calls lets several roots (an operation's input and
/// output, say) emit common nested types exactly once. A name already
/// emitted with a different definition fails with `InvalidDeclaration`.
pub fn collect_complex_types(
    record: &RecordType,
    seen: &mut HashMap<String, String>,
    out: &mut Vec<String>,
) -> Result<()> {
    for nested in record.record_tree() {
        claim_type_name(seen, nested.name(), nested.complex_type(), out)?;
    }
    Ok(())
}

/// Record `complex_type` under `name` and append it to `out`, unless the
/// same text is already there.
pub fn claim_type_name(
    seen: &mut HashMap<String, String>,
    name: &str,
    complex_type: &str,
    out: &mut Vec<String>,
) -> Result<()> {
    match seen.get(name) {
        Some(existing) if existing == complex_type => Ok(()),
        Some(_) => Err(MarshalError::invalid_declaration(format!(
            "two different types are named {}",
            name
        ))),
        None => {
            seen.insert(name.to_string(), complex_type.to_string());
            out.push(complex_type.to_string());
            Ok(())
        }
    }
}

pub(crate) fn render_complex_type(record: &RecordType) -> String {
    complex_type_decl(record.name(), record.fields().iter().map(field_element))
}

fn field_element(field: &FieldDescriptor) -> String {
    match field.kind() {
        FieldKind::Scalar(kind) => {
            element_decl(field.name(), kind.qualified_name(), None, *field.optional())
        }
        FieldKind::Record(record) => element_decl(
            field.name(),
            &format!("tns:{}", record.name()),
            None,
            *field.optional(),
        ),
        FieldKind::Repeated { element, occurs } => {
            element_decl(field.name(), &element.type_ref(), Some(*occurs), false)
        }
    }
}

/// A single `xsd:element` declaration.
///
/// Repeated elements carry both occurrence bounds; optional single elements
/// carry `minOccurs="0"`.
pub fn element_decl(name: &str, type_ref: &str, occurs: Option<Occurs>, optional: bool) -> String {
    let mut decl = format!(
        r#"<xsd:element name="{}" type="{}""#,
        escape(name),
        escape(type_ref)
    );
    match occurs {
        Some(occurs) => decl.push_str(&format!(
            r#" minOccurs="{}" maxOccurs="{}""#,
            occurs.min, occurs.max
        )),
        None if optional => decl.push_str(r#" minOccurs="0""#),
        None => {}
    }
    decl.push_str("/>");
    decl
}

/// A named `xsd:complexType` holding a sequence of element declarations.
pub fn complex_type_decl(name: &str, elements: impl IntoIterator<Item = String>) -> String {
    let mut decl = format!(r#"<xsd:complexType name="{}"><xsd:sequence>"#, escape(name));
    for element in elements {
        decl.push_str(&element);
    }
    decl.push_str("</xsd:sequence></xsd:complexType>");
    decl
}

/// Wrap schema text in an `xsd:schema` element that binds the `xsd` and
/// `tns` prefixes, so it can be parsed on its own.
pub fn schema_document(body: &str, target_namespace: Option<&str>) -> String {
    let namespace = target_namespace.unwrap_or("urn:soapwire");
    format!(
        r#"<xsd:schema xmlns:xsd="{}" xmlns:tns="{ns}" targetNamespace="{ns}">{}</xsd:schema>"#,
        XSD_NAMESPACE,
        body,
        ns = escape(namespace),
    )
}
