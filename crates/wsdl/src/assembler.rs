//! WSDL 1.1 documents describing a single document/literal operation.

use crate::shape::{ArgumentKind, OperationDescriptor, Shape};
use quick_xml::escape::escape;
use soapwire_schema::{
    claim_type_name, collect_complex_types, complex_type_decl, element_decl, Result, XSD_NAMESPACE,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

pub const WSDL_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/";
pub const WSDL_SOAP_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const SOAP_HTTP_TRANSPORT: &str = "http://schemas.xmlsoap.org/soap/http";

/// Element name of synthesized input shapes.
pub const PARAMS_ELEMENT: &str = "params";
/// Element name of synthesized output shapes.
pub const RETURNS_ELEMENT: &str = "returns";

/// The sections of a generated WSDL, each as XML text.
///
/// Rendering with [`fmt::Display`] wraps them, in order, in a
/// `wsdl:definitions` element that binds every prefix they use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WsdlDocument {
    pub service_name: String,
    pub target_namespace: String,
    pub types: String,
    pub request_message: String,
    pub response_message: String,
    pub port_type: String,
    pub binding: String,
    pub service: String,
}

impl WsdlDocument {
    pub fn to_xml(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WsdlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = escape(self.target_namespace.as_str());
        write!(
            f,
            concat!(
                r#"<wsdl:definitions name="{name}" xmlns:xsd="{xsd}" xmlns:xsi="{xsi}" "#,
                r#"xmlns:tns="{ns}" xmlns:soap="{soap}" xmlns:wsdl="{wsdl}" targetNamespace="{ns}">"#,
            ),
            name = escape(self.service_name.as_str()),
            xsd = XSD_NAMESPACE,
            xsi = XSI_NAMESPACE,
            ns = ns,
            soap = WSDL_SOAP_NAMESPACE,
            wsdl = WSDL_NAMESPACE,
        )?;
        for section in [
            &self.types,
            &self.request_message,
            &self.response_message,
            &self.port_type,
            &self.binding,
            &self.service,
        ] {
            f.write_str(section)?;
        }
        f.write_str("</wsdl:definitions>")
    }
}

/// Builds [`WsdlDocument`]s. Stateless; every call is independent.
#[derive(Clone, Copy, Debug, Default)]
pub struct WsdlAssembler;

impl WsdlAssembler {
    /// Describe `op` as the only operation of `service_name`, served at
    /// `location`.
    ///
    /// Fails with `UnsupportedShape` when the descriptor's shapes cannot be
    /// expressed.
    pub fn assemble(
        op: &OperationDescriptor,
        service_name: &str,
        target_namespace: &str,
        location: &str,
    ) -> Result<WsdlDocument> {
        op.validate()?;

        let mut types = TypesSection::default();
        let input_element = types.add(op, op.input(), PARAMS_ELEMENT, "Params")?;
        let output_element = types.add(op, op.output(), RETURNS_ELEMENT, "Returns")?;

        let service = escape(service_name);
        let operation = escape(op.name().as_str());
        let location = escape(location);

        let document = WsdlDocument {
            service_name: service_name.to_string(),
            target_namespace: target_namespace.to_string(),
            types: format!(
                r#"<wsdl:types><xsd:schema targetNamespace="{}">{}</xsd:schema></wsdl:types>"#,
                escape(target_namespace),
                types.body
            ),
            request_message: message(&format!("{}Request", service), &input_element),
            response_message: message(&format!("{}Response", service), &output_element),
            port_type: format!(
                concat!(
                    r#"<wsdl:portType name="{s}PortType"><wsdl:operation name="{op}">"#,
                    r#"<wsdl:input message="tns:{s}Request"/><wsdl:output message="tns:{s}Response"/>"#,
                    r#"</wsdl:operation></wsdl:portType>"#
                ),
                s = service,
                op = operation,
            ),
            binding: format!(
                concat!(
                    r#"<wsdl:binding name="{s}Binding" type="tns:{s}PortType">"#,
                    r#"<soap:binding style="document" transport="{transport}"/>"#,
                    r#"<wsdl:operation name="{op}"><soap:operation soapAction="{loc}" style="document"/>"#,
                    r#"<wsdl:input><soap:body use="literal"/></wsdl:input>"#,
                    r#"<wsdl:output><soap:body use="literal"/></wsdl:output>"#,
                    r#"</wsdl:operation></wsdl:binding>"#
                ),
                s = service,
                op = operation,
                loc = location,
                transport = SOAP_HTTP_TRANSPORT,
            ),
            service: format!(
                concat!(
                    r#"<wsdl:service name="{s}"><wsdl:port name="{s}Port" binding="tns:{s}Binding">"#,
                    r#"<soap:address location="{loc}"/></wsdl:port></wsdl:service>"#
                ),
                s = service,
                loc = location,
            ),
        };

        debug!(
            "assembled WSDL for {}/{} ({} bytes of types)",
            service_name,
            op.name(),
            document.types.len()
        );
        Ok(document)
    }
}

fn message(name: &str, element: &str) -> String {
    format!(
        r#"<wsdl:message name="{}"><wsdl:part name="parameters" element="tns:{}"/></wsdl:message>"#,
        name,
        escape(element)
    )
}

/// Accumulates the schema body; complex types and top-level elements shared
/// by input and output are written once. Type names map to the complexType
/// emitted for them, so a second, different type of the same name is caught.
#[derive(Default)]
struct TypesSection {
    seen_types: HashMap<String, String>,
    seen_elements: HashSet<String>,
    body: String,
}

impl TypesSection {
    /// Add the declarations for `shape` and return the name of its
    /// top-level element.
    fn add(
        &mut self,
        op: &OperationDescriptor,
        shape: &Shape,
        element: &str,
        suffix: &str,
    ) -> Result<String> {
        let wrapper = format!("{}{}", op.name(), suffix);
        match shape {
            Shape::Record(record) => {
                let mut complex_types = Vec::new();
                collect_complex_types(record, &mut self.seen_types, &mut complex_types)?;
                self.body.push_str(&complex_types.concat());
                let root = record.name().to_string();
                self.element(&root, &format!("tns:{}", root));
                Ok(root)
            }
            Shape::Arguments(_) => {
                let elements = op
                    .ordered_arguments()?
                    .into_iter()
                    .map(|(name, kind)| match kind {
                        ArgumentKind::Scalar(kind) => {
                            element_decl(name, kind.qualified_name(), None, false)
                        }
                        ArgumentKind::Array(array) => {
                            element_decl(name, array.kind.qualified_name(), Some(array.occurs), false)
                        }
                    })
                    .collect::<Vec<_>>();
                self.wrapper(element, &wrapper, elements)
            }
            Shape::Array(array) => {
                let elements = vec![element_decl(
                    "value",
                    array.kind.qualified_name(),
                    Some(array.occurs),
                    false,
                )];
                self.wrapper(element, &wrapper, elements)
            }
            Shape::Primitives(kinds) => {
                let elements = kinds
                    .iter()
                    .enumerate()
                    .map(|(i, kind)| {
                        element_decl(&format!("value{}", i + 1), kind.qualified_name(), None, false)
                    })
                    .collect::<Vec<_>>();
                self.wrapper(element, &wrapper, elements)
            }
            Shape::Scalar(kind) => {
                self.element(element, kind.qualified_name());
                Ok(element.to_string())
            }
        }
    }

    fn wrapper(&mut self, element: &str, type_name: &str, elements: Vec<String>) -> Result<String> {
        let mut complex_types = Vec::new();
        claim_type_name(
            &mut self.seen_types,
            type_name,
            &complex_type_decl(type_name, elements),
            &mut complex_types,
        )?;
        self.body.push_str(&complex_types.concat());
        self.element(element, &format!("tns:{}", type_name));
        Ok(element.to_string())
    }

    fn element(&mut self, name: &str, type_ref: &str) {
        if self.seen_elements.insert(name.to_string()) {
            self.body.push_str(&element_decl(name, type_ref, None, false));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ArrayShape;
    use pretty_assertions::assert_eq;
    use soapwire_schema::ScalarKind;

    fn add() -> OperationDescriptor {
        OperationDescriptor::with_arguments(
            "add",
            [
                ("a", ArgumentKind::Scalar(ScalarKind::Integer)),
                ("b", ArgumentKind::Scalar(ScalarKind::String)),
            ],
            Shape::Scalar(ScalarKind::Integer),
        )
    }

    #[test]
    fn test_named_arguments_synthesize_params_type() {
        let wsdl = WsdlAssembler::assemble(
            &add(),
            "Calculator",
            "http://localhost:8080/Calculator/add",
            "http://localhost:8080/Calculator",
        )
        .unwrap();
        assert_eq!(
            wsdl.types,
            concat!(
                r#"<wsdl:types><xsd:schema targetNamespace="http://localhost:8080/Calculator/add">"#,
                r#"<xsd:complexType name="addParams"><xsd:sequence>"#,
                r#"<xsd:element name="a" type="xsd:integer"/>"#,
                r#"<xsd:element name="b" type="xsd:string"/>"#,
                r#"</xsd:sequence></xsd:complexType>"#,
                r#"<xsd:element name="params" type="tns:addParams"/>"#,
                r#"<xsd:element name="returns" type="xsd:integer"/>"#,
                r#"</xsd:schema></wsdl:types>"#,
            )
        );
        assert_eq!(
            wsdl.request_message,
            r#"<wsdl:message name="CalculatorRequest"><wsdl:part name="parameters" element="tns:params"/></wsdl:message>"#
        );
    }

    #[test]
    fn test_array_and_primitive_list_shapes() {
        let op = OperationDescriptor::new(
            "stats",
            Shape::Array(ArrayShape::of(ScalarKind::Double)),
            Shape::Primitives(vec![ScalarKind::Double, ScalarKind::Integer]),
        );
        let wsdl = WsdlAssembler::assemble(&op, "Stats", "urn:stats", "http://h/Stats").unwrap();
        assert!(wsdl.types.contains(concat!(
            r#"<xsd:complexType name="statsParams"><xsd:sequence>"#,
            r#"<xsd:element name="value" type="xsd:double" minOccurs="0" maxOccurs="unbounded"/>"#
        )));
        assert!(wsdl.types.contains(concat!(
            r#"<xsd:complexType name="statsReturns"><xsd:sequence>"#,
            r#"<xsd:element name="value1" type="xsd:double"/>"#,
            r#"<xsd:element name="value2" type="xsd:integer"/>"#
        )));
        assert!(wsdl.types.contains(r#"<xsd:element name="returns" type="tns:statsReturns"/>"#));
    }

    #[test]
    fn test_definitions_wraps_sections_in_order() {
        let text = WsdlAssembler::assemble(&add(), "Calculator", "urn:calc", "http://h/Calculator")
            .unwrap()
            .to_string();
        assert!(text.starts_with(r#"<wsdl:definitions name="Calculator""#));
        let positions: Vec<_> = [
            "<wsdl:types>",
            r#"<wsdl:message name="CalculatorRequest">"#,
            r#"<wsdl:message name="CalculatorResponse">"#,
            "<wsdl:portType",
            "<wsdl:binding",
            "<wsdl:service",
        ]
        .iter()
        .map(|section| text.find(section).unwrap())
        .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(text.contains(r#"<soap:operation soapAction="http://h/Calculator" style="document"/>"#));
        assert!(text.contains(r#"<soap:address location="http://h/Calculator"/>"#));
    }

    #[test]
    fn test_record_named_like_a_wrapper_type_is_rejected() {
        let clash = soapwire_schema::RecordType::builder("addReturns")
            .scalar("sum", ScalarKind::Integer)
            .build()
            .unwrap();
        let op = OperationDescriptor::new(
            "add",
            Shape::Record(clash),
            Shape::Array(ArrayShape::of(ScalarKind::Integer)),
        );
        let err = WsdlAssembler::assemble(&op, "Calculator", "urn:calc", "http://h/c").unwrap_err();
        assert!(
            matches!(err, soapwire_schema::MarshalError::InvalidDeclaration(msg) if msg.contains("addReturns"))
        );
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let first = WsdlAssembler::assemble(&add(), "Calculator", "urn:calc", "http://h/c").unwrap();
        let second = WsdlAssembler::assemble(&add(), "Calculator", "urn:calc", "http://h/c").unwrap();
        assert_eq!(first, second);
    }
}
