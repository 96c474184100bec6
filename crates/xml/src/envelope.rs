//! SOAP 1.1 envelopes and faults.

use crate::document::Element;
use quick_xml::escape::escape;
use soapwire_schema::{MarshalError, Result};
use std::fmt;
use tracing::{debug, warn};

pub const SOAP_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Prefix bound to [`SOAP_ENVELOPE_NAMESPACE`] in rendered envelopes.
pub const SOAP_ENVELOPE_PREFIX: &str = "soapenv";

/// The single fault code used for every failure.
pub const SERVER_FAULT_CODE: &str = "soapenv:Server";

/// A parsed or outgoing SOAP envelope.
///
/// Header and body entries are kept as detached elements: each one carries
/// the namespace declarations it needs, so it can be serialized and parsed
/// on its own.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SoapMessage {
    header: Vec<Element>,
    body: Vec<Element>,
}

impl SoapMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `Envelope` document. The envelope prefix, whatever it is, is
    /// honored; a missing `Body` is a schema mismatch.
    pub fn parse(xml: &str) -> Result<Self> {
        let root = Element::parse(xml)?;
        if root.local_name() != "Envelope" {
            return Err(MarshalError::schema_mismatch(format!(
                "expected a SOAP Envelope, found <{}>",
                root.qualified_name()
            )));
        }
        if root.namespace() != Some(SOAP_ENVELOPE_NAMESPACE) {
            warn!(
                "envelope namespace is {:?}, not SOAP 1.1",
                root.namespace().unwrap_or_default()
            );
        }

        let header: Vec<Element> = root
            .child("Header")
            .map(|header| header.child_elements().map(Element::detached).collect())
            .unwrap_or_default();
        let body: Vec<Element> = root
            .child("Body")
            .ok_or_else(|| MarshalError::schema_mismatch("SOAP envelope has no Body"))?
            .child_elements()
            .map(Element::detached)
            .collect();

        debug!(
            "parsed envelope with {} header and {} body element(s)",
            header.len(),
            body.len()
        );
        Ok(Self { header, body })
    }

    pub fn header(&self) -> &[Element] {
        &self.header
    }

    pub fn body(&self) -> &[Element] {
        &self.body
    }

    /// The first body element: the operation's input or output element.
    pub fn body_root(&self) -> Option<&Element> {
        self.body.first()
    }

    pub fn with_header(mut self, element: Element) -> Self {
        self.header.push(element);
        self
    }

    pub fn with_body(mut self, element: Element) -> Self {
        self.body.push(element);
        self
    }

    /// Append XML text (e.g. a serialized record) to the body.
    pub fn with_body_xml(self, xml: &str) -> Result<Self> {
        Ok(self.with_body(Element::parse(xml)?))
    }

    /// The fault carried in the body, if any.
    pub fn fault(&self) -> Option<Fault> {
        let fault = self.body.iter().find(|e| e.local_name() == "Fault")?;
        Some(Fault {
            code: fault.child("faultcode").map(Element::text).unwrap_or_default(),
            message: fault
                .child("faultstring")
                .map(Element::text)
                .unwrap_or_default(),
        })
    }

    /// Render with the `soapenv` prefix. The header is always written, empty
    /// when there are no header entries.
    pub fn to_xml(&self) -> String {
        let mut body = String::new();
        for element in &self.body {
            body.push_str(&element.to_xml_string());
        }
        let mut header = String::new();
        for element in &self.header {
            header.push_str(&element.to_xml_string());
        }
        render_envelope(&header, &body)
    }
}

impl fmt::Display for SoapMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

/// Wrap already serialized header and body content in an envelope.
pub fn render_envelope(header: &str, body: &str) -> String {
    let p = SOAP_ENVELOPE_PREFIX;
    let header = if header.is_empty() {
        format!("<{p}:Header/>")
    } else {
        format!("<{p}:Header>{header}</{p}:Header>")
    };
    format!(
        r#"<{p}:Envelope xmlns:{p}="{ns}">{header}<{p}:Body>{body}</{p}:Body></{p}:Envelope>"#,
        ns = SOAP_ENVELOPE_NAMESPACE,
    )
}

/// A SOAP fault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fault {
    pub code: String,
    pub message: String,
}

impl Fault {
    /// A `soapenv:Server` fault for any failure raised while serving a
    /// request.
    pub fn server(error: impl fmt::Display) -> Self {
        Self {
            code: SERVER_FAULT_CODE.to_string(),
            message: format!("Error in web service : {}", error),
        }
    }

    pub fn to_xml(&self) -> String {
        format!(
            "<{p}:Fault><faultcode>{}</faultcode><faultstring>{}</faultstring></{p}:Fault>",
            escape(self.code.as_str()),
            escape(self.message.as_str()),
            p = SOAP_ENVELOPE_PREFIX,
        )
    }

    /// A complete envelope carrying only this fault.
    pub fn envelope(&self) -> String {
        render_envelope("", &self.to_xml())
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<&MarshalError> for Fault {
    fn from(err: &MarshalError) -> Self {
        Fault::server(err)
    }
}
