//! Service description and dispatch for a single SOAP operation.
//!
//! An [`OperationDescriptor`] names the operation and its input and output
//! [`Shape`]s. [`WsdlAssembler`] turns it into a WSDL 1.1 document;
//! [`SoapEndpoint`] decodes requests for it, calls a [`SoapOperation`] and
//! encodes the response or a fault.
//!
//! ```
//! use soapwire_schema::{ScalarKind, ScalarValue};
//! use soapwire_wsdl::{
//!     ArgumentKind, FnOperation, OperationDescriptor, OperationOutput, ServiceConfig,
//!     Shape, SoapEndpoint,
//! };
//!
//! let add = OperationDescriptor::with_arguments(
//!     "add",
//!     [
//!         ("a", ArgumentKind::Scalar(ScalarKind::Integer)),
//!         ("b", ArgumentKind::Scalar(ScalarKind::Integer)),
//!     ],
//!     Shape::Scalar(ScalarKind::Integer),
//! );
//! let endpoint = SoapEndpoint::new(
//!     ServiceConfig::for_endpoint("localhost", 8080, "Calculator"),
//!     FnOperation::new(add, |input| {
//!         let a = input.argument("a").and_then(ScalarValue::as_i64).unwrap_or(0);
//!         let b = input.argument("b").and_then(ScalarValue::as_i64).unwrap_or(0);
//!         Ok(OperationOutput::Scalar(ScalarValue::Integer(a + b)))
//!     }),
//! );
//!
//! let response = endpoint.handle(concat!(
//!     r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">"#,
//!     "<soapenv:Body><params><a>2</a><b>3</b></params></soapenv:Body></soapenv:Envelope>",
//! ));
//! assert!(response.contains("<returns>5</returns>"));
//! ```

pub use assembler::{
    WsdlAssembler, WsdlDocument, PARAMS_ELEMENT, RETURNS_ELEMENT, SOAP_HTTP_TRANSPORT,
    WSDL_NAMESPACE, WSDL_SOAP_NAMESPACE, XSI_NAMESPACE,
};
pub use config::ServiceConfig;
pub use endpoint::{is_wsdl_query, FnOperation, SoapEndpoint, SoapOperation};
pub use error::EndpointError;
pub use message::{ArgumentValue, OperationInput, OperationOutput};
pub use shape::{ArgumentKind, ArrayShape, OperationDescriptor, Shape};

mod assembler;
mod config;
mod endpoint;
mod error;
mod message;
mod shape;
