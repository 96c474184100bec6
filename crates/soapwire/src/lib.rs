//! soapwire: declare record types once, get their XSD, read and write them
//! as XML, and describe and serve a SOAP operation over them.
//!
//! The pieces live in separate crates, re-exported here:
//!
//! - [`schema`]: scalar kinds, record types and instances, XSD generation
//! - [`XmlRecord`]: derive a record type from a struct
//! - [`xml`]: XML documents, schema index, unmarshalling, SOAP envelopes
//! - [`wsdl`]: operation shapes, WSDL assembly, the request endpoint
//!
//! Outside the `soapwire_schema` crate, derived types name the schema path:
//!
//! ```
//! use soapwire::prelude::*;
//!
//! #[derive(XmlRecord, Debug, PartialEq)]
//! #[xml(crate = "soapwire::schema")]
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! let steve = Person { name: "Steve".to_string(), age: 38 };
//! let xml = steve.to_xml();
//! assert_eq!(xml, "<Person><name>Steve</name><age>38</age></Person>");
//! assert_eq!(xml_to_record::<Person>(&xml)?, steve);
//! # Ok::<(), MarshalError>(())
//! ```

pub use soapwire_schema as schema;
pub use soapwire_schema_derive::XmlRecord;
pub use soapwire_wsdl as wsdl;
pub use soapwire_xml as xml;

pub mod prelude {
    pub use soapwire_schema::{
        FromRecordInstance, MarshalError, RecordInstance, RecordType, ScalarKind, ScalarValue,
        ToRecordInstance, ToRecordType,
    };
    pub use soapwire_schema_derive::XmlRecord;
    pub use soapwire_wsdl::{
        ArgumentKind, ArrayShape, FnOperation, OperationDescriptor, OperationInput,
        OperationOutput, ServiceConfig, Shape, SoapEndpoint, SoapOperation, WsdlAssembler,
    };
    pub use soapwire_xml::{xml_to_record, Marshaller, SoapMessage};
}
