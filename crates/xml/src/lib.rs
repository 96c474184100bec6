//! XML side of soapwire: parsing documents, indexing schemas, turning XML
//! back into record instances and handling SOAP envelopes.
//!
//! ```
//! use soapwire_schema::{RecordType, ScalarKind};
//! use soapwire_xml::Marshaller;
//!
//! let person = RecordType::builder("Person")
//!     .scalar("name", ScalarKind::String)
//!     .scalar("age", ScalarKind::Integer)
//!     .build()?;
//! let marshaller = Marshaller::new(person);
//! let steve = marshaller.from_xml("<Person><name>Steve</name><age>38</age></Person>")?;
//! assert_eq!(steve.to_xml(), "<Person><name>Steve</name><age>38</age></Person>");
//! # Ok::<(), soapwire_schema::MarshalError>(())
//! ```

pub use document::{Element, Node};
pub use envelope::{
    render_envelope, Fault, SoapMessage, SERVER_FAULT_CODE, SOAP_ENVELOPE_NAMESPACE,
    SOAP_ENVELOPE_PREFIX,
};
pub use pipeline::{
    flatten, from_element, from_xml, reconstruct, xml_to_record, FlatValue, Marshaller,
};
pub use schema_index::{IndexEntry, SchemaIndex};

mod document;
mod envelope;
mod pipeline;
mod schema_index;
