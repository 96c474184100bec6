//! Record types over a fixed set of XSD scalar kinds: declaration, XSD
//! generation and XML serialization.
//!
//! Record types are usually derived from Rust structs with
//! `#[derive(XmlRecord)]` (see `soapwire-schema-derive`) but can also be
//! declared by hand with [`RecordType::builder`].

pub use error::*;
pub use field::*;
pub use impls::XsdDuration;
pub use instance::*;
pub use record::*;
pub use scalar::*;
pub use traits::{
    FromRecordInstance, ToRecordInstance, ToRecordType, XmlElement, XmlField, XmlScalar,
};
pub use xsd::{
    claim_type_name, collect_complex_types, complex_type_decl, element_decl, schema_document,
    XsdFragment,
};

mod error;
mod field;
mod impls;
mod instance;
mod record;
mod scalar;
mod traits;
pub mod xsd;

/// Helpers used by code generated from `soapwire-schema-derive` and
/// [`impl_scalar_field!`]. Not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use crate::traits::{scalar_field_value, scalar_item};
}

/// Collect the XSD fragments of several record types into one schema body,
/// each distinct complex type once. Evaluates to a `Result<String>` that
/// fails when two of the types disagree on what a type name means.
///
/// ```
/// use soapwire_schema::{schema_document, xsd_types, RecordRef, RecordType, ScalarKind, ToRecordType};
///
/// struct Point;
///
/// impl ToRecordType for Point {
///     fn record_type() -> RecordRef {
///         RecordType::builder("Point")
///             .scalar("x", ScalarKind::Double)
///             .scalar("y", ScalarKind::Double)
///             .build()
///             .unwrap()
///     }
/// }
///
/// let body = xsd_types!(Point, Point)?;
/// assert_eq!(body.matches("<xsd:complexType").count(), 1);
/// assert!(schema_document(&body, None).starts_with("<xsd:schema"));
/// # Ok::<(), soapwire_schema::MarshalError>(())
/// ```
#[macro_export]
macro_rules! xsd_types {
    ($($ty:ty),* $(,)?) => {{
        (|| -> $crate::Result<::std::string::String> {
            let mut seen = ::std::collections::HashMap::new();
            let mut types = ::std::vec::Vec::new();
            $(
                $crate::collect_complex_types(
                    &<$ty as $crate::ToRecordType>::record_type(),
                    &mut seen,
                    &mut types,
                )?;
            )*
            Ok(types.concat())
        })()
    }};
}
