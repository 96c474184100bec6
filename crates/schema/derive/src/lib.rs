mod args;
mod prelude;
mod record;

use crate::prelude::*;
use crate::record::implement_for_struct;

/// Derives a record type for a struct with named fields, together with
/// conversions between the struct and `RecordInstance`.
///
/// Fields map to record fields in declaration order. Field types must
/// implement `XmlField`: the supported scalars, `Option<T>` (optional
/// element), `Vec<T>` (repeated element) or another `XmlRecord` type
/// (nested record).
///
/// # Struct Attributes
///
/// - `#[xml(name = "CustomName")]` - record type name (defaults to the struct name).
/// - `#[xml(rename_all = "camelCase")]` - rename every field element. Supported values:
///   "lowercase", "UPPERCASE", "PascalCase", "camelCase", "snake_case", "SCREAMING_SNAKE_CASE", "kebab-case".
/// - `#[xml(crate = "path")]` - path to `soapwire_schema` in generated code.
///
/// # Field Attributes
///
/// - `#[xml(name = "customName")]` - element name (defaults to the field name).
/// - `#[xml(min_occurs = 1)]` - `minOccurs` of a `Vec` field (default 0).
/// - `#[xml(max_occurs = 10)]` - `maxOccurs` of a `Vec` field, a number or `"unbounded"` (default).
///
/// Record and element names must be XML names, and `min_occurs` may not
/// exceed a numeric `max_occurs`; both are compile errors. Nesting two
/// different records that share a name panics on the first `record_type()`.
///
/// # Example
///
/// ```rust
/// use soapwire_schema::{ToRecordInstance, ToRecordType};
/// use soapwire_schema_derive::XmlRecord;
///
/// #[derive(XmlRecord)]
/// struct Person {
///     name: String,
///     age: i64,
/// }
///
/// let steve = Person { name: "Steve".to_string(), age: 38 };
/// assert_eq!(steve.to_xml(), "<Person><name>Steve</name><age>38</age></Person>");
/// assert_eq!(Person::record_type().fields().len(), 2);
/// ```
#[proc_macro_derive(XmlRecord, attributes(xml))]
pub fn derive_xml_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match XmlRecordOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(err) => return err.write_errors().into(),
    };

    match implement_for_struct(&opts) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
