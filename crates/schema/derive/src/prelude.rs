pub use darling::FromDeriveInput;
pub use darling::FromField;
pub use proc_macro::TokenStream;
pub use quote::quote;
pub use syn::spanned::Spanned;
pub use syn::{parse_macro_input, DeriveInput};

pub use crate::args::*;

/// Check if a type is a `Vec<T>`
pub fn is_vec_type(ty: &syn::Type) -> bool {
    if let syn::Type::Path(typepath) = ty {
        if let Some(segment) = typepath.path.segments.last() {
            return segment.ident == "Vec";
        }
    }
    false
}

/// Check that a name can be used as an XML element or type name: a letter
/// or `_`, then letters, digits, `_`, `-` or `.`.
pub fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Check that `min_occurs` does not exceed a bounded `max_occurs`
pub fn occurs_in_order(min: Option<u32>, max: Option<MaxOccursArg>) -> bool {
    match (min, max) {
        (Some(min), Some(MaxOccursArg::Bounded(max))) => min <= max,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_names() {
        assert!(is_xml_name("stayLength"));
        assert!(is_xml_name("_private.v2-x"));
        assert!(!is_xml_name("first name"));
        assert!(!is_xml_name("2nd"));
        assert!(!is_xml_name("tns:Person"));
        assert!(!is_xml_name(""));
    }

    #[test]
    fn test_occurs_order() {
        assert!(occurs_in_order(Some(2), Some(MaxOccursArg::Bounded(2))));
        assert!(occurs_in_order(Some(9), Some(MaxOccursArg::Unbounded)));
        assert!(occurs_in_order(Some(9), None));
        assert!(!occurs_in_order(Some(3), Some(MaxOccursArg::Bounded(2))));
    }
}
