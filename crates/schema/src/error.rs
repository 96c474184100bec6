use crate::ScalarKind;
use thiserror::Error;

/// Errors raised while generating schemas or marshalling records.
///
/// None of these are retried internally; they surface to the immediate caller
/// which, at the transport boundary, turns them into a SOAP fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// Scalar text does not match the declared kind
    #[error("cannot read {text:?} as xsd:{}", kind.xsd_name())]
    TypeCoercion { kind: ScalarKind, text: String },

    /// XML structure disagrees with the target record type
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Operation input/output shape is not one of the recognized forms
    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),

    /// Input bytes are not well-formed XML
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    /// A record type declaration is inconsistent (duplicate field names etc.)
    #[error("invalid record declaration: {0}")]
    InvalidDeclaration(String),
}

impl MarshalError {
    pub fn coercion(kind: ScalarKind, text: impl Into<String>) -> Self {
        Self::TypeCoercion {
            kind,
            text: text.into(),
        }
    }

    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch(message.into())
    }

    pub fn unsupported_shape(message: impl Into<String>) -> Self {
        Self::UnsupportedShape(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedXml(message.into())
    }

    pub fn invalid_declaration(message: impl Into<String>) -> Self {
        Self::InvalidDeclaration(message.into())
    }
}

impl From<quick_xml::Error> for MarshalError {
    fn from(err: quick_xml::Error) -> Self {
        Self::MalformedXml(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MarshalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercion_message_names_xsd_type() {
        let err = MarshalError::coercion(ScalarKind::Integer, "abc");
        assert_eq!(err.to_string(), "cannot read \"abc\" as xsd:integer");
    }
}
