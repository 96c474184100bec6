//! Operation values on the wire: reading the request body into an
//! [`OperationInput`] and writing an [`OperationOutput`] as the response
//! body.

use crate::shape::{ArgumentKind, OperationDescriptor, Shape};
use soapwire_schema::{
    FromRecordInstance, MarshalError, RecordInstance, Result, ScalarKind, ScalarValue,
    ToRecordInstance,
};
use soapwire_xml::{Element, Marshaller};
use std::collections::BTreeMap;
use tracing::trace;

/// Value of one named argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgumentValue {
    /// first matching element, `None` when missing or empty
    Scalar(Option<ScalarValue>),
    /// every matching element in document order
    Array(Vec<ScalarValue>),
}

/// A decoded request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationInput {
    Record(RecordInstance),
    Arguments(BTreeMap<String, ArgumentValue>),
    Array(Vec<ScalarValue>),
    Primitives(Vec<Option<ScalarValue>>),
    Scalar(Option<ScalarValue>),
}

impl OperationInput {
    /// Decode the request's first body element for `descriptor`.
    pub fn parse(body: &Element, descriptor: &OperationDescriptor) -> Result<Self> {
        let input = match descriptor.input() {
            Shape::Record(record) => {
                OperationInput::Record(Marshaller::new(record.clone()).from_element(body)?)
            }
            Shape::Arguments(_) => {
                let mut values = BTreeMap::new();
                for (name, kind) in descriptor.ordered_arguments()? {
                    let value = match kind {
                        ArgumentKind::Scalar(kind) => {
                            ArgumentValue::Scalar(find_values(body, name, kind)?.into_iter().next())
                        }
                        ArgumentKind::Array(array) => {
                            ArgumentValue::Array(find_values(body, name, array.kind)?)
                        }
                    };
                    values.insert(name.to_string(), value);
                }
                OperationInput::Arguments(values)
            }
            Shape::Array(array) => OperationInput::Array(find_values(body, "value", array.kind)?),
            Shape::Primitives(kinds) => OperationInput::Primitives(
                kinds
                    .iter()
                    .enumerate()
                    .map(|(i, kind)| {
                        Ok(find_values(body, &format!("value{}", i + 1), *kind)?
                            .into_iter()
                            .next())
                    })
                    .collect::<Result<_>>()?,
            ),
            Shape::Scalar(kind) => OperationInput::Scalar(element_value(body, *kind)?),
        };
        trace!("decoded input of {}: {:?}", descriptor.name(), input);
        Ok(input)
    }

    pub fn record(&self) -> Option<&RecordInstance> {
        match self {
            OperationInput::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Decode a record input into its Rust type.
    pub fn decode<T: FromRecordInstance>(&self) -> Result<T> {
        match self {
            OperationInput::Record(record) => T::from_instance(record),
            _ => Err(MarshalError::schema_mismatch("operation input is not a record")),
        }
    }

    /// A scalar argument, `None` when missing.
    pub fn argument(&self, name: &str) -> Option<&ScalarValue> {
        match self {
            OperationInput::Arguments(values) => match values.get(name)? {
                ArgumentValue::Scalar(value) => value.as_ref(),
                ArgumentValue::Array(_) => None,
            },
            _ => None,
        }
    }

    /// An array argument, empty when missing.
    pub fn array_argument(&self, name: &str) -> &[ScalarValue] {
        match self {
            OperationInput::Arguments(values) => match values.get(name) {
                Some(ArgumentValue::Array(items)) => items,
                _ => &[],
            },
            _ => &[],
        }
    }

    /// Items of an array input.
    pub fn items(&self) -> &[ScalarValue] {
        match self {
            OperationInput::Array(items) => items,
            _ => &[],
        }
    }
}

/// Value of an element: `None` for an empty element, the coerced text
/// otherwise. Strings are kept verbatim.
fn element_value(element: &Element, kind: ScalarKind) -> Result<Option<ScalarValue>> {
    let text = element.text();
    if text.is_empty() {
        return Ok(None);
    }
    kind.coerce(&text).map(Some)
}

/// Values of every element named `name` below `body`, skipping empty ones.
fn find_values(body: &Element, name: &str, kind: ScalarKind) -> Result<Vec<ScalarValue>> {
    let mut values = Vec::new();
    for element in body.find_all(name) {
        if let Some(value) = element_value(element, kind)? {
            values.push(value);
        }
    }
    Ok(values)
}

/// A response value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationOutput {
    Record(RecordInstance),
    Scalar(ScalarValue),
    Primitives(Vec<ScalarValue>),
    Array(Vec<ScalarValue>),
}

impl OperationOutput {
    pub fn record<T: ToRecordInstance>(value: &T) -> Self {
        OperationOutput::Record(value.to_instance())
    }

    /// Write the response body for `descriptor`'s output shape.
    ///
    /// Records are written as their own root element, everything else inside
    /// a `returns` element.
    pub fn to_xml(&self, descriptor: &OperationDescriptor) -> Result<String> {
        let mismatch = || {
            MarshalError::schema_mismatch(format!(
                "operation {} returns {}, which does not match the produced value",
                descriptor.name(),
                descriptor.output()
            ))
        };
        let xml = match (descriptor.output(), self) {
            (Shape::Record(record), OperationOutput::Record(instance)) => {
                if record.name() != instance.name() {
                    return Err(mismatch());
                }
                instance.to_xml()
            }
            (Shape::Scalar(kind), OperationOutput::Scalar(value)) if *kind == value.kind() => {
                Element::new("returns").with_text(value.render()).to_xml_string()
            }
            (Shape::Primitives(kinds), OperationOutput::Primitives(values))
                if kinds.len() == values.len()
                    && kinds.iter().zip(values).all(|(kind, v)| *kind == v.kind()) =>
            {
                values
                    .iter()
                    .enumerate()
                    .fold(Element::new("returns"), |returns, (i, value)| {
                        returns.with_child(
                            Element::new(format!("value{}", i + 1)).with_text(value.render()),
                        )
                    })
                    .to_xml_string()
            }
            (Shape::Array(array), OperationOutput::Array(values))
                if values.iter().all(|v| v.kind() == array.kind)
                    && array.occurs.max.allows(values.len()) =>
            {
                values
                    .iter()
                    .fold(Element::new("returns"), |returns, value| {
                        returns.with_child(Element::new("value").with_text(value.render()))
                    })
                    .to_xml_string()
            }
            _ => return Err(mismatch()),
        };
        Ok(xml)
    }
}

impl From<ScalarValue> for OperationOutput {
    fn from(value: ScalarValue) -> Self {
        OperationOutput::Scalar(value)
    }
}

impl From<RecordInstance> for OperationOutput {
    fn from(instance: RecordInstance) -> Self {
        OperationOutput::Record(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ArrayShape;
    use pretty_assertions::assert_eq;

    fn add() -> OperationDescriptor {
        OperationDescriptor::with_arguments(
            "add",
            [
                ("a", ArgumentKind::Scalar(ScalarKind::Integer)),
                ("b", ArgumentKind::Scalar(ScalarKind::Integer)),
                ("tags", ArgumentKind::Array(ArrayShape::of(ScalarKind::String))),
            ],
            Shape::Scalar(ScalarKind::Integer),
        )
    }

    #[test]
    fn test_named_arguments() {
        let body =
            Element::parse("<add><a>1</a><b></b><tags>x</tags><tags>y</tags></add>").unwrap();
        let input = OperationInput::parse(&body, &add()).unwrap();
        assert_eq!(input.argument("a"), Some(&ScalarValue::Integer(1)));
        assert_eq!(input.argument("b"), None);
        assert_eq!(
            input.array_argument("tags"),
            &[
                ScalarValue::String("x".to_string()),
                ScalarValue::String("y".to_string())
            ]
        );
    }

    #[test]
    fn test_bad_argument_text_fails() {
        let body = Element::parse("<add><a>one</a></add>").unwrap();
        assert!(matches!(
            OperationInput::parse(&body, &add()),
            Err(MarshalError::TypeCoercion { .. })
        ));
    }

    #[test]
    fn test_returns_rendering() {
        let scalar = OperationOutput::Scalar(ScalarValue::Integer(3));
        assert_eq!(scalar.to_xml(&add()).unwrap(), "<returns>3</returns>");

        let list = OperationDescriptor::new(
            "split",
            Shape::Scalar(ScalarKind::String),
            Shape::Primitives(vec![ScalarKind::String, ScalarKind::Boolean]),
        );
        let values = OperationOutput::Primitives(vec![
            ScalarValue::String("a".to_string()),
            ScalarValue::Boolean(true),
        ]);
        assert_eq!(
            values.to_xml(&list).unwrap(),
            "<returns><value1>a</value1><value2>true</value2></returns>"
        );

        let array = OperationDescriptor::new(
            "range",
            Shape::Scalar(ScalarKind::Integer),
            Shape::Array(ArrayShape::of(ScalarKind::Integer)),
        );
        let items = OperationOutput::Array(vec![ScalarValue::Integer(0), ScalarValue::Integer(1)]);
        assert_eq!(
            items.to_xml(&array).unwrap(),
            "<returns><value>0</value><value>1</value></returns>"
        );
        assert!(scalar.to_xml(&array).is_err());
    }

    #[test]
    fn test_empty_array_renders_empty_returns() {
        let array = OperationDescriptor::new(
            "range",
            Shape::Scalar(ScalarKind::Integer),
            Shape::Array(ArrayShape::of(ScalarKind::Integer)),
        );
        assert_eq!(
            OperationOutput::Array(Vec::new()).to_xml(&array).unwrap(),
            "<returns/>"
        );
    }
}
