use derive_getters::Getters;
use itertools::Itertools;
use soapwire_schema::{MarshalError, Occurs, RecordRef, Result, ScalarKind, ToRecordType};
use std::collections::BTreeMap;
use std::fmt;

/// A repeated primitive: every item is a `value` element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrayShape {
    pub kind: ScalarKind,
    pub occurs: Occurs,
}

impl ArrayShape {
    pub fn of(kind: ScalarKind) -> Self {
        Self {
            kind,
            occurs: Occurs::default(),
        }
    }
}

/// Kind of one named argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgumentKind {
    Scalar(ScalarKind),
    Array(ArrayShape),
}

impl From<ScalarKind> for ArgumentKind {
    fn from(kind: ScalarKind) -> Self {
        ArgumentKind::Scalar(kind)
    }
}

impl From<ArrayShape> for ArgumentKind {
    fn from(array: ArrayShape) -> Self {
        ArgumentKind::Array(array)
    }
}

/// The input or output shape of an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    /// a record type, exchanged as its own root element
    Record(RecordRef),
    /// a bare repeated primitive
    Array(ArrayShape),
    /// named arguments, ordered by the descriptor's argument names
    Arguments(BTreeMap<String, ArgumentKind>),
    /// unnamed primitives, exchanged as `value1..valueN`
    Primitives(Vec<ScalarKind>),
    /// a single primitive
    Scalar(ScalarKind),
}

impl Shape {
    pub fn record<T: ToRecordType>() -> Self {
        Shape::Record(T::record_type())
    }

    pub fn arguments<I, K>(arguments: I) -> Self
    where
        I: IntoIterator<Item = (K, ArgumentKind)>,
        K: Into<String>,
    {
        Shape::Arguments(
            arguments
                .into_iter()
                .map(|(name, kind)| (name.into(), kind))
                .collect(),
        )
    }

    fn label(&self) -> &'static str {
        match self {
            Shape::Record(_) => "record",
            Shape::Array(_) => "array",
            Shape::Arguments(_) => "arguments",
            Shape::Primitives(_) => "primitive list",
            Shape::Scalar(_) => "scalar",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Record(record) => write!(f, "record {}", record.name()),
            Shape::Array(array) => write!(f, "array of {}", array.kind),
            Shape::Arguments(arguments) => {
                write!(f, "arguments ({})", arguments.keys().join(", "))
            }
            Shape::Primitives(kinds) => write!(f, "primitives ({})", kinds.iter().join(", ")),
            Shape::Scalar(kind) => write!(f, "{}", kind),
        }
    }
}

/// One exposed operation: its name, input and output shapes and, for named
/// arguments, the argument order.
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
pub struct OperationDescriptor {
    name: String,
    input: Shape,
    output: Shape,
    argument_names: Vec<String>,
}

impl OperationDescriptor {
    pub fn new(name: impl Into<String>, input: Shape, output: Shape) -> Self {
        Self {
            name: name.into(),
            input,
            output,
            argument_names: Vec::new(),
        }
    }

    /// Operation with named arguments in the given order.
    pub fn with_arguments<I, K>(name: impl Into<String>, arguments: I, output: Shape) -> Self
    where
        I: IntoIterator<Item = (K, ArgumentKind)>,
        K: Into<String>,
    {
        let arguments: Vec<(String, ArgumentKind)> = arguments
            .into_iter()
            .map(|(name, kind)| (name.into(), kind))
            .collect();
        let argument_names = arguments.iter().map(|(name, _)| name.clone()).collect();
        Self {
            name: name.into(),
            input: Shape::Arguments(arguments.into_iter().collect()),
            output,
            argument_names,
        }
    }

    pub fn with_argument_names<I, K>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.argument_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Arguments in declaration order with their kinds.
    ///
    /// Fails unless the input takes named arguments and every argument name
    /// has exactly one kind.
    pub fn ordered_arguments(&self) -> Result<Vec<(&str, ArgumentKind)>> {
        let Shape::Arguments(kinds) = &self.input else {
            return Err(MarshalError::unsupported_shape(format!(
                "operation {} takes a {}, not named arguments",
                self.name,
                self.input.label()
            )));
        };
        if kinds.is_empty() {
            return Err(MarshalError::unsupported_shape(format!(
                "operation {} declares no arguments",
                self.name
            )));
        }
        let names_match = self.argument_names.len() == kinds.len()
            && self.argument_names.iter().all_unique()
            && self.argument_names.iter().all(|name| kinds.contains_key(name));
        if !names_match {
            return Err(MarshalError::unsupported_shape(format!(
                "operation {} names arguments [{}] but types [{}]",
                self.name,
                self.argument_names.iter().join(", "),
                kinds.keys().join(", ")
            )));
        }
        Ok(self
            .argument_names
            .iter()
            .map(|name| (name.as_str(), kinds[name]))
            .collect())
    }

    /// Check that both shapes are usable in their position.
    pub fn validate(&self) -> Result<()> {
        match &self.input {
            Shape::Arguments(_) => {
                self.ordered_arguments()?;
            }
            Shape::Primitives(kinds) if kinds.is_empty() => {
                return Err(MarshalError::unsupported_shape(format!(
                    "operation {} takes an empty primitive list",
                    self.name
                )))
            }
            _ => {}
        }
        match &self.output {
            Shape::Arguments(_) => Err(MarshalError::unsupported_shape(format!(
                "operation {} cannot return named arguments",
                self.name
            ))),
            Shape::Primitives(kinds) if kinds.is_empty() => Err(MarshalError::unsupported_shape(
                format!("operation {} returns an empty primitive list", self.name),
            )),
            _ => Ok(()),
        }
    }
}
