//! Recorded call signatures of registered functions.
//!
//! A function registered through [`LambdaFunction`](super::LambdaFunction)
//! remembers which of the accepted native shapes it had. The mock fetcher
//! uses that record to synthesize a stand-in that returns the same kind of
//! result without running any code.

use crate::function::handler::InvokeError;
use bytes::Bytes;
use serde::Serialize;
use std::fmt;

/// Produces the wire encoding of an output type's zero value.
pub type ZeroFn = fn() -> Result<Bytes, InvokeError>;

/// The value slot of a function's return type.
#[derive(Clone, Copy)]
pub struct ValueType {
    name: &'static str,
    zero: ZeroFn,
}

impl ValueType {
    /// Describe a JSON-encoded output type whose zero value is `O::default()`.
    pub fn of<O>() -> Self
    where
        O: Serialize + Default + 'static,
    {
        Self {
            name: std::any::type_name::<O>(),
            zero: zero_of::<O>,
        }
    }

    /// Describe a raw byte output whose zero value is the empty payload.
    pub fn raw() -> Self {
        Self {
            name: std::any::type_name::<Bytes>(),
            zero: || Ok(Bytes::new()),
        }
    }

    /// Full type name of the output.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Encode the zero value of the output.
    pub fn zero(&self) -> Result<Bytes, InvokeError> {
        (self.zero)()
    }
}

fn zero_of<O>() -> Result<Bytes, InvokeError>
where
    O: Serialize + Default + 'static,
{
    crate::function::lambda::encode(&O::default())
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueType").field(&self.name).finish()
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ValueType {}

/// What a function returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Returns nothing.
    Nothing,
    /// Returns a value.
    Value(ValueType),
    /// Returns only an error slot.
    Error,
    /// Returns a value and an error slot.
    ValueAndError(ValueType),
    /// Hand-written function whose shape was never recorded.
    Opaque,
}

/// The original call signature of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    input: &'static str,
    output: Output,
}

impl Signature {
    pub fn new(input: &'static str, output: Output) -> Self {
        Self { input, output }
    }

    /// Signature of a function taking `I`.
    pub fn taking<I: ?Sized>(output: Output) -> Self {
        Self::new(std::any::type_name::<I>(), output)
    }

    /// Signature for functions that do not record their shape.
    pub fn opaque() -> Self {
        Self::new("_", Output::Opaque)
    }

    /// Full type name of the input parameter, `()` for none.
    pub fn input(&self) -> &'static str {
        self.input
    }

    pub fn output(&self) -> Output {
        self.output
    }

    /// Whether the function takes a parameter.
    pub fn takes_input(&self) -> bool {
        self.input != "()"
    }

    /// Whether the function declares an error return.
    pub fn returns_error(&self) -> bool {
        matches!(self.output, Output::Error | Output::ValueAndError(_))
    }

    /// The value slot, if the function returns one.
    pub fn value_type(&self) -> Option<ValueType> {
        match self.output {
            Output::Value(value) | Output::ValueAndError(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.output == Output::Opaque
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.takes_input() {
            write!(f, "fn({})", self.input)?;
        } else {
            f.write_str("fn()")?;
        }
        match self.output {
            Output::Nothing => Ok(()),
            Output::Value(value) => write!(f, " -> {}", value.name()),
            Output::Error => f.write_str(" -> error"),
            Output::ValueAndError(value) => write!(f, " -> ({}, error)", value.name()),
            Output::Opaque => f.write_str(" -> ?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Default)]
    struct Greeting {
        greeting: String,
    }

    #[test]
    fn test_value_type_zero() {
        let value = ValueType::of::<Greeting>();
        assert_eq!(value.zero().unwrap(), Bytes::from_static(br#"{"greeting":""}"#));
        assert!(ValueType::raw().zero().unwrap().is_empty());
        assert!(ValueType::of::<()>().zero().unwrap().is_empty());
    }

    #[test]
    fn test_signature_shape_queries() {
        let sig = Signature::taking::<u32>(Output::ValueAndError(ValueType::of::<String>()));
        assert!(sig.takes_input());
        assert!(sig.returns_error());
        assert_eq!(sig.value_type().map(|v| v.name()), Some("alloc::string::String"));

        let sig = Signature::taking::<()>(Output::Nothing);
        assert!(!sig.takes_input());
        assert!(!sig.returns_error());
        assert!(sig.value_type().is_none());

        assert!(Signature::opaque().is_opaque());
    }

    #[test]
    fn test_signature_display() {
        let sig = Signature::taking::<()>(Output::Error);
        assert_eq!(sig.to_string(), "fn() -> error");

        let sig = Signature::taking::<u32>(Output::Value(ValueType::of::<u64>()));
        assert_eq!(sig.to_string(), "fn(u32) -> u64");
    }
}
