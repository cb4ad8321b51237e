//! Functions: the uniform byte-oriented call contract and its typed adapter.

pub mod handler;
pub mod lambda;
pub mod signature;

pub use handler::{short_type_name, ErrorKind, Function, InvokeError};
pub use lambda::LambdaFunction;
pub use signature::{Output, Signature, ValueType};
