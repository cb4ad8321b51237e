//! Wire types of the Invoke API.

mod request;
mod response;

pub use request::{requested_error, InvocationType, ERROR_TYPE_HEADER, INVOCATION_TYPE_HEADER};
pub use response::{
    InvokeResponse, LambdaError, EXECUTED_VERSION, EXECUTED_VERSION_HEADER, FUNCTION_ERROR_HANDLED,
    FUNCTION_ERROR_HEADER, FUNCTION_ERROR_UNHANDLED,
};
