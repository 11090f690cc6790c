//! Crate-wide error type and the context helpers used to annotate it.

use std::fmt::Debug;
pub mod error;
pub mod result;

/// Wraps an error with the debug form of the object being worked on and the failing function
pub trait WithDebugObjectAndFnName<S: Into<String>, O: Debug + 'static> {
    fn with_debug_object_and_fn_name(self, obj: O, fn_name: S) -> Self;
}

/// Wraps an error with a human readable message
pub trait WithMsg<S: Into<String>> {
    fn with_msg(self, msg: S) -> Self;
}
