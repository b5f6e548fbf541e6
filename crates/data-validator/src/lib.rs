//! Input Validation
//!
//! Range checking for the three user-supplied prediction inputs.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{ApprenticeInput, InputLimits, Range, Validator};
