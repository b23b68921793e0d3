//! Request validators and small rule helpers.

use crate::error::FieldFailure;
use crate::request::Request;

/// Checks a request and reports every failing field.
///
/// An empty result means the request is valid.
pub trait Validator<R: Request>: Send + Sync {
    fn validate(&self, request: &R) -> Vec<FieldFailure>;
}

/// Any closure over a request is a validator.
impl<R, F> Validator<R> for F
where
    R: Request,
    F: Fn(&R) -> Vec<FieldFailure> + Send + Sync,
{
    fn validate(&self, request: &R) -> Vec<FieldFailure> {
        self(request)
    }
}

/// Fails if the value is blank.
pub fn not_empty(failures: &mut Vec<FieldFailure>, field: &str, value: &str) {
    if value.trim().is_empty() {
        failures.push(FieldFailure::new(field, format!("'{field}' must not be empty.")));
    }
}

/// Fails if the value has more than `max` characters.
pub fn max_length(failures: &mut Vec<FieldFailure>, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        failures.push(FieldFailure::new(
            field,
            format!("The length of '{field}' must be {max} characters or fewer. You entered {len} characters."),
        ));
    }
}

/// Fails if the value lies outside `[min, max]`.
pub fn inclusive_between(failures: &mut Vec<FieldFailure>, field: &str, value: f64, min: f64, max: f64) {
    if !(min..=max).contains(&value) {
        failures.push(FieldFailure::new(
            field,
            format!("'{field}' must be between {min} and {max}. You entered {value}."),
        ));
    }
}
