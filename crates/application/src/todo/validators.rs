//! Validators for the todo requests.

use std::str::FromStr;

use domain::{Colour, PriorityLevel};

use super::{CreateTodoItem, CreateTodoList, UpdateTodoItem};
use crate::error::FieldFailure;
use crate::validation::{Validator, max_length, not_empty};

/// Longest accepted list or item title.
pub const MAX_TITLE_LENGTH: usize = 200;

fn title_rules(failures: &mut Vec<FieldFailure>, title: &str) {
    not_empty(failures, "title", title);
    max_length(failures, "title", title, MAX_TITLE_LENGTH);
}

pub struct CreateTodoListValidator;

impl Validator<CreateTodoList> for CreateTodoListValidator {
    fn validate(&self, request: &CreateTodoList) -> Vec<FieldFailure> {
        let mut failures = Vec::new();
        title_rules(&mut failures, &request.title);

        if let Some(colour) = &request.colour {
            if Colour::from_code(colour).is_err() {
                failures.push(FieldFailure::new(
                    "colour",
                    format!("'{colour}' is not a supported colour."),
                ));
            }
        }
        failures
    }
}

pub struct CreateTodoItemValidator;

impl Validator<CreateTodoItem> for CreateTodoItemValidator {
    fn validate(&self, request: &CreateTodoItem) -> Vec<FieldFailure> {
        let mut failures = Vec::new();
        title_rules(&mut failures, &request.title);
        failures
    }
}

pub struct UpdateTodoItemValidator;

impl Validator<UpdateTodoItem> for UpdateTodoItemValidator {
    fn validate(&self, request: &UpdateTodoItem) -> Vec<FieldFailure> {
        let mut failures = Vec::new();
        title_rules(&mut failures, &request.title);

        if let Some(priority) = &request.priority {
            if PriorityLevel::from_str(priority).is_err() {
                failures.push(FieldFailure::new(
                    "priority",
                    format!("'{priority}' is not a priority level."),
                ));
            }
        }
        failures
    }
}
