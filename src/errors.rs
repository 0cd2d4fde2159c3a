use std::io;

use thiserror::Error;

use crate::etl::validate::ValidationError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed OSM input near byte {position}: {message}")]
    StructuralParse {
        position: usize,
        message: String,
    },

    #[error("{} is missing required attribute `{attribute}`", describe(.kind, .id))]
    MissingAttribute {
        kind: String,
        id: Option<u64>,
        attribute: String,
    },

    #[error("{} has invalid `{attribute}` value {value:?}: {reason}", describe(.kind, .id))]
    InvalidAttribute {
        kind: String,
        id: Option<u64>,
        attribute: String,
        value: String,
        reason: String,
    },

    #[error(
        "Element of type '{kind}' (id {id}) failed validation on field '{field}':\n{}",
        list_errors(.errors)
    )]
    SchemaValidation {
        kind: String,
        id: u64,
        field: String,
        errors: Vec<ValidationError>,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("could not parse config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("{0}")]
    Message(String),
}

fn describe(kind: &str, id: &Option<u64>) -> String {
    match id {
        Some(id) => format!("{kind} {id}"),
        None => format!("{kind} without id"),
    }
}

fn list_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|err| format!("  {err}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Message(value.to_string())
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Message(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
