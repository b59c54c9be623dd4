use thiserror::Error;

use crate::models::EvaluationType;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("score {score} is not selectable on a {evaluation_type} report")]
    InvalidScore {
        evaluation_type: EvaluationType,
        score: u8,
    },

    #[error("report {report_id} references unknown teacher {teacher_id}")]
    UnknownTeacher {
        report_id: String,
        teacher_id: String,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("malformed stored record {id}: {source}")]
    Storage {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, EvaluationError>;
