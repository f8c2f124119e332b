use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuidelineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown subcategory '{subcategory}' referenced by {table}")]
    UnknownSubcategory { table: &'static str, subcategory: String },

    #[error("score {score} for '{subcategory}' is out of range")]
    InvalidScore { subcategory: String, score: i32 },

    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),
}

pub type GuidelineResult<T> = Result<T, GuidelineError>;
