use std::path::PathBuf;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum EisError {
    #[error("sweep file not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("column {column:?} missing from {}", .path.display())]
    MissingColumn { column: &'static str, path: PathBuf },
    #[error("frequency axes do not match across {context}")]
    FrequencyMismatch { context: String },
    #[error("no usable sweep data for {context}")]
    EmptyAggregate { context: String },
    #[error("device returned {actual} channels, expected {expected}")]
    ChannelMismatch { expected: usize, actual: usize },
    #[error("{call} failed (driver code {code})")]
    Driver { call: &'static str, code: i32 },
    #[error("failed to render chart: {0}")]
    Plot(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for EisError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        EisError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for EisError {
    fn from(value: image::ImageError) -> Self {
        EisError::Plot(value.to_string())
    }
}
