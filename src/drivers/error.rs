use thiserror::Error;
#[derive(Debug, Error)]
pub enum GloveError {
    #[error("invalid frame length: expected {expected} values, got {actual}")]
    InvalidFrameLength { expected: usize, actual: usize },
    #[error("invalid column range {start}-{end}; available: 1-{available}")]
    Range {
        start: usize,
        end: usize,
        available: usize,
    },
    #[error("comparison needs 2 or 4 recordings, got {0}")]
    ComparisonArity(usize),
    #[error("gesture record is malformed: {0}")]
    MalformedRecord(String),
    #[error("{0} must not be empty")]
    EmptyName(&'static str),
    #[error("hand assignment rejected: {0}")]
    HandAssignment(String),
    #[error("glove link error: {0}")]
    Transport(String),
    #[error("failed to render plot: {0}")]
    Plot(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for GloveError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        GloveError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for GloveError {
    fn from(value: image::ImageError) -> Self {
        GloveError::Plot(value.to_string())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn wrapped_io_error_prints_its_message_once() {
        let err = GloveError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.to_string(), "gone");
        let chained = format!("{:#}", anyhow::Error::from(err).context("save"));
        assert_eq!(chained, "save: gone");
    }
}
