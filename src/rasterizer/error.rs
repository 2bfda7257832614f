//! Error type for the render pipeline

/// Errors raised by buffers and the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The allocator refused to grow a buffer to `requested` elements
    Allocation { requested: usize },
    /// Zero-area triangle or non-finite vertex data
    DegenerateGeometry,
    /// Image could not be decoded or encoded
    Image(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Allocation { requested } => {
                write!(f, "Allocation failed for {} elements", requested)
            }
            RenderError::DegenerateGeometry => write!(f, "Degenerate geometry"),
            RenderError::Image(e) => write!(f, "Image error: {}", e),
        }
    }
}

impl std::error::Error for RenderError {}
