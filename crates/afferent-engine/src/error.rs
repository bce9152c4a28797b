//! Error taxonomy shared by the Rust API and the C ABI.

use thiserror::Error;

/// Result codes returned across the C ABI.
///
/// The numeric values are part of the ABI and must not be reordered.
#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AfferentResult {
    Ok = 0,
    InitFailed = 1,
    WindowFailed = 2,
    DeviceFailed = 3,
    PipelineFailed = 4,
    BufferFailed = 5,
    FontFailed = 6,
    TextFailed = 7,
}

/// Errors produced by the native layer.
///
/// Draw calls never return these for malformed instance data; those are
/// silent no-ops so the hot path stays free of error plumbing.
#[derive(Error, Debug)]
pub enum AfferentError {
    #[error("initialization failed: {0}")]
    Init(String),
    #[error("window creation failed: {0}")]
    Window(String),
    #[error("GPU device unavailable: {0}")]
    Device(String),
    #[error("pipeline construction failed: {0}")]
    Pipeline(String),
    #[error("buffer creation failed: {0}")]
    Buffer(String),
    #[error("font load failed: {0}")]
    Font(String),
    #[error("text rendering failed: {0}")]
    Text(String),
}

impl AfferentError {
    /// Maps the error onto its C ABI result code.
    pub fn code(&self) -> AfferentResult {
        match self {
            AfferentError::Init(_) => AfferentResult::InitFailed,
            AfferentError::Window(_) => AfferentResult::WindowFailed,
            AfferentError::Device(_) => AfferentResult::DeviceFailed,
            AfferentError::Pipeline(_) => AfferentResult::PipelineFailed,
            AfferentError::Buffer(_) => AfferentResult::BufferFailed,
            AfferentError::Font(_) => AfferentResult::FontFailed,
            AfferentError::Text(_) => AfferentResult::TextFailed,
        }
    }
}

impl From<anyhow::Error> for AfferentError {
    fn from(err: anyhow::Error) -> Self {
        AfferentError::Device(format!("{err:#}"))
    }
}

impl<T> From<Result<T, AfferentError>> for AfferentResult {
    fn from(res: Result<T, AfferentError>) -> Self {
        match res {
            Ok(_) => AfferentResult::Ok,
            Err(e) => {
                log::debug!("native call failed: {e}");
                e.code()
            }
        }
    }
}

pub type Result<T, E = AfferentError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_abi_values() {
        assert_eq!(AfferentResult::Ok as i32, 0);
        assert_eq!(AfferentResult::BufferFailed as i32, 5);
        assert_eq!(AfferentResult::TextFailed as i32, 7);
    }

    #[test]
    fn error_maps_to_its_code() {
        assert_eq!(AfferentError::Window("x".into()).code(), AfferentResult::WindowFailed);
        assert_eq!(AfferentError::Font("x".into()).code(), AfferentResult::FontFailed);
        assert_eq!(AfferentError::Pipeline("x".into()).code(), AfferentResult::PipelineFailed);
    }

    #[test]
    fn anyhow_errors_become_device_failures() {
        let err: AfferentError = anyhow::anyhow!("adapter lost").into();
        assert_eq!(err.code(), AfferentResult::DeviceFailed);
        assert!(err.to_string().contains("adapter lost"));
    }

    #[test]
    fn results_collapse_to_codes() {
        let ok: Result<u32> = Ok(3);
        assert_eq!(AfferentResult::from(ok), AfferentResult::Ok);

        let bad: Result<u32> = Err(AfferentError::Buffer("empty".into()));
        assert_eq!(AfferentResult::from(bad), AfferentResult::BufferFailed);
    }
}
