use std::fmt;

use thiserror::Error;

use crate::driver::DriverError;

/// Step of window construction, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreateStep {
    MakeCurrent,
    Device,
    Texture,
    Renderer,
}

impl fmt::Display for CreateStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CreateStep::MakeCurrent => "context activation",
            CreateStep::Device => "device",
            CreateStep::Texture => "texture",
            CreateStep::Renderer => "renderer",
        })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("no available GPU backends")]
    NoBackend,
    /// Every configured context strategy failed; carries the first failure.
    #[error("GPU backend unavailable: {0}")]
    Backend(#[source] DriverError),
    #[error("invalid window size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("failed to create {step}: {source}")]
    Create {
        step: CreateStep,
        #[source]
        source: DriverError,
    },
    #[error("failed to activate context: {0}")]
    MakeCurrent(#[source] DriverError),
    #[error("frame failed: {0}")]
    Frame(#[source] DriverError),
    #[error("screenshot failed: {0}")]
    Screenshot(#[source] DriverError),
    #[error("window has been released")]
    Released,
    #[error("failed to spawn context thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("context thread is gone")]
    ContextThreadGone,
}

impl Error {
    /// The construction step that failed, if this is a construction error.
    pub fn create_step(&self) -> Option<CreateStep> {
        match self {
            Error::Create { step, .. } => Some(*step),
            _ => None,
        }
    }
}
