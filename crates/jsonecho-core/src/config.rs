//! Handler configuration

use crate::pipe::PipeConfig;

/// Echo handler configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoConfig {
    /// Buffering used by the pipe relay strategy
    pub pipe: PipeConfig,
}

impl EchoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pipe(mut self, pipe: PipeConfig) -> Self {
        self.pipe = pipe;
        self
    }

    /// Shorthand for a pipe of `capacity` bytes
    pub fn pipe_capacity(self, capacity: usize) -> Self {
        self.pipe(PipeConfig::new(capacity))
    }
}
