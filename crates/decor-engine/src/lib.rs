pub mod codec;
pub mod config;
pub mod error;
pub mod form;
pub mod pipeline;
pub mod studio;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use config::StabilityConfig;
pub use error::GenerationError;
pub use pipeline::{
    CancelToken, DesignGenerator, GenerationParams, GenerationRequest, GenerationResult,
};
pub use studio::{DesignStudio, SavedDesign};
pub use transport::{HttpReply, HttpTransport, MultipartPost, ReqwestTransport};
