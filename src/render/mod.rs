//! Render Layer
//!
//! The per-camera pipeline, the command-buffer contract with its recording
//! reference realization, the post-process chain and the backend type
//! mapping.

pub mod backend;
pub mod command_buffer;
pub mod pipeline;
pub mod postprocess;

pub use command_buffer::{
    CommandBuffer, DrawSubmission, RecordingBuffer, color_to_id, id_to_color,
};
pub use pipeline::{Pipeline, RenderStats};
pub use postprocess::{
    Bloom, MAX_BLUR_SAMPLES, PostProcessSettings, PostProcessor, gaussian_kernel,
};
