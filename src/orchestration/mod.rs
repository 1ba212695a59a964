pub mod pipeline;

pub use pipeline::{Annotation, PipelineOutput, TranslationPipeline};
