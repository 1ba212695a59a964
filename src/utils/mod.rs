pub mod image_ops;
pub mod metrics;

// Re-export commonly used items
pub use image_ops::{
    decode_rgb_async, encode_jpeg, encode_jpeg_async, encode_png_async, ImageOpError,
};
pub use metrics::{Metrics, MetricsSnapshot};
