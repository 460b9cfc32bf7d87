//! Rendering - image normalization, terminal output and document export

pub mod export;
pub mod images;
pub mod present;
pub mod probe;

pub use export::Exporter;
pub use images::{ImageNormalizer, NormalizedMarkdown};
pub use probe::{HttpImageProbe, ImageProbe};
