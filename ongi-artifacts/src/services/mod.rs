//! Description services built on the generation client and the database

pub mod description_stream;
pub mod descriptions;

pub use description_stream::{description_frames, DescriptionFrame, EMPTY_COMPLETION_MESSAGE};
pub use descriptions::{describe, needs_regeneration, reset, DescriptionView};
