//! Configuration loading
//!
//! Sources are applied in the order they were added; each one is turned into a
//! JSON fragment and deep-merged over the previous result, so later sources
//! override earlier ones field by field. The merged document is deserialized
//! and validated once, which makes invalid values fail at load time.

mod builder;
mod loading;
pub(crate) mod merge;
mod types;


pub use builder::ConfigLoader;
pub use merge::{merge_values, set_nested_value};
pub use types::ConfigSource;
