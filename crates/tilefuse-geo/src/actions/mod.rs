//! Pipeline actions driving the external tools.

pub mod build;
pub mod convert;
pub mod merge;
pub mod tag;

pub use build::{build_fused, build_layered, inspect, BuildTuning};
pub use convert::{convert, ClipBounds, ConvertOptions};
pub use merge::merge;
pub use tag::{tag_year, verify_year_attribute, YEAR_PROPERTY};
