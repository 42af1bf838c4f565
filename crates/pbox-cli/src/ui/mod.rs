//! # CLI UI Module
//!
//! Styling and formatting layer for `experiment` output. Colors respect
//! `NO_COLOR` and the `--color` flag; every listing command also has a
//! `--json` form for scripting.
//!
//! - `color`: color mode detection
//! - `style`: message prefixes and styling
//! - `format`: byte sizes, relative times, name lists
//! - `table`: comfy-table renderers for experiments, artifacts and configs

pub mod color;
pub mod format;
pub mod style;
pub mod table;

pub use color::ColorMode;
pub use style::{MessageType, Style};
