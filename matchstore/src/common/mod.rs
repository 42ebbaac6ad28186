//! Common types shared by every backend: the value model, documents,
//! sort order, constants and small utilities.

mod constants;
mod document;
mod sort_order;
pub mod util;
mod value;

pub use constants::*;
pub use document::*;
pub use sort_order::*;
pub use value::*;
