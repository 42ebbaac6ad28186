mod date_utils;
mod id_utils;

pub use date_utils::*;
pub use id_utils::*;
