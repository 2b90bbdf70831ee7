pub mod normalizer;
pub mod types;
pub mod utils;

pub use normalizer::{derive_fields, map_row, validate};
pub use types::{BusinessRecord, StatusFilter, PAGE_SIZE};
