pub mod aggregation;
pub mod date_range;
pub mod entry_repository;
pub mod journal;
pub mod reference_lists;

pub use aggregation::*;
pub use date_range::*;
pub use entry_repository::*;
pub use journal::*;
pub use reference_lists::*;
