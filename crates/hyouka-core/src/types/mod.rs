pub mod criteria;
pub mod record;

pub use criteria::FilterCriteria;
pub use record::{AiringStatus, MediaKind, Record};
