pub mod containment;
pub mod coordinates;
pub mod deduplicator;
pub mod extract_join;
pub mod field_mapper;
pub mod identifier;
pub mod identity_matcher;
pub mod plugged_filter;
pub mod status_normalizer;

pub use containment::*;
pub use coordinates::*;
pub use deduplicator::*;
pub use extract_join::*;
pub use field_mapper::*;
pub use identifier::*;
pub use identity_matcher::*;
pub use plugged_filter::*;
pub use status_normalizer::*;
