pub mod keys;
pub mod raw_record;
pub mod reference;
pub mod region;
pub mod well_record;

pub use keys::*;
pub use raw_record::*;
pub use reference::*;
pub use region::Region;
pub use well_record::*;
