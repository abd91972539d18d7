pub mod census_config;
pub mod pipeline_config;
pub mod region_tables;

pub use census_config::*;
pub use pipeline_config::*;
pub use region_tables::*;
