pub mod export;
pub mod reconcile;
pub mod summary;

pub use export::*;
pub use reconcile::*;
pub use summary::*;
