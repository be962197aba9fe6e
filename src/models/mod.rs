pub mod classification;
pub mod dataset;
pub mod page;
pub mod record;

pub use classification::*;
pub use dataset::*;
pub use page::*;
pub use record::*;
