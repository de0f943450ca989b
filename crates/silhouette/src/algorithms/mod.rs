pub mod preprocessing;
pub mod extraction;
pub mod descriptors;
pub mod similarity;

pub use preprocessing::*;
pub use extraction::*;
pub use descriptors::*;
pub use similarity::*;
