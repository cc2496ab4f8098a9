pub mod color;
pub mod edges;
pub mod preprocessing;
pub mod extraction;

pub use color::*;
pub use edges::*;
pub use preprocessing::*;
pub use extraction::*;
