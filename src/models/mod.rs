pub mod price;
pub mod range;

pub use price::*;
pub use range::*;
