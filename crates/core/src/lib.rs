pub mod models;
pub mod traits;
pub mod valuation;

pub use models::*;
pub use traits::*;
pub use valuation::*;
