pub mod error;
pub mod model;
pub mod utils;

pub use error::ParseError;
pub use model::*;
