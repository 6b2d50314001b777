pub mod battery;
pub mod forecast;
pub mod grid;
pub mod types;

pub use battery::*;
pub use forecast::*;
pub use grid::*;
pub use types::*;
