pub mod planning;
pub mod validate;

pub use planning::*;
pub use validate::*;
