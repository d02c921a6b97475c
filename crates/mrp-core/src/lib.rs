pub mod alternates;
pub mod cancel;
pub mod error;
pub mod models;
pub mod repository;

pub use cancel::*;
pub use error::*;
pub use models::*;
pub use repository::*;
