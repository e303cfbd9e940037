pub mod api;
pub mod location;
pub mod organization;
pub mod price;
pub mod storage;
pub mod waste;


pub use api::*;
pub use location::Location;
pub use organization::*;
pub use price::*;
pub use storage::*;
pub use waste::*;
