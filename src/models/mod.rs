pub mod asset;
pub mod image;
pub mod request;
pub mod response;

pub use asset::*;
pub use image::*;
pub use request::*;
pub use response::*;
