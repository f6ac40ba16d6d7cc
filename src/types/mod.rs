pub(crate) mod bitmap;
pub(crate) mod name;

pub use bitmap::Bitmap;
pub use name::Name;

pub mod errors;
pub mod stats;
