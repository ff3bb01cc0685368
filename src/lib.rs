pub mod backup;
pub mod crypt;
pub mod ec;
pub mod error;
pub mod image;
pub mod perm;

pub use backup::{Extractor, Report};
pub use crypt::KeySet;
pub use error::{Error, ErrorClass, Result};
