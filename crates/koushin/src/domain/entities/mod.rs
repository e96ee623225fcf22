pub mod chapter;
pub mod manga;
pub mod source;
pub mod tag;
