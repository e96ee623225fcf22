pub mod latest_update;
pub use latest_update::*;

pub mod manga_detail;
pub use manga_detail::*;

pub mod chapter_listing;
pub use chapter_listing::*;

pub mod chapter_number;
pub use chapter_number::*;
