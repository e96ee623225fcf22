#[macro_use]
extern crate log;

pub mod date;
pub mod http;
pub mod registry;
pub mod sources;

pub mod prelude {
    pub use crate::date::parse_update_date;
    pub use crate::http::HttpConfig;
    pub use crate::registry::{SourceRegistry, normalize_base_url};
    pub use crate::sources::mangaread::MangaRead;
}
