use std::sync::Arc;

use koushin_lib::prelude::{Result, Scraper};

use crate::{
    http::{HttpConfig, create_client},
    registry::SourceRegistry,
};

pub mod mangaread;

/// Registry holding every adapter shipped with this crate, sharing one
/// http client.
pub fn builtin_registry(config: &HttpConfig) -> Result<SourceRegistry> {
    let client = create_client(config)?;

    let builtin: Vec<Arc<dyn Scraper>> = vec![Arc::new(mangaread::MangaRead::new(client))];

    Ok(builtin
        .into_iter()
        .fold(SourceRegistry::new(), |registry, scraper| registry.with(scraper)))
}
