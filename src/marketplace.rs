// Marketplace API: public images and the identifiers to use when creating
// a server.
//
// An image has versions; each version has one local image per
// (architecture, zone). The local image id is what server creation wants.

use crate::api::{Access, ApiClient};
use crate::config::Arch;
use crate::error::{ApiError, Result};
use crate::pagination::Paginated;
use crate::transport::{HttpResponse, Transport};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocalImage {
    pub id: String,
    pub arch: String,
    pub zone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageVersion {
    pub id: String,
    #[serde(default)]
    pub local_images: Vec<LocalImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarketplaceImage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub versions: Vec<ImageVersion>,
}

impl ImageVersion {
    /// Local images built for `arch`.
    pub fn local_images_for(&self, arch: Arch) -> impl Iterator<Item = &LocalImage> {
        self.local_images
            .iter()
            .filter(move |local| local.arch == arch.as_str())
    }
}

#[derive(Deserialize)]
struct ImagesPage {
    images: Vec<MarketplaceImage>,
}

fn images(response: &HttpResponse) -> Result<Vec<MarketplaceImage>> {
    Ok(response.json::<ImagesPage>()?.images)
}

/// Case-insensitive match on the image name. An empty pattern matches
/// every image.
#[derive(Debug, Clone)]
pub struct NameFilter(Option<Regex>);

impl NameFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Ok(NameFilter(None));
        }
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(|re| NameFilter(Some(re)))
            .map_err(|e| ApiError::Config(format!("invalid name pattern '{pattern}': {e}")))
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0.as_ref().map_or(true, |re| re.is_match(name))
    }
}

/// Current images for `arch` whose name passes `filter`. Errors are passed
/// through so the caller sees them in order.
pub fn list_images<'a, T: Transport>(
    client: &'a ApiClient<T>,
    arch: Arch,
    filter: NameFilter,
) -> Result<impl Iterator<Item = Result<MarketplaceImage>> + 'a> {
    let mut first = client.marketplace_url(&["images"])?;
    first
        .query_pairs_mut()
        .append_pair("only_current", "true")
        .append_pair("arch", arch.as_str());

    let pages = Paginated::new(client, first, Access::Anonymous, images);
    Ok(pages.filter(move |item| match item {
        Ok(image) => filter.matches(&image.name),
        Err(_) => true,
    }))
}
