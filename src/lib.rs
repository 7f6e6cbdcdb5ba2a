// Library root
// ------------
// Small clients for the Scaleway REST API, shared by the binaries under
// `src/bin/`.
//
// Module responsibilities:
// - `transport`: the `Transport` seam and its blocking reqwest
//   implementation.
// - `api`: `ApiClient`, which adds the auth header and status checks.
// - `pagination`: `Link` header parsing and the lazy page iterator.
// - `account`: token owner lookup and SSH key set editing.
// - `instances`: server listing for a compute region.
// - `marketplace`: public image lookup.
// - `config`, `error`, `logging`: ambient plumbing.
// - `ui`: output rendering for the binaries.
pub mod account;
pub mod api;
pub mod config;
pub mod error;
pub mod instances;
pub mod logging;
pub mod marketplace;
pub mod pagination;
pub mod transport;
pub mod ui;

pub use api::ApiClient;
pub use error::{ApiError, Result};
