// Pagination: Scaleway collections answer with at most one page of items
// and a `Link: <...>; rel="next"` header while more pages remain.

use crate::api::{Access, ApiClient};
use crate::error::{ApiError, Result};
use crate::transport::{HttpResponse, Transport};
use reqwest::header::{HeaderMap, LINK};
use reqwest::Url;
use tracing::{debug, warn};

/// Target of the `rel="next"` link, if the response has one. A `Link`
/// header that does not parse is a malformed response.
pub fn next_link(headers: &HeaderMap) -> Result<Option<String>> {
    for value in headers.get_all(LINK) {
        let value = value
            .to_str()
            .map_err(|_| ApiError::MalformedResponse("Link header is not valid text".into()))?;
        let links = parse_link_header::parse_with_rel(value).map_err(|e| {
            ApiError::MalformedResponse(format!("invalid Link header '{value}': {e}"))
        })?;
        if let Some(next) = links.get("next") {
            return Ok(Some(next.raw_uri.clone()));
        }
    }
    Ok(None)
}

/// Resolve a next link against the URL of the page it came from. Relative
/// links (what Scaleway sends) are joined; absolute ones are used as is.
pub fn resolve_next(current: &Url, link: &str) -> Result<Url> {
    current
        .join(link)
        .map_err(|e| ApiError::MalformedResponse(format!("invalid next link '{link}': {e}")))
}

/// Lazy iterator over the items of a paginated collection. Pages are
/// fetched on demand; each page is dropped once its items are yielded.
///
/// After an error the iterator is exhausted; items yielded before it stand.
/// A bad next link is reported after the items of the page carrying it.
pub struct Paginated<'a, T: Transport, R> {
    client: &'a ApiClient<T>,
    access: Access,
    extract: fn(&HttpResponse) -> Result<Vec<R>>,
    next_url: Option<Url>,
    items: std::vec::IntoIter<R>,
    deferred: Option<ApiError>,
    pages: usize,
}

impl<'a, T: Transport, R> Paginated<'a, T, R> {
    pub fn new(
        client: &'a ApiClient<T>,
        first: Url,
        access: Access,
        extract: fn(&HttpResponse) -> Result<Vec<R>>,
    ) -> Self {
        Paginated {
            client,
            access,
            extract,
            next_url: Some(first),
            items: Vec::new().into_iter(),
            deferred: None,
            pages: 0,
        }
    }

    /// Number of pages fetched so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    fn fetch(&mut self, url: Url) -> Result<Vec<R>> {
        let response = self.client.get(url.clone(), self.access)?;
        self.pages += 1;

        let items = (self.extract)(&response)?;
        debug!(page = self.pages, items = items.len(), "fetched page");

        let next = next_link(&response.headers)
            .and_then(|link| link.map(|link| resolve_next(&url, &link)).transpose());
        match next {
            Ok(next) => self.next_url = next,
            Err(e) => self.deferred = Some(e),
        }
        Ok(items)
    }
}

impl<T: Transport, R> Iterator for Paginated<'_, T, R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.items.next() {
                return Some(Ok(item));
            }
            if let Some(e) = self.deferred.take() {
                return Some(Err(e));
            }

            let url = self.next_url.take()?;
            let limit = self.client.config().max_pages;
            if self.pages >= limit {
                warn!(limit, "next link still present, giving up");
                return Some(Err(ApiError::PaginationLimitExceeded(limit)));
            }

            match self.fetch(url) {
                Ok(items) => self.items = items.into_iter(),
                Err(e) => {
                    self.next_url = None;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(values: &[&'static str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(LINK, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn finds_next_link() {
        let headers = headers(&[r#"</servers?page=2&per_page=50>; rel="next""#]);
        assert_eq!(
            next_link(&headers).unwrap().as_deref(),
            Some("/servers?page=2&per_page=50")
        );
    }

    #[test]
    fn picks_next_among_several_links() {
        let headers = headers(&[
            r#"</servers?page=1>; rel="first", </servers?page=3>; rel="next", </servers?page=9>; rel="last""#,
        ]);
        assert_eq!(next_link(&headers).unwrap().as_deref(), Some("/servers?page=3"));
    }

    #[test]
    fn next_link_ignores_other_relations() {
        let mut headers =
            headers(&[r#"</servers?page=1>; rel="first", </servers?page=9>; rel="last""#]);
        assert_eq!(next_link(&headers).unwrap(), None);

        headers.append(LINK, HeaderValue::from_static(r#"</servers?page=2>; rel="next""#));
        assert_eq!(next_link(&headers).unwrap().as_deref(), Some("/servers?page=2"));
    }

    #[test]
    fn no_link_header_means_last_page() {
        assert_eq!(next_link(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn relative_and_absolute_links_resolve() {
        let current = Url::parse("https://cp-par1.scaleway.com/servers").unwrap();
        assert_eq!(
            resolve_next(&current, "/servers?page=2").unwrap().as_str(),
            "https://cp-par1.scaleway.com/servers?page=2"
        );
        assert_eq!(
            resolve_next(&current, "https://other.example/servers?page=2")
                .unwrap()
                .as_str(),
            "https://other.example/servers?page=2"
        );
    }
}
