//! Page-token pagination.
//!
//! Every listing call takes a `page_token` and returns the token for the
//! next page. The first request uses `0`; a returned token of `0` ends the
//! listing.

use crate::error::Result;
use crate::types::Page;

/// Follow page tokens until the final page and concatenate all `data`.
///
/// The first error aborts the whole listing; pages already fetched are
/// discarded so callers never act on a partial view.
pub fn fetch_all<T, F>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(u64) -> Result<Page<T>>,
{
    let mut items = Vec::new();
    let mut page_token = 0;

    loop {
        let page = fetch(page_token)?;
        let next = page.next_page_token;
        items.extend(page.data);

        if next == 0 {
            break;
        }
        page_token = next;
    }

    Ok(items)
}
