use std::future::Future;

use futures::{Stream, TryStreamExt, stream};

use crate::{Error, Result};

/// Page size used for every paged listing.
pub const PAGE_SIZE: u32 = 100;

/// Lazily walk a zero-based paged listing.
///
/// `fetch` is called with page 0, 1, 2, ... and the items are yielded one by
/// one. The walk ends after the first page holding fewer than `per_page`
/// items, so a listing that never returns a short page never ends. Nothing is
/// fetched until the stream is polled and a consumer that stops early stops
/// the fetching too; calling `paginate` again starts over from page 0.
pub fn paginate<'a, T, F, Fut>(per_page: u32, fetch: F) -> impl Stream<Item = Result<T>> + 'a
where
    T: 'a,
    F: FnMut(u32) -> Fut + 'a,
    Fut: Future<Output = Result<Vec<T>>> + 'a,
{
    let per_page = per_page.max(1) as usize;
    stream::try_unfold((fetch, Some(0u32)), move |(mut fetch, next)| async move {
        let Some(page) = next else {
            return Ok::<_, Error>(None);
        };
        let items = fetch(page).await?;
        let next = (items.len() >= per_page).then_some(page + 1);
        let items = stream::iter(items.into_iter().map(Ok::<T, Error>));
        Ok(Some((items, (fetch, next))))
    })
    .try_flatten()
}
