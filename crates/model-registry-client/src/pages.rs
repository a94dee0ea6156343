//! Following `nextPageToken` across list calls

use futures::stream::{self, Stream, StreamExt};
use model_registry_core::{Page, PageCursor};
use std::collections::HashSet;
use std::future::Future;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

struct Cursor<Q, F> {
    next: Option<Q>,
    fetch: F,
    seen: HashSet<String>,
}

/// Stream pages until the server returns an empty token
///
/// A token that comes back a second time ends the stream with
/// [`ClientError::Pagination`] instead of looping.
pub fn page_stream<T, Q, F, Fut>(query: Q, fetch: F) -> impl Stream<Item = ClientResult<Page<T>>>
where
    Q: PageCursor,
    F: FnMut(Q) -> Fut,
    Fut: Future<Output = ClientResult<Page<T>>>,
{
    let cursor = Cursor {
        next: Some(query),
        fetch,
        seen: HashSet::new(),
    };

    stream::unfold(cursor, |mut cursor| async move {
        let query = cursor.next.take()?;
        let page = match (cursor.fetch)(query.clone()).await {
            Ok(page) => page,
            Err(e) => return Some((Err(e), cursor)),
        };

        if page.has_more() {
            let token = page.next_page_token.clone();
            if !cursor.seen.insert(token.clone()) {
                let err = ClientError::Pagination(format!("server repeated page token {:?}", token));
                return Some((Err(err), cursor));
            }
            debug!(items = page.items.len(), "Following next page token");
            let mut next = query;
            next.set_page_token(token);
            cursor.next = Some(next);
        }

        Some((Ok(page), cursor))
    })
}

/// Collect every item across all pages
pub async fn collect_all<T, Q, F, Fut>(query: Q, fetch: F) -> ClientResult<Vec<T>>
where
    Q: PageCursor,
    F: FnMut(Q) -> Fut,
    Fut: Future<Output = ClientResult<Page<T>>>,
{
    let pages = page_stream(query, fetch);
    futures::pin_mut!(pages);

    let mut items = Vec::new();
    while let Some(page) = pages.next().await {
        items.extend(page?.items);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_registry_core::ListOptions;

    fn page(items: &[u32], token: &str) -> Page<u32> {
        Page {
            items: items.to_vec(),
            size: items.len() as i64,
            page_size: 2,
            next_page_token: token.to_string(),
        }
    }

    #[tokio::test]
    async fn test_collects_until_empty_token() {
        let items = collect_all(ListOptions::new().with_page_size(2), |q: ListOptions| async move {
            Ok(match q.page_token.as_deref() {
                None => page(&[1, 2], "t1"),
                Some("t1") => page(&[3, 4], "t2"),
                Some("t2") => page(&[5], ""),
                other => panic!("unexpected token {:?}", other),
            })
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_repeated_token_is_an_error() {
        let err = collect_all(ListOptions::new(), |_q: ListOptions| async move {
            Ok(page(&[1], "same"))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Pagination(_)));
    }

    #[tokio::test]
    async fn test_fetch_error_stops_stream() {
        let err = collect_all(ListOptions::new(), |_q: ListOptions| async move {
            Err::<Page<u32>, _>(ClientError::Auth("denied".into()))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Auth(_)));
    }
}
