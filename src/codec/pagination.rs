//! Cursor pagination walker.
//!
//! A [`Paginator`] wraps a page-fetch function and a starting cursor. Every
//! call to [`Paginator::pages`] starts a fresh walk, so the walker can be
//! restarted. Pages are fetched one after another, never concurrently, and
//! the walk ends at the first page whose `next` cursor is empty.

use super::envelope::Page;
use crate::{BoxStream, Result};
use futures::future::BoxFuture;
use futures::TryStreamExt;
use std::future::Future;
use tracing::warn;

type FetchPage<'a, T> =
    Box<dyn Fn(Option<String>) -> BoxFuture<'a, Result<Page<T>>> + Send + Sync + 'a>;

enum Cursor {
    Start(Option<String>),
    Next(String),
    Done,
}

pub struct Paginator<'a, T> {
    fetch: FetchPage<'a, T>,
    start: Option<String>,
}

impl<'a, T: Send + 'a> Paginator<'a, T> {
    /// `fetch` receives `None` for the first page, then each `next` cursor in turn.
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn(Option<String>) -> Fut + Send + Sync + 'a,
        Fut: Future<Output = Result<Page<T>>> + Send + 'a,
    {
        Self {
            fetch: Box::new(move |cursor| Box::pin(fetch(cursor))),
            start: None,
        }
    }

    /// Begin the walk at `cursor` instead of the first page.
    pub fn starting_at(mut self, cursor: impl Into<String>) -> Self {
        let cursor = cursor.into();
        self.start = if cursor.is_empty() { None } else { Some(cursor) };
        self
    }

    /// Lazy stream of pages. Nothing is fetched until the stream is polled.
    pub fn pages(&self) -> BoxStream<'_, Page<T>> {
        let fetch = &self.fetch;
        Box::pin(futures::stream::try_unfold(
            Cursor::Start(self.start.clone()),
            move |state| async move {
                let cursor = match state {
                    Cursor::Done => return Ok(None),
                    Cursor::Start(c) => c,
                    Cursor::Next(c) => Some(c),
                };
                let page = fetch(cursor.clone()).await?;
                let next = match page.next_cursor() {
                    Some(next) if cursor.as_deref() == Some(next) => {
                        warn!(cursor = next, "server repeated pagination cursor; stopping");
                        Cursor::Done
                    }
                    Some(next) => Cursor::Next(next.to_string()),
                    None => Cursor::Done,
                };
                Ok::<_, crate::Error>(Some((page, next)))
            },
        ))
    }

    /// Walk every page and concatenate the items.
    pub async fn collect_items(&self) -> Result<Vec<T>> {
        self.pages()
            .try_fold(Vec::new(), |mut acc, page| async move {
                acc.extend(page.items);
                Ok(acc)
            })
            .await
    }
}
