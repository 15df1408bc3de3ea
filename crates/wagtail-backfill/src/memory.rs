//! In-memory revision and page sources.

use std::collections::HashMap;

use wagtail_contracts::{
    error::WagtailResult,
    site::{Page, PageId, PageRevision},
};
use wagtail_core::traits::{PageSource, RevisionSource, RevisionStream};

/// Revisions held in a `Vec`, kept sorted by `(page_id, created_at, id)`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRevisions {
    revisions: Vec<PageRevision>,
}

impl InMemoryRevisions {
    pub fn new(mut revisions: Vec<PageRevision>) -> Self {
        revisions.sort_by_key(|r| (r.page_id, r.created_at, r.id));
        Self { revisions }
    }
}

impl RevisionSource for InMemoryRevisions {
    fn revisions_in_page_order(&self) -> WagtailResult<RevisionStream<'_>> {
        Ok(Box::new(self.revisions.iter().cloned().map(Ok)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryPages {
    pages: HashMap<PageId, Page>,
}

impl InMemoryPages {
    pub fn new(pages: impl IntoIterator<Item = Page>) -> Self {
        Self {
            pages: pages.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}

impl PageSource for InMemoryPages {
    fn page(&self, id: PageId) -> WagtailResult<Option<Page>> {
        Ok(self.pages.get(&id).cloned())
    }
}
