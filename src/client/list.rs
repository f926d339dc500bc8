use uuid::Uuid;

use super::ResourceApi;
use crate::{
    filter::{self, ListQuery},
    resource::{Document, Resource, missing_fields_message},
};

/// Page size a freshly created list starts with.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// DialogMode
///
/// The pending mutation being confirmed. Every open state owns a draft copy of the
/// item's fields; closing drops it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DialogMode<R> {
    #[default]
    Closed,
    Adding(R),
    Editing { id: Uuid, draft: R },
    ConfirmingDelete { id: Uuid, draft: R },
}

impl<R> DialogMode<R> {
    pub fn is_closed(&self) -> bool {
        matches!(self, DialogMode::Closed)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DialogError {
    #[error("another dialog is already open")]
    AlreadyOpen,
    #[error("item {0} is not in the loaded list")]
    UnknownItem(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Notice
///
/// A transient user-facing notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// SubmitOutcome
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The server confirmed the change; the dialog closed and the list was reloaded.
    Applied,
    /// Required fields were empty; nothing was sent.
    Invalid(Vec<&'static str>),
    /// The request failed; the dialog stays open with its draft.
    Failed(String),
    /// No dialog was open.
    Idle,
}

/// ListResource
///
/// Client-side state of one resource's admin page: the last fetched list, the search
/// and pagination over it, and the dialog driving add/edit/delete. Network failures
/// never escape; they clear or keep the list and leave a `Notice` behind.
pub struct ListResource<R: Resource, A: ResourceApi<R>> {
    api: A,
    items: Vec<Document<R>>,
    last_search: Option<String>,
    query: ListQuery,
    page: usize,
    page_size: usize,
    dialog: DialogMode<R>,
    notices: Vec<Notice>,
}

impl<R: Resource, A: ResourceApi<R>> ListResource<R, A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            items: Vec::new(),
            last_search: None,
            query: ListQuery::default(),
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            dialog: DialogMode::Closed,
            notices: Vec::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn items(&self) -> &[Document<R>] {
        &self.items
    }

    // --- Fetching ---

    /// Replaces the cached list with a fresh fetch, passing `search` to the server.
    /// On any failure the list is emptied and an error notice is left.
    pub async fn load(&mut self, search: Option<&str>) {
        self.last_search = search.map(str::to_owned);
        match self.api.fetch_all(search).await {
            Ok(items) => {
                tracing::debug!("loaded {} {} item(s)", items.len(), R::NAME);
                self.items = items;
                self.clamp_page();
            }
            Err(e) => {
                tracing::warn!("loading {} failed: {}", R::NAME, e);
                self.items.clear();
                self.page = 0;
                let message = e.user_message(&format!("Failed to load {} data", R::NAME));
                self.notify(NoticeLevel::Error, message);
            }
        }
    }

    /// Re-runs the last `load` with the same server-side search.
    pub async fn reload(&mut self) {
        let search = self.last_search.clone();
        self.load(search.as_deref()).await;
    }

    // --- Filtering & Pagination ---

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Replaces the client-side query and returns to the first page.
    pub fn set_query(&mut self, query: ListQuery) {
        self.query = query;
        self.page = 0;
    }

    /// Sets only the free-text term, across all searchable fields.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.query.term = term.into();
        self.query.field = None;
        self.page = 0;
    }

    pub fn filtered_view(&self) -> Vec<&Document<R>> {
        filter::filtered_view(&self.items, &self.query)
    }

    /// One zero-based page of `filtered_view()`.
    pub fn paginate(&self, page: usize, page_size: usize) -> Vec<&Document<R>> {
        let view = self.filtered_view();
        filter::paginate(&view, page, page_size).to_vec()
    }

    pub fn current_page(&self) -> Vec<&Document<R>> {
        self.paginate(self.page, self.page_size)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size;
        self.page = 0;
    }

    pub fn page_count(&self) -> usize {
        filter::page_count(self.filtered_view().len(), self.page_size)
    }

    fn clamp_page(&mut self) {
        self.page = self.page.min(self.page_count().saturating_sub(1));
    }

    // --- Dialog ---

    pub fn dialog(&self) -> &DialogMode<R> {
        &self.dialog
    }

    pub fn open_add(&mut self, draft: R) -> Result<(), DialogError> {
        self.ensure_closed()?;
        self.dialog = DialogMode::Adding(draft);
        Ok(())
    }

    pub fn open_edit(&mut self, id: Uuid) -> Result<(), DialogError> {
        self.ensure_closed()?;
        let draft = self.cached(id)?;
        self.dialog = DialogMode::Editing { id, draft };
        Ok(())
    }

    pub fn open_delete(&mut self, id: Uuid) -> Result<(), DialogError> {
        self.ensure_closed()?;
        let draft = self.cached(id)?;
        self.dialog = DialogMode::ConfirmingDelete { id, draft };
        Ok(())
    }

    /// The editable draft while adding or editing.
    pub fn draft_mut(&mut self) -> Option<&mut R> {
        match &mut self.dialog {
            DialogMode::Adding(draft) | DialogMode::Editing { draft, .. } => Some(draft),
            DialogMode::Closed | DialogMode::ConfirmingDelete { .. } => None,
        }
    }

    /// Dismisses the dialog, discarding its draft.
    pub fn close(&mut self) {
        self.dialog = DialogMode::Closed;
    }

    fn ensure_closed(&self) -> Result<(), DialogError> {
        if self.dialog.is_closed() {
            Ok(())
        } else {
            Err(DialogError::AlreadyOpen)
        }
    }

    fn cached(&self, id: Uuid) -> Result<R, DialogError> {
        self.items
            .iter()
            .find(|doc| doc.id == id)
            .map(|doc| doc.body.clone())
            .ok_or(DialogError::UnknownItem(id))
    }

    // --- Mutation ---

    /// Sends the pending mutation. Add and edit are validated first and never reach the
    /// network with empty required fields. On success the dialog closes and the list is
    /// reloaded from the server; on failure everything stays as it was.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let dialog = self.dialog.clone();

        if let DialogMode::Adding(draft) | DialogMode::Editing { draft, .. } = &dialog {
            let missing = draft.missing_fields();
            if !missing.is_empty() {
                self.notify(NoticeLevel::Error, missing_fields_message(&missing));
                return SubmitOutcome::Invalid(missing);
            }
        }

        let (verb, done, result) = match &dialog {
            DialogMode::Closed => return SubmitOutcome::Idle,
            DialogMode::Adding(draft) => {
                ("add", "added", self.api.create(draft).await.map(|_| ()))
            }
            DialogMode::Editing { id, draft } => (
                "update",
                "updated",
                self.api.update(*id, draft).await.map(|_| ()),
            ),
            DialogMode::ConfirmingDelete { id, .. } => {
                ("delete", "deleted", self.api.delete(*id).await)
            }
        };

        match result {
            Ok(()) => {
                self.dialog = DialogMode::Closed;
                self.notify(
                    NoticeLevel::Success,
                    format!("{} {} successfully", R::NAME, done),
                );
                self.reload().await;
                SubmitOutcome::Applied
            }
            Err(e) => {
                tracing::warn!("{} {} failed: {}", verb, R::NAME, e);
                let message = e.user_message(&format!("Failed to {} {}", verb, R::NAME));
                self.notify(NoticeLevel::Error, message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    // --- Notices ---

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drains the pending notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, level: NoticeLevel, message: String) {
        self.notices.push(Notice { level, message });
    }
}
