use chrono::NaiveDate;

use crate::resource::{Document, Resource};

/// ListQuery
///
/// The search state of a list view: a free-text term (optionally scoped to one field),
/// a category tab and an inclusive date range. All active parts must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub term: String,
    pub field: Option<String>,
    pub category: Option<String>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl ListQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    /// Restricts the term to a single searchable field.
    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_range = Some((from, to));
        self
    }

    pub fn matches<R: Resource>(&self, item: &R) -> bool {
        self.matches_term(item) && self.matches_category(item) && self.matches_date(item)
    }

    fn matches_term<R: Resource>(&self, item: &R) -> bool {
        let needle = self.term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        item.search_fields()
            .into_iter()
            .filter(|(name, _)| self.field.as_deref().is_none_or(|f| f.eq_ignore_ascii_case(name)))
            .any(|(_, text)| text.to_lowercase().contains(&needle))
    }

    fn matches_category<R: Resource>(&self, item: &R) -> bool {
        match self.category.as_deref() {
            None => true,
            Some(wanted) => item
                .category()
                .is_some_and(|c| c.eq_ignore_ascii_case(wanted)),
        }
    }

    fn matches_date<R: Resource>(&self, item: &R) -> bool {
        match self.date_range {
            None => true,
            Some((from, to)) => item.date().is_some_and(|d| d >= from && d <= to),
        }
    }
}

/// Items matching `query`, in their original relative order.
pub fn filtered_view<'a, R: Resource>(
    items: &'a [Document<R>],
    query: &ListQuery,
) -> Vec<&'a Document<R>> {
    items.iter().filter(|doc| query.matches(&doc.body)).collect()
}

/// Zero-based page of `view`. Pages past the end, and a zero page size, are empty.
pub fn paginate<T>(view: &[T], page: usize, page_size: usize) -> &[T] {
    let start = page.saturating_mul(page_size);
    if page_size == 0 || start >= view.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(view.len());
    &view[start..end]
}

/// Number of pages needed to show `total` items.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}
