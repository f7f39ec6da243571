//! Import of browser bookmark exports (the Netscape `<DL>/<DT>` format).
//!
//! Every anchor becomes one row. Its label is the heading of the nearest
//! enclosing folder: walking up from the anchor, the first `DT` that
//! contains an `H3` wins. Anchors outside any folder get [`DEFAULT_LABEL`].

use scraper::{ElementRef, Html, Selector};

use super::{BookmarkApi, CategoryApi, ClientError};
use crate::model::{BookmarkDraft, Category, CategoryDraft};

pub const DEFAULT_LABEL: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedBookmark {
    pub url: String,
    pub title: String,
    pub category_name: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub categories_created: usize,
    pub categories_reused: usize,
    pub bookmarks_created: usize,
}

fn selector(css: &str) -> Result<Selector, ClientError> {
    Selector::parse(css).map_err(|e| ClientError::Validation(format!("invalid selector {css}: {e}")))
}

fn folder_label(anchor: ElementRef<'_>, heading: &Selector) -> Option<String> {
    (*anchor)
        .ancestors()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name().eq_ignore_ascii_case("dt"))
        .find_map(|dt| dt.select(heading).next())
        .map(|h3| h3.text().collect::<String>().trim().to_string())
}

pub fn parse_bookmarks(html: &str) -> Result<Vec<ImportedBookmark>, ClientError> {
    let document = Html::parse_document(html);
    let anchors = selector("a")?;
    let heading = selector("h3")?;

    let mut rows = Vec::new();
    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };

        let label = folder_label(anchor, &heading).filter(|l| !l.is_empty());
        rows.push(ImportedBookmark {
            url: href.trim().to_string(),
            title: anchor.text().collect::<String>().trim().to_string(),
            category_name: label.unwrap_or_else(|| DEFAULT_LABEL.to_string()),
        });
    }

    Ok(rows)
}

/// Rows grouped by exact label, groups in order of first appearance.
pub fn group_by_label(rows: &[ImportedBookmark]) -> Vec<(&str, Vec<&ImportedBookmark>)> {
    let mut groups: Vec<(&str, Vec<&ImportedBookmark>)> = Vec::new();
    for row in rows {
        match groups.iter_mut().find(|(label, _)| *label == row.category_name) {
            Some((_, members)) => members.push(row),
            None => groups.push((row.category_name.as_str(), vec![row])),
        }
    }
    groups
}

fn find_by_name<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.name.to_lowercase() == name.to_lowercase())
}

/// Creates the categories and bookmarks for `rows`.
///
/// Labels resolve case-insensitively against `existing` and against each
/// other, so "Work" and "work" share one category. Missing categories are
/// created in a single call, then all bookmarks in a single call. `only`
/// restricts the import to the given labels.
pub async fn import_bookmarks<A>(
    api: &A,
    existing: &[Category],
    rows: &[ImportedBookmark],
    only: Option<&[String]>,
) -> Result<ImportSummary, ClientError>
where
    A: BookmarkApi + CategoryApi + ?Sized,
{
    let selected: Vec<ImportedBookmark> = rows
        .iter()
        .filter(|row| match only {
            Some(labels) => labels.iter().any(|l| l.eq_ignore_ascii_case(&row.category_name)),
            None => true,
        })
        .cloned()
        .collect();

    if selected.is_empty() {
        return Err(ClientError::Validation("No bookmarks provided to import".to_string()));
    }

    let groups = group_by_label(&selected);
    let mut summary = ImportSummary::default();
    let mut resolved: Vec<Category> = Vec::new();
    let mut to_create: Vec<CategoryDraft> = Vec::new();

    for (label, _) in &groups {
        if let Some(category) = find_by_name(existing, label) {
            if find_by_name(&resolved, label).is_none() {
                resolved.push(category.clone());
                summary.categories_reused += 1;
            }
        } else if !to_create.iter().any(|d| d.name.to_lowercase() == label.to_lowercase()) {
            to_create.push(CategoryDraft {
                name: label.to_string(),
            });
        }
    }

    if !to_create.is_empty() {
        let created = api.create_categories(&to_create).await?;
        summary.categories_created = created.len();
        resolved.extend(created);
    }

    let mut drafts = Vec::with_capacity(selected.len());
    for (label, members) in &groups {
        let category = find_by_name(&resolved, label)
            .ok_or_else(|| ClientError::Validation(format!("Category {label} was not created")))?;

        for row in members {
            let name = if row.title.is_empty() { row.url.clone() } else { row.title.clone() };
            drafts.push(BookmarkDraft {
                category_id: category.category_id.clone(),
                name,
                url: row.url.clone(),
                notes: None,
                tag: None,
            });
        }
    }

    let created = api.create_bookmarks(&drafts).await?;
    summary.bookmarks_created = created.len();
    tracing::info!(
        created = summary.categories_created,
        reused = summary.categories_reused,
        bookmarks = summary.bookmarks_created,
        "imported bookmarks"
    );
    Ok(summary)
}
