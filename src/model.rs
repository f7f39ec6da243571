use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Collection, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub bookmark_id: String,
    pub user_id: String,
    pub category_id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    pub create_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: String,
    pub user_id: String,
    pub name: String,
    pub create_date: DateTime<Utc>,
}

/// Client-supplied fields for a new bookmark. Anything else the client
/// sends (ids, owner, dates) is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkDraft {
    pub category_id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub name: String,
}

/// The mutable bookmark fields. Every field is written on update, matching
/// a full-form edit; absent optional fields clear the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkPatch {
    pub category_id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookmarkRef {
    Id(String),
    Keyed {
        #[serde(rename = "bookmarkId")]
        bookmark_id: String,
    },
}

impl BookmarkRef {
    pub fn id(&self) -> &str {
        match self {
            BookmarkRef::Id(id) => id,
            BookmarkRef::Keyed { bookmark_id } => bookmark_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(String),
    Keyed {
        #[serde(rename = "categoryId")]
        category_id: String,
    },
}

impl CategoryRef {
    pub fn id(&self) -> &str {
        match self {
            CategoryRef::Id(id) => id,
            CategoryRef::Keyed { category_id } => category_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    pub file_name: String,
    pub file_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrl {
    pub upload_url: String,
}

impl Record for Bookmark {
    type Draft = BookmarkDraft;
    type Patch = BookmarkPatch;

    const COLLECTION: Collection = Collection {
        kind: "Bookmark",
        table: "bookmarks",
        id_column: "bookmark_id",
    };

    fn id(&self) -> &str {
        &self.bookmark_id
    }

    fn owner(&self) -> &str {
        &self.user_id
    }

    fn from_draft(draft: BookmarkDraft, id: String, owner: &str, now: DateTime<Utc>) -> Self {
        Bookmark {
            bookmark_id: id,
            user_id: owner.to_string(),
            category_id: draft.category_id,
            name: draft.name,
            url: draft.url,
            notes: draft.notes,
            tag: draft.tag,
            attachment_url: None,
            create_date: now,
        }
    }

    fn apply(&mut self, patch: BookmarkPatch) {
        self.category_id = patch.category_id;
        self.name = patch.name;
        self.url = patch.url;
        self.notes = patch.notes;
        self.tag = patch.tag;
    }
}

impl Record for Category {
    type Draft = CategoryDraft;
    type Patch = CategoryPatch;

    const COLLECTION: Collection = Collection {
        kind: "Category",
        table: "categories",
        id_column: "category_id",
    };

    fn id(&self) -> &str {
        &self.category_id
    }

    fn owner(&self) -> &str {
        &self.user_id
    }

    fn from_draft(draft: CategoryDraft, id: String, owner: &str, now: DateTime<Utc>) -> Self {
        Category {
            category_id: id,
            user_id: owner.to_string(),
            name: draft.name,
            create_date: now,
        }
    }

    fn apply(&mut self, patch: CategoryPatch) {
        self.name = patch.name;
    }
}
