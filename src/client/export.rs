//! Export to the Netscape bookmark format understood by every browser.

use crate::model::{Bookmark, Category};

pub const DEFAULT_TITLE: &str = "markstash-bookmarks";
pub const UNKNOWN_CATEGORY: &str = "Untitled";

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders `bookmarks` grouped into one folder per category, folders in
/// order of first appearance. Bookmarks whose category is not in
/// `categories` land in an "Untitled" folder.
pub fn export_bookmarks(bookmarks: &[Bookmark], categories: &[Category], title: &str) -> String {
    let mut groups: Vec<(&str, Vec<&Bookmark>)> = Vec::new();
    for bookmark in bookmarks {
        match groups.iter_mut().find(|(id, _)| *id == bookmark.category_id) {
            Some((_, members)) => members.push(bookmark),
            None => groups.push((bookmark.category_id.as_str(), vec![bookmark])),
        }
    }

    let title = escape(title);
    let mut out = String::new();
    out.push_str("<!DOCTYPE NETSCAPE-Bookmark-file-1>\n");
    out.push_str("<!-- This is an automatically generated file.\n");
    out.push_str("     It will be read and overwritten.\n");
    out.push_str("     DO NOT EDIT! -->\n");
    out.push_str("<META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">\n");
    out.push_str(&format!("<TITLE>{title}</TITLE>\n"));
    out.push_str(&format!("<H1>{title}</H1>\n"));
    out.push_str("<DL><p>\n");

    for (category_id, members) in groups {
        let name = categories
            .iter()
            .find(|c| c.category_id == category_id)
            .map(|c| c.name.as_str())
            .unwrap_or(UNKNOWN_CATEGORY);

        out.push_str(&format!("    <DT><H3>{}</H3>\n", escape(name)));
        out.push_str("    <DL><p>\n");
        for bookmark in members {
            out.push_str(&format!(
                "        <DT><A HREF=\"{}\">{}</A>\n",
                escape(&bookmark.url),
                escape(&bookmark.name)
            ));
        }
        out.push_str("    </DL><p>\n");
    }

    out.push_str("</DL><p>\n");
    out
}
