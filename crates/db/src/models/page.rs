//! Page entity models.

use std::sync::Arc;

use arbor_core::actor::EditScope;
use arbor_core::registry::BASE_PAGE_CLASS;
use arbor_core::types::{DbId, Timestamp, ROOT_ID};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::version::PageVersion;

/// A page row as persisted in one stage projection.
///
/// A record's id is invariant across stages and versions; only field values
/// vary between the two projection tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRow {
    pub id: DbId,
    /// Polymorphic node tag, resolved against the class registry on load.
    pub class_name: String,
    pub title: String,
    /// Unique among siblings within this projection.
    pub url_segment: String,
    /// 0 = top level.
    pub parent_id: DbId,
    /// Display order among siblings; ties fall back to creation order.
    pub sort: i32,
    /// Free-form content fields.
    pub content: JsonValue,
    pub edit_scope: EditScope,
    /// Version number of the snapshot this row reflects.
    pub version: i32,
    /// 0 = written anonymously.
    pub author_id: DbId,
    /// 0 = this row was not produced by a publish.
    pub publisher_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A mutable, in-memory page.
///
/// This is the object callers edit and hand to the stage manager; `id == 0`
/// until the first write persists it. A parent attached with
/// [`Page::set_parent`] is held as a strong in-memory reference and is
/// observable through [`Page::parent`] before either page has been saved.
#[derive(Debug, Clone)]
pub struct Page {
    /// 0 until first persisted.
    pub id: DbId,
    pub class_name: String,
    pub title: String,
    /// Empty = derive from the title on the next write.
    pub url_segment: String,
    /// `None` persists as "no relation" (0), never as "leave unchanged".
    pub parent_id: Option<DbId>,
    pub sort: i32,
    pub content: JsonValue,
    pub edit_scope: EditScope,
    /// Last written version; 0 before the first write.
    pub version: i32,
    parent_node: Option<Arc<Page>>,
}

impl Page {
    /// A new unsaved page of the base class.
    pub fn new(title: &str) -> Self {
        Page::with_class(title, BASE_PAGE_CLASS)
    }

    /// A new unsaved page with an explicit class tag.
    pub fn with_class(title: &str, class_name: &str) -> Self {
        Page {
            id: 0,
            class_name: class_name.to_string(),
            title: title.to_string(),
            url_segment: String::new(),
            parent_id: None,
            sort: 0,
            content: JsonValue::Object(Default::default()),
            edit_scope: EditScope::Inherit,
            version: 0,
            parent_node: None,
        }
    }

    /// Attach an in-memory parent.
    ///
    /// The reference is observable via [`Page::parent`] immediately, before
    /// any persistence. When the parent is already saved its id is recorded
    /// too; an unsaved parent leaves `parent_id` untouched until it gets one.
    pub fn set_parent(&mut self, parent: &Arc<Page>) {
        if parent.id != ROOT_ID {
            self.parent_id = Some(parent.id);
        }
        self.parent_node = Some(Arc::clone(parent));
    }

    /// The in-memory parent reference, when one was attached. This wins over
    /// a re-fetch for as long as the object graph lives.
    pub fn parent(&self) -> Option<&Page> {
        self.parent_node.as_deref()
    }

    /// Materialise a working page from a projection row.
    pub fn from_row(row: PageRow) -> Self {
        Page {
            id: row.id,
            class_name: row.class_name,
            title: row.title,
            url_segment: row.url_segment,
            parent_id: (row.parent_id != ROOT_ID).then_some(row.parent_id),
            sort: row.sort,
            content: row.content,
            edit_scope: row.edit_scope,
            version: row.version,
            parent_node: None,
        }
    }

    /// Materialise a working page from a version snapshot.
    pub fn from_version(entry: &PageVersion) -> Self {
        Page::from_row(entry.to_row())
    }

    /// Read one content field.
    pub fn content_field(&self, key: &str) -> Option<&JsonValue> {
        self.content.get(key)
    }

    /// Set one content field. Writing `JsonValue::Null` keeps the key with a
    /// null value, so cleared fields propagate on publish instead of being
    /// merge-patch-skipped.
    pub fn set_content_field(&mut self, key: &str, value: JsonValue) {
        if let JsonValue::Object(map) = &mut self.content {
            map.insert(key.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_is_cached_in_memory_before_any_write() {
        let parent = Arc::new(Page::new("Section Title"));
        let mut child = Page::new("Page Title");
        child.set_parent(&parent);

        let held = child.parent().expect("parent reference should be held");
        assert_eq!(held.title, "Section Title");
        // Neither side has been persisted.
        assert_eq!(child.id, 0);
        assert_eq!(held.id, 0);
        assert_eq!(child.parent_id, None);
    }

    #[test]
    fn parent_reference_keeps_the_class_tag() {
        let parent = Arc::new(Page::with_class("Catalog", "ProductPage"));
        let mut child = Page::with_class("Item", "ProductPage");
        child.set_parent(&parent);

        assert_eq!(child.parent().unwrap().class_name, "ProductPage");
    }

    #[test]
    fn set_parent_records_id_of_saved_parent() {
        let mut saved = Page::new("Saved");
        saved.id = 42;
        let saved = Arc::new(saved);

        let mut child = Page::new("Child");
        child.set_parent(&saved);
        assert_eq!(child.parent_id, Some(42));
    }

    #[test]
    fn clearing_a_content_field_keeps_an_explicit_null() {
        let mut page = Page::new("Meta");
        page.set_content_field("meta_title", JsonValue::from("asdf"));
        assert_eq!(page.content_field("meta_title").unwrap(), "asdf");

        page.set_content_field("meta_title", JsonValue::Null);
        assert!(page.content_field("meta_title").unwrap().is_null());
    }
}
