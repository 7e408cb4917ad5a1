//! Polymorphic page classes.
//!
//! Every page row carries a `class_name` tag. Behaviour attached to a tag
//! (the default edit scope for new pages, a route segment the class claims
//! outside the page tree) is declared once in a [`ClassRegistry`] and
//! resolved when rows are loaded or restored. Writing a page with an
//! unregistered tag is a validation failure.

use std::collections::{HashMap, HashSet};

use crate::actor::EditScope;
use crate::error::CoreError;

/// Tag of the base page class every registry starts with.
pub const BASE_PAGE_CLASS: &str = "Page";

/// Behaviour descriptor for one page class.
#[derive(Debug, Clone)]
pub struct PageClass {
    /// Tag stored in the `class_name` column.
    pub name: String,
    /// Scope applied to new pages of this class that declare none.
    pub default_edit_scope: EditScope,
    /// Route segment this class claims outside the page tree. Generated
    /// page segments must not shadow it.
    pub reserved_segment: Option<String>,
}

impl PageClass {
    pub fn new(name: &str) -> Self {
        PageClass {
            name: name.to_string(),
            default_edit_scope: EditScope::Inherit,
            reserved_segment: None,
        }
    }

    pub fn with_default_edit_scope(mut self, scope: EditScope) -> Self {
        self.default_edit_scope = scope;
        self
    }

    pub fn with_reserved_segment(mut self, segment: &str) -> Self {
        self.reserved_segment = Some(segment.to_string());
        self
    }
}

/// Registry of known page classes, keyed by tag.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, PageClass>,
}

impl ClassRegistry {
    /// An empty registry. Most callers want [`ClassRegistry::with_defaults`].
    pub fn new() -> Self {
        ClassRegistry::default()
    }

    /// A registry preloaded with the base [`BASE_PAGE_CLASS`] class.
    pub fn with_defaults() -> Self {
        let mut registry = ClassRegistry::new();
        registry
            .register(PageClass::new(BASE_PAGE_CLASS))
            .expect("empty registry cannot conflict");
        registry
    }

    /// Register a class. Each tag may be registered once.
    pub fn register(&mut self, class: PageClass) -> Result<(), CoreError> {
        if self.classes.contains_key(&class.name) {
            return Err(CoreError::Conflict(format!(
                "page class '{}' is already registered",
                class.name
            )));
        }
        self.classes.insert(class.name.clone(), class);
        Ok(())
    }

    /// Look up a class by tag.
    pub fn resolve(&self, name: &str) -> Option<&PageClass> {
        self.classes.get(name)
    }

    /// Look up a class by tag, rejecting unknown tags.
    pub fn validate(&self, name: &str) -> Result<&PageClass, CoreError> {
        self.resolve(name).ok_or_else(|| {
            CoreError::Validation(format!("unknown page class '{name}'"))
        })
    }

    /// Every route segment claimed by a registered class.
    pub fn reserved_segments(&self) -> HashSet<String> {
        self.classes
            .values()
            .filter_map(|c| c.reserved_segment.clone())
            .collect()
    }
}
