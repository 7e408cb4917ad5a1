//! Shared fixtures for the behaviour suite.
//!
//! Everything runs against [`MemoryStore`]; the Postgres backend has its
//! own feature-gated suite.

#![allow(dead_code)]

use arbor_core::actor::{Actor, EditScope, ROLE_ADMIN, ROLE_EDITOR};
use arbor_core::types::DbId;
use arbor_db::{MemoryStore, Page, StageManager};

pub fn manager() -> StageManager<MemoryStore> {
    StageManager::new(MemoryStore::new())
}

pub fn admin() -> Actor {
    Actor::new(1, &[ROLE_ADMIN])
}

pub fn editor() -> Actor {
    Actor::new(2, &[ROLE_EDITOR])
}

/// Write a fresh page with the given title and parent, returning it with
/// its assigned id and segment.
pub async fn write_page(
    mgr: &StageManager<MemoryStore>,
    title: &str,
    parent_id: Option<DbId>,
    actor: Option<&Actor>,
) -> Page {
    let mut page = Page::new(title);
    page.parent_id = parent_id;
    mgr.write(&mut page, actor)
        .await
        .expect("fixture write should succeed");
    page
}

/// A small content tree modelled on a typical site:
///
/// ```text
/// home                (admin-locked)
/// about-us
/// ├── my-staff
/// └── my-staff-2
/// products            (editor-locked)
/// ├── 1-1-test-product  (inherits)
/// └── another-product   (override: admin-locked)
/// ```
pub struct SiteFixture {
    pub mgr: StageManager<MemoryStore>,
    pub home: Page,
    pub about: Page,
    pub staff: Page,
    pub staff_dup: Page,
    pub products: Page,
    pub product1: Page,
    pub product4: Page,
}

impl SiteFixture {
    pub async fn build() -> Self {
        let mgr = manager();
        let actor = admin();

        let mut home = Page::new("Home");
        home.edit_scope = EditScope::only_roles(&[ROLE_ADMIN]);
        mgr.write(&mut home, Some(&actor)).await.unwrap();

        let about = write_page(&mgr, "About Us", None, Some(&actor)).await;
        let staff = write_page(&mgr, "My Staff", Some(about.id), Some(&actor)).await;
        let staff_dup = write_page(&mgr, "My Staff", Some(about.id), Some(&actor)).await;

        let mut products = Page::new("Products");
        products.edit_scope = EditScope::only_roles(&[ROLE_EDITOR]);
        mgr.write(&mut products, Some(&actor)).await.unwrap();

        let product1 =
            write_page(&mgr, "1 1 Test Product", Some(products.id), Some(&actor)).await;

        let mut product4 = Page::new("Another Product");
        product4.parent_id = Some(products.id);
        product4.edit_scope = EditScope::only_roles(&[ROLE_ADMIN]);
        mgr.write(&mut product4, Some(&actor)).await.unwrap();

        SiteFixture {
            mgr,
            home,
            about,
            staff,
            staff_dup,
            products,
            product1,
            product4,
        }
    }
}
