//! Edit permission inheritance and overrides.

mod common;

use arbor_core::actor::EditScope;
use arbor_core::stage::ReadContext;
use arbor_db::perms;
use common::{admin, editor, SiteFixture};

// ---------------------------------------------------------------------------
// Test: declaration, inheritance, and override in one tree
// ---------------------------------------------------------------------------

#[tokio::test]
async fn editor_permissions_follow_declaration_and_inheritance() {
    let f = SiteFixture::build().await;
    let editor = editor();
    let ctx = ReadContext::draft();

    // Can't edit a page that is locked to admins.
    assert!(!perms::can_edit(f.mgr.store(), f.home.id, Some(&editor), &ctx)
        .await
        .unwrap());

    // Can edit a page that is locked to editors.
    assert!(perms::can_edit(f.mgr.store(), f.products.id, Some(&editor), &ctx)
        .await
        .unwrap());

    // Can edit a child of that page that inherits.
    assert!(perms::can_edit(f.mgr.store(), f.product1.id, Some(&editor), &ctx)
        .await
        .unwrap());

    // Can't edit a child of that page that has its permissions overridden.
    assert!(!perms::can_edit(f.mgr.store(), f.product4.id, Some(&editor), &ctx)
        .await
        .unwrap());
}

// ---------------------------------------------------------------------------
// Test: admins pass their own locks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_passes_admin_locked_pages() {
    let f = SiteFixture::build().await;
    let admin = admin();
    let ctx = ReadContext::draft();

    assert!(perms::can_edit(f.mgr.store(), f.home.id, Some(&admin), &ctx)
        .await
        .unwrap());
    assert!(perms::can_edit(f.mgr.store(), f.product4.id, Some(&admin), &ctx)
        .await
        .unwrap());
}

// ---------------------------------------------------------------------------
// Test: an explicit "no restriction" override beats ancestor locks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn open_override_is_editable_under_a_restricted_ancestor() {
    let f = SiteFixture::build().await;
    let actor = admin();

    let mut open = arbor_db::Page::new("Open Leaflet");
    open.parent_id = Some(f.home.id); // home is admin-locked
    open.edit_scope = EditScope::Anyone;
    f.mgr.write(&mut open, Some(&actor)).await.unwrap();

    let ctx = ReadContext::draft();
    assert!(
        perms::can_edit(f.mgr.store(), open.id, Some(&editor()), &ctx)
            .await
            .unwrap()
    );
    // Even anonymously.
    assert!(perms::can_edit(f.mgr.store(), open.id, None, &ctx)
        .await
        .unwrap());
}

// ---------------------------------------------------------------------------
// Test: restriction to specific identities
// ---------------------------------------------------------------------------

#[tokio::test]
async fn user_scoped_pages_match_by_identity() {
    let f = SiteFixture::build().await;
    let actor = admin();

    let mut personal = arbor_db::Page::new("Personal Draft");
    personal.edit_scope = EditScope::only_users(&[editor().id]);
    f.mgr.write(&mut personal, Some(&actor)).await.unwrap();

    let ctx = ReadContext::draft();
    assert!(
        perms::can_edit(f.mgr.store(), personal.id, Some(&editor()), &ctx)
            .await
            .unwrap()
    );
    assert!(
        !perms::can_edit(f.mgr.store(), personal.id, Some(&actor), &ctx)
            .await
            .unwrap(),
        "identity lists do not admit other roles, even admins"
    );
}

// ---------------------------------------------------------------------------
// Test: the default policy at an all-inheriting root
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inheriting_chain_falls_back_to_authenticated_default() {
    let f = SiteFixture::build().await;
    let ctx = ReadContext::draft();

    // about-us and its children all inherit.
    assert!(
        perms::can_edit(f.mgr.store(), f.staff.id, Some(&editor()), &ctx)
            .await
            .unwrap()
    );
    assert!(!perms::can_edit(f.mgr.store(), f.staff.id, None, &ctx)
        .await
        .unwrap());
}

// ---------------------------------------------------------------------------
// Test: a class default scope applies to new pages of that class
// ---------------------------------------------------------------------------

#[tokio::test]
async fn class_default_scope_applies_to_new_pages() {
    use arbor_core::registry::{ClassRegistry, PageClass};
    use arbor_db::{MemoryStore, StageManager};

    let mut registry = ClassRegistry::with_defaults();
    registry
        .register(
            PageClass::new("AdminOnlyPage")
                .with_default_edit_scope(EditScope::only_roles(&[arbor_core::actor::ROLE_ADMIN])),
        )
        .unwrap();
    let mgr = StageManager::with_registry(MemoryStore::new(), registry);

    let mut page = arbor_db::Page::with_class("Settings", "AdminOnlyPage");
    mgr.write(&mut page, Some(&admin())).await.unwrap();

    let ctx = ReadContext::draft();
    assert!(!perms::can_edit(mgr.store(), page.id, Some(&editor()), &ctx)
        .await
        .unwrap());
    assert!(perms::can_edit(mgr.store(), page.id, Some(&admin()), &ctx)
        .await
        .unwrap());
}

// ---------------------------------------------------------------------------
// Test: unsaved pages evaluate their in-memory chain
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsaved_page_inherits_through_in_memory_parent() {
    let f = SiteFixture::build().await;
    let ctx = ReadContext::draft();

    let mut locked = arbor_db::Page::new("Locked Section");
    locked.edit_scope = EditScope::only_roles(&[arbor_core::actor::ROLE_ADMIN]);
    let locked = std::sync::Arc::new(locked);

    let mut child = arbor_db::Page::new("Unsaved Child");
    child.set_parent(&locked);

    assert!(
        !perms::can_edit_page(f.mgr.store(), &child, Some(&editor()), &ctx)
            .await
            .unwrap()
    );
    assert!(
        perms::can_edit_page(f.mgr.store(), &child, Some(&admin()), &ctx)
            .await
            .unwrap()
    );
}
