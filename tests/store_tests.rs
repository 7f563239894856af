use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use dokarr::db::{NewUser, ReassignOutcome, Store};
use dokarr::domain::Role;
use dokarr::entities::users;

/// Admin account seeded by migration (must match m20240101_create_users.rs)
const ADMIN_EMAIL: &str = "admin@dokarr.local";

async fn store() -> Store {
    Store::new("sqlite::memory:")
        .await
        .expect("Failed to open in-memory store")
}

async fn insert_user(store: &Store, name: &str, email: &str, role: Role) -> i32 {
    store
        .insert_user(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            password_hash: None,
            role,
            manager_id: None,
        })
        .await
        .unwrap()
        .id
}

/// Pins an account's creation timestamp so ordering is not at the mercy of
/// the wall clock during the test run.
async fn pin_created_at(store: &Store, user_id: i32, created_at: &str) {
    let model = users::Entity::find_by_id(user_id)
        .one(&store.conn)
        .await
        .unwrap()
        .expect("user should exist");

    let mut active: users::ActiveModel = model.into();
    active.created_at = Set(created_at.to_string());
    active.update(&store.conn).await.unwrap();
}

async fn deactivate_seeded_admin(store: &Store) {
    let admin = store
        .get_user_by_email(ADMIN_EMAIL)
        .await
        .unwrap()
        .expect("seeded admin should exist");
    store.set_user_status(admin.id, false).await.unwrap();
}

#[tokio::test]
async fn assignment_candidate_ties_go_to_the_earliest_account() {
    let store = store().await;
    deactivate_seeded_admin(&store).await;

    // Insert in reverse creation order to rule out insertion-order luck.
    let late = insert_user(&store, "Late", "late@example.com", Role::Manager).await;
    let early = insert_user(&store, "Early", "early@example.com", Role::Manager).await;
    pin_created_at(&store, late, "2024-02-01T00:00:00+00:00").await;
    pin_created_at(&store, early, "2024-01-01T00:00:00+00:00").await;

    // Both carry zero clients; the older account wins the tie.
    assert_eq!(store.least_loaded_manager().await.unwrap(), Some(early));

    // Loading the winner with a client flips the selection.
    let client = insert_user(&store, "Client", "client@example.com", Role::Client).await;
    let outcome = store.reassign_manager(client, Some(early)).await.unwrap();
    assert!(matches!(outcome, ReassignOutcome::Updated(_)));

    assert_eq!(store.least_loaded_manager().await.unwrap(), Some(late));
}

#[tokio::test]
async fn no_active_candidate_yields_none() {
    let store = store().await;
    deactivate_seeded_admin(&store).await;

    assert_eq!(store.least_loaded_manager().await.unwrap(), None);

    // An active manager becomes eligible, a deactivated one drops out again.
    let manager = insert_user(&store, "Manager", "mgr@example.com", Role::Manager).await;
    assert_eq!(store.least_loaded_manager().await.unwrap(), Some(manager));

    store.set_user_status(manager, false).await.unwrap();
    assert_eq!(store.least_loaded_manager().await.unwrap(), None);
}
