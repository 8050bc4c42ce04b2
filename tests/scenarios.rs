//! End-to-end scenarios spanning archive, envelope, datasource, and
//! workspace together.

use std::sync::Arc;

use warden::archive::Archive;
use warden::config::Config;
use warden::credentials::Credentials;
use warden::datasource::{Datasource, TextDatasource};
use warden::error::Error;
use warden::workspace::Workspace;

fn build_banking_archive() -> Archive {
    let archive = Archive::new(Config::default());
    let group = archive.create_group("Banking").unwrap();
    let entry = group.create_entry().unwrap();
    entry.set_property("username", "alice").unwrap();
    entry.set_property("password", "p").unwrap();
    return archive;
}

#[tokio::test]
async fn create_save_and_reload_recovers_archive() {
    let archive = build_banking_archive();
    archive.set_id("s1-archive").unwrap();

    let datasource: Arc<dyn Datasource> = Arc::new(TextDatasource::new());
    let workspace = Workspace::new(archive.clone(), datasource.clone(), Credentials::from_password("hunter2"));
    workspace.save().await.unwrap();
    assert!(!archive.is_dirty());

    let reloaded_history = datasource.load(&Credentials::from_password("hunter2")).await.unwrap();
    let reloaded = Archive::create_from_history(reloaded_history, Config::default()).unwrap();

    let groups = reloaded.groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].title(), "Banking");
    let entries = groups[0].entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].properties().get("username").unwrap(), "alice");
    assert_eq!(entries[0].properties().get("password").unwrap(), "p");
}

#[tokio::test]
async fn reload_with_wrong_password_fails_and_leaves_local_untouched() {
    let archive = build_banking_archive();
    archive.set_id("s2-archive").unwrap();
    let history_before = archive.history();

    let datasource: Arc<dyn Datasource> = Arc::new(TextDatasource::new());
    let workspace = Workspace::new(archive.clone(), datasource.clone(), Credentials::from_password("hunter2"));
    workspace.save().await.unwrap();

    let result = datasource.load(&Credentials::from_password("hunter3")).await;
    assert!(matches!(result, Err(Error::AuthenticationFailure(_))));
    assert_eq!(archive.history(), history_before);
}

#[tokio::test]
async fn concurrent_non_conflicting_edits_both_survive_update() {
    let local = Archive::new(Config::default());
    local.set_id("s3-archive").unwrap();
    let group = local.create_group("Shared").unwrap();

    let datasource: Arc<dyn Datasource> = Arc::new(TextDatasource::new());
    let creds = Credentials::from_password("hunter2");
    datasource.save(&local.history(), &creds, &Config::default()).await.unwrap();

    // Remote branches from the same common point and adds an entry.
    let remote = Archive::create_from_history(local.history(), Config::default()).unwrap();
    let remote_group = remote.groups().into_iter().find(|g| g.id() == group.id()).unwrap();
    remote_group.create_entry().unwrap();
    datasource.save(&remote.history(), &creds, &Config::default()).await.unwrap();

    // Local independently adds its own entry before updating.
    let local_entry = group.create_entry().unwrap();

    let mut workspace = Workspace::new(local.clone(), datasource.clone(), creds);
    workspace.update().await.unwrap();

    let merged_group = workspace.archive().groups().into_iter().find(|g| g.id() == group.id()).unwrap();
    let entry_ids: Vec<String> = merged_group.entries().iter().map(|e| e.id()).collect();
    assert!(entry_ids.contains(&local_entry.id()));
    assert_eq!(entry_ids.len(), 2);
}

#[test]
fn move_into_own_descendant_is_rejected_and_archive_unchanged() {
    let archive = Archive::new(Config::default());
    let parent = archive.create_group("Parent").unwrap();
    let child = parent.create_group("Child").unwrap();
    let history_before = archive.history();
    let dirty_before = archive.is_dirty();

    let result = parent.move_to(Some(&child.id()));
    assert!(matches!(result, Err(Error::InvalidMove(_))));
    assert_eq!(archive.history(), history_before);
    assert_eq!(archive.is_dirty(), dirty_before);
}
