use super::*;
use tempfile::tempdir;

#[test]
fn create_then_remove_round_trips() {
    let project = tempdir().unwrap();
    let watch = tempdir().unwrap();

    let link = create_project_symlink(project.path(), "sess-1", watch.path()).unwrap();
    assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
    assert_eq!(std::fs::read_link(&link).unwrap(), watch.path());

    remove_project_symlink(project.path(), "sess-1").unwrap();
    assert!(link.symlink_metadata().is_err());
}

#[test]
fn create_replaces_a_stale_symlink() {
    let project = tempdir().unwrap();
    let watch_a = tempdir().unwrap();
    let watch_b = tempdir().unwrap();

    create_project_symlink(project.path(), "sess-1", watch_a.path()).unwrap();
    let link = create_project_symlink(project.path(), "sess-1", watch_b.path()).unwrap();

    assert_eq!(std::fs::read_link(&link).unwrap(), watch_b.path());
}

#[test]
fn remove_on_missing_symlink_is_not_an_error() {
    let project = tempdir().unwrap();
    remove_project_symlink(project.path(), "never-created").unwrap();
}
