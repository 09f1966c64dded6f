use std::fs;
use std::path::Path;
use tempfile::tempdir;

use archive_janitor_core::cleanup::is_stack_directory_empty;

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"data").unwrap();
}

#[test]
fn test_directory_without_entries_is_empty() {
    let tmp = tempdir().unwrap();
    let stack = tmp.path().join("web");
    fs::create_dir(&stack).unwrap();
    assert!(is_stack_directory_empty(&stack));
}

#[test]
fn test_file_anywhere_below_is_not_empty() {
    let tmp = tempdir().unwrap();
    let stack = tmp.path().join("web");
    touch(&stack.join("a").join("b").join("c").join("compose.yaml"));
    assert!(!is_stack_directory_empty(&stack));

    let flat = tmp.path().join("db");
    touch(&flat.join("dump.sql"));
    assert!(!is_stack_directory_empty(&flat));
}

#[test]
fn test_only_plain_empty_subdirectories_is_empty() {
    let tmp = tempdir().unwrap();
    let stack = tmp.path().join("web");
    fs::create_dir_all(stack.join("volumes").join("data")).unwrap();
    fs::create_dir_all(stack.join("config")).unwrap();
    assert!(is_stack_directory_empty(&stack));
}

#[test]
fn test_timestamp_subdirectory_is_not_empty() {
    let tmp = tempdir().unwrap();
    let stack = tmp.path().join("web");
    fs::create_dir_all(stack.join("20240101_120000")).unwrap();
    assert!(!is_stack_directory_empty(&stack));
}

#[test]
fn test_timestamp_subdirectory_with_suffix_is_not_empty() {
    let tmp = tempdir().unwrap();
    let stack = tmp.path().join("beszel");
    fs::create_dir_all(stack.join("20251221_182125_beszel")).unwrap();
    assert!(!is_stack_directory_empty(&stack));
}

#[test]
fn test_near_timestamp_names_do_not_count() {
    let tmp = tempdir().unwrap();
    let stack = tmp.path().join("web");
    fs::create_dir_all(stack.join("2024-01-01_12-00-00")).unwrap();
    fs::create_dir_all(stack.join("1234567_123456")).unwrap();
    assert!(is_stack_directory_empty(&stack));
}

#[test]
fn test_same_named_child_without_files_is_empty() {
    let tmp = tempdir().unwrap();
    let stack = tmp.path().join("web");
    fs::create_dir_all(stack.join("web").join("nested")).unwrap();
    assert!(is_stack_directory_empty(&stack));
}

#[test]
fn test_same_named_child_with_file_is_not_empty() {
    let tmp = tempdir().unwrap();
    let stack = tmp.path().join("web");
    touch(&stack.join("web").join("deep").join("web.tar.gz"));
    assert!(!is_stack_directory_empty(&stack));
}

#[test]
fn test_unreadable_directory_is_not_empty() {
    let tmp = tempdir().unwrap();
    assert!(!is_stack_directory_empty(&tmp.path().join("missing")));
}

#[cfg(unix)]
#[test]
fn test_symlinked_file_counts_as_content() {
    let tmp = tempdir().unwrap();
    let target = tmp.path().join("outside.tar");
    touch(&target);
    let stack = tmp.path().join("web");
    fs::create_dir(&stack).unwrap();
    std::os::unix::fs::symlink(&target, stack.join("link.tar")).unwrap();
    assert!(!is_stack_directory_empty(&stack));
}
