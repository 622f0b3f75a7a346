//! End-to-end tests for the `tutorbook` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

const META: &str = r#"title: Activation functions
author: Phillip Lippe
created: 2021-08-27
license: CC BY-SA
description: Closer look at activation functions.
requirements:
  - torchvision
accelerator:
  - GPU
"#;

const SCRIPT: &str = "# %%\nimport torch\n\n# %% [markdown]\n# ## Sigmoid\n\n# %%\nx = torch.zeros(3)\n";

fn tutorial(root: &Path, rel: &str) {
    let dir = root.join(rel);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(".meta.yml"), META).unwrap();
    let stem = rel.rsplit('/').next().unwrap();
    fs::write(dir.join(format!("{stem}.py")), SCRIPT).unwrap();
}

fn tutorbook(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tutorbook").unwrap();
    cmd.arg("--root").arg(root);
    cmd
}

// =============================================================================
// Folder Commands
// =============================================================================

#[test]
fn test_list_dirs() {
    let temp = TempDir::new().unwrap();
    tutorial(temp.path(), "course_UvA-DL/02-activation-functions");
    tutorial(temp.path(), "lightning_examples/mnist-hello-world");
    tutorial(temp.path(), ".notebooks/not-a-tutorial");

    tutorbook(temp.path())
        .arg("list-dirs")
        .assert()
        .success()
        .stdout("course_UvA-DL/02-activation-functions\nlightning_examples/mnist-hello-world\n");
}

#[test]
fn test_list_published_dirs() {
    let temp = TempDir::new().unwrap();
    let published = temp.path().join(".notebooks/course_UvA-DL");
    fs::create_dir_all(&published).unwrap();
    fs::write(published.join("02-activation-functions.ipynb"), "{}").unwrap();
    fs::write(published.join("02-activation-functions.yaml"), "title: x\n").unwrap();

    tutorbook(temp.path())
        .args(["list-dirs", "--published"])
        .assert()
        .success()
        .stdout("course_UvA-DL/02-activation-functions\n");
}

#[test]
fn test_group_folders_scans_root() {
    let temp = TempDir::new().unwrap();
    tutorial(temp.path(), "course_UvA-DL/02-activation-functions");
    let published = temp.path().join(".notebooks/course_UvA-DL");
    fs::create_dir_all(&published).unwrap();
    fs::write(published.join("99-removed.ipynb"), "{}").unwrap();
    let diff = temp.path().join("diff.txt");
    fs::write(
        &diff,
        "course_UvA-DL/02-activation-functions/02-activation-functions.py\nREADME.md\n",
    )
    .unwrap();

    tutorbook(temp.path())
        .arg("group-folders")
        .arg(&diff)
        .assert()
        .success()
        .stdout(predicate::str::contains("course_UvA-DL/02-activation-functions"));

    assert_eq!(
        fs::read_to_string(temp.path().join("changed-folders.txt")).unwrap(),
        "course_UvA-DL/02-activation-functions\n"
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("dropped-folders.txt")).unwrap(),
        "course_UvA-DL/99-removed\n"
    );
}

#[test]
fn test_group_folders_with_listings() {
    let temp = TempDir::new().unwrap();
    tutorial(temp.path(), "lightning_examples/augmentation_kornia");
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();
    fs::write(temp.path().join("diff.txt"), "lightning_examples/augmentation_kornia/.meta.yml\n").unwrap();
    fs::write(temp.path().join("source.txt"), "lightning_examples/augmentation_kornia\n").unwrap();
    fs::write(
        temp.path().join("published.txt"),
        "lightning_examples/augmentation_kornia\nlightning_examples/old-tutorial\n",
    )
    .unwrap();

    tutorbook(temp.path())
        .arg("group-folders")
        .arg(temp.path().join("diff.txt"))
        .arg("--actual-dirs")
        .arg(temp.path().join("source.txt"))
        .arg(temp.path().join("published.txt"))
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(out.join("changed-folders.txt")).unwrap(),
        "lightning_examples/augmentation_kornia\n"
    );
    assert_eq!(
        fs::read_to_string(out.join("dropped-folders.txt")).unwrap(),
        "lightning_examples/old-tutorial\n"
    );
}

#[test]
fn test_group_folders_rejects_folder_without_meta() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("drafts/idea")).unwrap();
    fs::write(temp.path().join("drafts/idea/idea.py"), "# %%\n").unwrap();
    fs::write(temp.path().join("diff.txt"), "drafts/idea/idea.py\n").unwrap();

    tutorbook(temp.path())
        .arg("group-folders")
        .arg(temp.path().join("diff.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("drafts/idea"))
        .stderr(predicate::str::contains("hint:"));

    tutorbook(temp.path())
        .arg("group-folders")
        .arg(temp.path().join("diff.txt"))
        .arg("--no-strict")
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(temp.path().join("changed-folders.txt")).unwrap(),
        ""
    );
}

// =============================================================================
// Single-Folder Commands
// =============================================================================

#[test]
fn test_generate_writes_notebook() {
    let temp = TempDir::new().unwrap();
    tutorial(temp.path(), "course_UvA-DL/02-activation-functions");

    tutorbook(temp.path())
        .args(["generate", "course_UvA-DL/02-activation-functions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("6 cells"));

    let path = temp
        .path()
        .join("course_UvA-DL/02-activation-functions/02-activation-functions.ipynb");
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["nbformat"], 4);
    assert_eq!(json["cells"][2]["source"][0], "! pip install --quiet \"torchvision\"");
}

#[test]
fn test_validate() {
    let temp = TempDir::new().unwrap();
    tutorial(temp.path(), "course_UvA-DL/02-activation-functions");

    tutorbook(temp.path())
        .args(["validate", "course_UvA-DL/02-activation-functions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Activation functions"))
        .stdout(predicate::str::contains("accelerator:  GPU"));
}

#[test]
fn test_validate_reports_missing_fields() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("broken");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(".meta.yml"), "title: Broken\n").unwrap();
    fs::write(dir.join("broken.py"), SCRIPT).unwrap();

    tutorbook(temp.path())
        .args(["validate", "broken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required fields"));
}

#[test]
fn test_validate_missing_folder() {
    let temp = TempDir::new().unwrap();
    tutorbook(temp.path())
        .args(["validate", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no metadata manifest"));
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("tutorbook")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("group-folders"))
        .stdout(predicate::str::contains("list-dirs"));
}

#[test]
fn test_render_help_says_nothing_is_committed() {
    Command::cargo_bin("tutorbook")
        .unwrap()
        .args(["render", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("without committing"))
        .stdout(predicate::str::contains("stage").not());
}
