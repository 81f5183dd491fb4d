use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// `rname` running inside `dir` with its data directory isolated under it
fn rname(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rname").unwrap();
    cmd.current_dir(dir.path())
        .env("RNAME_HOME", dir.path().join(".rname-home"))
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{:?}", output);
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_help_command() {
    let mut cmd = Command::cargo_bin("rname").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Batch rename files"));
}

#[test]
fn test_version_subcommand() {
    let temp_dir = TempDir::new().unwrap();
    rname(&temp_dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rname 0.1.0"));
}

#[test]
fn test_version_subcommand_json() {
    let temp_dir = TempDir::new().unwrap();
    rname(&temp_dir)
        .args(["version", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r#"\{"name":"rname","version":"0\.1\.0"\}"#).unwrap());
}

#[test]
fn test_rename_single_file() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("a.txt").write_str("a").unwrap();

    rname(&temp_dir)
        .args(["rename", "a.txt", "{{f|big}}"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt → A.txt"))
        .stdout(predicate::str::contains("Renamed 1 files"));

    temp_dir.child("A.txt").assert(predicate::path::exists());
}

#[test]
fn test_simulate_changes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("a.txt").write_str("a").unwrap();

    rname(&temp_dir)
        .args(["rename", "--sim", "a.txt", "b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt → b.txt"))
        .stdout(predicate::str::contains("Simulated 1 operations"));

    temp_dir.child("a.txt").assert(predicate::path::exists());
    temp_dir.child("b.txt").assert(predicate::path::missing());
    temp_dir
        .child(".rname-home/history.json")
        .assert(predicate::path::missing());
}

#[test]
fn test_glob_collisions_get_indices() {
    let temp_dir = TempDir::new().unwrap();
    for name in ["four.txt", "five.txt", "fourteen.txt", "fifteen.txt"] {
        temp_dir.child(name).write_str(name).unwrap();
    }

    rname(&temp_dir)
        .args(["rename", "*.txt", "multiple"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Renamed 4 files"));

    for name in ["multiple1.txt", "multiple2.txt", "multiple3.txt", "multiple4.txt"] {
        temp_dir.child(name).assert(predicate::path::exists());
    }
    temp_dir.child("four.txt").assert(predicate::path::missing());
}

#[test]
fn test_noindex_conflict_is_declined_without_terminal() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("a.txt").write_str("a").unwrap();
    temp_dir.child("b.txt").write_str("b").unwrap();

    rname(&temp_dir)
        .args(["rename", "--noindex", "a.txt", "b.txt", "same"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped a.txt (declined)"))
        .stdout(predicate::str::contains("Renamed 0 files (2 skipped, 0 failed)"));

    temp_dir.child("a.txt").assert("a");
    temp_dir.child("b.txt").assert("b");
    temp_dir.child("same.txt").assert(predicate::path::missing());
}

#[test]
fn test_existing_target_skipped_without_terminal() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("a.txt").write_str("a").unwrap();
    temp_dir.child("b.txt").write_str("b").unwrap();

    rname(&temp_dir)
        .args(["rename", "a.txt", "b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped a.txt (declined)"));
    temp_dir.child("b.txt").assert("b");

    rname(&temp_dir)
        .args(["rename", "--force", "a.txt", "b"])
        .assert()
        .success();
    temp_dir.child("b.txt").assert("a");
}

#[test]
fn test_missing_inputs_are_reported() {
    let temp_dir = TempDir::new().unwrap();

    rname(&temp_dir)
        .args(["rename", "nope.txt", "out"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Skipping nope.txt"))
        .stdout(predicate::str::contains("No input files found"));
}

#[test]
fn test_rename_requires_template() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("a.txt").write_str("a").unwrap();

    rname(&temp_dir)
        .args(["rename", "a.txt"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Expected at least one input"));
}

#[test]
fn test_bad_template_aborts_batch() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("a.txt").write_str("a").unwrap();

    rname(&temp_dir)
        .args(["rename", "a.txt", "{{ nothere }}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
    temp_dir.child("a.txt").assert(predicate::path::exists());
}

#[test]
fn test_undo_restores_last_batch() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("a.txt").write_str("a").unwrap();
    temp_dir.child("b.txt").write_str("b").unwrap();

    rname(&temp_dir)
        .args(["rename", "*.txt", "{{f}}-renamed"])
        .assert()
        .success();
    temp_dir.child("a-renamed.txt").assert(predicate::path::exists());

    rname(&temp_dir)
        .arg("undo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored 2 files"));
    temp_dir.child("a.txt").assert("a");
    temp_dir.child("b.txt").assert("b");

    rname(&temp_dir)
        .arg("undo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to undo"));
}

#[test]
fn test_noundo_is_not_recorded() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("a.txt").write_str("a").unwrap();

    rname(&temp_dir)
        .args(["rename", "--noundo", "a.txt", "b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rname undo").not());

    let history = json_stdout(rname(&temp_dir).args(["history", "--output", "json"]));
    assert_eq!(history["total"], 0);
}

#[test]
fn test_history_lists_batches() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("a.txt").write_str("a").unwrap();

    let renamed = json_stdout(rname(&temp_dir).args(["rename", "--output", "json", "a.txt", "b"]));
    let batch_id = renamed["batch_id"].as_str().unwrap().to_string();

    let history = json_stdout(rname(&temp_dir).args(["history", "--output", "json"]));
    assert_eq!(history["total"], 1);
    assert_eq!(history["batches"][0]["id"], batch_id.as_str());
    assert_eq!(history["batches"][0]["operations"], 1);

    rname(&temp_dir)
        .args(["undo", "--batch", &batch_id[..6]])
        .assert()
        .success();

    let history = json_stdout(rname(&temp_dir).args(["history", "--output", "json"]));
    assert_eq!(history["total"], 1);
    assert_eq!(history["batches"][0]["revert_of"], batch_id.as_str());
    let history = json_stdout(rname(&temp_dir).args(["history", "--all", "--output", "json"]));
    assert_eq!(history["total"], 2);
}

#[test]
fn test_print_data() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("photo.jpg").write_str("x").unwrap();

    let data = json_stdout(rname(&temp_dir).args(["rename", "--printdata", "photo.jpg"]));
    assert_eq!(data[0]["data"]["f"], "photo");
    temp_dir.child("photo.jpg").assert(predicate::path::exists());
}

#[test]
fn test_favorites_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("a.txt").write_str("a").unwrap();

    rname(&temp_dir)
        .args(["favorites", "add", "--alias", "up", "rename", "*.txt", "{{f|big}}"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved favorite 1"));

    rname(&temp_dir)
        .args(["favorites", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("up"));

    rname(&temp_dir)
        .args(["favorites", "run", "up"])
        .assert()
        .success();
    temp_dir.child("A.txt").assert(predicate::path::exists());

    rname(&temp_dir)
        .args(["favorites", "remove", "1"])
        .assert()
        .success();
    rname(&temp_dir)
        .args(["favorites", "run", "up"])
        .assert()
        .failure();
}

#[test]
fn test_favorites_reject_non_rename_commands() {
    let temp_dir = TempDir::new().unwrap();
    rname(&temp_dir)
        .args(["favorites", "add", "history"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only store rename commands"));
}

#[test]
fn test_rename_saves_favorite() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("a.txt").write_str("a").unwrap();

    rname(&temp_dir)
        .args(["rename", "--sim", "--favorite", "--alias", "s", "a.txt", "b"])
        .assert()
        .success();

    let favorites = json_stdout(rname(&temp_dir).args(["favorites", "list", "--output", "json"]));
    assert_eq!(favorites[0]["alias"], "s");
    assert_eq!(
        favorites[0]["command"],
        serde_json::json!(["rename", "--sim", "a.txt", "b"])
    );
}

#[test]
fn test_completions() {
    let temp_dir = TempDir::new().unwrap();
    rname(&temp_dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rname"));
}
