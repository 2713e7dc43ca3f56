use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

mod common;
use common::{write_file, write_image, write_npz};

const VALID_COLLECTION: &str = r#"{
  "info": {"description": "WGISD grapes train split", "year": 2025},
  "images": [{"id": 1, "file_name": "grapes/images/A.jpg", "width": 1000, "height": 800}],
  "annotations": [
    {"id": 1, "image_id": 1, "category_id": 1, "bbox": [400.0, 300.0, 200.0, 200.0], "area": 40000.0, "iscrowd": 0}
  ],
  "categories": [{"id": 1, "name": "grape"}]
}"#;

const INVALID_COLLECTION: &str = r#"{
  "images": [
    {"id": 1, "file_name": "grapes/images/A.jpg", "width": 1000, "height": 800},
    {"id": 1, "file_name": "grapes/images/B.jpg", "width": 1000, "height": 800}
  ],
  "annotations": [
    {"id": 1, "image_id": 7, "category_id": 3, "bbox": [10.0, 10.0, 5.0, 5.0], "area": 25.0, "iscrowd": 0}
  ],
  "categories": [{"id": 1, "name": "grape"}]
}"#;

fn grapeset() -> Command {
    Command::cargo_bin("grapeset").unwrap()
}

fn write_collection(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    write_file(&path, contents);
    path.to_string_lossy().into_owned()
}

#[test]
fn runs() {
    grapeset()
        .assert()
        .success()
        .stdout(predicate::str::contains("grapeset --help"));
}

#[test]
fn outputs_tool_name() {
    grapeset().arg("-V").assert().success().stdout("grapeset 0.1.0\n");
}

// Validate subcommand tests

#[test]
fn validate_valid_collection_succeeds() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = write_collection(temp.path(), "valid.json", VALID_COLLECTION);

    grapeset()
        .args(["validate", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains("Validation passed"));
}

#[test]
fn validate_invalid_collection_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = write_collection(temp.path(), "invalid.json", INVALID_COLLECTION);

    grapeset()
        .args(["validate", &input])
        .assert()
        .failure()
        .stdout(predicate::str::contains("DuplicateImageId"))
        .stdout(predicate::str::contains("MissingImageRef"))
        .stdout(predicate::str::contains("MissingCategoryRef"))
        .stderr(predicate::str::contains("Validation failed"));
}

#[test]
fn validate_json_output_lists_issues() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = write_collection(temp.path(), "valid.json", VALID_COLLECTION);

    grapeset()
        .args(["validate", &input, "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"issues\": []"));
}

#[test]
fn validate_rejects_unknown_output_format() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = write_collection(temp.path(), "valid.json", VALID_COLLECTION);

    grapeset()
        .args(["validate", &input, "--output", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown report output"));
}

#[test]
fn validate_nonexistent_file_fails() {
    grapeset()
        .args(["validate", "nonexistent_file.json"])
        .assert()
        .failure();
}

// Pipeline subcommand tests

#[test]
fn coco_rejects_unknown_split() {
    let temp = tempfile::tempdir().expect("create temp dir");

    grapeset()
        .args(["coco", "--splits", "train,bogus"])
        .arg("--root")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported split"));
}

#[test]
fn coco_reads_root_from_environment() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_image(&temp.path().join("grapes/images/A.jpg"), 1000, 800);
    write_file(
        &temp.path().join("grapes/csv/A.csv"),
        "#item,x,y,width,height,label\n0,400.0,300.0,200.0,200.0,1\n",
    );

    grapeset()
        .env("GRAPESET_ROOT", temp.path())
        .args(["coco", "--splits", "all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 succeeded"));

    let written = temp.path().join("annotations/grapes_instances_all.json");
    let text = fs::read_to_string(written).expect("read collection");
    assert!(text.contains("\"file_name\": \"grapes/images/A.jpg\""));
}

#[test]
fn yolo_to_csv_then_splits() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let images = temp.path().join("grapes/images");
    for stem in ["A", "B", "C", "D", "E"] {
        write_image(&images.join(format!("{stem}.jpg")), 100, 100);
    }
    write_file(&images.join("A.txt"), "0 0.5 0.5 0.5 0.5\n");
    write_file(&temp.path().join("train.txt"), "A\nB\nC\nD\nE\n");
    write_file(&temp.path().join("test.txt"), "E\n");

    grapeset()
        .arg("yolo-to-csv")
        .arg("--data")
        .arg(&images)
        .arg("--images")
        .arg(&images)
        .arg("--csv")
        .arg(temp.path().join("grapes/csv"))
        .assert()
        .success()
        .stdout(predicate::str::contains("5 succeeded"));

    let sets = temp.path().join("grapes/sets");
    grapeset()
        .arg("splits")
        .arg("--images")
        .arg(&images)
        .arg("--train")
        .arg(temp.path().join("train.txt"))
        .arg("--test")
        .arg(temp.path().join("test.txt"))
        .arg("--out")
        .arg(&sets)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 train, 1 val, 1 test, 5 total"));

    assert_eq!(fs::read_to_string(sets.join("val.txt")).unwrap(), "A\n");
    assert_eq!(
        fs::read_to_string(sets.join("train_val.txt")).unwrap(),
        "A\nB\nC\nD\n"
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("grapes/csv/A.csv")).unwrap(),
        "#item,x,y,width,height,label\n0,25.0,25.0,50.0,50.0,1\n"
    );
}

#[test]
fn masks_rejects_unknown_policy() {
    let temp = tempfile::tempdir().expect("create temp dir");

    grapeset()
        .arg("masks")
        .arg("--input")
        .arg(temp.path())
        .arg("--out")
        .arg(temp.path().join("out"))
        .args(["--policy", "biggest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown mask policy"));
}

#[test]
fn masks_writes_pngs() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("masks");
    write_npz(&input.join("CDY_1.npz"), "arr_0.npy", &[2, 2, 1], &[1, 0, 0, 1]);

    grapeset()
        .arg("masks")
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(temp.path().join("png"))
        .args(["--policy", "first"])
        .assert()
        .success()
        .stdout(predicate::str::contains("masks (first)"));

    assert!(temp.path().join("png/CDY_1.png").is_file());
}

#[test]
fn labelmap_is_written() {
    let temp = tempfile::tempdir().expect("create temp dir");

    grapeset()
        .arg("labelmap")
        .arg("--out")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("labelmap.json"));

    let text = fs::read_to_string(temp.path().join("labelmap.json")).expect("read labelmap");
    assert!(text.contains("\"object_name\": \"grape\""));
    assert!(text.contains("\"object_name\": \"background\""));
}

#[test]
fn image_json_and_berries() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let data = temp.path().join("data");
    write_image(&data.join("SVB_1.jpg"), 200, 100);
    write_file(&data.join("SVB_1.txt"), "0 0.5 0.5 0.5 0.5\n");
    write_file(&temp.path().join("berries/SVB_1-berries.txt"), "1 1\n2 2\n");

    grapeset()
        .arg("image-json")
        .arg("--data")
        .arg(&data)
        .assert()
        .success();

    grapeset()
        .arg("berries")
        .arg("--json")
        .arg(&data)
        .arg("--berries")
        .arg(temp.path().join("berries"))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 succeeded"));

    let text = fs::read_to_string(data.join("SVB_1.json")).expect("read document");
    assert!(text.contains("\"berry_count\": 2"));
    assert!(text.contains("Sauvignon Blanc"));
}
