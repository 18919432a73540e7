//! Tests for loading level files from disk.

use std::fs;

use demondrian_core::{GameRules, LevelRepository, PuzzleRef, Solver};
use tempfile::TempDir;

const FIRST: &str = r#"[
    {"id": "b-second", "puzzles": [
        {"board": {"compact": "00 01"}, "types": [{"index": 0}, {"index": 1}]}
    ]}
]"#;

const SECOND: &str = r#"[
    {"id": "a-first", "puzzles": [
        {"board": {"compact": "01 11"}, "rules": {"NextTypePolicy": 0}, "types": [{"index": 0}, {"index": 1}]},
        {"board": {"size": 2, "pointers": ["1/1->0:0", "0/1->1:0", "0/1->0:1", "0/1->1:1"]},
         "rules": {"NextTypePolicy": "RemovedType"}, "types": [{"index": 0}, {"index": 1}]}
    ]}
]"#;

fn write(dir: &TempDir, name: &str, contents: &str) {
    fs::write(dir.path().join(name), contents).expect("Failed to write level file");
}

#[test]
fn test_scan_sorts_levels_by_id() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write(&temp_dir, "one.json", FIRST);
    write(&temp_dir, "two.json", SECOND);

    let repository = LevelRepository::scan(temp_dir.path()).expect("Failed to scan levels");

    assert_eq!(repository.len(), 2);
    let ids: Vec<&str> = repository.levels().iter().map(|l| l.id().as_str()).collect();
    assert_eq!(ids, vec!["a-first", "b-second"]);
}

#[test]
fn test_scan_skips_invalid_and_foreign_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write(&temp_dir, "good.json", FIRST);
    write(&temp_dir, "broken.json", "{ not json");
    write(&temp_dir, "empty-palette.json", r#"[{"id": 3, "puzzles": [{"board": {}}]}]"#);
    write(&temp_dir, "notes.txt", SECOND);
    fs::create_dir(temp_dir.path().join("nested.json")).expect("Failed to create dir");

    let repository = LevelRepository::scan(temp_dir.path()).expect("Failed to scan levels");

    assert_eq!(repository.len(), 1);
    assert_eq!(repository.levels()[0].id(), "b-second");
}

#[test]
fn test_scan_without_levels_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    assert!(LevelRepository::scan(temp_dir.path()).is_err());

    write(&temp_dir, "broken.json", "[{]");
    let err = LevelRepository::scan(temp_dir.path()).expect_err("no valid levels");
    assert!(err.to_string().contains("No valid levels"));
}

#[test]
fn test_scan_missing_directory_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("missing");
    let err = LevelRepository::scan(&missing).expect_err("missing dir");
    assert!(err.to_string().contains("not found"));

    let file = temp_dir.path().join("levels.json");
    fs::write(&file, FIRST).expect("Failed to write level file");
    let err = LevelRepository::scan(&file).expect_err("not a dir");
    assert!(err.to_string().contains("not a directory"));
}

#[test]
fn test_from_file_reads_rules_and_pointer_boards() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write(&temp_dir, "levels.json", SECOND);

    let repository =
        LevelRepository::from_file(temp_dir.path().join("levels.json")).expect("Failed to load");
    let level = repository.get(0).expect("level");
    assert_eq!(level.len(), 2);

    let keep_same = repository.puzzle(PuzzleRef::new(0, 1)).expect("puzzle");
    assert_eq!(*keep_same.rules(), GameRules::keep_same());
    assert!(keep_same.board().is_full());

    assert!(LevelRepository::from_file(temp_dir.path().join("nope.json")).is_err());
}

#[test]
fn test_loaded_puzzles_are_solvable() {
    let mut repository = LevelRepository::new();
    repository.load(FIRST).expect("Failed to parse levels");

    for level in repository.levels() {
        for puzzle in level.puzzles() {
            let game = puzzle.new_game().expect("Failed to start game");
            let result = Solver::new(&game).solve(10_000, 4).expect("search runs");
            assert!(result.is_solvable(), "{}", result);
        }
    }
}
