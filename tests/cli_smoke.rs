use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_formweave")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "formweave.exe"
            } else {
                "formweave"
            });
            p
        })
}

#[test]
fn cli_build_emits_parsable_metadata() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let out_path = dir.join("metadata.json");
    let _ = std::fs::remove_file(&out_path);

    let status = std::process::Command::new(exe())
        .args([
            "build",
            "--structure",
            "tests/data/structure.json",
            "--enums",
            "tests/data/enums.json",
            "--root",
            "employee",
            "--mode",
            "new-entry",
            "--out",
        ])
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());

    let text = std::fs::read_to_string(&out_path).unwrap();
    let meta: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(meta["fields"].is_object());
    assert!(meta["layout"]["tabs"].is_array());
    // new_only fields are present in new-entry mode.
    assert!(meta["fields"].get("999901").is_some());
}

#[test]
fn cli_validate_accepts_the_fixture_pair() {
    let status = std::process::Command::new(exe())
        .args([
            "validate",
            "--structure",
            "tests/data/structure.json",
            "--enums",
            "tests/data/enums.json",
            "--root",
            "employee",
        ])
        .status()
        .unwrap();

    assert!(status.success());
}

#[test]
fn cli_validate_fails_on_a_missing_document() {
    let status = std::process::Command::new(exe())
        .args([
            "validate",
            "--structure",
            "tests/data/absent.json",
            "--enums",
            "tests/data/enums.json",
            "--root",
            "employee",
        ])
        .status()
        .unwrap();

    assert!(!status.success());
}
