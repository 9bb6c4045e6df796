use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const PAYLOAD: &str = r#"{"labels":["Jan","Feb","Mar"],"values":[{"label":"Income","data":[1,2]},{"label":"Spend","data":[3,4,5]}]}"#;

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("chatviz").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("chatviz"))
        .stdout(predicate::str::contains("render"));
}

#[test]
fn render_writes_plot_csv_and_json() {
    let dir = tempdir().unwrap();
    let payload = dir.path().join("payload.json");
    fs::write(&payload, PAYLOAD).unwrap();
    let plot = dir.path().join("chart.svg");
    let json = dir.path().join("chart.json");

    let mut cmd = Command::cargo_bin("chatviz").unwrap();
    cmd.arg("render")
        .arg("--payload")
        .arg(&payload)
        .args(["--kind", "line", "--hide", "Spend"])
        .arg("--plot")
        .arg(&plot)
        .arg("--csv")
        .arg(dir.path())
        .arg("--json")
        .arg(&json);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Chart: Line"))
        .stdout(predicate::str::contains("[ ] #82ca9d Spend"));

    assert!(fs::metadata(&plot).unwrap().len() > 0);
    assert_eq!(
        fs::read_to_string(dir.path().join("visualization_data.csv")).unwrap(),
        "label,Income,Spend\nJan,1,3\nFeb,2,4\nMar,,5"
    );
    let desc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(desc["kind"], "line");
    assert_eq!(desc["data"]["datasets"].as_array().unwrap().len(), 1);
}

#[test]
fn render_reports_unsupported_kind() {
    let dir = tempdir().unwrap();
    let payload = dir.path().join("payload.json");
    fs::write(&payload, PAYLOAD).unwrap();

    let mut cmd = Command::cargo_bin("chatviz").unwrap();
    cmd.arg("render").arg("--payload").arg(&payload).args(["--kind", "radar"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Unsupported visualization type: radar"));
}

#[test]
fn export_writes_into_out_dir() {
    let dir = tempdir().unwrap();
    let payload = dir.path().join("payload.json");
    fs::write(&payload, PAYLOAD).unwrap();
    let out = dir.path().join("exports");

    let mut cmd = Command::cargo_bin("chatviz").unwrap();
    cmd.arg("export").arg("--payload").arg(&payload).arg("--out").arg(&out);
    cmd.assert().success();
    assert!(out.join("visualization_data.csv").exists());
}

#[test]
fn upload_rejects_unsupported_extension_before_network() {
    let mut cmd = Command::cargo_bin("chatviz").unwrap();
    cmd.args(["--backend", "http://127.0.0.1:9", "upload", "notes.txt"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("File upload failed"));
}

// Live test (opt-in): CHATVIZ_BACKEND_URL=... cargo test --features online
#[cfg(feature = "online")]
#[test]
fn upload_online_fixture() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("fruit.csv");
    fs::write(&csv, "fruit,count\napple,3\npear,5\n").unwrap();
    let mut cmd = Command::cargo_bin("chatviz").unwrap();
    cmd.arg("upload").arg(&csv);
    cmd.assert().success();
}
