//! Live backend tests. Run with: `CHATVIZ_BACKEND_URL=http://localhost:8000 cargo test --features online -- --nocapture`
#![cfg(feature = "online")]

use chatviz::{Client, ControlPanel};
use std::fs;
use tempfile::tempdir;

#[test]
fn upload_then_query() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("sales.csv");
    fs::write(&csv, "region,sales\nNorth,120\nSouth,80\nEast,95\n").unwrap();

    let client = Client::default();
    let table = client.upload(&csv).unwrap();
    assert!(!table.table_name.is_empty());
    assert_eq!(table.rows_loaded, 3);

    let resp = client
        .query("What are the total sales per region?", &table.table_name)
        .unwrap();
    assert!(!resp.answer.is_empty());
    if let Some(raw) = resp.formatted_data_for_visualization {
        let panel = ControlPanel::new(raw, resp.visualization.as_deref());
        assert!(panel.rendered().chart().is_some() || panel.rendered().notice().is_some());
    }
}

#[test]
fn unknown_table_surfaces_detail() {
    let client = Client::default();
    let err = client.query("anything?", "no_such_table_xyz").unwrap_err();
    assert!(err.to_string().starts_with("Failed to process query"));
}
