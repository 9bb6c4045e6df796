use chatviz::models::{Series, VisualizationPayload};
use chatviz::normalize::{EmptyReason, normalize};

fn payload(labels: &[&str], series: &[(&str, &[f64])]) -> VisualizationPayload {
    VisualizationPayload::new(
        labels.iter().map(|s| s.to_string()).collect(),
        series
            .iter()
            .map(|(l, d)| Series::new(*l, d.to_vec()))
            .collect(),
    )
}

#[test]
fn ragged_payload_is_padded_not_truncated() {
    let raw = payload(&["a", "b", "c"], &[("X", &[1.0, 2.0]), ("Y", &[3.0, 4.0, 5.0, 6.0])]);
    let t = normalize(&raw);

    assert_eq!(t.labels(), ["a", "b", "c", ""]);
    assert_eq!(t.series()[0].data, vec![1.0, 2.0, 0.0, 0.0]);
    assert_eq!(t.series()[1].data, vec![3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn output_is_rectangular_for_assorted_shapes() {
    let cases: Vec<VisualizationPayload> = vec![
        payload(&["a"], &[("X", &[])]),
        payload(&["a", "b"], &[("X", &[1.0, 2.0, 3.0, 4.0, 5.0])]),
        payload(&["a", "b", "c", "d"], &[("X", &[1.0]), ("Y", &[1.0, 2.0]), ("Z", &[])]),
    ];
    for raw in &cases {
        let longest = raw.values.iter().map(|s| s.data.len()).max().unwrap_or(0);
        let expected = longest.max(raw.labels.len());
        let t = normalize(raw);
        assert_eq!(t.len(), expected);
        assert_eq!(t.labels().len(), expected);
        assert!(t.series().iter().all(|s| s.data.len() == expected));
        // series order and names survive
        let names: Vec<&str> = t.series().iter().map(|s| s.label.as_str()).collect();
        let raw_names: Vec<&str> = raw.values.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(names, raw_names);
    }
}

#[test]
fn normalizing_twice_changes_nothing() {
    let raw = payload(&["a", "b"], &[("X", &[1.0]), ("Y", &[2.0, 3.0, 4.0])]);
    let once = normalize(&raw);
    assert_eq!(normalize(&once.to_payload()), once);
}

#[test]
fn wire_payload_with_missing_pieces_becomes_notice() {
    let raw: VisualizationPayload = serde_json::from_str(r#"{"values":[{"label":"X","data":[1]}]}"#).unwrap();
    let t = normalize(&raw);
    assert!(t.is_empty());
    assert_eq!(t.empty_reason().map(EmptyReason::notice), Some("No data to visualize"));

    let raw: VisualizationPayload = serde_json::from_str(r#"{"labels":["a"],"values":[]}"#).unwrap();
    assert_eq!(normalize(&raw).empty_reason(), Some(EmptyReason::NoSeries));
}
