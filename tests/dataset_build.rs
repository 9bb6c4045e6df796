use chatviz::dataset::{ChartDataset, PALETTE, ScatterPoint, SeriesVisibility, build};
use chatviz::models::{Series, VisualizationPayload};
use chatviz::normalize::{NormalizedTable, normalize};
use chatviz::viz::ChartKind;

fn table(series: &[(&str, &[f64])]) -> NormalizedTable {
    let len = series.iter().map(|(_, d)| d.len()).max().unwrap_or(0);
    normalize(&VisualizationPayload::new(
        (0..len).map(|i| format!("r{i}")).collect(),
        series
            .iter()
            .map(|(l, d)| Series::new(*l, d.to_vec()))
            .collect(),
    ))
}

fn series_colors(ds: &ChartDataset) -> Vec<(String, String)> {
    match ds {
        ChartDataset::Series { datasets, .. } => datasets
            .iter()
            .map(|d| (d.label.clone(), d.background_color.clone()))
            .collect(),
        other => panic!("expected series datasets, got {other:?}"),
    }
}

#[test]
fn colors_follow_position_after_filtering() {
    let t = table(&[("A", &[1.0]), ("B", &[2.0]), ("C", &[3.0])]);
    let mut vis = SeriesVisibility::all_visible(t.series());

    let all = series_colors(&build(&t, &vis, ChartKind::Bar));
    assert_eq!(all[1], ("B".to_string(), PALETTE[1].to_string()));

    vis.toggle("A");
    let shifted = series_colors(&build(&t, &vis, ChartKind::Bar));
    assert_eq!(
        shifted,
        vec![
            ("B".to_string(), PALETTE[0].to_string()),
            ("C".to_string(), PALETTE[1].to_string()),
        ]
    );
}

#[test]
fn palette_wraps_after_ten_series() {
    let data = [1.0];
    let names: Vec<String> = (0..12).map(|i| format!("S{i}")).collect();
    let spec: Vec<(&str, &[f64])> = names.iter().map(|n| (n.as_str(), &data[..])).collect();
    let t = table(&spec);
    let colors = series_colors(&build(&t, &SeriesVisibility::all_visible(t.series()), ChartKind::Line));
    assert_eq!(colors[10].1, PALETTE[0]);
    assert_eq!(colors[11].1, PALETTE[1]);
}

#[test]
fn pie_uses_first_visible_series_and_per_label_colors() {
    let t = table(&[("A", &[1.0, 2.0, 3.0]), ("B", &[4.0, 5.0, 6.0])]);
    let mut vis = SeriesVisibility::all_visible(t.series());
    vis.toggle("A");
    let ChartDataset::Pie { labels, dataset: Some(ds) } = build(&t, &vis, ChartKind::Pie) else {
        panic!("expected pie dataset");
    };
    assert_eq!(labels.len(), 3);
    assert_eq!(ds.label, "B");
    assert_eq!(ds.data, vec![4.0, 5.0, 6.0]);
    assert_eq!(ds.background_color, PALETTE[..3].to_vec());
}

#[test]
fn pie_with_nothing_visible_is_empty() {
    let t = table(&[("A", &[1.0, 2.0])]);
    let mut vis = SeriesVisibility::all_visible(t.series());
    vis.toggle("A");
    let ds = build(&t, &vis, ChartKind::Pie);
    assert_eq!(
        ds,
        ChartDataset::Pie {
            labels: Vec::new(),
            dataset: None
        }
    );
    assert_eq!(ds.dataset_count(), 0);
}

#[test]
fn scatter_pairs_first_two_series() {
    let raw = VisualizationPayload::new(
        vec!["a".into(), "b".into(), "c".into()],
        vec![
            Series::new("A", vec![1.0, 2.0, 3.0]),
            Series::new("B", vec![10.0, 20.0]),
        ],
    );
    let t = normalize(&raw);
    let ChartDataset::Scatter { dataset: Some(ds) } =
        build(&t, &SeriesVisibility::all_visible(t.series()), ChartKind::Scatter)
    else {
        panic!("expected scatter dataset");
    };
    assert_eq!(ds.label, "A vs B");
    assert_eq!(ds.background_color, PALETTE[0]);
    assert_eq!(
        ds.data,
        vec![
            ScatterPoint { x: 1.0, y: 10.0 },
            ScatterPoint { x: 2.0, y: 20.0 },
            ScatterPoint { x: 3.0, y: 0.0 },
        ]
    );
}

#[test]
fn scatter_single_series_plots_against_index() {
    let t = table(&[("A", &[5.0, 7.0]), ("B", &[1.0, 1.0])]);
    let mut vis = SeriesVisibility::all_visible(t.series());
    vis.toggle("A");
    let ChartDataset::Scatter { dataset: Some(ds) } = build(&t, &vis, ChartKind::Scatter) else {
        panic!("expected scatter dataset");
    };
    assert_eq!(ds.label, "B");
    assert_eq!(ds.data[1], ScatterPoint { x: 1.0, y: 1.0 });
    assert_eq!(ds.background_color, PALETTE[0]);

    vis.toggle("B");
    assert_eq!(
        build(&t, &vis, ChartKind::Scatter),
        ChartDataset::Scatter { dataset: None }
    );
}

#[test]
fn empty_table_builds_no_data_for_every_kind() {
    let t = normalize(&VisualizationPayload::default());
    for kind in ChartKind::ALL {
        let ds = build(&t, &SeriesVisibility::default(), kind);
        assert!(matches!(ds, ChartDataset::NoData { .. }), "{kind}");
    }
}
