//! Filter stage and histogram tests.

use std::fs;

use aspectscan::{
    AspectError, AspectRatio, Dataset, FilterOptions, PipelineConfig, RatioPair, RatioWindow,
    VideoRecord, filter_dataset, run_filter,
};

fn record(video: &str, frame_ratio: f64, crop_ratio: f64) -> VideoRecord {
    VideoRecord {
        video: video.to_string(),
        class: video.split('_').nth(1).unwrap_or_default().to_string(),
        duration: 2.0,
        label: 1,
        ratios: RatioPair {
            frame_ratio: AspectRatio::from_f64(frame_ratio),
            crop_ratio: AspectRatio::from_f64(crop_ratio),
        },
        extra: Vec::new(),
    }
}

fn selected_videos(dataset: &Dataset) -> Vec<&str> {
    dataset.records().iter().map(|r| r.video.as_str()).collect()
}

#[test]
fn bordered_videos_are_excluded() {
    let dataset = Dataset::from_records(
        Vec::new(),
        vec![
            record("v_Archery_a.mp4", 1.78, 1.78),
            record("v_Archery_b.mp4", 1.78, 1.50),
            record("v_Bowling_c.mp4", 1.78, 1.78),
        ],
    );

    let outcome = filter_dataset(&dataset).unwrap();
    assert_eq!(
        selected_videos(&outcome.selected),
        ["v_Archery_a.mp4", "v_Bowling_c.mp4"]
    );
    assert_eq!(outcome.mismatched, 1);
    assert_eq!(outcome.outliers, 0);
}

#[test]
fn single_row_window_is_inclusive() {
    let dataset = Dataset::from_records(Vec::new(), vec![record("v_Archery_a.mp4", 1.78, 1.78)]);

    let outcome = filter_dataset(&dataset).unwrap();
    assert_eq!(outcome.window.std_dev, 0.0);
    assert_eq!(outcome.window.lower, outcome.window.upper);
    assert_eq!(outcome.selected.len(), 1);
}

#[test]
fn frame_ratio_outliers_are_excluded() {
    let mut records: Vec<VideoRecord> = (0..20)
        .map(|index| record(&format!("v_Archery_{index}.mp4"), 1.78, 1.78))
        .collect();
    records.push(record("v_Bowling_portrait.mp4", 0.56, 0.56));
    let dataset = Dataset::from_records(Vec::new(), records);

    let outcome = filter_dataset(&dataset).unwrap();
    assert_eq!(outcome.outliers, 1);
    assert_eq!(outcome.selected.len(), 20);
    assert!(
        outcome
            .selected
            .records()
            .iter()
            .all(|record| record.video != "v_Bowling_portrait.mp4")
    );
}

#[test]
fn window_uses_sample_standard_deviation() {
    let window = RatioWindow::from_values(&[1.0, 2.0, 3.0]).unwrap();
    assert!((window.mean - 2.0).abs() < 1e-12);
    assert!((window.std_dev - 1.0).abs() < 1e-12);
    assert!((window.lower + 1.0).abs() < 1e-12);
    assert!((window.upper - 5.0).abs() < 1e-12);
    assert!(window.contains(5.0));
    assert!(!window.contains(5.01));
}

#[test]
fn empty_dataset_is_an_error() {
    assert!(matches!(
        filter_dataset(&Dataset::default()),
        Err(AspectError::EmptyDataset)
    ));
}

#[test]
fn run_filter_writes_table_and_histograms() {
    let directory = tempfile::tempdir().unwrap();
    fs::write(
        directory.path().join("dataset.csv"),
        "video,class,duration,label,frame_ratio,crop_ratio,youtube_id\n\
         v_Archery_a.mp4,Archery,2.0,1,1.78,1.78,a\n\
         v_Archery_b.mp4,Archery,2.0,1,1.78,1.33,b\n\
         v_Bowling_c.mp4,Bowling,2.01,1,1.78,1.78,c\n",
    )
    .unwrap();
    let config = PipelineConfig::new(directory.path().join("videos"), directory.path());
    let plots = directory.path().join("plots");
    let options = FilterOptions {
        bins: 4,
        histogram_dir: Some(plots.clone()),
        ..FilterOptions::default()
    };

    let report = run_filter(&config, &options).unwrap();
    assert_eq!(report.output, config.filtered_path());
    assert_eq!(report.frame_histogram.total(), 3);
    assert_eq!(report.crop_histogram.counts.len(), 4);
    assert!(plots.join("frame_ratio_hist.png").exists());
    assert!(plots.join("crop_ratio_hist.png").exists());

    let contents = fs::read_to_string(config.filtered_path()).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        [
            "video,class,duration,label,frame_ratio,crop_ratio,youtube_id",
            "v_Archery_a.mp4,Archery,2,1,1.78,1.78,a",
            "v_Bowling_c.mp4,Bowling,2.01,1,1.78,1.78,c",
        ]
    );
}

#[test]
fn run_filter_rejects_zero_bins() {
    let directory = tempfile::tempdir().unwrap();
    fs::write(
        directory.path().join("dataset.csv"),
        "video,class,duration,label,frame_ratio,crop_ratio\n\
         v_Archery_a.mp4,Archery,2.0,1,1.78,1.78\n",
    )
    .unwrap();
    let config = PipelineConfig::new(directory.path(), directory.path());
    let options = FilterOptions {
        bins: 0,
        ..FilterOptions::default()
    };

    assert!(matches!(
        run_filter(&config, &options),
        Err(AspectError::InvalidBinCount)
    ));
    assert!(!config.filtered_path().exists());
}
