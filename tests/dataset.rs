//! Duration and dataset table tests.

use std::fs;
use std::path::Path;

use aspectscan::{AspectError, AspectRatio, Dataset, QualificationCriteria, RatioPair};

const DURATION_TABLE: &str = "\
video,class,duration,subset,label,youtube_id
v_Bowling_b.mp4,Bowling,2.01,training,1.0,b
v_Archery_a.mp4,Archery,2.0,training,1,a
v_Archery_c.mp4,Archery,1.99,training,1,c
v_Archery_d.mp4,Archery,3.0,training,1,d
v_Archery_e.mp4,Archery,2.0,validation,1,e
v_Archery_f.mp4,Archery,2.0,training,0,f
v_Archery_g.mp4,Archery,,training,1,g
v_Bowling_h.mp4,Bowling,2.0,training,-1,h
v_Bowling_i.mp4,Bowling,1.95,training,1,i
";

fn write_table(directory: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = directory.join(name);
    fs::write(&path, contents).expect("Failed to write table");
    path
}

#[test]
fn qualifying_rows_are_kept_sorted_by_class() {
    let directory = tempfile::tempdir().unwrap();
    let path = write_table(directory.path(), "duration.csv", DURATION_TABLE);

    let dataset = Dataset::load_qualified(&path, &QualificationCriteria::default()).unwrap();
    let videos: Vec<&str> = dataset.records().iter().map(|r| r.video.as_str()).collect();
    assert_eq!(
        videos,
        ["v_Archery_a.mp4", "v_Archery_c.mp4", "v_Bowling_b.mp4"]
    );
    assert_eq!(dataset.extra_columns(), ["youtube_id"]);
    assert!(
        dataset
            .records()
            .iter()
            .all(|record| record.label == 1 && record.ratios == RatioPair::UNSET)
    );
    assert_eq!(dataset.records()[2].extra, ["b"]);
}

#[test]
fn custom_criteria_change_the_selection() {
    let directory = tempfile::tempdir().unwrap();
    let path = write_table(directory.path(), "duration.csv", DURATION_TABLE);

    let criteria = QualificationCriteria::default()
        .with_subset("validation")
        .with_duration_window(1.0, 2.5);
    let dataset = Dataset::load_qualified(&path, &criteria).unwrap();
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.records()[0].video, "v_Archery_e.mp4");
}

#[test]
fn written_table_has_dataset_columns_first() {
    let directory = tempfile::tempdir().unwrap();
    let path = write_table(directory.path(), "duration.csv", DURATION_TABLE);
    let output = directory.path().join("dataset.csv");

    let mut dataset = Dataset::load_qualified(&path, &QualificationCriteria::default()).unwrap();
    dataset.update_ratios(
        "v_Archery_a.mp4",
        RatioPair {
            frame_ratio: AspectRatio::from_dimensions(1920, 1080).unwrap(),
            crop_ratio: AspectRatio::from_dimensions(1440, 1080).unwrap(),
        },
    );
    dataset.write(&output).unwrap();

    let contents = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        [
            "video,class,duration,label,frame_ratio,crop_ratio,youtube_id",
            "v_Archery_a.mp4,Archery,2,1,1.78,1.33,a",
            "v_Archery_c.mp4,Archery,1.99,1,0.00,0.00,c",
            "v_Bowling_b.mp4,Bowling,2.01,1,0.00,0.00,b",
        ]
    );

    let reread = Dataset::read(&output).unwrap();
    assert_eq!(reread, dataset);
}

#[test]
fn update_ratios_touches_every_matching_row() {
    let directory = tempfile::tempdir().unwrap();
    let path = write_table(
        directory.path(),
        "dataset.csv",
        "video,class,duration,label,frame_ratio,crop_ratio\n\
         v_Archery_a.mp4,Archery,2.0,1,0,0\n\
         v_Archery_a.mp4,Archery,2.0,1,0,0\n\
         v_Archery_b.mp4,Archery,2.0,1,1.78,1.78\n",
    );

    let mut dataset = Dataset::read(&path).unwrap();
    let pair = RatioPair {
        frame_ratio: AspectRatio::from_f64(1.33),
        crop_ratio: AspectRatio::from_f64(1.33),
    };
    assert_eq!(dataset.update_ratios("v_Archery_a.mp4", pair), 2);
    assert_eq!(dataset.update_ratios("v_Missing_z.mp4", pair), 0);
    assert_eq!(dataset.records()[2].ratios.frame_ratio.to_string(), "1.78");
}

#[test]
fn missing_column_is_reported() {
    let directory = tempfile::tempdir().unwrap();
    let path = write_table(
        directory.path(),
        "duration.csv",
        "video,class,duration,label\nv_Archery_a.mp4,Archery,2.0,1\n",
    );

    match Dataset::load_qualified(&path, &QualificationCriteria::default()) {
        Err(AspectError::MissingColumn { column, .. }) => assert_eq!(column, "subset"),
        other => panic!("Expected MissingColumn, got {other:?}"),
    }
}

#[test]
fn non_numeric_duration_is_reported() {
    let directory = tempfile::tempdir().unwrap();
    let path = write_table(
        directory.path(),
        "duration.csv",
        "video,class,duration,subset,label\nv_Archery_a.mp4,Archery,two,training,1\n",
    );

    match Dataset::load_qualified(&path, &QualificationCriteria::default()) {
        Err(AspectError::InvalidField { row, column, value }) => {
            assert_eq!((row, column.as_str(), value.as_str()), (1, "duration", "two"));
        }
        other => panic!("Expected InvalidField, got {other:?}"),
    }
}

#[test]
fn label_of_skipped_row_is_not_parsed() {
    let directory = tempfile::tempdir().unwrap();
    let path = write_table(
        directory.path(),
        "duration.csv",
        "video,class,duration,subset,label\n\
         v_Archery_a.mp4,Archery,5.0,training,n/a\n\
         v_Archery_b.mp4,Archery,2.0,training,1\n",
    );

    let dataset = Dataset::load_qualified(&path, &QualificationCriteria::default()).unwrap();
    assert_eq!(dataset.len(), 1);
}
