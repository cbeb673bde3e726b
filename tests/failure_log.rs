//! Failure log writing and parsing tests.

use std::fs;

use aspectscan::{
    AspectError,
    failure_log::{FailedVideo, FailureLogWriter, read_failed_videos},
};

fn failed(video: &str, class: &str) -> FailedVideo {
    FailedVideo {
        video: video.to_string(),
        class: class.to_string(),
    }
}

#[test]
fn entries_append_across_writers() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("frame_ratio.txt");

    {
        let mut writer = FailureLogWriter::open(&path).unwrap();
        writer.record("v_Archery_a.mp4", &"decoder exploded").unwrap();
    }
    {
        let mut writer = FailureLogWriter::open(&path).unwrap();
        writer
            .record(
                "v_Bowling_b.mp4",
                &AspectError::NoValidFrame {
                    path: "/data/Bowling/v_Bowling_b.mp4".into(),
                    frames_tried: 50,
                },
            )
            .unwrap();
    }

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Error processing v_Archery_a.mp4:decoder exploded");
    assert!(lines[1].starts_with("Error processing v_Bowling_b.mp4:No valid frame found"));

    let entries = read_failed_videos(&path).unwrap();
    assert_eq!(
        entries,
        [
            failed("v_Archery_a.mp4", "Archery"),
            failed("v_Bowling_b.mp4", "Bowling"),
        ]
    );
}

#[test]
fn repeated_entries_are_read_once_in_first_seen_order() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("frame_ratio.txt");
    fs::write(
        &path,
        "Error processing v_Bowling_b.mp4:first run\n\
         \n\
         Error processing v_Archery_a.mp4:first run\n\
         Error processing v_Bowling_b.mp4:second run\n",
    )
    .unwrap();

    let entries = read_failed_videos(&path).unwrap();
    assert_eq!(
        entries,
        [
            failed("v_Bowling_b.mp4", "Bowling"),
            failed("v_Archery_a.mp4", "Archery"),
        ]
    );
}

#[test]
fn missing_log_means_nothing_failed() {
    let directory = tempfile::tempdir().unwrap();
    let entries = read_failed_videos(directory.path().join("absent.txt")).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn malformed_line_reports_its_number() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("frame_ratio.txt");
    fs::write(
        &path,
        "Error processing v_Archery_a.mp4:boom\nsomething unrelated\n",
    )
    .unwrap();

    match read_failed_videos(&path) {
        Err(AspectError::MalformedFailureEntry { line_number, line }) => {
            assert_eq!(line_number, 2);
            assert_eq!(line, "something unrelated");
        }
        other => panic!("Expected MalformedFailureEntry, got {other:?}"),
    }
}
