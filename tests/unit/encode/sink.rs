use super::*;

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        label: "CONFIRMED".to_owned(),
        dates: vec![
            NaiveDate::from_ymd_opt(2020, 1, 22).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 23).unwrap(),
        ],
    }
}

fn solid(width: u32, height: u32) -> FrameRGBA {
    FrameRGBA {
        width,
        height,
        data: [10u8, 20, 30, 255].repeat((width * height) as usize),
        premultiplied: true,
    }
}

#[test]
fn frame_names_are_zero_padded() {
    assert_eq!(PngDirSink::file_name(FrameIndex(0)), "frame_000000.png");
    assert_eq!(PngDirSink::file_name(FrameIndex(123)), "frame_000123.png");
}

#[test]
fn png_dir_sink_writes_frames_and_reports_them_cached() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("frames").join("confirmed");
    let mut sink = PngDirSink::new(&out);

    sink.begin(cfg(4, 2)).unwrap();
    assert!(out.is_dir());
    assert!(!sink.contains(FrameIndex(0)));

    sink.push_frame(FrameIndex(0), &solid(4, 2)).unwrap();
    assert!(sink.contains(FrameIndex(0)));
    assert!(!sink.contains(FrameIndex(1)));
    sink.end().unwrap();

    let img = image::open(out.join("frame_000000.png")).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (4, 2));
    assert_eq!(img.get_pixel(3, 1).0, [10, 20, 30, 255]);
}

#[test]
fn png_dir_sink_writes_manifest_on_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = PngDirSink::new(dir.path());
    sink.begin(cfg(4, 2)).unwrap();
    sink.end().unwrap();

    let bytes = std::fs::read(dir.path().join(MANIFEST_FILE)).unwrap();
    let manifest: FrameManifest = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(manifest.label, "CONFIRMED");
    assert_eq!(manifest.frames.len(), 2);
    assert_eq!(manifest.frames[1].file, "frame_000001.png");
    assert_eq!(
        manifest.frames[1].date,
        NaiveDate::from_ymd_opt(2020, 1, 23).unwrap()
    );

    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("\"2020-01-22\""));
}

#[test]
fn png_dir_sink_enforces_order_and_size() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = PngDirSink::new(dir.path());
    assert!(sink.push_frame(FrameIndex(0), &solid(4, 2)).is_err());

    sink.begin(cfg(4, 2)).unwrap();
    sink.push_frame(FrameIndex(1), &solid(4, 2)).unwrap();
    assert!(sink.push_frame(FrameIndex(0), &solid(4, 2)).is_err());
    assert!(sink.push_frame(FrameIndex(2), &solid(2, 2)).is_err());
}

#[test]
fn png_dir_sink_rejects_empty_canvas() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = PngDirSink::new(dir.path());
    assert!(sink.begin(cfg(0, 2)).is_err());
}

#[test]
fn in_memory_sink_reports_preexisting_frames() {
    let mut sink = InMemorySink::with_existing([FrameIndex(1)]);
    sink.begin(cfg(4, 2)).unwrap();
    assert!(sink.contains(FrameIndex(1)));
    assert!(!sink.contains(FrameIndex(0)));
    sink.push_frame(FrameIndex(0), &solid(4, 2)).unwrap();
    assert_eq!(sink.frames().len(), 1);
    assert_eq!(sink.config().unwrap().label, "CONFIRMED");
}

#[test]
fn leftover_part_file_is_not_a_cached_frame() {
    let dir = tempfile::tempdir().unwrap();
    // Truncated encode from an interrupted run.
    std::fs::write(dir.path().join("frame_000000.png.part"), b"\x89PNG").unwrap();

    let mut sink = PngDirSink::new(dir.path());
    sink.begin(cfg(4, 2)).unwrap();
    assert!(!sink.contains(FrameIndex(0)));

    sink.push_frame(FrameIndex(0), &solid(4, 2)).unwrap();
    assert!(sink.contains(FrameIndex(0)));
    assert!(!dir.path().join("frame_000000.png.part").exists());
    let img = image::open(sink.frame_path(FrameIndex(0))).unwrap();
    assert_eq!((img.width(), img.height()), (4, 2));
}

#[test]
fn png_dir_sink_rejects_a_different_frame_size_than_earlier_runs() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = PngDirSink::new(dir.path());
    sink.begin(cfg(4, 2)).unwrap();
    sink.push_frame(FrameIndex(0), &solid(4, 2)).unwrap();
    sink.end().unwrap();

    let mut again = PngDirSink::new(dir.path());
    let err = again.begin(cfg(8, 2)).unwrap_err();
    assert!(err.to_string().contains("4x2"), "{err}");
    assert!(again.begin(cfg(4, 2)).is_ok());
}

#[test]
fn unreadable_manifest_does_not_block_a_run() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(MANIFEST_FILE), "{ not json").unwrap();
    let mut sink = PngDirSink::new(dir.path());
    assert!(sink.read_manifest().is_none());
    assert!(sink.begin(cfg(4, 2)).is_ok());
}
