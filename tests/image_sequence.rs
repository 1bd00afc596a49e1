use block_motion::{
    FrameSource, ImageSequenceSink, ImageSequenceSource, MotionConfig, MotionPipeline, PipelineState,
};
use image::{Rgb, RgbImage};

fn gradient(width: u32, height: u32, shift: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let v = ((x + shift) * 13 + y * 7) % 200;
        Rgb([v as u8 + 20, (v as u8).wrapping_mul(3), 255 - v as u8])
    })
}

#[test]
fn directory_round_trip_writes_numbered_tiffs() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    for (n, shift) in [(0, 0), (1, 1), (2, 2)] {
        gradient(25, 20, shift)
            .save(input.path().join(format!("frame{n}.png")))
            .expect("Error Saving File.");
    }

    let mut source = ImageSequenceSource::open(input.path()).expect("open frames");
    assert_eq!(source.frame_count(), Some(3));

    let mut sink = ImageSequenceSink::create(output.path().join("motionDetected")).expect("create sink");
    let mut pipeline = MotionPipeline::new(MotionConfig::default()).expect("valid config");
    let summary = pipeline.run(&mut source, &mut sink).expect("run");

    assert_eq!(summary.frames_read, 3);
    assert_eq!(summary.frames_emitted, 2);
    assert_eq!(pipeline.state(), PipelineState::HasPreviousFrame);

    for index in 1..=2 {
        let written = image::open(sink.frame_path(index)).expect("annotated frame").to_rgb8();
        assert_eq!(written.dimensions(), (25, 20));
    }
    assert!(!sink.frame_path(0).exists());
    assert!(!sink.frame_path(3).exists());
}

#[test]
fn existing_output_directory_is_reused() {
    let output = tempfile::tempdir().expect("output dir");
    let stale = output.path().join("frame1.tif");
    std::fs::write(&stale, b"stale").expect("write stale file");

    let mut sink = ImageSequenceSink::create(output.path()).expect("reuse sink");
    let mut pipeline = MotionPipeline::new(MotionConfig::default()).expect("valid config");
    for frame in [gradient(15, 15, 0), gradient(15, 15, 0)] {
        if let Some(annotated) = pipeline.process_frame(&frame).expect("process") {
            block_motion::FrameSink::write_frame(&mut sink, &annotated).expect("write");
        }
    }

    let written = image::open(&stale).expect("overwritten frame").to_rgb8();
    assert_eq!(written.dimensions(), (15, 15));
}

#[test]
fn unreadable_frame_reports_its_index() {
    let input = tempfile::tempdir().expect("input dir");
    gradient(10, 10, 0).save(input.path().join("frame0.png")).expect("Error Saving File.");
    std::fs::write(input.path().join("frame1.png"), b"not a png").expect("write junk");

    let mut source = ImageSequenceSource::open(input.path()).expect("open frames");
    assert!(source.next_frame().expect("first frame").is_some());
    match source.next_frame() {
        Err(block_motion::MotionError::FrameRead { frame, .. }) => assert_eq!(frame, 1),
        other => panic!("expected a frame read error, got {other:?}"),
    }
}
