use serde_json::Value;
use std::path::{Path, PathBuf};
use vtsdk::{
    load_rgba_image, save_png, CompareRequest, Engine, EngineConfig, Envelope, ErrorKind,
    LocateRequest, Metadata, OwnedImage, SearchRequest,
};

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn png(&self, name: &str, img: &OwnedImage) -> PathBuf {
        let path = self.path(name);
        save_png(img, &path).unwrap();
        path
    }

    fn artifacts(&self) -> PathBuf {
        self.path("artifacts")
    }

    fn engine(&self) -> Engine {
        Engine::new(EngineConfig::default().with_artifact_dir(self.artifacts()))
    }
}

fn gradient(width: usize, height: usize) -> OwnedImage {
    OwnedImage::from_fn(width, height, |x, y| {
        [(x * 7) as u8, (y * 5) as u8, ((x + y) * 3) as u8, 255]
    })
    .unwrap()
}

fn to_value<E: Envelope>(envelope: &E) -> Value {
    serde_json::from_str(&envelope.to_json()).unwrap()
}

fn artifact_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
}

#[test]
fn compare_writes_artifact_and_echoes_metadata() {
    let fx = Fixture::new();
    let base = gradient(32, 24);
    let cand = OwnedImage::from_fn(32, 24, |x, y| {
        if x < 4 {
            [0, 0, 0, 255]
        } else {
            base.pixel(x, y).unwrap()
        }
    })
    .unwrap();
    let base_path = fx.png("base.png", &base);
    let cand_path = fx.png("cand.png", &cand);

    let req = CompareRequest::parse(
        base_path.to_str().unwrap(),
        cand_path.to_str().unwrap(),
        95,
        10,
        Some(r#"[{"topLeftX": 0, "topLeftY": 0, "bottomRightX": 1, "bottomRightY": 23}]"#),
        Some(r#"{"testName": "gradient", "nested": {"build": 4}}"#),
    )
    .unwrap();
    let value = to_value(&fx.engine().compare_envelope(&req));

    assert!(value["error"].is_null(), "{value}");
    assert_eq!(value["totalPixelCount"], 32 * 24);
    assert_eq!(value["metadata"]["testName"], "gradient");
    assert_eq!(value["metadata"]["nested"]["build"], 4);
    let diff = value["diffPixelCount"].as_u64().unwrap();
    assert!(diff > 0 && diff <= 2 * 24);
    assert_eq!(value["passed"], false);
    let similarity = value["obtainedSimilarity"].as_f64().unwrap();
    assert_eq!(similarity, (similarity * 100.0).round() / 100.0);

    let artifact = PathBuf::from(value["resultImageRef"].as_str().unwrap());
    assert!(artifact.starts_with(fx.artifacts()));
    let name = artifact.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("vt_diff_") && name.ends_with(".png"));
    let rendered = load_rgba_image(&artifact).unwrap();
    assert_eq!((rendered.width(), rendered.height()), (32, 24));
    assert_eq!(rendered.pixel(3, 0), Some([255, 0, 0, 255]));
}

#[test]
fn every_comparison_gets_its_own_artifact() {
    let fx = Fixture::new();
    let path = fx.png("same.png", &gradient(8, 8));
    let req = CompareRequest::parse(
        path.to_str().unwrap(),
        path.to_str().unwrap(),
        100,
        0,
        None,
        None,
    )
    .unwrap();
    let engine = fx.engine();
    let first = engine.compare(&req).unwrap();
    let second = engine.compare(&req).unwrap();
    assert!(first.passed);
    assert_ne!(first.result_image_ref, second.result_image_ref);
    assert_eq!(artifact_count(&fx.artifacts()), 2);
}

#[test]
fn concurrent_comparisons_agree_and_keep_separate_artifacts() {
    const THREADS: usize = 8;
    let fx = Fixture::new();
    let base = gradient(40, 30);
    let cand = OwnedImage::from_fn(40, 30, |x, y| {
        if (10..20).contains(&x) && y < 5 {
            [255, 255, 255, 255]
        } else {
            base.pixel(x, y).unwrap()
        }
    })
    .unwrap();
    let base_path = fx.png("base.png", &base);
    let cand_path = fx.png("cand.png", &cand);
    let req = CompareRequest::parse(
        base_path.to_str().unwrap(),
        cand_path.to_str().unwrap(),
        90,
        5,
        None,
        Some(r#"{"run": "parallel"}"#),
    )
    .unwrap();
    let engine = fx.engine();

    let mut values: Vec<Value> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| scope.spawn(|| to_value(&engine.compare_envelope(&req))))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut refs: Vec<String> = values
        .iter_mut()
        .map(|value| {
            assert!(value["error"].is_null(), "{value}");
            let path = value["resultImageRef"].as_str().unwrap().to_owned();
            assert!(Path::new(&path).is_file());
            value["resultImageRef"] = Value::Null;
            path
        })
        .collect();
    refs.sort();
    refs.dedup();
    assert_eq!(refs.len(), THREADS);
    assert_eq!(artifact_count(&fx.artifacts()), THREADS);

    assert!(values[0]["diffPixelCount"].as_u64().unwrap() > 0);
    for value in &values[1..] {
        assert_eq!(value, &values[0]);
    }
}

#[test]
fn dimension_mismatch_has_no_artifact() {
    let fx = Fixture::new();
    let big = fx.png("big.png", &OwnedImage::filled(200, 200, [255; 4]).unwrap());
    let small = fx.png("small.png", &OwnedImage::filled(100, 100, [255; 4]).unwrap());
    let req = CompareRequest::parse(
        big.to_str().unwrap(),
        small.to_str().unwrap(),
        95,
        20,
        None,
        Some(r#"{"testName": "mismatch"}"#),
    )
    .unwrap();
    let value = to_value(&fx.engine().compare_envelope(&req));
    assert_eq!(value["error"]["kind"], "DimensionMismatch");
    assert!(value["resultImageRef"].is_null());
    assert_eq!(value["passed"], false);
    assert_eq!(value["metadata"]["testName"], "mismatch");
    assert_eq!(artifact_count(&fx.artifacts()), 0);
}

#[test]
fn loader_errors_map_to_kinds() {
    let fx = Fixture::new();
    let good = fx.png("good.png", &gradient(4, 4));
    let garbage = fx.path("garbage.png");
    std::fs::write(&garbage, b"definitely not an image").unwrap();

    let cases = [
        (fx.path("missing.png"), ErrorKind::InvalidPath),
        (fx.dir.path().to_path_buf(), ErrorKind::InvalidPath),
        (PathBuf::new(), ErrorKind::InvalidPath),
        (garbage, ErrorKind::UnsupportedFormat),
    ];
    let engine = fx.engine();
    for (path, kind) in cases {
        let req = SearchRequest {
            parent_path: good.clone(),
            child_path: path.clone(),
            metadata: Metadata::new(),
        };
        let envelope = engine.search_envelope(&req);
        assert_eq!(envelope.error().map(|e| e.kind), Some(kind), "{path:?}");
        assert!(!envelope.result.found);
    }
}

#[test]
fn bad_parameters_are_reported_in_envelopes() {
    let err = CompareRequest::parse(
        "a.png",
        "b.png",
        95,
        20,
        Some(r#"[{"topLeftX": 9, "topLeftY": 0, "bottomRightX": 2, "bottomRightY": 5}]"#),
        None,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRegion);

    let err = CompareRequest::parse("a.png", "b.png", 95, 20, Some("{"), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);

    let fx = Fixture::new();
    let path = fx.png("img.png", &gradient(4, 4));
    for (min, noise) in [(-1, 20), (101, 20), (95, -1), (95, 256)] {
        let req = CompareRequest::parse(
            path.to_str().unwrap(),
            path.to_str().unwrap(),
            min,
            noise,
            None,
            None,
        )
        .unwrap();
        let value = to_value(&fx.engine().compare_envelope(&req));
        assert_eq!(value["error"]["kind"], "InvalidParameter", "{min} {noise}");
    }
}

#[test]
fn search_and_locate_envelopes_from_files() {
    let fx = Fixture::new();
    let screen = gradient(48, 40);
    let screen_path = fx.png("screen.png", &screen);
    let button = fx.png("button.png", &screen.crop(30, 2, 9, 6).unwrap());
    let label = fx.png("label.png", &screen.crop(3, 25, 10, 8).unwrap());
    let meta: Metadata = serde_json::from_str(r#"{"step": "checkout"}"#).unwrap();

    let engine = fx.engine();
    let found = to_value(&engine.search_envelope(&SearchRequest {
        parent_path: screen_path.clone(),
        child_path: button.clone(),
        metadata: meta.clone(),
    }));
    assert_eq!(found["found"], true);
    assert_eq!(found["confidence"], 100.0);
    assert_eq!(found["boundingBox"]["topLeftX"], 30);
    assert_eq!(found["boundingBox"]["topLeftY"], 2);
    assert_eq!(found["boundingBox"]["bottomRightX"], 38);
    assert_eq!(found["boundingBox"]["bottomRightY"], 7);
    assert_eq!(found["metadata"]["step"], "checkout");

    let located = to_value(&engine.locate_envelope(&LocateRequest {
        container_path: screen_path,
        main_path: button,
        relative_path: label,
        metadata: meta,
    }));
    assert!(located["error"].is_null(), "{located}");
    assert_eq!(located["mainMatch"]["found"], true);
    assert_eq!(located["relativeMatch"]["boundingBox"]["topLeftX"], 3);
    assert_eq!(located["relativeOffset"]["dx"], -27);
    assert_eq!(located["relativeOffset"]["dy"], 23);
    assert_eq!(located["relativePosition"], "BOTTOM_LEFT");
}
