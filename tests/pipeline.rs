use std::io::Cursor;
use std::ops::Range;
use std::time::Duration;

use idcards::layout::{
    BadgePlacement, CardLayout, DEFAULT_AADHAAR, DEFAULT_BUS_HALT, DEFAULT_PAN, ELLIPSIS, Field,
};
use idcards::logging::{LogOutput, init_logging_to};
use idcards::{
    AppConfig, AppContext, AssetError, AvatarSource, CAPTURE_SCALE, CaptureEngine, CaptureError,
    CardArena, CardVariant, Category, DownloadSink, ExportError, ExportState, ImageOrigin,
    LoadedImage, MemorySink, PhotoLoader, Record, RecordBody, RecordStore, VariantChoice,
};
use image::RgbaImage;
use pretty_assertions::assert_eq;
use serde_json::json;

/// Serves local tiles, except for one photo hosted without CORS headers.
struct TaintingLoader {
    tainted: &'static str,
}

impl PhotoLoader for TaintingLoader {
    fn load(&self, uri: &str) -> Result<LoadedImage, AssetError> {
        let origin = if uri == self.tainted {
            ImageOrigin::CrossOrigin {
                cors_permitted: false,
            }
        } else {
            ImageOrigin::Local
        };
        Ok(LoadedImage {
            pixels: RgbaImage::from_pixel(40, 48, image::Rgba([90, 120, 160, 255])),
            origin,
        })
    }
}

/// Records when each file arrives, on the tokio clock.
#[derive(Default)]
struct TimedSink {
    arrivals: Vec<(String, tokio::time::Instant)>,
}

impl DownloadSink for TimedSink {
    fn deliver(&mut self, filename: &str, _bytes: &[u8]) -> std::io::Result<()> {
        self.arrivals
            .push((filename.to_string(), tokio::time::Instant::now()));
        Ok(())
    }
}

/// Accepts `accept` files, then reports a full disk.
struct FullDisk {
    accept: usize,
}

impl DownloadSink for FullDisk {
    fn deliver(&mut self, _filename: &str, _bytes: &[u8]) -> std::io::Result<()> {
        if self.accept == 0 {
            return Err(std::io::Error::other("no space left on device"));
        }
        self.accept -= 1;
        Ok(())
    }
}

fn context() -> AppContext {
    let mut config = AppConfig::default();
    config.export.pacing_ms = 0;
    init_logging_to(&config.logging, LogOutput::TestHarness);
    AppContext::new(config)
}

fn student(roll: &str, name: &str, photo: &str) -> RecordBody {
    serde_json::from_value(json!({
        "category": "student",
        "rollNumber": roll,
        "name": name,
        "department": "CSE",
        "year": "2nd Year",
        "photo": photo,
    }))
    .unwrap()
}

fn faculty(extra: serde_json::Value) -> Record {
    let mut body = json!({
        "category": "faculty",
        "facultyId": "FAC042",
        "name": "Dr. K. Srinivas",
        "department": "MECH",
        "designation": "Associate Professor",
    });
    if let (Some(base), Some(more)) = (body.as_object_mut(), extra.as_object()) {
        base.extend(more.clone());
    }
    let mut store = RecordStore::new();
    store
        .insert_one(serde_json::from_value(body).unwrap())
        .clone()
}

fn resolve(ctx: &AppContext, record: &Record) -> CardLayout {
    ctx.layout_resolver()
        .resolve(record, CardVariant::for_record(&record.body), ctx.theme)
        .unwrap()
}

/// Pixels noticeably darker than the white card body inside a device-pixel box.
fn dark_pixels(bitmap: &image::RgbImage, xs: Range<u32>, ys: Range<u32>) -> usize {
    ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
        .filter(|&(x, y)| {
            let [r, g, b] = bitmap.get_pixel(x, y).0;
            (r as u32 + g as u32 + b as u32) < 600
        })
        .count()
}

fn five_students() -> RecordStore {
    let mut store = RecordStore::new();
    store.insert_many((1..=5).map(|n| {
        let photo = format!("https://photos.example/{n}.jpg");
        student(&format!("21A9{n}"), &format!("Student {n}"), &photo)
    }));
    store
}

#[test]
fn long_named_bus_student_without_photo_or_halt() {
    let name = "Venkata Satya Naga Sai Lakshmi Prasanna Kumari";
    assert_eq!(name.chars().count(), 46);
    let body: RecordBody = serde_json::from_value(json!({
        "category": "student",
        "rollNumber": "22B81A0412",
        "name": name,
        "department": "ECE",
        "year": "1st Year",
        "photo": "",
        "isBusStudent": true,
        "busHalt": "",
    }))
    .unwrap();
    let mut store = RecordStore::new();
    let record = store.insert_one(body).clone();

    let ctx = context();
    let layout = ctx
        .layout_resolver()
        .resolve(&record, CardVariant::for_record(&record.body), ctx.theme)
        .unwrap();

    assert_eq!(layout.variant, CardVariant::BusStudent);
    let name_block = layout.text_block(Field::Name).unwrap();
    assert_eq!(name_block.size, 10);
    assert_eq!(name_block.content.chars().count(), 40 + ELLIPSIS.len());
    assert!(name_block.content.ends_with(ELLIPSIS));
    assert_eq!(layout.text(Field::BusHalt), Some(DEFAULT_BUS_HALT));
    assert_eq!(
        layout.bus_badges(),
        vec![BadgePlacement::CornerRibbon, BadgePlacement::FooterBanner]
    );
    match layout.avatar() {
        Some(AvatarSource::Placeholder(url)) => {
            assert!(url.contains("name=Venkata%20Satya"));
            assert!(url.contains("size=256"));
        }
        other => panic!("expected placeholder, got {other:?}"),
    }
}

#[test]
fn capture_is_double_size_and_opaque() {
    let mut store = RecordStore::new();
    let record = store.insert_one(student("21A91A0501", "Ravi Teja", "")).clone();
    let mut ctx = context();
    ctx.theme = idcards::ThemeColor::parse("#1e3a8a80").unwrap();

    let mut arena = CardArena::new();
    let targets = ctx
        .prepare_cards(&[&record], &mut arena, &TaintingLoader { tainted: "" })
        .unwrap();
    let engine = CaptureEngine::new();
    assert_eq!(engine.scale(), CAPTURE_SCALE);
    let bitmap = engine.capture_handle(&arena, targets[0].handle).unwrap();

    assert_eq!((bitmap.width(), bitmap.height()), (700, 1100));
    // header band carries the flattened theme color, not transparency
    let header = bitmap.get_pixel(4, 4);
    assert_ne!(header.0, [0, 0, 0]);
    assert_ne!(header.0, [0xff, 0xff, 0xff]);
}

#[test]
fn variant_mismatch_is_reported() {
    let mut store = RecordStore::new();
    let record = store.insert_one(student("21A91A0501", "Ravi Teja", "")).clone();
    let mut ctx = context();
    ctx.variant = VariantChoice::Fixed(CardVariant::Faculty);
    let err = ctx
        .prepare_cards(&[&record], &mut CardArena::new(), &TaintingLoader { tainted: "" })
        .unwrap_err();
    assert!(matches!(err, idcards::IdCardError::VariantMismatch { .. }));
}

#[tokio::test]
async fn sequential_batch_skips_tainted_capture() {
    let store = five_students();
    let ctx = context();
    let loader = TaintingLoader {
        tainted: "https://photos.example/3.jpg",
    };
    let mut arena = CardArena::new();
    let targets = ctx.prepare_cards(&store.all(), &mut arena, &loader).unwrap();
    let mut sink = MemorySink::default();
    let mut orchestrator = ctx.orchestrator();

    let report = orchestrator
        .export_sequential(&mut arena, &targets, &mut sink)
        .await
        .unwrap();

    assert_eq!(report.processed, 5);
    assert_eq!(report.delivered.len(), 4);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].natural_key, "21A93");
    let names: Vec<&str> = sink.files.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "ID_Card_21A91.jpg",
            "ID_Card_21A92.jpg",
            "ID_Card_21A94.jpg",
            "ID_Card_21A95.jpg"
        ]
    );
    assert!(sink.files.iter().all(|(_, bytes)| bytes.starts_with(&[0xFF, 0xD8])));
    assert_eq!(orchestrator.state(), ExportState::Idle);
    assert_eq!(arena.live(), 0);
}

#[tokio::test]
async fn archive_aborts_on_tainted_capture() {
    let store = five_students();
    let ctx = context();
    let loader = TaintingLoader {
        tainted: "https://photos.example/3.jpg",
    };
    let mut arena = CardArena::new();
    let targets = ctx.prepare_cards(&store.all(), &mut arena, &loader).unwrap();
    let mut sink = MemorySink::default();
    let mut orchestrator = ctx.orchestrator();

    let err = orchestrator
        .export_archive(&mut arena, &targets, "ID_Cards.zip", &mut sink)
        .await
        .unwrap_err();

    match err {
        ExportError::Capture { key, source } => {
            assert_eq!(key, "21A93");
            assert!(matches!(source, CaptureError::Tainted { .. }));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(sink.files.is_empty());
    assert_eq!(orchestrator.state(), ExportState::Idle);
}

#[tokio::test]
async fn archive_entries_are_numbered_jpegs() {
    let store = five_students();
    let ctx = context();
    let mut arena = CardArena::new();
    let targets = ctx
        .prepare_cards(&store.all()[..3], &mut arena, &TaintingLoader { tainted: "" })
        .unwrap();
    let mut sink = MemorySink::default();

    let report = ctx
        .orchestrator()
        .export_archive(&mut arena, &targets, "ID_Cards.zip", &mut sink)
        .await
        .unwrap();

    assert_eq!(report.notice(), "Bundled 3 ID cards into ID_Cards.zip");
    assert_eq!(sink.files.len(), 1);
    let (filename, bytes) = &sink.files[0];
    assert_eq!(filename, "ID_Cards.zip");
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
    let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, vec!["ID_Card_1.jpeg", "ID_Card_2.jpeg", "ID_Card_3.jpeg"]);
    let entry = zip.by_name("ID_Card_2.jpeg").unwrap();
    assert!(entry.size() > 0);
}

#[tokio::test]
async fn single_export_names_file_after_roll_number() {
    let mut store = RecordStore::new();
    let record = store.insert_one(student("21A91A0501", "Ravi Teja", "")).clone();
    let ctx = context();
    let mut arena = CardArena::new();
    let targets = ctx
        .prepare_cards(&[&record], &mut arena, &TaintingLoader { tainted: "" })
        .unwrap();
    let mut sink = MemorySink::default();

    let report = ctx
        .orchestrator()
        .export_single(&mut arena, &targets[0], &mut sink)
        .await
        .unwrap();

    assert_eq!(report.filename, "ID_Card_21A91A0501.jpg");
    assert_eq!(sink.files[0].0, "ID_Card_21A91A0501.jpg");
    let decoded = image::load_from_memory(&sink.files[0].1).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (700, 1100));
}

#[test]
fn json_export_uses_category_filename() {
    let mut store = five_students();
    store.insert_one(
        serde_json::from_value(json!({
            "category": "faculty",
            "facultyId": "FAC042",
            "name": "Dr. K. Srinivas",
            "department": "MECH",
        }))
        .unwrap(),
    );
    let ctx = context();
    let mut sink = MemorySink::default();
    let faculty = store.by_category(Category::Faculty);

    let filename = ctx
        .orchestrator()
        .export_json(&faculty, Category::Faculty, &mut sink)
        .unwrap();

    assert_eq!(filename, "faculty-data.json");
    let saved: serde_json::Value = serde_json::from_slice(&sink.files[0].1).unwrap();
    assert_eq!(saved[0]["facultyId"], "FAC042");
    assert_eq!(saved[0]["category"], "faculty");
    assert_eq!(saved[0]["id"], 6);
}

#[tokio::test]
async fn stale_upscale_setting_does_not_change_capture_size() {
    let config: AppConfig = serde_json::from_value(json!({
        "export": { "upscale": 3, "pacing_ms": 0 }
    }))
    .unwrap();
    let ctx = AppContext::new(config);
    let mut store = RecordStore::new();
    let record = store.insert_one(student("21A91A0501", "Ravi Teja", "")).clone();
    let mut arena = CardArena::new();
    let targets = ctx
        .prepare_cards(&[&record], &mut arena, &TaintingLoader { tainted: "" })
        .unwrap();
    let mut sink = MemorySink::default();

    ctx.orchestrator()
        .export_single(&mut arena, &targets[0], &mut sink)
        .await
        .unwrap();

    let decoded = image::load_from_memory(&sink.files[0].1).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (700, 1100));
}

#[test]
fn faculty_card_fills_defaults_and_links_profile() {
    let record = faculty(json!({ "teluguName": "శ్రీనివాస్" }));
    let layout = resolve(&context(), &record);

    assert_eq!(layout.variant, CardVariant::Faculty);
    assert_eq!(layout.text(Field::PanNumber), Some(DEFAULT_PAN));
    assert_eq!(layout.text(Field::Aadhaar), Some(DEFAULT_AADHAAR));
    assert_eq!(DEFAULT_PAN, "Not Available");
    assert_eq!(layout.text(Field::LocalizedName), Some("శ్రీనివాస్"));
    let (symbol, visible) = layout.qr().unwrap();
    assert_eq!(symbol.payload, "https://www.git.ac.in/faculty/FAC042");
    assert!(visible);
}

#[test]
fn faculty_without_telugu_name_has_no_localized_line() {
    let layout = resolve(&context(), &faculty(json!({ "teluguName": "  " })));
    assert_eq!(layout.text(Field::LocalizedName), None);
    assert_eq!(layout.text(Field::NaturalKey), Some("FAC042"));
}

#[test]
fn student_qr_is_computed_but_hidden() {
    let mut store = RecordStore::new();
    let record = store.insert_one(student("21A91A0501", "Ravi Teja", "")).clone();
    let layout = resolve(&context(), &record);
    let (symbol, visible) = layout.qr().unwrap();
    assert_eq!(symbol.payload, "https://www.git.ac.in");
    assert!(!visible);
}

#[test]
fn telugu_name_leaves_ink_on_faculty_capture() {
    let record = faculty(json!({ "teluguName": "శ్రీనివాస్" }));
    let ctx = context();
    let mut arena = CardArena::new();
    let targets = ctx
        .prepare_cards(&[&record], &mut arena, &TaintingLoader { tainted: "" })
        .unwrap();
    let bitmap = CaptureEngine::new()
        .capture_handle(&arena, targets[0].handle)
        .unwrap();

    assert_eq!((bitmap.width(), bitmap.height()), (1100, 700));
    // localized line sits at (145, 114) 385x14 on the card
    assert!(dark_pixels(&bitmap, 290..1060, 228..256) > 50);
}

#[tokio::test(start_paused = true)]
async fn sequential_downloads_are_paced() {
    let store = five_students();
    let mut ctx = context();
    ctx.config.export.pacing_ms = 500;
    let mut arena = CardArena::new();
    let targets = ctx
        .prepare_cards(&store.all()[..3], &mut arena, &TaintingLoader { tainted: "" })
        .unwrap();
    let mut sink = TimedSink::default();
    let start = tokio::time::Instant::now();

    ctx.orchestrator()
        .export_sequential(&mut arena, &targets, &mut sink)
        .await
        .unwrap();

    let offsets: Vec<Duration> = sink.arrivals.iter().map(|(_, at)| *at - start).collect();
    assert_eq!(
        offsets,
        vec![
            Duration::ZERO,
            Duration::from_millis(500),
            Duration::from_millis(1000)
        ]
    );
    // no pause after the last card
    assert_eq!(start.elapsed(), Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn skipped_card_adds_no_pause() {
    let store = five_students();
    let mut ctx = context();
    ctx.config.export.pacing_ms = 500;
    let loader = TaintingLoader {
        tainted: "https://photos.example/2.jpg",
    };
    let mut arena = CardArena::new();
    let targets = ctx
        .prepare_cards(&store.all()[..4], &mut arena, &loader)
        .unwrap();
    let mut sink = TimedSink::default();
    let start = tokio::time::Instant::now();

    let report = ctx
        .orchestrator()
        .export_sequential(&mut arena, &targets, &mut sink)
        .await
        .unwrap();

    assert_eq!(report.skipped.len(), 1);
    let arrivals: Vec<(&str, Duration)> = sink
        .arrivals
        .iter()
        .map(|(name, at)| (name.as_str(), *at - start))
        .collect();
    assert_eq!(
        arrivals,
        vec![
            ("ID_Card_21A91.jpg", Duration::ZERO),
            ("ID_Card_21A93.jpg", Duration::from_millis(500)),
            ("ID_Card_21A94.jpg", Duration::from_millis(1000)),
        ]
    );
}

#[tokio::test]
async fn failed_delivery_releases_queued_cards() {
    let store = five_students();
    let ctx = context();
    let mut arena = CardArena::new();
    let targets = ctx
        .prepare_cards(&store.all(), &mut arena, &TaintingLoader { tainted: "" })
        .unwrap();
    let mut orchestrator = ctx.orchestrator();

    let err = orchestrator
        .export_sequential(&mut arena, &targets, &mut FullDisk { accept: 1 })
        .await
        .unwrap_err();

    match err {
        ExportError::Delivery { filename, .. } => assert_eq!(filename, "ID_Card_21A92.jpg"),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(arena.live(), 0);
    assert_eq!(orchestrator.state(), ExportState::Idle);
}

#[tokio::test]
async fn aborted_archive_releases_every_card() {
    let store = five_students();
    let ctx = context();
    let loader = TaintingLoader {
        tainted: "https://photos.example/2.jpg",
    };
    let mut arena = CardArena::new();
    let targets = ctx.prepare_cards(&store.all(), &mut arena, &loader).unwrap();
    assert_eq!(arena.live(), 5);

    ctx.orchestrator()
        .export_archive(&mut arena, &targets, "ID_Cards.zip", &mut MemorySink::default())
        .await
        .unwrap_err();
    assert_eq!(arena.live(), 0);

    let targets = ctx
        .prepare_cards(&store.all()[..2], &mut arena, &TaintingLoader { tainted: "" })
        .unwrap();
    let err = ctx
        .orchestrator()
        .export_archive(&mut arena, &targets, "ID_Cards.zip", &mut FullDisk { accept: 0 })
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Delivery { .. }));
    assert_eq!(arena.live(), 0);
}
