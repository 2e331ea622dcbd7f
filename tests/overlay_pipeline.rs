use image::DynamicImage;
use omnichord_overlay::calibrate::calibrate;
use omnichord_overlay::config::OverlayConfig;
use omnichord_overlay::error::OverlayError;
use omnichord_overlay::filter::filter_candidates;
use omnichord_overlay::geometry::RawRegion;
use omnichord_overlay::kornia::CandidateExtractor;
use omnichord_overlay::pipeline::{generate_overlay_map, overlay_from_regions, overlay_from_regions_detailed};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const IMAGE: &str = "assets/omnichord.png";

// Labels are 45x36 at y=400, so the baseline y0 is 418. Buttons are 41x40 in
// rows at y=450/510/570 (centres 52/112/172 px below the baseline), sheared
// left by 0.25 px per px of depth: offsets 13/28/43 px.
const LABEL_PITCH: u32 = 90;
const ROW_TOPS: [u32; 3] = [450, 510, 570];
const ROW_OFFSETS: [u32; 3] = [13, 28, 43];
const TRUE_SLOPE: f64 = 0.25;

fn label(column: u32) -> RawRegion {
    RawRegion::new(100 + LABEL_PITCH * column, 400, 45, 36)
}

fn button(column: u32, row: usize) -> RawRegion {
    RawRegion::new(102 + LABEL_PITCH * column - ROW_OFFSETS[row], ROW_TOPS[row], 41, 40)
}

/// Labels first, then buttons column by column, top to bottom.
fn panel_regions() -> Vec<RawRegion> {
    let mut regions: Vec<RawRegion> = (0..12).map(label).collect();
    for column in 0..12 {
        for row in 0..3 {
            regions.push(button(column, row));
        }
    }
    regions
}

fn ids(map: &omnichord_overlay::OverlayMap) -> Vec<&str> {
    map.elements.iter().map(|e| e.id.as_str()).collect()
}

#[test]
fn full_panel_yields_every_chord_once() {
    let config = OverlayConfig::default();
    let run = overlay_from_regions_detailed(&panel_regions(), WIDTH, HEIGHT, IMAGE, &config)
        .expect("overlay");
    let map = &run.map;

    assert_eq!(map.elements.len(), 36);
    assert_eq!(map.reference.width, WIDTH);
    assert_eq!(map.reference.height, HEIGHT);
    assert_eq!(map.reference.image, IMAGE);
    assert!((run.calibration.fit.slope - TRUE_SLOPE).abs() < 1e-9);

    for (column, root) in config.roots.iter().enumerate() {
        for (row, quality) in config.qualities.iter().enumerate() {
            let id = format!("chord_{root}_{quality}").replace('#', "s");
            let element = map.element(&id).unwrap_or_else(|| panic!("missing {id}"));
            assert_eq!(&element.root, root);
            assert_eq!(&element.quality, quality);
            assert_eq!(element.kind, "chord");
            assert_eq!(element.gesture, "hold");

            let expected = button(column as u32, row);
            assert!((element.bbox[0] * WIDTH as f64 - expected.x as f64).abs() < 1e-3);
            assert!((element.bbox[1] * HEIGHT as f64 - expected.y as f64).abs() < 1e-3);
        }
    }

    assert_eq!(&ids(map)[..4], &["chord_Ds_maj", "chord_Ds_min", "chord_Ds_7", "chord_Ab_maj"]);
    assert!(map.element("chord_Fs_7").is_some());
}

#[test]
fn column_zero_is_the_leftmost_label() {
    let mut regions = panel_regions();
    // Labels detected right to left must not change column order.
    regions[..12].reverse();
    let map = overlay_from_regions(&regions, WIDTH, HEIGHT, IMAGE, &OverlayConfig::default())
        .expect("overlay");

    let ds = map.element("chord_Ds_maj").expect("D# major");
    let fs = map.element("chord_Fs_maj").expect("F# major");
    assert!(ds.bbox[0] < fs.bbox[0]);
    assert!(map.elements.iter().filter(|e| e.quality == "maj").all(|e| e.bbox[0] >= ds.bbox[0]));
}

#[test]
fn chosen_slope_is_a_grid_minimum() {
    let config = OverlayConfig::default();
    let mut regions = panel_regions();
    // Jitter some buttons so the optimum is not a perfect fit.
    regions[14].x += 3;
    regions[20].x -= 2;
    regions[31].y += 4;

    let filtered = filter_candidates(&regions, &config.priors);
    let calibration = calibrate(&filtered.labels, &filtered.buttons, 12, &config.skew)
        .expect("calibration");
    let best = calibration.anchors.score(&filtered.buttons, calibration.fit.slope);
    assert_eq!(best, calibration.fit.score);

    let slopes = config.skew.slopes();
    for s in &slopes {
        assert!(best <= calibration.anchors.score(&filtered.buttons, *s));
    }
    let first_min = slopes
        .iter()
        .position(|&s| calibration.anchors.score(&filtered.buttons, s) == best)
        .expect("minimum on grid");
    assert_eq!(slopes[first_min], calibration.fit.slope);

    let sorted = calibration.anchors.centers_x.windows(2).all(|w| w[0] < w[1]);
    assert!(sorted, "anchors must be sorted left to right");
}

#[test]
fn eleven_labels_abort_calibration() {
    let mut regions = panel_regions();
    regions.remove(5);
    let err = overlay_from_regions(&regions, WIDTH, HEIGHT, IMAGE, &OverlayConfig::default())
        .expect_err("must abort");
    match err {
        OverlayError::CalibrationInfeasible { found, required } => {
            assert_eq!(found, 11);
            assert_eq!(required, 12);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn sparse_column_is_not_padded() {
    let mut regions = panel_regions();
    let missing = button(3, 2);
    regions.retain(|r| *r != missing);

    let map = overlay_from_regions(&regions, WIDTH, HEIGHT, IMAGE, &OverlayConfig::default())
        .expect("overlay");
    assert_eq!(map.elements.len(), 35);

    let bb: Vec<&str> = map
        .elements
        .iter()
        .filter(|e| e.root == "Bb")
        .map(|e| e.quality.as_str())
        .collect();
    assert_eq!(bb, vec!["maj", "min"]);
}

#[test]
fn fragments_lose_to_the_largest_box() {
    let mut regions = panel_regions();
    let whole = button(6, 1);
    // A smaller detection inside the same button, listed before it.
    let fragment = RawRegion::new(whole.x + 4, whole.y + 4, 32, 32);
    regions.insert(12, fragment);

    let map = overlay_from_regions(&regions, WIDTH, HEIGHT, IMAGE, &OverlayConfig::default())
        .expect("overlay");
    assert_eq!(map.elements.len(), 36);
    let g_min = map.element("chord_G_min").expect("G minor");
    assert!((g_min.bbox[2] * WIDTH as f64 - 41.0).abs() < 1e-3);
    assert!((g_min.bbox[0] * WIDTH as f64 - whole.x as f64).abs() < 1e-3);
}

#[test]
fn noise_outside_the_priors_is_ignored() {
    let mut regions = panel_regions();
    regions.extend([
        // too small, too elongated, outside the panel, too large
        RawRegion::new(300, 500, 10, 10),
        RawRegion::new(300, 500, 55, 30),
        RawRegion::new(300, 100, 40, 40),
        RawRegion::new(300, 500, 120, 120),
        // label-row fragment: in the label band, wrong width
        RawRegion::new(500, 402, 35, 34),
    ]);

    let run = overlay_from_regions_detailed(&regions, WIDTH, HEIGHT, IMAGE, &OverlayConfig::default())
        .expect("overlay");
    assert_eq!(run.filtered.labels.len(), 12);
    assert_eq!(run.filtered.buttons.len(), 36);
    assert_eq!(run.filtered.label_fragments, 1);
    assert_eq!(run.map.elements.len(), 36);
}

#[test]
fn extra_labels_use_the_leftmost_twelve() {
    let mut regions = panel_regions();
    regions.push(RawRegion::new(1150, 400, 45, 36));

    let run = overlay_from_regions_detailed(&regions, WIDTH, HEIGHT, IMAGE, &OverlayConfig::default())
        .expect("overlay");
    assert_eq!(run.calibration.anchors.len(), 12);
    assert!(run.calibration.anchors.centers_x.iter().all(|&x| x < 1150.0));
    assert_eq!(run.map.elements.len(), 36);
}

#[test]
fn labels_without_buttons_give_an_empty_map() {
    let regions: Vec<RawRegion> = (0..12).map(label).collect();
    let map = overlay_from_regions(&regions, WIDTH, HEIGHT, IMAGE, &OverlayConfig::default())
        .expect("overlay");
    assert!(map.elements.is_empty());
}

#[test]
fn output_is_byte_identical_across_runs() {
    let config = OverlayConfig::default();
    let first = overlay_from_regions(&panel_regions(), WIDTH, HEIGHT, IMAGE, &config)
        .and_then(|m| m.to_json_string())
        .expect("first");
    let second = overlay_from_regions(&panel_regions(), WIDTH, HEIGHT, IMAGE, &config)
        .and_then(|m| m.to_json_string())
        .expect("second");
    assert_eq!(first, second);
}

#[test]
fn normalized_boxes_reconstruct_pixels() {
    let width = 1283;
    let height = 719;
    let map = overlay_from_regions(&panel_regions(), width, height, IMAGE, &OverlayConfig::default())
        .expect("overlay");

    let pixel_boxes: Vec<RawRegion> = (0..12u32)
        .flat_map(|c| (0..3).map(move |r| button(c, r)))
        .collect();
    for (element, px) in map.elements.iter().zip(&pixel_boxes) {
        let [x, y, w, h] = element.bbox;
        for v in element.bbox {
            assert!((0.0..=1.0).contains(&v));
            assert_eq!(format!("{v:.6}").parse::<f64>().expect("float"), v);
        }
        let tol_w = 0.5e-6 * width as f64 + 1e-9;
        let tol_h = 0.5e-6 * height as f64 + 1e-9;
        assert!((x * width as f64 - px.x as f64).abs() <= tol_w);
        assert!((y * height as f64 - px.y as f64).abs() <= tol_h);
        assert!((w * width as f64 - px.w as f64).abs() <= tol_w);
        assert!((h * height as f64 - px.h as f64).abs() <= tol_h);
    }
}

struct FixedRegions(Vec<RawRegion>);

impl CandidateExtractor for FixedRegions {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<RawRegion>, OverlayError> {
        Ok(self.0.clone())
    }
}

#[test]
fn image_dimensions_come_from_the_image() {
    let image = DynamicImage::new_rgb8(WIDTH, HEIGHT);
    let map = generate_overlay_map(
        &image,
        &FixedRegions(panel_regions()),
        IMAGE,
        &OverlayConfig::default(),
    )
    .expect("overlay");
    assert_eq!((map.reference.width, map.reference.height), (WIDTH, HEIGHT));
    assert_eq!(map.elements.len(), 36);
}

#[test]
fn custom_root_and_quality_names_are_honoured() {
    let config = OverlayConfig {
        roots: (0..12).map(|i| format!("R{i}")).collect(),
        qualities: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        ..OverlayConfig::default()
    };
    let map = overlay_from_regions(&panel_regions(), WIDTH, HEIGHT, IMAGE, &config).expect("overlay");
    assert_eq!(map.elements.len(), 36);
    assert_eq!(&ids(&map)[..4], &["chord_R0_a", "chord_R0_b", "chord_R0_c", "chord_R1_a"]);
}

#[test]
fn quality_count_other_than_three_is_rejected() {
    for n in [2, 4] {
        let config = OverlayConfig {
            qualities: (0..n).map(|i| format!("q{i}")).collect(),
            ..OverlayConfig::default()
        };
        let err = overlay_from_regions(&panel_regions(), WIDTH, HEIGHT, IMAGE, &config)
            .expect_err("must reject");
        assert!(matches!(err, OverlayError::InvalidConfig(_)), "{n} qualities: {err}");
    }
}

#[test]
fn label_count_other_than_twelve_is_rejected() {
    let mut config = OverlayConfig::default();
    config.priors.label_count = 13;
    config.roots.push("X".to_string());
    let err = overlay_from_regions(&panel_regions(), WIDTH, HEIGHT, IMAGE, &config)
        .expect_err("must reject");
    assert!(matches!(err, OverlayError::InvalidConfig(_)), "{err}");
}

#[test]
fn config_file_with_four_qualities_is_rejected() {
    let dir = std::env::temp_dir().join(format!("omnichord_config_{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("four_rows.json");
    std::fs::write(&path, r#"{ "qualities": ["maj", "min", "7", "dim"] }"#).expect("write");

    let err = OverlayConfig::load(&path).expect_err("must reject");
    assert!(matches!(err, OverlayError::ConfigFile { .. }), "{err}");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn equal_area_duplicates_keep_the_earliest_detection() {
    let whole = button(6, 1);
    let twin = RawRegion::new(whole.x + 2, whole.y, whole.w, whole.h);

    // Twin detected after the original: the original represents the row.
    let mut regions = panel_regions();
    regions.push(twin);
    let map = overlay_from_regions(&regions, WIDTH, HEIGHT, IMAGE, &OverlayConfig::default())
        .expect("overlay");
    assert_eq!(map.elements.len(), 36);
    let g_min = map.element("chord_G_min").expect("G minor");
    assert!((g_min.bbox[0] * WIDTH as f64 - whole.x as f64).abs() < 1e-3);

    // Twin detected first: it wins instead.
    let mut regions = panel_regions();
    regions.insert(12, twin);
    let map = overlay_from_regions(&regions, WIDTH, HEIGHT, IMAGE, &OverlayConfig::default())
        .expect("overlay");
    assert_eq!(map.elements.len(), 36);
    let g_min = map.element("chord_G_min").expect("G minor");
    assert!((g_min.bbox[0] * WIDTH as f64 - twin.x as f64).abs() < 1e-3);
}
