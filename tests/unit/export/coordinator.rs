use super::*;
use crate::combine::combination::Pick;
use crate::foundation::core::Raster;
use crate::model::layer::{ImageVariant, LayerGroup};

fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "layermix_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn zero_workers_is_rejected() {
    let opts = ExportOpts {
        max_workers: 0,
        ..ExportOpts::default()
    };
    let err = opts.validate().unwrap_err();
    assert!(err.to_string().contains("max_workers"));
}

#[test]
fn pool_size_is_capped_by_max_workers() {
    let opts = ExportOpts {
        max_workers: 1,
        ..ExportOpts::default()
    };
    assert_eq!(opts.pool_size(), 1);
    let wide = ExportOpts {
        max_workers: 4096,
        ..ExportOpts::default()
    };
    let available = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    assert_eq!(wide.pool_size(), available.min(4096));
}

#[test]
fn cancel_is_visible_through_clones() {
    let token = CancelToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());
    token.cancel();
    token.cancel();
    assert!(clone.is_cancelled());
}

#[test]
fn empty_batch_reports_nothing_and_never_calls_progress() {
    let out = temp_dir("coord_empty");
    let calls = std::sync::atomic::AtomicUsize::new(0);
    let report = export_all(
        &[],
        Canvas::new(1, 1).unwrap(),
        &out,
        &ExportOpts::default(),
        &|_: usize, _: usize| {
            calls.fetch_add(1, Ordering::SeqCst);
        },
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(report, ExportReport::new(0));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(out.is_dir());
}

#[test]
fn composite_failure_is_recorded_not_raised() {
    let out = temp_dir("coord_fail");
    let canvas = Canvas::new(2, 2).unwrap();
    let good = LayerGroup::new("good", 1).with_variant(ImageVariant::in_memory(
        "01_ok.png",
        Raster::solid(canvas, [1, 2, 3, 255]).unwrap(),
    ));
    let bad = LayerGroup::new("bad", 2)
        .with_variant(ImageVariant::from_path(out.join("missing").join("01_gone.png")));

    let combos = [
        Combination::new(0, None, [Pick::new(&good, &good.variants[0])]),
        Combination::new(
            1,
            None,
            [
                Pick::new(&good, &good.variants[0]),
                Pick::new(&bad, &bad.variants[0]),
            ],
        ),
    ];
    let report = export_all(
        &combos,
        canvas,
        &out,
        &ExportOpts::default(),
        &|_: usize, _: usize| {},
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].combination_id, 1);
    assert_eq!(report.failures[0].kind, FailureKind::Composite);
    assert!(out.join("good_01_ok.png").is_file());
    assert!(!out.join("good_01_ok_bad_01_gone.png").exists());
}

#[test]
fn pre_cancelled_batch_runs_nothing() {
    let out = temp_dir("coord_precancel");
    let canvas = Canvas::new(1, 1).unwrap();
    let g = LayerGroup::new("g", 1).with_variant(ImageVariant::in_memory(
        "01_a.png",
        Raster::solid(canvas, [0, 0, 0, 255]).unwrap(),
    ));
    let combos = [Combination::new(0, None, [Pick::new(&g, &g.variants[0])])];
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = export_all(&combos, canvas, &out, &ExportOpts::default(), &|_: usize, _: usize| {}, &cancel)
        .unwrap();
    assert_eq!(report.completed(), 0);
    assert_eq!(report.skipped, 1);
    assert!(report.cancelled);
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
}
