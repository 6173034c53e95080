use super::*;
use crate::model::command::LayerCommand;
use crate::model::layer::{ImageVariant, LayerGroup, MutexTarget};

fn canvas() -> Canvas {
    Canvas::new(2, 2).unwrap()
}

fn solid(id: &str, rgba: [u8; 4]) -> ImageVariant {
    ImageVariant::in_memory(id, Raster::solid(canvas(), rgba).unwrap())
}

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

fn rig() -> LayerStack {
    LayerStack::from_groups(vec![
        LayerGroup::new("base", 1).with_variant(solid("00_base.png", [0, 0, 0, 255])),
        LayerGroup::new("face", 2)
            .with_variant(solid("01_smile.png", [255, 0, 0, 255]))
            .with_variant(solid("02_frown.png", [0, 255, 0, 255])),
    ])
    .unwrap()
}

#[test]
fn session_is_isolated_from_later_edits() {
    let mut stack = rig();
    let session = ExportSession::new(&stack, canvas()).unwrap();
    stack
        .apply(LayerCommand::SetEnabled {
            group: "face".into(),
            enabled: false,
        })
        .unwrap();
    assert_eq!(session.plan().combinations().len(), 2);
}

#[test]
fn zero_sized_canvas_is_rejected() {
    let err = ExportSession::new(&rig(), Canvas { width: 0, height: 4 }).unwrap_err();
    assert!(err.to_string().contains("canvas"));
}

#[test]
fn export_on_empty_stack_is_nothing_to_export() {
    let session = ExportSession::new(&LayerStack::new(), canvas()).unwrap();
    let out = temp_dir("session_empty");
    let outcome = session
        .export(&out, &ExportOpts::default(), &|_: usize, _: usize| {}, &CancelToken::new())
        .unwrap();
    assert!(matches!(
        outcome,
        ExportOutcome::NothingToExport(EmptyReason::NoEnabledGroups)
    ));
    assert!(!out.exists());
}

#[test]
fn export_when_everything_is_excluded() {
    let stack = LayerStack::from_groups(vec![
        LayerGroup::new("a", 1).with_variant(solid("01_a.png", [1, 1, 1, 255])),
        LayerGroup::new("b", 2)
            .with_variant(solid("01_b.png", [2, 2, 2, 255]))
            .with_mutex("01_b.png", [MutexTarget::group("a")]),
    ])
    .unwrap();
    let session = ExportSession::new(&stack, canvas()).unwrap();
    let outcome = session
        .export(
            &temp_dir("session_excluded"),
            &ExportOpts::default(),
            &|_: usize, _: usize| {},
            &CancelToken::new(),
        )
        .unwrap();
    let ExportOutcome::AllExcluded { rejected, conflicts } = outcome else {
        panic!("expected AllExcluded, got {outcome:?}");
    };
    assert_eq!(rejected, 1);
    assert_eq!(conflicts.len(), 1);
}

#[test]
fn invalid_options_fail_before_generation() {
    let session = ExportSession::new(&LayerStack::new(), canvas()).unwrap();
    let opts = ExportOpts {
        max_workers: 0,
        ..ExportOpts::default()
    };
    assert!(
        session
            .export(&temp_dir("session_opts"), &opts, &|_: usize, _: usize| {}, &CancelToken::new())
            .is_err()
    );
}

#[test]
fn export_writes_every_legal_combination() {
    let session = ExportSession::new(&rig(), canvas()).unwrap();
    let out = temp_dir("session_export");
    let outcome = session
        .export(&out, &ExportOpts::default(), &|_: usize, _: usize| {}, &CancelToken::new())
        .unwrap();
    let ExportOutcome::Exported(report) = outcome else {
        panic!("expected Exported");
    };
    assert_eq!(report.succeeded, 2);
    assert!(out.join("base_00_base_face_01_smile.png").is_file());
    assert!(out.join("base_00_base_face_02_frown.png").is_file());
}

#[test]
fn current_selection_check_and_preview() {
    let mut stack = rig();
    stack
        .apply(LayerCommand::SelectVariant {
            group: "face".into(),
            index: 1,
        })
        .unwrap();
    let session = ExportSession::new(&stack, canvas()).unwrap();
    assert!(session.check_current().is_empty());
    assert_eq!(session.current_selection().describe(), "base=00_base, face=02_frown");
    let px = session.preview().unwrap().pixel(0, 0);
    assert_eq!(px, Some([0, 255, 0, 255]));

    stack
        .apply(LayerCommand::SetMutex {
            group: "face".into(),
            id: "02_frown.png".into(),
            targets: [MutexTarget::variant("base", "00_base.png")].into(),
        })
        .unwrap();
    let session = ExportSession::new(&stack, canvas()).unwrap();
    let conflicts = session.check_current();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].group, "face");
}
