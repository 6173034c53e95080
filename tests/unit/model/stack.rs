use std::collections::BTreeSet;

use super::*;
use crate::model::layer::{ImageVariant, VariantId};

fn add_group(stack: &mut LayerStack, name: &str, order: i32) {
    stack
        .apply(LayerCommand::AddGroup {
            name: name.to_string(),
            order,
        })
        .unwrap();
}

fn add_variant(stack: &mut LayerStack, group: &str, path: &str) {
    stack
        .apply(LayerCommand::AddVariant {
            group: group.to_string(),
            variant: ImageVariant::from_path(path),
        })
        .unwrap();
}

#[test]
fn add_group_rejects_taken_order() {
    let mut stack = LayerStack::new();
    add_group(&mut stack, "body", 1);
    let err = stack
        .apply(LayerCommand::AddGroup {
            name: "hair".to_string(),
            order: 1,
        })
        .unwrap_err();
    assert!(err.to_string().contains("order 1"));
    assert_eq!(stack.groups().len(), 1);
}

#[test]
fn disabled_groups_free_their_order() {
    let mut stack = LayerStack::new();
    add_group(&mut stack, "body", 1);
    stack
        .apply(LayerCommand::SetEnabled {
            group: "body".to_string(),
            enabled: false,
        })
        .unwrap();
    add_group(&mut stack, "hair", 1);

    // re-enabling would collide with "hair"
    assert!(
        stack
            .apply(LayerCommand::ToggleEnabled {
                group: "body".to_string(),
            })
            .is_err()
    );
    assert!(!stack.group("body").unwrap().enabled);
}

fn generated(stack: &LayerStack) -> Vec<Vec<(String, String)>> {
    use crate::combine::generator::CombinationGenerator;

    let snap = stack.snapshot().unwrap();
    CombinationGenerator::new(&snap)
        .generate()
        .into_combinations()
        .iter()
        .map(|c| {
            c.picks
                .iter()
                .map(|p| (p.group.name.clone(), p.variant.id.to_string()))
                .collect()
        })
        .collect()
}

#[test]
fn toggle_is_idempotent_over_two_applications() {
    let mut stack = LayerStack::new();
    add_group(&mut stack, "body", 1);
    add_group(&mut stack, "hat", 2);
    add_variant(&mut stack, "body", "00_body.png");
    add_variant(&mut stack, "hat", "01_cap.png");
    add_variant(&mut stack, "hat", "02_crown.png");
    let original = generated(&stack);
    assert_eq!(original.len(), 2);

    let toggle = |stack: &mut LayerStack| {
        stack
            .apply(LayerCommand::ToggleEnabled {
                group: "body".to_string(),
            })
            .unwrap();
    };

    toggle(&mut stack);
    assert!(!stack.group("body").unwrap().enabled);
    let hidden = generated(&stack);
    assert_eq!(hidden.len(), 2);
    assert!(
        hidden
            .iter()
            .flatten()
            .all(|(group, _)| group.as_str() != "body")
    );

    toggle(&mut stack);
    assert!(stack.group("body").unwrap().enabled);
    assert_eq!(generated(&stack), original);
}

#[test]
fn empty_group_names_are_rejected_without_changes() {
    let mut stack = LayerStack::new();
    add_group(&mut stack, "body", 1);

    let err = stack
        .apply(LayerCommand::AddGroup {
            name: String::new(),
            order: 2,
        })
        .unwrap_err();
    assert!(matches!(err, LayermixError::Validation(_)));

    let err = stack
        .apply(LayerCommand::RenameGroup {
            from: "body".to_string(),
            to: String::new(),
        })
        .unwrap_err();
    assert!(matches!(err, LayermixError::Validation(_)));

    let names: Vec<&str> = stack.groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, ["body"]);
    assert!(stack.snapshot().is_ok());
}

#[test]
fn remove_variant_drops_its_rules_and_references() {
    let mut stack = LayerStack::new();
    add_group(&mut stack, "a", 1);
    add_group(&mut stack, "b", 2);
    add_variant(&mut stack, "a", "01_a.png");
    add_variant(&mut stack, "b", "01_b.png");
    stack
        .apply(LayerCommand::SetMutex {
            group: "a".to_string(),
            id: VariantId::new("01_a.png"),
            targets: BTreeSet::from([MutexTarget::variant("b", "01_b.png")]),
        })
        .unwrap();
    stack
        .apply(LayerCommand::SetMutex {
            group: "b".to_string(),
            id: VariantId::new("01_b.png"),
            targets: BTreeSet::from([MutexTarget::group("a")]),
        })
        .unwrap();

    stack
        .apply(LayerCommand::RemoveVariant {
            group: "b".to_string(),
            id: VariantId::new("01_b.png"),
        })
        .unwrap();

    assert!(stack.group("b").unwrap().mutex_settings.is_empty());
    assert!(stack.group("a").unwrap().mutex_settings.is_empty());
    stack.snapshot().unwrap();
}

#[test]
fn remove_group_prunes_group_targets() {
    let mut stack = LayerStack::new();
    add_group(&mut stack, "a", 1);
    add_group(&mut stack, "b", 2);
    add_variant(&mut stack, "a", "01_a.png");
    stack
        .apply(LayerCommand::SetMutex {
            group: "a".to_string(),
            id: VariantId::new("01_a.png"),
            targets: BTreeSet::from([MutexTarget::group("b")]),
        })
        .unwrap();
    stack
        .apply(LayerCommand::RemoveGroup {
            name: "b".to_string(),
        })
        .unwrap();
    assert!(stack.group("a").unwrap().mutex_settings.is_empty());
}

#[test]
fn rename_rewrites_targets() {
    let mut stack = LayerStack::new();
    add_group(&mut stack, "a", 1);
    add_group(&mut stack, "b", 2);
    add_variant(&mut stack, "a", "01_a.png");
    add_variant(&mut stack, "b", "01_b.png");
    stack
        .apply(LayerCommand::SetMutex {
            group: "a".to_string(),
            id: VariantId::new("01_a.png"),
            targets: BTreeSet::from([
                MutexTarget::group("b"),
                MutexTarget::variant("b", "01_b.png"),
            ]),
        })
        .unwrap();
    stack
        .apply(LayerCommand::RenameGroup {
            from: "b".to_string(),
            to: "hat".to_string(),
        })
        .unwrap();

    let targets = stack
        .group("a")
        .unwrap()
        .mutex_for(&VariantId::new("01_a.png"))
        .unwrap();
    assert!(targets.contains(&MutexTarget::group("hat")));
    assert!(targets.contains(&MutexTarget::variant("hat", "01_b.png")));
    stack.snapshot().unwrap();
}

#[test]
fn set_mutex_rejects_unknown_targets() {
    let mut stack = LayerStack::new();
    add_group(&mut stack, "a", 1);
    add_variant(&mut stack, "a", "01_a.png");
    let err = stack
        .apply(LayerCommand::SetMutex {
            group: "a".to_string(),
            id: VariantId::new("01_a.png"),
            targets: BTreeSet::from([MutexTarget::group("ghost")]),
        })
        .unwrap_err();
    assert!(err.to_string().contains("unknown layer group"));
}

#[test]
fn sort_variants_uses_natural_order() {
    let mut stack = LayerStack::new();
    add_group(&mut stack, "a", 1);
    for p in ["/x/10_a.png", "/x/02_a.png", "/x/01_a.png"] {
        add_variant(&mut stack, "a", p);
    }
    stack
        .apply(LayerCommand::SortVariants {
            group: "a".to_string(),
        })
        .unwrap();
    let ids: Vec<_> = stack.group("a").unwrap().variants.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["/x/01_a.png", "/x/02_a.png", "/x/10_a.png"]);
}

#[test]
fn select_variant_checks_bounds_and_removal_clamps() {
    let mut stack = LayerStack::new();
    add_group(&mut stack, "a", 1);
    add_variant(&mut stack, "a", "01_a.png");
    add_variant(&mut stack, "a", "02_a.png");
    assert!(
        stack
            .apply(LayerCommand::SelectVariant {
                group: "a".to_string(),
                index: 2,
            })
            .is_err()
    );
    stack
        .apply(LayerCommand::SelectVariant {
            group: "a".to_string(),
            index: 1,
        })
        .unwrap();
    stack
        .apply(LayerCommand::RemoveVariant {
            group: "a".to_string(),
            id: VariantId::new("02_a.png"),
        })
        .unwrap();
    assert_eq!(stack.group("a").unwrap().current, 0);
}

#[test]
fn snapshot_rejects_shared_enabled_order() {
    let groups = vec![LayerGroup::new("a", 3), LayerGroup::new("b", 3)];
    let err = LayerSnapshot::new(groups).unwrap_err();
    assert!(err.to_string().contains("share order 3"));

    let mut disabled = LayerGroup::new("b", 3);
    disabled.enabled = false;
    LayerSnapshot::new(vec![LayerGroup::new("a", 3), disabled]).unwrap();
}

#[test]
fn snapshot_orders_enabled_groups_ascending() {
    let mut hidden = LayerGroup::new("hidden", 0);
    hidden.enabled = false;
    let snap = LayerSnapshot::new(vec![
        LayerGroup::new("top", 9),
        hidden,
        LayerGroup::new("bottom", -1),
    ])
    .unwrap();
    let names: Vec<_> = snap.enabled_groups().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["bottom", "top"]);
}
