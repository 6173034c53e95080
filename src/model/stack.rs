use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::foundation::error::{LayermixError, LayermixResult};
use crate::model::command::LayerCommand;
use crate::model::layer::{LayerGroup, MutexTarget};
use crate::model::tag::natural_key;

/// Editable layer model. Mutated only through [`LayerCommand`]s, frozen with
/// [`LayerStack::snapshot`] before generation or export.
#[derive(Clone, Debug, Default)]
pub struct LayerStack {
    groups: Vec<LayerGroup>,
}

impl LayerStack {
    /// Empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stack from pre-assembled groups, validating them as a snapshot would.
    pub fn from_groups(groups: Vec<LayerGroup>) -> LayermixResult<Self> {
        validate_groups(&groups)?;
        Ok(Self { groups })
    }

    /// Groups in insertion order.
    pub fn groups(&self) -> &[LayerGroup] {
        &self.groups
    }

    pub(crate) fn groups_mut(&mut self) -> &mut [LayerGroup] {
        &mut self.groups
    }

    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<&LayerGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Orders held by enabled groups, optionally ignoring one group.
    pub fn taken_orders(&self, exclude: Option<&str>) -> BTreeSet<i32> {
        self.groups
            .iter()
            .filter(|g| g.enabled && Some(g.name.as_str()) != exclude)
            .map(|g| g.order)
            .collect()
    }

    /// Apply one command. On error the stack is unchanged.
    pub fn apply(&mut self, cmd: LayerCommand) -> LayermixResult<()> {
        tracing::debug!(group = cmd.group_name(), "apply layer command");
        match cmd {
            LayerCommand::AddGroup { name, order } => {
                ensure_name(&name)?;
                if self.group(&name).is_some() {
                    return Err(LayermixError::validation(format!(
                        "layer group '{name}' already exists"
                    )));
                }
                self.ensure_order_free(order, None)?;
                self.groups.push(LayerGroup::new(name, order));
            }
            LayerCommand::RemoveGroup { name } => {
                let idx = self.index_of(&name)?;
                self.groups.remove(idx);
                for g in &mut self.groups {
                    prune_targets(g, |t| t.group_name() == name);
                }
            }
            LayerCommand::RenameGroup { from, to } => {
                let idx = self.index_of(&from)?;
                if from == to {
                    return Ok(());
                }
                ensure_name(&to)?;
                if self.group(&to).is_some() {
                    return Err(LayermixError::validation(format!(
                        "layer group '{to}' already exists"
                    )));
                }
                self.groups[idx].name = to.clone();
                for g in &mut self.groups {
                    rename_targets(g, &from, &to);
                }
            }
            LayerCommand::SetOrder { group, order } => {
                let idx = self.index_of(&group)?;
                if self.groups[idx].enabled {
                    self.ensure_order_free(order, Some(&group))?;
                }
                self.groups[idx].order = order;
            }
            LayerCommand::SetEnabled { group, enabled } => {
                self.set_enabled(&group, enabled)?;
            }
            LayerCommand::ToggleEnabled { group } => {
                let idx = self.index_of(&group)?;
                let enabled = !self.groups[idx].enabled;
                self.set_enabled(&group, enabled)?;
            }
            LayerCommand::AddVariant { group, variant } => {
                let idx = self.index_of(&group)?;
                let g = &mut self.groups[idx];
                if g.variant(&variant.id).is_some() {
                    return Err(LayermixError::validation(format!(
                        "variant '{}' already in group '{group}'",
                        variant.id
                    )));
                }
                g.variants.push(variant);
            }
            LayerCommand::RemoveVariant { group, id } => {
                let idx = self.index_of(&group)?;
                let g = &mut self.groups[idx];
                let pos = g.variants.iter().position(|v| v.id == id).ok_or_else(|| {
                    LayermixError::validation(format!("variant '{id}' not in group '{group}'"))
                })?;
                g.variants.remove(pos);
                g.mutex_settings.remove(&id);
                if g.current >= g.variants.len() {
                    g.current = g.variants.len().saturating_sub(1);
                }
                for g in &mut self.groups {
                    prune_targets(g, |t| {
                        matches!(t, MutexTarget::Variant { group: tg, id: tid } if *tg == group && *tid == id)
                    });
                }
            }
            LayerCommand::SetMutex { group, id, targets } => {
                let idx = self.index_of(&group)?;
                if self.groups[idx].variant(&id).is_none() {
                    return Err(LayermixError::validation(format!(
                        "variant '{id}' not in group '{group}'"
                    )));
                }
                for t in &targets {
                    self.ensure_target_exists(t)?;
                }
                let g = &mut self.groups[idx];
                if targets.is_empty() {
                    g.mutex_settings.remove(&id);
                } else {
                    g.mutex_settings.insert(id, targets);
                }
            }
            LayerCommand::SortVariants { group } => {
                let idx = self.index_of(&group)?;
                self.groups[idx]
                    .variants
                    .sort_by_cached_key(|v| natural_key(v.id.as_str()));
            }
            LayerCommand::SelectVariant { group, index } => {
                let idx = self.index_of(&group)?;
                let g = &mut self.groups[idx];
                if index >= g.variants.len() {
                    return Err(LayermixError::validation(format!(
                        "variant index {index} out of range for group '{group}' ({} variants)",
                        g.variants.len()
                    )));
                }
                g.current = index;
            }
        }
        Ok(())
    }

    /// Freeze the current state into an immutable, validated snapshot.
    pub fn snapshot(&self) -> LayermixResult<LayerSnapshot> {
        LayerSnapshot::new(self.groups.clone())
    }

    fn index_of(&self, name: &str) -> LayermixResult<usize> {
        self.groups
            .iter()
            .position(|g| g.name == name)
            .ok_or_else(|| LayermixError::validation(format!("unknown layer group '{name}'")))
    }

    fn ensure_order_free(&self, order: i32, exclude: Option<&str>) -> LayermixResult<()> {
        if self.taken_orders(exclude).contains(&order) {
            return Err(LayermixError::validation(format!(
                "order {order} is already used by another enabled layer group"
            )));
        }
        Ok(())
    }

    fn set_enabled(&mut self, group: &str, enabled: bool) -> LayermixResult<()> {
        let idx = self.index_of(group)?;
        if enabled && !self.groups[idx].enabled {
            self.ensure_order_free(self.groups[idx].order, Some(group))?;
        }
        self.groups[idx].enabled = enabled;
        Ok(())
    }

    fn ensure_target_exists(&self, target: &MutexTarget) -> LayermixResult<()> {
        let group = self.group(target.group_name()).ok_or_else(|| {
            LayermixError::validation(format!(
                "mutex target '{target}' names an unknown layer group"
            ))
        })?;
        if let MutexTarget::Variant { id, .. } = target
            && group.variant(id).is_none()
        {
            return Err(LayermixError::validation(format!(
                "mutex target '{target}' names an unknown variant"
            )));
        }
        Ok(())
    }
}

fn prune_targets(group: &mut LayerGroup, mut drop: impl FnMut(&MutexTarget) -> bool) {
    for targets in group.mutex_settings.values_mut() {
        targets.retain(|t| !drop(t));
    }
    group.mutex_settings.retain(|_, targets| !targets.is_empty());
}

fn rename_targets(group: &mut LayerGroup, from: &str, to: &str) {
    for targets in group.mutex_settings.values_mut() {
        let renamed = std::mem::take(targets)
            .into_iter()
            .map(|t| match t {
                MutexTarget::Group(name) if name == from => MutexTarget::Group(to.to_string()),
                MutexTarget::Variant { group, id } if group == from => MutexTarget::Variant {
                    group: to.to_string(),
                    id,
                },
                other => other,
            })
            .collect();
        *targets = renamed;
    }
}

/// Immutable, validated view of the layer model used for one generation + export run.
///
/// Cloning is cheap; workers share it by reference without locking.
#[derive(Clone, Debug)]
pub struct LayerSnapshot {
    groups: Arc<[LayerGroup]>,
    render_order: Arc<[usize]>,
}

impl LayerSnapshot {
    /// Validate `groups` and freeze them.
    pub fn new(groups: Vec<LayerGroup>) -> LayermixResult<Self> {
        validate_groups(&groups)?;
        let mut render_order: Vec<usize> = groups
            .iter()
            .enumerate()
            .filter(|(_, g)| g.enabled)
            .map(|(i, _)| i)
            .collect();
        render_order.sort_by_key(|&i| groups[i].order);
        Ok(Self {
            groups: groups.into(),
            render_order: render_order.into(),
        })
    }

    /// Every group, enabled or not, in insertion order.
    pub fn groups(&self) -> &[LayerGroup] {
        &self.groups
    }

    /// Enabled groups sorted by ascending render order.
    pub fn enabled_groups(&self) -> impl Iterator<Item = &LayerGroup> + '_ {
        self.render_order.iter().map(|&i| &self.groups[i])
    }

    /// Total variant count across enabled groups.
    pub fn enabled_variant_count(&self) -> usize {
        self.enabled_groups().map(|g| g.variants.len()).sum()
    }
}

/// Structural checks shared by [`LayerStack::from_groups`] and [`LayerSnapshot::new`].
pub(crate) fn validate_groups(groups: &[LayerGroup]) -> LayermixResult<()> {
    let mut names = BTreeSet::new();
    let mut orders = BTreeMap::<i32, &str>::new();
    for g in groups {
        ensure_name(&g.name)?;
        if !names.insert(g.name.as_str()) {
            return Err(LayermixError::validation(format!(
                "duplicate layer group name '{}'",
                g.name
            )));
        }
        if g.enabled
            && let Some(other) = orders.insert(g.order, g.name.as_str())
        {
            return Err(LayermixError::validation(format!(
                "enabled layer groups '{other}' and '{}' share order {}",
                g.name, g.order
            )));
        }
        let mut ids = BTreeSet::new();
        for v in &g.variants {
            if !ids.insert(&v.id) {
                return Err(LayermixError::validation(format!(
                    "duplicate variant '{}' in layer group '{}'",
                    v.id, g.name
                )));
            }
        }
    }

    for g in groups {
        for (id, targets) in &g.mutex_settings {
            if g.variant(id).is_none() {
                return Err(LayermixError::validation(format!(
                    "layer group '{}' declares exclusions for unknown variant '{id}'",
                    g.name
                )));
            }
            for t in targets {
                let Some(target_group) = groups.iter().find(|o| o.name == t.group_name()) else {
                    return Err(LayermixError::validation(format!(
                        "mutex target '{t}' on '{}' names an unknown layer group",
                        g.name
                    )));
                };
                if let MutexTarget::Variant { id: tid, .. } = t
                    && target_group.variant(tid).is_none()
                {
                    return Err(LayermixError::validation(format!(
                        "mutex target '{t}' on '{}' names an unknown variant",
                        g.name
                    )));
                }
            }
        }
    }
    Ok(())
}

fn ensure_name(name: &str) -> LayermixResult<()> {
    if name.is_empty() {
        return Err(LayermixError::validation("layer group name must be non-empty"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/model/stack.rs"]
mod tests;
