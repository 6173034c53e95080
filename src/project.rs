use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{
    foundation::core::Canvas,
    foundation::error::{LayermixError, LayermixResult},
    model::layer::{ImageVariant, LayerGroup, MutexTarget, VariantId},
    model::stack::LayerStack,
};

const GROUP_PREFIX: &str = "group:";
const IMAGE_PREFIX: &str = "image:";

/// Options for turning a [`ProjectFile`] into a [`LayerStack`].
#[derive(Clone, Debug)]
pub struct LoadOpts {
    /// Drop image entries whose file does not exist instead of failing.
    pub skip_missing_images: bool,
    /// Directory relative image paths are resolved against.
    pub base_dir: Option<PathBuf>,
}

impl Default for LoadOpts {
    fn default() -> Self {
        Self {
            skip_missing_images: true,
            base_dir: None,
        }
    }
}

impl LoadOpts {
    fn resolve(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Persisted layer project (`.lmp`, JSON).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProjectFile {
    /// Canvas width in pixels.
    #[serde(default = "default_canvas_size")]
    pub canvas_width: u32,
    /// Canvas height in pixels.
    #[serde(default = "default_canvas_size")]
    pub canvas_height: u32,
    /// Layer groups in display order.
    #[serde(default)]
    pub layers: Vec<ProjectLayer>,
}

/// One persisted layer group.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProjectLayer {
    /// Group name.
    pub name: String,
    /// Render order; higher is on top.
    pub order: i32,
    /// Image file paths, in display order.
    #[serde(default)]
    pub images: Vec<String>,
    /// Index of the selected image.
    #[serde(default)]
    pub current_index: usize,
    /// Image path to `"group:NAME"` / `"image:PATH"` exclusion targets.
    #[serde(default)]
    pub mutex_settings: BTreeMap<String, Vec<String>>,
    /// Whether the group takes part in preview and export.
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

fn default_canvas_size() -> u32 {
    Canvas::DEFAULT_SIZE
}

fn default_enabled() -> bool {
    true
}

impl ProjectFile {
    /// Parse a project from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> LayermixResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| LayermixError::serde(format!("parse project JSON: {e}")))
    }

    /// Parse a project file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> LayermixResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            LayermixError::io(format!("open project '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Write the project as pretty-printed JSON.
    pub fn to_path(&self, path: impl AsRef<Path>) -> LayermixResult<()> {
        let path = path.as_ref();
        let f = File::create(path).map_err(|e| {
            LayermixError::io(format!("create project '{}': {e}", path.display()))
        })?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, self)
            .map_err(|e| LayermixError::serde(format!("write project JSON: {e}")))?;
        w.flush()
            .map_err(|e| LayermixError::io(format!("flush project '{}': {e}", path.display())))
    }

    /// Validated canvas of the project.
    pub fn canvas(&self) -> LayermixResult<Canvas> {
        Canvas::new(self.canvas_width, self.canvas_height)
    }

    /// Capture `stack` and `canvas` as a project.
    ///
    /// Variant exclusions are stored as `image:` targets, which do not record the group.
    pub fn from_stack(stack: &LayerStack, canvas: Canvas) -> Self {
        let layers = stack
            .groups()
            .iter()
            .map(|g| ProjectLayer {
                name: g.name.clone(),
                order: g.order,
                images: g.variants.iter().map(|v| v.id.to_string()).collect(),
                current_index: g.current,
                mutex_settings: g
                    .mutex_settings
                    .iter()
                    .map(|(id, targets)| {
                        let encoded = targets
                            .iter()
                            .map(|t| match t {
                                MutexTarget::Group(name) => format!("{GROUP_PREFIX}{name}"),
                                MutexTarget::Variant { id, .. } => format!("{IMAGE_PREFIX}{id}"),
                            })
                            .collect::<BTreeSet<_>>()
                            .into_iter()
                            .collect::<Vec<_>>();
                        (id.to_string(), encoded)
                    })
                    .collect(),
                is_enabled: g.enabled,
            })
            .collect();
        Self {
            canvas_width: canvas.width,
            canvas_height: canvas.height,
            layers,
        }
    }

    /// Materialize the project into a validated [`LayerStack`].
    ///
    /// Images are referenced, not decoded. Missing images are skipped (or rejected, see
    /// [`LoadOpts::skip_missing_images`]) and exclusions pointing at anything that did not
    /// load are dropped with a warning.
    #[tracing::instrument(skip_all, fields(layers = self.layers.len()))]
    pub fn to_stack(&self, opts: &LoadOpts) -> LayermixResult<LayerStack> {
        let mut groups = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let mut group = LayerGroup::new(layer.name.clone(), layer.order);
            group.enabled = layer.is_enabled;
            for raw in &layer.images {
                let path = opts.resolve(raw);
                if !path.exists() {
                    if !opts.skip_missing_images {
                        return Err(LayermixError::validation(format!(
                            "layer '{}' references missing image '{}'",
                            layer.name,
                            path.display()
                        )));
                    }
                    tracing::warn!(layer = %layer.name, image = %path.display(), "image not found, skipped");
                    continue;
                }
                let variant = ImageVariant::from_path(path);
                if group.variant(&variant.id).is_some() {
                    tracing::warn!(layer = %layer.name, image = %variant.id, "duplicate image, skipped");
                    continue;
                }
                group.variants.push(variant);
            }
            group.current = if layer.current_index < group.variants.len() {
                layer.current_index
            } else {
                0
            };
            groups.push(group);
        }

        let known_groups: BTreeSet<&str> = self.layers.iter().map(|l| l.name.as_str()).collect();
        let mut owners = BTreeMap::<VariantId, Vec<String>>::new();
        for g in &groups {
            for v in &g.variants {
                owners.entry(v.id.clone()).or_default().push(g.name.clone());
            }
        }

        let mut settings = Vec::with_capacity(groups.len());
        for (layer, group) in self.layers.iter().zip(&groups) {
            let mut resolved = BTreeMap::<VariantId, BTreeSet<MutexTarget>>::new();
            for (raw_key, raw_targets) in &layer.mutex_settings {
                let id = variant_id(&opts.resolve(raw_key));
                if group.variant(&id).is_none() {
                    tracing::warn!(layer = %layer.name, image = %id, "exclusions for unloaded image dropped");
                    continue;
                }
                let mut targets = BTreeSet::new();
                for raw in raw_targets {
                    let decoded = decode_target(raw, opts, &known_groups, &owners);
                    if decoded.is_empty() {
                        tracing::warn!(layer = %layer.name, image = %id, target = %raw, "unresolvable exclusion dropped");
                    }
                    targets.extend(decoded);
                }
                if !targets.is_empty() {
                    resolved.insert(id, targets);
                }
            }
            settings.push(resolved);
        }
        for (group, resolved) in groups.iter_mut().zip(settings) {
            group.mutex_settings = resolved;
        }

        LayerStack::from_groups(groups)
    }
}

fn variant_id(path: &Path) -> VariantId {
    VariantId::new(path.to_string_lossy().into_owned())
}

fn decode_target(
    raw: &str,
    opts: &LoadOpts,
    known_groups: &BTreeSet<&str>,
    owners: &BTreeMap<VariantId, Vec<String>>,
) -> Vec<MutexTarget> {
    if let Some(name) = raw.strip_prefix(GROUP_PREFIX) {
        if known_groups.contains(name) {
            return vec![MutexTarget::group(name)];
        }
        return Vec::new();
    }
    if let Some(image) = raw.strip_prefix(IMAGE_PREFIX) {
        let id = variant_id(&opts.resolve(image));
        return owners
            .get(&id)
            .map(|groups| {
                groups
                    .iter()
                    .map(|g| MutexTarget::variant(g.clone(), id.clone()))
                    .collect()
            })
            .unwrap_or_default();
    }
    Vec::new()
}

#[cfg(test)]
#[path = "../tests/unit/project.rs"]
mod tests;
