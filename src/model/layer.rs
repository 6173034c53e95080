use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::core::Raster;
use crate::model::tag::SequenceTag;

/// Stable identity of an image variant (its source path or an equivalent key).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariantId(String);

impl VariantId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File stem of the identifier (`"/a/01_smile.png"` -> `"01_smile"`).
    pub fn stem(&self) -> String {
        Path::new(&self.0)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.clone())
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VariantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for VariantId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Where a variant's pixels come from.
#[derive(Clone, Debug)]
pub enum RasterSource {
    /// Already decoded; shared by every combination of the session.
    Memory(Arc<Raster>),
    /// Encoded image on disk, decoded by the compositor when needed.
    File(PathBuf),
}

/// One concrete image choice for a layer group.
#[derive(Clone, Debug)]
pub struct ImageVariant {
    /// Stable identity.
    pub id: VariantId,
    /// Pairing token, see [`SequenceTag`].
    pub sequence_tag: SequenceTag,
    /// Pixel source.
    pub source: RasterSource,
}

impl ImageVariant {
    /// Variant backed by an image file; the path doubles as identity.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            id: VariantId::new(path.to_string_lossy().into_owned()),
            sequence_tag: SequenceTag::from_file_name(&path),
            source: RasterSource::File(path),
        }
    }

    /// Variant backed by a decoded raster. The tag is still derived from `id`'s file name.
    pub fn in_memory(id: impl Into<VariantId>, raster: Raster) -> Self {
        let id = id.into();
        Self {
            sequence_tag: SequenceTag::from_file_name(id.as_str()),
            id,
            source: RasterSource::Memory(Arc::new(raster)),
        }
    }

    /// Override the extracted tag.
    pub fn with_tag(mut self, tag: SequenceTag) -> Self {
        self.sequence_tag = tag;
        self
    }

    /// Base name used in export file names.
    pub fn base_name(&self) -> String {
        self.id.stem()
    }
}

/// Something a variant can be declared incompatible with.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MutexTarget {
    /// Every variant of the named group.
    Group(String),
    /// One specific variant of one group.
    Variant {
        /// Owning group name.
        group: String,
        /// Variant identity inside that group.
        id: VariantId,
    },
}

impl MutexTarget {
    /// Shorthand for [`MutexTarget::Group`].
    pub fn group(name: impl Into<String>) -> Self {
        Self::Group(name.into())
    }

    /// Shorthand for [`MutexTarget::Variant`].
    pub fn variant(group: impl Into<String>, id: impl Into<VariantId>) -> Self {
        Self::Variant {
            group: group.into(),
            id: id.into(),
        }
    }

    /// Return `true` when this target names `group`, either whole or through `variant`.
    pub fn matches(&self, group: &str, variant: &VariantId) -> bool {
        match self {
            Self::Group(name) => name == group,
            Self::Variant { group: g, id } => g == group && id == variant,
        }
    }

    /// Name of the group this target refers to.
    pub fn group_name(&self) -> &str {
        match self {
            Self::Group(name) => name,
            Self::Variant { group, .. } => group,
        }
    }
}

impl fmt::Display for MutexTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(name) => write!(f, "group:{name}"),
            Self::Variant { group, id } => write!(f, "variant:{group}/{id}"),
        }
    }
}

/// A named, ordered slot in the composition holding interchangeable variants.
#[derive(Clone, Debug)]
pub struct LayerGroup {
    /// Unique group name.
    pub name: String,
    /// Render order; higher renders on top. Unique among enabled groups.
    pub order: i32,
    /// Disabled groups take no part in generation or rendering.
    pub enabled: bool,
    /// Variants in display order.
    pub variants: Vec<ImageVariant>,
    /// Exclusions declared per variant of this group.
    pub mutex_settings: BTreeMap<VariantId, BTreeSet<MutexTarget>>,
    /// Index of the editor's selected variant.
    pub current: usize,
}

impl LayerGroup {
    /// Empty, enabled group.
    pub fn new(name: impl Into<String>, order: i32) -> Self {
        Self {
            name: name.into(),
            order,
            enabled: true,
            variants: Vec::new(),
            mutex_settings: BTreeMap::new(),
            current: 0,
        }
    }

    /// Builder-style variant append.
    pub fn with_variant(mut self, variant: ImageVariant) -> Self {
        self.variants.push(variant);
        self
    }

    /// Builder-style mutex declaration for the variant `id`.
    pub fn with_mutex(
        mut self,
        id: impl Into<VariantId>,
        targets: impl IntoIterator<Item = MutexTarget>,
    ) -> Self {
        self.mutex_settings
            .entry(id.into())
            .or_default()
            .extend(targets);
        self
    }

    /// Look up a variant by identity.
    pub fn variant(&self, id: &VariantId) -> Option<&ImageVariant> {
        self.variants.iter().find(|v| &v.id == id)
    }

    /// Exclusions declared on `id`, if any.
    pub fn mutex_for(&self, id: &VariantId) -> Option<&BTreeSet<MutexTarget>> {
        self.mutex_settings.get(id)
    }

    /// Variants eligible for `tag` (exact match or wildcard), in display order.
    pub fn candidates_for<'a, 't>(
        &'a self,
        tag: &'t SequenceTag,
    ) -> impl Iterator<Item = &'a ImageVariant> {
        self.variants
            .iter()
            .filter(move |v| v.sequence_tag.matches(tag))
    }

    /// The editor's selected variant.
    pub fn current_variant(&self) -> Option<&ImageVariant> {
        self.variants.get(self.current)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/layer.rs"]
mod tests;
