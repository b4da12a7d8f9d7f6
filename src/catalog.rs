//! The fixed affective descriptor catalog.
//!
//! Each descriptor belongs to one category and carries the RGBA color its
//! blob is painted with. Catalog order matters: it is the order descriptors
//! are listed in, and the order the interactive viewer blends them in.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;

use crate::error::{TerrainError, TerrainResult};

/// RGBA color with components in [0, 1].
pub type Rgba = [f64; 4];

/// Selections larger than this still work but crowd the map.
pub const SUGGESTED_MAX_SELECTION: usize = 10;

/// Number of leading catalog entries selected when the caller picks none.
pub const DEFAULT_SELECTION_LEN: usize = 4;

/// Separator between category and name in an option label.
const LABEL_SEPARATOR: &str = " - ";

/// A named affective quality and the color used to draw it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Descriptor {
    pub name: &'static str,
    pub category: &'static str,
    pub color: Rgba,
}

impl Descriptor {
    const fn new(name: &'static str, category: &'static str, color: Rgba) -> Self {
        Self { name, category, color }
    }

    /// Display label, e.g. `"Tension / Unease - uneasy"`.
    pub fn label(&self) -> String {
        format!("{}{}{}", self.category, LABEL_SEPARATOR, self.name)
    }
}

// Category colors
const TENSION: Rgba = [1.0, 0.2, 0.2, 1.0];
const MELANCHOLY: Rgba = [0.2, 0.4, 1.0, 1.0];
const STILLNESS: Rgba = [0.4, 0.6, 1.0, 1.0];
const SUBLIMITY: Rgba = [0.6, 0.2, 0.8, 1.0];
const EXPOSURE: Rgba = [1.0, 0.1, 0.1, 1.0];
const INTENSITY: Rgba = [0.9, 0.0, 0.1, 1.0];
const LIGHTNESS: Rgba = [1.0, 0.9, 0.3, 1.0];
const GRAVITAS: Rgba = [0.5, 0.5, 0.5, 1.0];
const UNCANNY: Rgba = [1.0, 0.5, 0.2, 1.0];
const META: Rgba = [0.8, 0.4, 0.9, 1.0];

/// The built-in descriptor table, in display order.
pub static DESCRIPTORS: [Descriptor; 18] = [
    Descriptor::new("uneasy", "Tension / Unease", TENSION),
    Descriptor::new("tense", "Tension / Unease", TENSION),
    Descriptor::new("anxious", "Tension / Unease", TENSION),
    Descriptor::new("melancholic", "Melancholy / Sentimentality", MELANCHOLY),
    Descriptor::new("nostalgic", "Melancholy / Sentimentality", MELANCHOLY),
    Descriptor::new("poignant", "Melancholy / Sentimentality", MELANCHOLY),
    Descriptor::new("still", "Stillness / Drift", STILLNESS),
    Descriptor::new("sublime", "Sublimity / Ominousness", SUBLIMITY),
    Descriptor::new("ominous", "Sublimity / Ominousness", SUBLIMITY),
    Descriptor::new("exposed", "Explicitness / Exposure", EXPOSURE),
    Descriptor::new("intense", "Excess / Intensity", INTENSITY),
    Descriptor::new("playful", "Play / Lightness", LIGHTNESS),
    Descriptor::new("light", "Play / Lightness", LIGHTNESS),
    Descriptor::new("serious", "Gravitas / Seriousness", GRAVITAS),
    Descriptor::new("weighty", "Gravitas / Seriousness", GRAVITAS),
    Descriptor::new("strange", "Strangeness / Uncanny", UNCANNY),
    Descriptor::new("uncanny", "Strangeness / Uncanny", UNCANNY),
    Descriptor::new("meta", "meta-affect", META),
];

/// Immutable descriptor table with a name index.
#[derive(Debug)]
pub struct Catalog {
    entries: &'static [Descriptor],
    by_name: HashMap<&'static str, usize>,
}

impl Catalog {
    /// Index a descriptor table. Names must be unique.
    pub fn new(entries: &'static [Descriptor]) -> TerrainResult<Self> {
        let mut by_name = HashMap::with_capacity(entries.len());
        for (idx, descriptor) in entries.iter().enumerate() {
            if by_name.insert(descriptor.name, idx).is_some() {
                return Err(TerrainError::DuplicateDescriptor(descriptor.name.to_string()));
            }
        }
        Ok(Self { entries, by_name })
    }

    /// The built-in catalog, indexed on first use.
    pub fn builtin() -> &'static Catalog {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            Catalog::new(&DESCRIPTORS).expect("built-in descriptor names are unique")
        })
    }

    pub fn entries(&self) -> &'static [Descriptor] {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of a descriptor in catalog order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&'static Descriptor> {
        self.position(name).map(|idx| &self.entries[idx])
    }

    /// Look up a descriptor by name, failing on names outside the catalog.
    pub fn lookup(&self, name: &str) -> TerrainResult<&'static Descriptor> {
        self.get(name)
            .ok_or_else(|| TerrainError::unknown_descriptor(name))
    }

    /// Resolve either a bare name (`"uneasy"`) or an option label
    /// (`"Tension / Unease - uneasy"`).
    pub fn resolve(&self, token: &str) -> TerrainResult<&'static Descriptor> {
        let token = token.trim();
        if let Some(descriptor) = self.get(token) {
            return Ok(descriptor);
        }
        // Category names contain " / " but never " - ", so split on the last one.
        if let Some((category, name)) = token.rsplit_once(LABEL_SEPARATOR) {
            if let Some(descriptor) = self.get(name.trim()) {
                if descriptor.category == category.trim() {
                    return Ok(descriptor);
                }
            }
        }
        Err(TerrainError::unknown_descriptor(token))
    }

    /// Every descriptor as pretty JSON, in catalog order.
    pub fn to_json(&self) -> TerrainResult<String> {
        Ok(serde_json::to_string_pretty(self.entries)?)
    }

    /// Option labels in catalog order.
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(Descriptor::label).collect()
    }

    /// Distinct categories in order of first appearance.
    pub fn categories(&self) -> Vec<&'static str> {
        let mut categories: Vec<&'static str> = Vec::new();
        for descriptor in self.entries {
            if !categories.contains(&descriptor.category) {
                categories.push(descriptor.category);
            }
        }
        categories
    }

    /// The selection used when the caller does not choose one.
    pub fn default_selection(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .take(DEFAULT_SELECTION_LEN)
            .map(|d| d.name)
            .collect()
    }

    /// Reduce a selection to the distinct selected descriptors in catalog
    /// order, the way a multi-select option list reports them.
    pub fn in_catalog_order<S: AsRef<str>>(&self, selected: &[S]) -> TerrainResult<Vec<&'static str>> {
        let mut flags = vec![false; self.entries.len()];
        for name in selected {
            let name = name.as_ref();
            let idx = self
                .position(name)
                .ok_or_else(|| TerrainError::unknown_descriptor(name))?;
            flags[idx] = true;
        }
        Ok(self
            .entries
            .iter()
            .zip(flags)
            .filter_map(|(d, selected)| selected.then_some(d.name))
            .collect())
    }
}
