use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Mutex};

use ecow::EcoString;

use crate::font::{Font, FontVariant};
use crate::geom::Fixed;

/// Raw font data to instantiate faces from.
#[derive(Clone)]
pub struct FontSource {
    /// The raw data of the font file or collection.
    pub data: Arc<Vec<u8>>,
    /// The face's index within a collection; zero for plain files.
    pub index: u32,
    /// The path the data was read from. Layout serialization
    /// references fonts by this path.
    pub path: EcoString,
}

impl FontSource {
    /// A source for face zero of the given data.
    pub fn new(data: Arc<Vec<u8>>, path: impl Into<EcoString>) -> Self {
        Self { data, index: 0, path: path.into() }
    }

    /// Select a different face index within a collection.
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }
}

impl Debug for FontSource {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "FontSource({}@{})", self.path, self.index)
    }
}

/// A named set of font faces covering style/caps/weight variants.
///
/// Faces are instantiated per pixel size on demand and memoized, so a
/// family handed out by an immutable style sheet can still serve
/// layout calls on multiple threads.
pub struct FontFamily {
    name: EcoString,
    faces: Vec<(FontVariant, FontSource)>,
    cache: Mutex<HashMap<(i32, FontVariant), Font>>,
}

impl FontFamily {
    /// Create an empty family.
    pub fn new(name: impl Into<EcoString>) -> Self {
        Self {
            name: name.into(),
            faces: Vec::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The family's name.
    pub fn name(&self) -> &EcoString {
        &self.name
    }

    /// Register a source for a variant. A variant registered twice
    /// keeps its first source.
    pub fn add(&mut self, variant: FontVariant, source: FontSource) {
        if self.faces.iter().any(|(v, _)| *v == variant) {
            log::warn!("duplicate face for {:?} in family {}", variant, self.name);
            return;
        }
        self.faces.push((variant, source));
    }

    /// The face for an exact variant at a pixel size.
    ///
    /// There is no fuzzy fallback: a variant that was never registered
    /// yields `None` and the caller reports `FontNotFound`.
    pub fn best_face(&self, size: Fixed, variant: FontVariant) -> Option<Font> {
        let source = self
            .faces
            .iter()
            .find(|(v, _)| *v == variant)
            .map(|(_, source)| source)?;

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(font) = cache.get(&(size.get(), variant)) {
            return Some(font.clone());
        }

        let font = Font::new(source.clone(), size)?;
        cache.insert((size.get(), variant), font.clone());
        Some(font)
    }
}

impl Debug for FontFamily {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "FontFamily({}, {} faces)", self.name, self.faces.len())
    }
}
