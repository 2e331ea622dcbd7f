//! The overlay map record: reference image metadata plus one element per
//! detected chord button, with image-relative bounding boxes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OverlayError;

pub const CHORD_TYPE: &str = "chord";
pub const HOLD_GESTURE: &str = "hold";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub width: u32,
    pub height: u32,
    pub image: String,
}

/// One interactive button region. `bbox` is `[x, y, w, h]` normalized by the
/// reference image size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordElement {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub root: String,
    #[serde(default)]
    pub quality: String,
    pub bbox: [f64; 4],
    #[serde(default)]
    pub gesture: String,
}

impl ChordElement {
    pub fn is_chord(&self) -> bool {
        self.kind == CHORD_TYPE
    }

    /// Left/top edges are inside, right/bottom edges are not.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let [bx, by, bw, bh] = self.bbox;
        x >= bx && x < bx + bw && y >= by && y < by + bh
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayMap {
    pub reference: Reference,
    pub elements: Vec<ChordElement>,
}

impl OverlayMap {
    /// Two-space indented JSON, no trailing newline.
    pub fn to_json_string(&self) -> Result<String, OverlayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, OverlayError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn read(path: &Path) -> Result<Self, OverlayError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn write(&self, path: &Path) -> Result<(), OverlayError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    pub fn element(&self, id: &str) -> Option<&ChordElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// First element whose box contains the normalized point.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&ChordElement> {
        self.elements.iter().find(|e| e.contains(x, y))
    }

    /// Moves every chord element's box down by its quality's offset, given in
    /// reference pixels. The new top edge is clamped to `[0, 1]`.
    ///
    /// Returns the number of elements moved.
    pub fn shift_rows(&mut self, nudge: &RowNudge) -> usize {
        let height = self.reference.height.max(1) as f64;
        let mut moved = 0usize;
        for element in self.elements.iter_mut().filter(|e| e.is_chord()) {
            let Some(px) = nudge.offset_for(&element.quality) else {
                continue;
            };
            element.bbox[1] = (element.bbox[1] + px / height).clamp(0.0, 1.0);
            moved += 1;
        }
        moved
    }
}

/// Per-quality vertical offsets in reference pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowNudge {
    offsets: Vec<(String, f64)>,
}

impl RowNudge {
    pub fn new<S: Into<String>>(offsets: impl IntoIterator<Item = (S, f64)>) -> Self {
        Self {
            offsets: offsets.into_iter().map(|(q, px)| (q.into(), px)).collect(),
        }
    }

    pub fn offset_for(&self, quality: &str) -> Option<f64> {
        self.offsets
            .iter()
            .find(|(q, _)| q == quality)
            .map(|&(_, px)| px)
    }
}
