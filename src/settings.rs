//! Curvelet transform settings.
//!
//! `DctSettings` mirrors the keyword arguments of the wrapping construction
//! (`is_real`, `finest`, `nbscales`, `nbangles_coarse`). A settings value is
//! immutable once handed to the builder; changing any field means building a
//! new curvelet system.

use crate::error::{CurveletError, Result};
use serde::{Deserialize, Serialize};

/// Wedge shape used at the finest scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Finest {
    /// Angular wedges at the finest scale too.
    Curvelets = 1,
    /// A single isotropic high-pass wedge at the finest scale.
    Wavelets = 2,
}

impl TryFrom<u8> for Finest {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Finest::Curvelets),
            2 => Ok(Finest::Wavelets),
            other => Err(format!("finest must be 1 or 2, got {other}")),
        }
    }
}

impl From<Finest> for u8 {
    fn from(value: Finest) -> u8 {
        value as u8
    }
}

pub const DEFAULT_NBANGLES_COARSE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DctSettings {
    pub is_real: bool,
    pub finest: Finest,
    pub nbscales: usize,
    pub nbangles_coarse: usize,
}

/// Partially specified settings as they appear in a config document.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsDocument {
    is_real: Option<bool>,
    finest: Option<Finest>,
    nbscales: Option<usize>,
    nbangles_coarse: Option<usize>,
}

impl DctSettings {
    pub fn new(is_real: bool, finest: Finest, nbscales: usize, nbangles_coarse: usize) -> Self {
        Self {
            is_real,
            finest,
            nbscales,
            nbangles_coarse,
        }
    }

    /// Toolbox defaults for an image of the given size.
    pub fn for_image(rows: usize, cols: usize) -> Self {
        Self::new(
            false,
            Finest::Wavelets,
            default_nbscales(rows, cols),
            DEFAULT_NBANGLES_COARSE,
        )
    }

    /// Parses a JSON settings document; missing keys take the defaults of
    /// [`DctSettings::for_image`].
    pub fn from_json_str(doc: &str, rows: usize, cols: usize) -> Result<Self> {
        let parsed: SettingsDocument = serde_json::from_str(doc)?;
        let base = Self::for_image(rows, cols);
        Ok(Self {
            is_real: parsed.is_real.unwrap_or(base.is_real),
            finest: parsed.finest.unwrap_or(base.finest),
            nbscales: parsed.nbscales.unwrap_or(base.nbscales),
            nbangles_coarse: parsed.nbangles_coarse.unwrap_or(base.nbangles_coarse),
        })
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn with_real(mut self, is_real: bool) -> Self {
        self.is_real = is_real;
        self
    }

    pub fn with_finest(mut self, finest: Finest) -> Self {
        self.finest = finest;
        self
    }

    pub fn with_nbscales(mut self, nbscales: usize) -> Self {
        self.nbscales = nbscales;
        self
    }

    pub fn with_nbangles_coarse(mut self, nbangles_coarse: usize) -> Self {
        self.nbangles_coarse = nbangles_coarse;
        self
    }

    /// Whether scale `scale` (0 = coarsest) is split into angular wedges.
    pub fn is_angular(&self, scale: usize) -> bool {
        if scale == 0 || scale >= self.nbscales {
            return false;
        }
        !(scale == self.nbscales - 1 && self.finest == Finest::Wavelets)
    }

    /// Number of wedges at each scale, coarsest first.
    pub fn wedges_per_scale(&self) -> Vec<usize> {
        (0..self.nbscales)
            .map(|scale| {
                if self.is_angular(scale) {
                    self.nbangles_coarse << ((scale - 1).div_ceil(2))
                } else {
                    1
                }
            })
            .collect()
    }

    pub fn total_wedges(&self) -> usize {
        self.wedges_per_scale().iter().sum()
    }

    /// Rejects settings the wrapping construction cannot honour for a
    /// `rows x cols` image.
    pub fn validate(&self, rows: usize, cols: usize) -> Result<()> {
        if rows < 2 || cols < 2 {
            return Err(CurveletError::construction(format!(
                "image must be at least 2x2, got {rows}x{cols}"
            )));
        }
        if self.nbscales < 2 {
            return Err(CurveletError::construction(format!(
                "nbscales must be at least 2, got {}",
                self.nbscales
            )));
        }
        if self.nbangles_coarse < 8 || self.nbangles_coarse % 4 != 0 {
            return Err(CurveletError::construction(format!(
                "nbangles_coarse must be a multiple of 4 and at least 8, got {}",
                self.nbangles_coarse
            )));
        }
        let coarse_radius = coarsest_flat_radius(self.nbscales) * rows.min(cols) as f64 / 2.0;
        if coarse_radius < 1.0 {
            return Err(CurveletError::construction(format!(
                "image {rows}x{cols} is too small for {} scales",
                self.nbscales
            )));
        }
        Ok(())
    }
}

/// `ceil(log2(min(rows, cols)) - 3)`, floored at two scales.
pub fn default_nbscales(rows: usize, cols: usize) -> usize {
    let side = rows.min(cols).max(1) as f64;
    let scales = (side.log2() - 3.0).ceil();
    if scales < 2.0 {
        2
    } else {
        scales as usize
    }
}

/// Normalized half-width of the flat part of the coarsest lowpass window.
pub(crate) fn coarsest_flat_radius(nbscales: usize) -> f64 {
    flat_radius(0, nbscales)
}

/// Normalized half-width of the flat part of lowpass `scale`; the window
/// reaches zero at twice this radius.
pub(crate) fn flat_radius(scale: usize, nbscales: usize) -> f64 {
    let steps = nbscales.saturating_sub(2).saturating_sub(scale) as i32;
    (1.0 / 3.0) * 0.5f64.powi(steps)
}
