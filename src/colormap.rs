// Palette definitions and scalar-to-color mapping
//
// A palette is a piecewise-linear ramp over ordered (t, color) stops with
// t ∈ [0, 1]. Channel interpolation rounds half away from zero
// (`f64::round`), so the halfway point between 0 and 255 is 128.

use crate::slice::RawSlice;
use serde::{Deserialize, Serialize};

/// Guards normalization against a degenerate zero value range
const NORM_EPSILON: f64 = 1e-6;

/// Built-in color schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaletteId {
    BlueYellowRed,
    Viridis,
    Plasma,
    Inferno,
    CoolWarm,
    Rainbow,
    Grayscale,
    GreenRed,
}

impl PaletteId {
    pub const ALL: [PaletteId; 8] = [
        PaletteId::BlueYellowRed,
        PaletteId::Viridis,
        PaletteId::Plasma,
        PaletteId::Inferno,
        PaletteId::CoolWarm,
        PaletteId::Rainbow,
        PaletteId::Grayscale,
        PaletteId::GreenRed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PaletteId::BlueYellowRed => "blue-yellow-red",
            PaletteId::Viridis => "viridis",
            PaletteId::Plasma => "plasma",
            PaletteId::Inferno => "inferno",
            PaletteId::CoolWarm => "cool-warm",
            PaletteId::Rainbow => "rainbow",
            PaletteId::Grayscale => "grayscale",
            PaletteId::GreenRed => "green-red",
        }
    }
}

/// One color stop: position along the ramp plus RGB color
#[derive(Debug, Clone, Copy)]
pub struct PaletteStop {
    pub t: f64,
    pub rgb: [u8; 3],
}

const fn stop(t: f64, r: u8, g: u8, b: u8) -> PaletteStop {
    PaletteStop { t, rgb: [r, g, b] }
}

static BLUE_YELLOW_RED: [PaletteStop; 3] = [
    stop(0.0, 0, 0, 255),
    stop(0.5, 255, 255, 0),
    stop(1.0, 255, 0, 0),
];

static VIRIDIS: [PaletteStop; 4] = [
    stop(0.0, 68, 1, 84),
    stop(0.33, 49, 104, 142),
    stop(0.66, 53, 183, 121),
    stop(1.0, 253, 231, 37),
];

static PLASMA: [PaletteStop; 4] = [
    stop(0.0, 13, 8, 135),
    stop(0.33, 126, 3, 168),
    stop(0.66, 204, 71, 120),
    stop(1.0, 249, 148, 65),
];

static INFERNO: [PaletteStop; 4] = [
    stop(0.0, 0, 0, 4),
    stop(0.33, 86, 16, 110),
    stop(0.66, 187, 55, 84),
    stop(1.0, 249, 140, 10),
];

static COOL_WARM: [PaletteStop; 4] = [
    stop(0.0, 59, 76, 192),
    stop(0.33, 107, 142, 35),
    stop(0.66, 255, 215, 0),
    stop(1.0, 255, 69, 0),
];

static RAINBOW: [PaletteStop; 10] = [
    stop(0.0, 255, 0, 0),
    stop(0.1, 255, 128, 0),
    stop(0.2, 255, 255, 0),
    stop(0.3, 128, 255, 0),
    stop(0.4, 0, 255, 0),
    stop(0.5, 0, 255, 128),
    stop(0.6, 0, 255, 255),
    stop(0.7, 0, 128, 255),
    stop(0.8, 0, 0, 255),
    stop(1.0, 128, 0, 255),
];

static GRAYSCALE: [PaletteStop; 3] = [
    stop(0.0, 0, 0, 0),
    stop(0.5, 128, 128, 128),
    stop(1.0, 255, 255, 255),
];

static GREEN_RED: [PaletteStop; 3] = [
    stop(0.0, 0, 255, 0),
    stop(0.5, 255, 255, 0),
    stop(1.0, 255, 0, 0),
];

static PALETTES: [Palette; 8] = [
    Palette { id: PaletteId::BlueYellowRed, stops: &BLUE_YELLOW_RED },
    Palette { id: PaletteId::Viridis, stops: &VIRIDIS },
    Palette { id: PaletteId::Plasma, stops: &PLASMA },
    Palette { id: PaletteId::Inferno, stops: &INFERNO },
    Palette { id: PaletteId::CoolWarm, stops: &COOL_WARM },
    Palette { id: PaletteId::Rainbow, stops: &RAINBOW },
    Palette { id: PaletteId::Grayscale, stops: &GRAYSCALE },
    Palette { id: PaletteId::GreenRed, stops: &GREEN_RED },
];

/// Piecewise-linear color ramp
pub struct Palette {
    pub id: PaletteId,
    stops: &'static [PaletteStop],
}

impl Palette {
    pub fn get(id: PaletteId) -> &'static Palette {
        &PALETTES[PaletteId::ALL.iter().position(|&p| p == id).unwrap_or(0)]
    }

    /// Color at normalized position `t`; values outside [0, 1] clamp to the
    /// endpoint colors
    pub fn sample(&self, t: f64) -> [u8; 3] {
        let t = t.clamp(0.0, 1.0);

        let first = &self.stops[0];
        if t <= first.t {
            return first.rgb;
        }

        for pair in self.stops.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if t <= b.t {
                let local = (t - a.t) / (b.t - a.t);
                return [
                    lerp_channel(a.rgb[0], b.rgb[0], local),
                    lerp_channel(a.rgb[1], b.rgb[1], local),
                    lerp_channel(a.rgb[2], b.rgb[2], local),
                ];
            }
        }

        self.stops[self.stops.len() - 1].rgb
    }

    /// Map a raw scalar into the ramp: `t = (value - min) / (max - min + ε)`,
    /// clamped to [0, 1]. A degenerate range (max == min) collapses to the
    /// t=0 stop color instead of dividing by zero.
    pub fn to_rgba(&self, value: f64, min: f64, max: f64) -> [u8; 4] {
        let t = ((value - min) / (max - min + NORM_EPSILON)).clamp(0.0, 1.0);
        let [r, g, b] = self.sample(t);
        [r, g, b, 255]
    }

    /// Like `to_rgba`, but a masked-out pixel is fully transparent no matter
    /// its value
    pub fn to_rgba_masked(&self, value: f64, min: f64, max: f64, inside: bool) -> [u8; 4] {
        if inside {
            self.to_rgba(value, min, max)
        } else {
            [0, 0, 0, 0]
        }
    }

    /// Color an entire raw slice. With no masked-in pixels (`value_range`
    /// absent) the raster is fully transparent.
    pub fn render(&self, raw: &RawSlice) -> SliceRaster {
        let pixels = match raw.value_range {
            Some((min, max)) => raw
                .values
                .iter()
                .zip(&raw.mask)
                .map(|(&value, &inside)| self.to_rgba_masked(value, min, max, inside))
                .collect(),
            None => vec![[0, 0, 0, 0]; raw.values.len()],
        };

        SliceRaster {
            width: raw.resolution,
            height: raw.resolution,
            pixels,
            value_range: raw.value_range,
            palette: self.id,
        }
    }
}

fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

/// Color-mapped slice image plus the metadata a legend needs
#[derive(Debug, Clone, PartialEq)]
pub struct SliceRaster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 4]>,
    /// (min, max) over the masked-in values, `None` for an all-masked slice
    pub value_range: Option<(f64, f64)>,
    pub palette: PaletteId,
}

impl SliceRaster {
    /// Flat RGBA byte buffer, suitable as texture or image input
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for px in &self.pixels {
            bytes.extend_from_slice(px);
        }
        bytes
    }

    pub fn is_fully_transparent(&self) -> bool {
        self.pixels.iter().all(|px| px[3] == 0)
    }
}
