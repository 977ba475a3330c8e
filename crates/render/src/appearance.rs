use pixelgrab_kernel::GrabbableObject;

/// 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BACKGROUND: Self = Self::rgb(245, 245, 245);
    pub const BOX_FILL: Self = Self::rgb(230, 41, 55);
    pub const BOX_WIRE: Self = Self::rgb(190, 33, 55);
    pub const SIGHTED_FILL: Self = Self::rgb(255, 161, 0);
    pub const HELD_FILL: Self = Self::rgb(253, 249, 0);
    pub const HELD_WIRE: Self = Self::rgb(80, 80, 80);
    pub const GRID_AXIS: Self = Self::rgb(128, 128, 128);
    pub const GRID_LINE: Self = Self::rgb(191, 191, 191);
    pub const CROSSHAIR: Self = Self::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Linear-light RGBA for writing into sRGB render targets.
    pub fn to_linear(self) -> [f32; 4] {
        fn channel(c: u8) -> f32 {
            let c = c as f32 / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        [
            channel(self.r),
            channel(self.g),
            channel(self.b),
            self.a as f32 / 255.0,
        ]
    }
}

/// How one box is drawn: a filled cube plus a wireframe outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeStyle {
    pub fill: Color,
    pub wire: Color,
}

/// Maps an object's interaction flags to its look.
pub trait AppearancePolicy {
    fn appearance(&self, object: &GrabbableObject) -> CubeStyle;
}

/// Every box looks the same regardless of sight or grab state.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlatAppearance;

impl AppearancePolicy for FlatAppearance {
    fn appearance(&self, _object: &GrabbableObject) -> CubeStyle {
        CubeStyle {
            fill: Color::BOX_FILL,
            wire: Color::BOX_WIRE,
        }
    }
}

/// Tints sighted boxes and, more strongly, the held one.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighlightAppearance;

impl AppearancePolicy for HighlightAppearance {
    fn appearance(&self, object: &GrabbableObject) -> CubeStyle {
        if object.is_grabbed() {
            CubeStyle {
                fill: Color::HELD_FILL,
                wire: Color::HELD_WIRE,
            }
        } else if object.is_looked_at() {
            CubeStyle {
                fill: Color::SIGHTED_FILL,
                wire: Color::BOX_WIRE,
            }
        } else {
            FlatAppearance.appearance(object)
        }
    }
}
