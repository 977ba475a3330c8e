use glam::{UVec2, Vec2};

/// Errors from building a canvas layout.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LayoutError {
    #[error("display size must be non-zero, got {width}x{height}")]
    EmptyDisplay { width: u32, height: u32 },
    #[error("downscale factor must be at least 1")]
    ZeroDownscale,
}

/// Axis-aligned rectangle in pixels, origin top-left, y down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Corners in normalized device coordinates for a display of `size`
    /// pixels: returns (top-left, bottom-right), with NDC y pointing up.
    pub fn to_ndc(&self, size: UVec2) -> (Vec2, Vec2) {
        let size = size.as_vec2();
        let to_ndc = |p: Vec2| Vec2::new(p.x / size.x * 2.0 - 1.0, 1.0 - p.y / size.y * 2.0);
        (
            to_ndc(Vec2::new(self.x, self.y)),
            to_ndc(Vec2::new(self.x + self.width, self.y + self.height)),
        )
    }
}

/// Where row zero of a render target lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOrigin {
    /// Row zero is the top row (wgpu, Vulkan, Metal, D3D).
    TopLeft,
    /// Row zero is the bottom row (OpenGL-style targets).
    BottomLeft,
}

/// Sizes and rectangles for the pixelated composite.
///
/// The scene renders into a canvas of `display / downscale` pixels, which is
/// then stretched over the display with a margin of `downscale` pixels on each
/// side so filtered edges fall off-screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasLayout {
    display: UVec2,
    canvas: UVec2,
    downscale: u32,
}

impl CanvasLayout {
    pub fn new(display_width: u32, display_height: u32, downscale: u32) -> Result<Self, LayoutError> {
        if display_width == 0 || display_height == 0 {
            return Err(LayoutError::EmptyDisplay {
                width: display_width,
                height: display_height,
            });
        }
        if downscale == 0 {
            return Err(LayoutError::ZeroDownscale);
        }
        let display = UVec2::new(display_width, display_height);
        let canvas = (display / downscale).max(UVec2::ONE);
        let display_size = display;
        tracing::debug!(display = ?display_size, ?canvas, downscale, "canvas layout");
        Ok(Self {
            display,
            canvas,
            downscale,
        })
    }

    pub fn display_size(&self) -> UVec2 {
        self.display
    }

    pub fn canvas_size(&self) -> UVec2 {
        self.canvas
    }

    pub fn downscale(&self) -> u32 {
        self.downscale
    }

    pub fn display_center(&self) -> Vec2 {
        (self.display / 2).as_vec2()
    }

    /// Where the canvas lands on the display, overscanned by the downscale factor.
    pub fn composite_dest(&self) -> Rect {
        let margin = self.downscale as f32;
        Rect::new(
            -margin,
            -margin,
            self.display.x as f32 + margin * 2.0,
            self.display.y as f32 + margin * 2.0,
        )
    }

    /// Region of the canvas to sample, in canvas pixels. A negative height
    /// reads the canvas bottom-up.
    pub fn composite_source(&self, origin: TargetOrigin) -> Rect {
        let (w, h) = (self.canvas.x as f32, self.canvas.y as f32);
        match origin {
            TargetOrigin::TopLeft => Rect::new(0.0, 0.0, w, h),
            TargetOrigin::BottomLeft => Rect::new(0.0, 0.0, w, -h),
        }
    }

    /// Texture coordinates for the top-left and bottom-right corners of the
    /// composite quad.
    pub fn source_uv(&self, origin: TargetOrigin) -> (Vec2, Vec2) {
        match origin {
            TargetOrigin::TopLeft => (Vec2::ZERO, Vec2::ONE),
            TargetOrigin::BottomLeft => (Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0)),
        }
    }

    /// Crosshair bars centered on the display: vertical 2x10, horizontal 10x2.
    pub fn crosshair(&self) -> [Rect; 2] {
        let cx = (self.display.x / 2) as f32;
        let cy = (self.display.y / 2) as f32;
        [
            Rect::new(cx - 1.0, cy - 5.0, 2.0, 10.0),
            Rect::new(cx - 5.0, cy - 1.0, 10.0, 2.0),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_is_display_over_factor() {
        let layout = CanvasLayout::new(1000, 600, 2).unwrap();
        assert_eq!(layout.canvas_size(), UVec2::new(500, 300));
        assert_eq!(layout.display_size(), UVec2::new(1000, 600));
    }

    #[test]
    fn tiny_display_keeps_one_pixel_canvas() {
        let layout = CanvasLayout::new(3, 3, 8).unwrap();
        assert_eq!(layout.canvas_size(), UVec2::ONE);
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        assert_eq!(CanvasLayout::new(1000, 600, 0), Err(LayoutError::ZeroDownscale));
        assert_eq!(
            CanvasLayout::new(0, 600, 2),
            Err(LayoutError::EmptyDisplay {
                width: 0,
                height: 600
            })
        );
    }

    #[test]
    fn dest_is_overscanned_by_factor() {
        let layout = CanvasLayout::new(1000, 600, 2).unwrap();
        assert_eq!(layout.composite_dest(), Rect::new(-2.0, -2.0, 1004.0, 604.0));
    }

    #[test]
    fn bottom_left_targets_are_flipped() {
        let layout = CanvasLayout::new(1000, 600, 2).unwrap();
        assert_eq!(
            layout.composite_source(TargetOrigin::BottomLeft),
            Rect::new(0.0, 0.0, 500.0, -300.0)
        );
        assert_eq!(
            layout.composite_source(TargetOrigin::TopLeft),
            Rect::new(0.0, 0.0, 500.0, 300.0)
        );
        let (tl, br) = layout.source_uv(TargetOrigin::BottomLeft);
        assert_eq!(tl.y, 1.0);
        assert_eq!(br.y, 0.0);
    }

    #[test]
    fn crosshair_is_centered() {
        let layout = CanvasLayout::new(1000, 600, 2).unwrap();
        let [vertical, horizontal] = layout.crosshair();
        assert_eq!(vertical, Rect::new(499.0, 295.0, 2.0, 10.0));
        assert_eq!(horizontal, Rect::new(495.0, 299.0, 10.0, 2.0));
        assert_eq!(layout.display_center(), Vec2::new(500.0, 300.0));
    }

    #[test]
    fn full_display_rect_maps_to_full_ndc() {
        let size = UVec2::new(1000, 600);
        let (tl, br) = Rect::new(0.0, 0.0, 1000.0, 600.0).to_ndc(size);
        assert_eq!(tl, Vec2::new(-1.0, 1.0));
        assert_eq!(br, Vec2::new(1.0, -1.0));
    }
}
