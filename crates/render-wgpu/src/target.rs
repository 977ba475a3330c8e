use glam::UVec2;

/// Color format of the low-resolution canvas.
pub const CANVAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Low-resolution color + depth target the 3D scene is drawn into.
///
/// Owned by the renderer alone; its GPU textures are destroyed when it drops.
pub struct OffscreenTarget {
    size: UVec2,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

impl OffscreenTarget {
    pub fn new(device: &wgpu::Device, size: UVec2) -> Self {
        let extent = wgpu::Extent3d {
            width: size.x.max(1),
            height: size.y.max(1),
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("canvas_color"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CANVAS_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("canvas_depth"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let color_view = color.create_view(&Default::default());
        let depth_view = depth.create_view(&Default::default());
        tracing::debug!(width = extent.width, height = extent.height, "offscreen target allocated");

        Self {
            size,
            color,
            color_view,
            depth,
            depth_view,
        }
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }
}

impl Drop for OffscreenTarget {
    fn drop(&mut self) {
        self.color.destroy();
        self.depth.destroy();
        tracing::debug!(width = self.size.x, height = self.size.y, "offscreen target released");
    }
}
