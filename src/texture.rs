use image::RgbaImage;

/// Tiling noise texture uploaded from an image, used for the displacement and
/// foam inputs.
pub struct NoiseTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl NoiseTexture {
    pub fn from_image(device: &wgpu::Device, queue: &wgpu::Queue, image: &RgbaImage, label: &str) -> Self {
        let (width, height) = image.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        // noise is data, not colour: keep it linear
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }

    /// Single opaque texel, used where a slot must be bound but is never sampled.
    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4], label: &str) -> Self {
        let image = RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
        Self::from_image(device, queue, &image, label)
    }
}

fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = x.wrapping_mul(0x8da6_b343) ^ y.wrapping_mul(0xd816_3841) ^ seed.wrapping_mul(0xcb1a_b31f);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2c1b_3c6d);
    h ^= h >> 12;
    h = h.wrapping_mul(0x297a_2d39);
    h ^ (h >> 15)
}

fn unit(h: u32) -> f32 {
    (h & 0x00ff_ffff) as f32 / 0x00ff_ffff as f32
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Smooth value noise on a `cells`×`cells` lattice that wraps at the image
/// edge. Red and green are independent layers so the result can drive a 2D
/// offset.
pub fn value_noise(size: u32, cells: u32, seed: u32) -> RgbaImage {
    let cells = cells.max(1);
    let sample = |u: f32, v: f32, layer: u32| {
        let (x, y) = (u * cells as f32, v * cells as f32);
        let (x0, y0) = (x.floor() as u32 % cells, y.floor() as u32 % cells);
        let (x1, y1) = ((x0 + 1) % cells, (y0 + 1) % cells);
        let fade = |t: f32| t * t * (3.0 - 2.0 * t);
        let (tx, ty) = (fade(x.fract()), fade(y.fract()));
        let corner = |cx, cy| unit(hash(cx, cy, seed.wrapping_add(layer)));
        let top = corner(x0, y0) + (corner(x1, y0) - corner(x0, y0)) * tx;
        let bottom = corner(x0, y1) + (corner(x1, y1) - corner(x0, y1)) * tx;
        top + (bottom - top) * ty
    };
    RgbaImage::from_fn(size, size, |px, py| {
        let (u, v) = (px as f32 / size as f32, py as f32 / size as f32);
        let r = to_byte(sample(u, v, 0));
        let g = to_byte(sample(u, v, 1));
        image::Rgba([r, g, r, 255])
    })
}

/// Tileable cellular noise: distance to the nearest of one jittered point per
/// cell, 0 on the points and approaching 1 at cell borders.
pub fn voronoi(size: u32, cells: u32, seed: u32) -> RgbaImage {
    let cells = cells.max(1);
    let n = cells as i64;
    RgbaImage::from_fn(size, size, |px, py| {
        let x = px as f32 / size as f32 * cells as f32;
        let y = py as f32 / size as f32 * cells as f32;
        let (cx, cy) = (x.floor() as i64, y.floor() as i64);
        let mut nearest = f32::MAX;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (gx, gy) = (cx + dx, cy + dy);
                let (wx, wy) = (gx.rem_euclid(n) as u32, gy.rem_euclid(n) as u32);
                let fx = gx as f32 + unit(hash(wx, wy, seed));
                let fy = gy as f32 + unit(hash(wx, wy, seed ^ 0x5bd1_e995));
                nearest = nearest.min(((fx - x).powi(2) + (fy - y).powi(2)).sqrt());
            }
        }
        let v = to_byte(nearest);
        image::Rgba([v, v, v, 255])
    })
}
