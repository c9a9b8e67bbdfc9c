//! Simulation texture pair and palette texture.

use wgpu::{
    AddressMode, Device, Extent3d, FilterMode, Queue, Sampler, SamplerDescriptor, Texture,
    TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor,
    util::{DeviceExt, TextureDataOrder},
};

use crate::{palette::Palette, sim::gather};

/// Format of both simulation textures. Unorm so the red channel reads back
/// as a plain fraction.
pub const SIM_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

/// Create a single-mip 2D texture, optionally with initial contents.
#[allow(clippy::too_many_arguments)]
pub fn create_texture(
    device: &Device,
    queue: &Queue,
    label: &str,
    width: u32,
    height: u32,
    format: TextureFormat,
    usage: TextureUsages,
    pixels: Option<&[u8]>,
) -> Texture {
    let desc = TextureDescriptor {
        label: Some(label),
        size: Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format,
        usage: usage | TextureUsages::COPY_DST,
        view_formats: &[],
    };
    log::debug!("creating texture `{label}` ({width}x{height} {format:?})");
    match pixels {
        Some(data) => device.create_texture_with_data(queue, &desc, TextureDataOrder::LayerMajor, data),
        None => device.create_texture(&desc),
    }
}

/// Sampler shared by every lookup: no blending between cells, no wrap-around
/// at the edges.
pub fn nearest_clamp_sampler(device: &Device) -> Sampler {
    device.create_sampler(&SamplerDescriptor {
        label: Some("nearest clamp sampler"),
        address_mode_u: AddressMode::ClampToEdge,
        address_mode_v: AddressMode::ClampToEdge,
        address_mode_w: AddressMode::ClampToEdge,
        mag_filter: FilterMode::Nearest,
        min_filter: FilterMode::Nearest,
        mipmap_filter: FilterMode::Nearest,
        ..Default::default()
    })
}

/// Initial RGBA contents of the front texture: the fuel line at full heat.
pub fn seed_pixels(width: u32, height: u32) -> Vec<u8> {
    gather::seed_intensities(width as usize, height as usize)
        .into_iter()
        .flat_map(|r| [r, 0, 0, if r > 0 { 255 } else { 0 }])
        .collect()
}

/// Two equally sized simulation textures used alternately as read source and
/// write target. `front` names the one holding the latest completed state.
pub struct SimTexturePair {
    textures: [Texture; 2],
    views: [TextureView; 2],
    front: usize,
    width: u32,
    height: u32,
}

impl SimTexturePair {
    pub fn new(device: &Device, queue: &Queue, width: u32, height: u32) -> Self {
        let usage = TextureUsages::TEXTURE_BINDING
            | TextureUsages::RENDER_ATTACHMENT
            | TextureUsages::COPY_SRC;
        let seed = seed_pixels(width, height);
        // only the initial front needs seeding; the first tick fills the back
        let textures = [
            create_texture(device, queue, "simulation texture 0", width, height, SIM_FORMAT, usage, Some(&seed)),
            create_texture(device, queue, "simulation texture 1", width, height, SIM_FORMAT, usage, None),
        ];
        let views = [
            textures[0].create_view(&TextureViewDescriptor::default()),
            textures[1].create_view(&TextureViewDescriptor::default()),
        ];
        Self {
            textures,
            views,
            front: 0,
            width,
            height,
        }
    }

    pub fn front(&self) -> usize {
        self.front
    }

    pub fn back(&self) -> usize {
        self.front ^ 1
    }

    /// The back texture now holds the newest state.
    pub fn swap(&mut self) {
        self.front ^= 1;
    }

    pub fn texture(&self, index: usize) -> &Texture {
        &self.textures[index]
    }

    pub fn view(&self, index: usize) -> &TextureView {
        &self.views[index]
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// The palette as an N x 1 texture.
///
/// When the render target is sRGB the texture is too, so the bytes that come
/// out on screen are the palette's bytes.
pub fn create_palette_texture(
    device: &Device,
    queue: &Queue,
    palette: &Palette,
    target_format: TextureFormat,
) -> (Texture, TextureView) {
    let format = if target_format.is_srgb() {
        TextureFormat::Rgba8UnormSrgb
    } else {
        TextureFormat::Rgba8Unorm
    };
    let texture = create_texture(
        device,
        queue,
        "palette texture",
        palette.len() as u32,
        1,
        format,
        TextureUsages::TEXTURE_BINDING,
        Some(&palette.to_rgba_bytes()),
    );
    let view = texture.create_view(&TextureViewDescriptor::default());
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_lights_only_the_bottom_row() {
        let pixels = seed_pixels(4, 3);
        assert_eq!(pixels.len(), 4 * 3 * 4);
        assert!(pixels[..2 * 4 * 4].iter().all(|&b| b == 0));
        for px in pixels[2 * 4 * 4..].chunks(4) {
            assert_eq!(px, &[255, 0, 0, 255]);
        }
    }
}
