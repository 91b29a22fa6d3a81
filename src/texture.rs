use std::path::Path;

use image::RgbaImage;

use crate::error::AssetError;
use crate::gpu::GpuContext;
use crate::model::{TextureId, TextureSource};

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct GpuTexture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl GpuTexture {
    /// Create a mipmapped texture from an RGBA image.
    ///
    /// The full mip chain is built on the CPU and uploaded in one go. Sampling
    /// repeats in both directions and filters linearly within and between mip
    /// levels.
    pub fn from_image(gpu: &GpuContext, image: &RgbaImage, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let (width, height) = image.dimensions();
        let mips = mip_chain(image);

        // LayerMajor with a single layer: level 0 first, then each smaller level.
        let data: Vec<u8> = mips.iter().flat_map(|level| level.as_raw().iter().copied()).collect();

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: mips.len() as u32,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// A 1x1 white texture, bound for meshes that are drawn untextured.
    pub fn white(gpu: &GpuContext) -> Self {
        let image = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        Self::from_image(gpu, &image, "White Texture")
    }
}

/// Decode an image file to RGBA, flipped so the first row is the bottom.
///
/// Texture coordinates in model files put `v = 0` at the bottom of the image.
pub fn decode(path: &Path) -> Result<RgbaImage, AssetError> {
    let mut image = image::open(path)?.to_rgba8();
    image::imageops::flip_vertical_in_place(&mut image);
    Ok(image)
}

/// Number of mip levels down to 1x1 for the given size.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Every mip level of `image`, largest first.
pub fn mip_chain(image: &RgbaImage) -> Vec<RgbaImage> {
    let (width, height) = image.dimensions();
    let levels = mip_level_count(width, height);

    let mut chain = Vec::with_capacity(levels as usize);
    chain.push(image.clone());
    for level in 1..levels {
        let w = (width >> level).max(1);
        let h = (height >> level).max(1);
        let next = image::imageops::resize(
            &chain[chain.len() - 1],
            w,
            h,
            image::imageops::FilterType::Triangle,
        );
        chain.push(next);
    }
    chain
}

/// Uploads textures to the GPU as models ask for them.
///
/// The id of a texture is its position in the store plus one.
pub struct GpuTextureStore<'a> {
    gpu: &'a GpuContext,
    textures: Vec<GpuTexture>,
}

impl<'a> GpuTextureStore<'a> {
    pub fn new(gpu: &'a GpuContext) -> Self {
        Self {
            gpu,
            textures: Vec::new(),
        }
    }

    /// The uploaded textures, indexed by `id - 1`.
    pub fn into_textures(self) -> Vec<GpuTexture> {
        self.textures
    }
}

impl TextureSource for GpuTextureStore<'_> {
    fn upload(&mut self, path: &Path) -> Result<TextureId, AssetError> {
        let image = decode(path)?;
        let texture = GpuTexture::from_image(self.gpu, &image, &path.to_string_lossy());
        log::info!(
            "loaded texture {} ({}x{})",
            path.display(),
            texture.width,
            texture.height
        );
        self.textures.push(texture);
        Ok(TextureId(self.textures.len() as u32))
    }
}
