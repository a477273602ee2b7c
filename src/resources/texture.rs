//! Texture Resource
//!
//! A texture is a pixel-surface asset: format, compression, filtering and
//! wrap state, plus the raw byte storage the backend uploads from. Storage is
//! organized as sides (one, or six for cubemaps), each side a mip chain of
//! byte buffers, mip 0 first.
//!
//! # Invariant
//!
//! Every mip buffer holds exactly [`Texture::size`] bytes for its level
//! dimensions under the current format and compression. `resize` reallocates
//! all sides and mips to match and discards prior contents.

use glam::Vec2;

/// Uncompressed pixel layout of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Single 8-bit channel.
    R8,
    /// 8-bit RGB, tightly packed.
    Rgb8,
    /// 8-bit RGBA.
    Rgba8,
    /// 10-bit RGB with 2-bit alpha.
    Rgb10A2,
    /// Half-float RGBA (HDR intermediate targets).
    Rgba16Float,
    /// 32-bit depth.
    Depth,
    /// Full-float RGBA (data textures, e.g. bone matrices).
    Rgba32Float,
}

impl PixelFormat {
    /// Bytes per pixel when stored uncompressed.
    #[must_use]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::R8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 | PixelFormat::Rgb10A2 | PixelFormat::Depth => 4,
            PixelFormat::Rgba16Float => 8,
            PixelFormat::Rgba32Float => 16,
        }
    }
}

/// Block-compression scheme applied to the stored surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    /// Raw pixels, no compression.
    #[default]
    None,
    /// BC1: 4x4 blocks, 8 bytes per block.
    Dxt1,
    /// BC3: 4x4 blocks, 16 bytes per block.
    Dxt5,
    /// ETC2 RGB: 4x4 blocks, 8 bytes per block.
    Etc2,
}

/// Minification/magnification filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filtering {
    /// Nearest-neighbor.
    #[default]
    None,
    /// Linear within a mip level.
    Bilinear,
    /// Linear across mip levels.
    Trilinear,
}

/// Texture coordinate wrap behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Clamp to edge texels.
    #[default]
    Clamp,
    /// Tile.
    Repeat,
    /// Tile with mirroring.
    Mirrored,
}

/// One side of a texture: a mip chain of byte buffers, mip 0 first.
pub type Surface = Vec<Vec<u8>>;

/// Pixel-surface resource backing a GPU texture.
#[derive(Debug, Clone)]
pub struct Texture {
    width: u32,
    height: u32,
    format: PixelFormat,
    compression: Compression,
    pub filtering: Filtering,
    pub wrap: WrapMode,
    cubemap: bool,
    sides: Vec<Surface>,
    /// Outline points for sprite tight-packing; empty for plain textures.
    pub shape: Vec<Vec2>,
    dirty: bool,
    version: u64,
}

impl Texture {
    /// Creates a flat 2D texture with a single zeroed mip level.
    #[must_use]
    pub fn new_2d(width: u32, height: u32, format: PixelFormat) -> Self {
        let mut texture = Self {
            width,
            height,
            format,
            compression: Compression::None,
            filtering: Filtering::default(),
            wrap: WrapMode::default(),
            cubemap: false,
            sides: Vec::new(),
            shape: Vec::new(),
            dirty: true,
            version: 0,
        };
        texture.sides = vec![texture.allocate_side(1)];
        texture
    }

    /// Creates a cubemap with six zeroed single-mip sides.
    #[must_use]
    pub fn new_cube(size: u32, format: PixelFormat) -> Self {
        let mut texture = Self::new_2d(size, size, format);
        texture.cubemap = true;
        texture.sides = (0..6).map(|_| texture.allocate_side(1)).collect();
        texture
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Changes the pixel format and reallocates all storage.
    pub fn set_format(&mut self, format: PixelFormat) {
        self.format = format;
        self.reallocate();
    }

    #[inline]
    #[must_use]
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Changes the compression scheme and reallocates all storage.
    pub fn set_compression(&mut self, compression: Compression) {
        self.compression = compression;
        self.reallocate();
    }

    #[inline]
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.compression != Compression::None
    }

    #[inline]
    #[must_use]
    pub fn is_cubemap(&self) -> bool {
        self.cubemap
    }

    /// Number of sides (1, or 6 for cubemaps).
    #[inline]
    #[must_use]
    pub fn side_count(&self) -> usize {
        self.sides.len()
    }

    /// Mip chain length of side 0.
    #[must_use]
    pub fn mip_count(&self) -> usize {
        self.sides.first().map_or(0, Vec::len)
    }

    /// Read access to one side's mip chain.
    #[must_use]
    pub fn surface(&self, side: usize) -> Option<&Surface> {
        self.sides.get(side)
    }

    /// Write access to one side's mip chain. The caller is expected to call
    /// [`Texture::set_dirty`] after modifying pixels.
    #[must_use]
    pub fn surface_mut(&mut self, side: usize) -> Option<&mut Surface> {
        self.sides.get_mut(side)
    }

    /// Appends a side (e.g. loading cubemap faces one by one).
    pub fn add_surface(&mut self, surface: Surface) {
        self.sides.push(surface);
        self.dirty = true;
    }

    /// Byte size of one mip level of `width` x `height` under the current
    /// format and compression. Block-compressed sizes round dimensions up to
    /// whole 4x4 blocks.
    #[must_use]
    pub fn size(&self, width: u32, height: u32) -> usize {
        let (w, h) = (width.max(1) as usize, height.max(1) as usize);
        match self.compression {
            Compression::None => w * h * self.format.bytes_per_pixel(),
            Compression::Dxt1 | Compression::Etc2 => w.div_ceil(4) * h.div_ceil(4) * 8,
            Compression::Dxt5 => w.div_ceil(4) * h.div_ceil(4) * 16,
        }
    }

    /// Resizes the texture, reallocating every side and mip to exactly the
    /// byte count the new dimensions require. Prior contents are discarded
    /// and the texture is marked dirty for backend re-upload.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.reallocate();
    }

    fn reallocate(&mut self) {
        let mips = self.mip_count().max(1);
        let sides = self.sides.len().max(if self.cubemap { 6 } else { 1 });
        self.sides = (0..sides).map(|_| self.allocate_side(mips)).collect();
        self.set_dirty();
    }

    fn allocate_side(&self, mips: usize) -> Surface {
        (0..mips)
            .map(|level| {
                let w = (self.width >> level).max(1);
                let h = (self.height >> level).max(1);
                vec![0u8; self.size(w, h)]
            })
            .collect()
    }

    /// Flags the pixel data as changed; the backend re-uploads before the
    /// next use.
    pub fn set_dirty(&mut self) {
        self.dirty = true;
        self.version = self.version.wrapping_add(1);
    }

    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Called by the backend once the current contents are uploaded.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Monotonic data version, bumped on every [`Texture::set_dirty`].
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}
