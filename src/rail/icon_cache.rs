//! Icon cache.
//!
//! Fixed grid of `num_caches x num_cache_entries` slots plus one scratch
//! slot for icons the server marks as not cacheable. A window-icon order
//! decodes its bitmap into a slot; a cached-icon order re-reads one.
//!
//! The stored payload is the windowing system's icon property format: a
//! flat integer array of `2 + width * height` elements, width and height
//! first, then ARGB color values in left-to-right, top-down order. Color
//! values are copied element by element into [`IconDatum`] — the property
//! element width is the backend's choice and need not match the wire's
//! 32-bit pixel encoding.

use crate::error::RailError;
use crate::rail::orders::IconInfo;
use crate::settings::RailSettings;

/// Element type of the backend's bulk icon property.
pub type IconDatum = u32;

/// Wire value marking an icon that should not be cached.
pub const ICON_CACHE_NONE: u8 = 0xFF;

/// Resolved cache slot address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSlot {
    Cached { cache_id: u8, cache_entry: u16 },
    Scratch,
}

impl IconSlot {
    /// Map a wire (cacheId, cacheEntry) pair to a slot address. The
    /// "do not cache" sentinel resolves to the scratch slot regardless of
    /// the entry value.
    pub fn from_wire(cache_id: u8, cache_entry: u16) -> Self {
        if cache_id == ICON_CACHE_NONE {
            IconSlot::Scratch
        } else {
            IconSlot::Cached { cache_id, cache_entry }
        }
    }
}

/// One decoded icon.
#[derive(Debug, Clone, Default)]
pub struct RailIcon {
    data: Vec<IconDatum>,
}

impl RailIcon {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn width(&self) -> Option<IconDatum> {
        self.data.first().copied()
    }

    pub fn height(&self) -> Option<IconDatum> {
        self.data.get(1).copied()
    }

    /// Full property payload, width and height leading.
    pub fn data(&self) -> &[IconDatum] {
        &self.data
    }
}

/// Session icon cache. Grid bounds are fixed at construction from the
/// session-negotiated limits; no slot is ever allocated on lookup.
#[derive(Debug)]
pub struct IconCache {
    num_caches: u32,
    num_cache_entries: u32,
    entries: Vec<RailIcon>,
    scratch: RailIcon,
}

impl IconCache {
    pub fn new(settings: &RailSettings) -> Self {
        let slots = (settings.num_icon_caches as usize) * (settings.num_icon_cache_entries as usize);
        Self {
            num_caches: settings.num_icon_caches,
            num_cache_entries: settings.num_icon_cache_entries,
            entries: vec![RailIcon::default(); slots],
            scratch: RailIcon::default(),
        }
    }

    fn index(&self, cache_id: u8, cache_entry: u16) -> Result<usize, RailError> {
        if u32::from(cache_id) >= self.num_caches
            || u32::from(cache_entry) >= self.num_cache_entries
        {
            return Err(RailError::IconCacheBounds { cache_id, cache_entry });
        }
        Ok((self.num_cache_entries * u32::from(cache_id) + u32::from(cache_entry)) as usize)
    }

    pub fn lookup(&self, slot: IconSlot) -> Result<&RailIcon, RailError> {
        match slot {
            IconSlot::Scratch => Ok(&self.scratch),
            IconSlot::Cached { cache_id, cache_entry } => {
                let index = self.index(cache_id, cache_entry)?;
                Ok(&self.entries[index])
            }
        }
    }

    /// Decode an icon description into a slot. The decode runs into a
    /// temporary buffer; the slot is only replaced once the whole icon
    /// decoded, so a failure leaves the previous contents intact.
    pub fn store(&mut self, slot: IconSlot, info: &IconInfo) -> Result<&RailIcon, RailError> {
        let index = match slot {
            IconSlot::Scratch => None,
            IconSlot::Cached { cache_id, cache_entry } => {
                Some(self.index(cache_id, cache_entry)?)
            }
        };

        let data = decode_icon(info)?;

        let target = match index {
            None => &mut self.scratch,
            Some(index) => &mut self.entries[index],
        };
        target.data = data;
        Ok(&*target)
    }
}

/// Convert a device-independent bitmap icon description into the property
/// payload: `[width, height, pixel...]`.
fn decode_icon(info: &IconInfo) -> Result<Vec<IconDatum>, RailError> {
    let width = usize::from(info.width);
    let height = usize::from(info.height);

    if width == 0 || height == 0 || width * height > 1024 * 1024 {
        return Err(RailError::IconDecode(format!(
            "bad icon dimensions {}x{}",
            info.width, info.height
        )));
    }

    let pixels = decode_pixels(info, width, height)?;

    let mut data = Vec::with_capacity(2 + pixels.len());
    data.push(IconDatum::from(info.width));
    data.push(IconDatum::from(info.height));
    data.extend(pixels.iter().map(|&px| IconDatum::from(px)));
    Ok(data)
}

/// Decode the color bitmap into ARGB, top-down. DIB rows are stored
/// bottom-up with 4-byte-aligned strides.
fn decode_pixels(info: &IconInfo, width: usize, height: usize) -> Result<Vec<u32>, RailError> {
    let stride = color_stride(width, info.bpp)?;
    let needed = stride * height;
    if info.bits_color.len() < needed {
        return Err(RailError::IconDecode(format!(
            "color bitmap too short: {} < {}",
            info.bits_color.len(),
            needed
        )));
    }

    let mut pixels = vec![0u32; width * height];
    for y in 0..height {
        let row = &info.bits_color[(height - 1 - y) * stride..][..stride];
        for x in 0..width {
            pixels[y * width + x] = decode_pixel(info, row, x)?;
        }
    }

    // The AND mask punches masked pixels out. Icons at 32bpp carry their own
    // alpha channel and only fall back to the mask when that channel is
    // entirely unused.
    let use_mask = !info.bits_mask.is_empty()
        && (info.bpp < 32 || pixels.iter().all(|px| px >> 24 == 0));

    if info.bpp == 32 && use_mask {
        for px in &mut pixels {
            *px |= 0xFF00_0000;
        }
    }

    if use_mask {
        apply_mask(&info.bits_mask, &mut pixels, width, height)?;
    }

    Ok(pixels)
}

fn decode_pixel(info: &IconInfo, row: &[u8], x: usize) -> Result<u32, RailError> {
    match info.bpp {
        32 => {
            let p = &row[x * 4..][..4];
            Ok(u32::from(p[3]) << 24
                | u32::from(p[2]) << 16
                | u32::from(p[1]) << 8
                | u32::from(p[0]))
        }
        24 => {
            let p = &row[x * 3..][..3];
            Ok(0xFF00_0000 | u32::from(p[2]) << 16 | u32::from(p[1]) << 8 | u32::from(p[0]))
        }
        16 => {
            // X1R5G5B5
            let v = u16::from_le_bytes([row[x * 2], row[x * 2 + 1]]);
            let scale5 = |c: u16| u32::from(c) * 255 / 31;
            Ok(0xFF00_0000
                | scale5((v >> 10) & 0x1F) << 16
                | scale5((v >> 5) & 0x1F) << 8
                | scale5(v & 0x1F))
        }
        8 => palette_color(&info.color_table, usize::from(row[x])),
        4 => {
            let byte = row[x / 2];
            let index = if x % 2 == 0 { byte >> 4 } else { byte & 0x0F };
            palette_color(&info.color_table, usize::from(index))
        }
        1 => {
            let bit = (row[x / 8] >> (7 - x % 8)) & 1;
            palette_color(&info.color_table, usize::from(bit))
        }
        other => Err(RailError::IconDecode(format!("unsupported bit depth {other}"))),
    }
}

/// Palette entries are 4 bytes each: blue, green, red, reserved.
fn palette_color(table: &[u8], index: usize) -> Result<u32, RailError> {
    let entry = table
        .get(index * 4..index * 4 + 4)
        .ok_or_else(|| RailError::IconDecode(format!("palette index {index} out of range")))?;
    Ok(0xFF00_0000 | u32::from(entry[2]) << 16 | u32::from(entry[1]) << 8 | u32::from(entry[0]))
}

fn color_stride(width: usize, bpp: u16) -> Result<usize, RailError> {
    let bits = match bpp {
        1 => width,
        4 => width * 4,
        8 => width * 8,
        16 => width * 16,
        24 => width * 24,
        32 => width * 32,
        other => {
            return Err(RailError::IconDecode(format!("unsupported bit depth {other}")));
        }
    };
    Ok((bits.div_ceil(8) + 3) & !3)
}

fn apply_mask(mask: &[u8], pixels: &mut [u32], width: usize, height: usize) -> Result<(), RailError> {
    let stride = (width.div_ceil(8) + 3) & !3;
    if mask.len() < stride * height {
        return Err(RailError::IconDecode(format!(
            "mask bitmap too short: {} < {}",
            mask.len(),
            stride * height
        )));
    }
    for y in 0..height {
        let row = &mask[(height - 1 - y) * stride..][..stride];
        for x in 0..width {
            if (row[x / 8] >> (7 - x % 8)) & 1 == 1 {
                pixels[y * width + x] &= 0x00FF_FFFF;
            }
        }
    }
    Ok(())
}
