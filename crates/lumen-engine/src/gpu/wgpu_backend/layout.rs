//! Uniform block packing and blend-state mapping.

use crate::gpu::{UniformDecl, UniformKind, UniformValue};
use crate::paint::{BlendFactor, BlendMode};

/// Dynamic uniform offsets must be multiples of this.
pub(super) const UNIFORM_ALIGN: u64 = 256;

#[derive(Debug, Clone)]
pub(super) struct UniformLayout {
    /// Byte offset per uniform location. `None` for samplers.
    pub slots: Vec<Option<u32>>,
    /// Block size, rounded to 16 and never zero.
    pub size: u32,
}

fn size_align(kind: UniformKind) -> Option<(u32, u32)> {
    Some(match kind {
        UniformKind::Float | UniformKind::Int => (4, 4),
        UniformKind::Vec2 => (8, 8),
        UniformKind::Vec3 => (12, 16),
        UniformKind::Vec4 => (16, 16),
        UniformKind::Mat3 => (48, 16),
        UniformKind::Mat4 => (64, 16),
        UniformKind::Sampler2D => return None,
    })
}

#[inline]
fn round_up(v: u32, align: u32) -> u32 {
    v.div_ceil(align) * align
}

#[inline]
pub(super) fn round_up_u64(v: u64, align: u64) -> u64 {
    v.div_ceil(align) * align
}

/// Lays the non-sampler uniforms out in declaration order with WGSL
/// uniform address space alignment.
pub(super) fn uniform_layout(decls: &[UniformDecl]) -> UniformLayout {
    let mut offset = 0u32;
    let slots = decls
        .iter()
        .map(|d| {
            let (size, align) = size_align(d.kind)?;
            let at = round_up(offset, align);
            offset = at + size;
            Some(at)
        })
        .collect();
    UniformLayout { slots, size: round_up(offset, 16).max(16) }
}

fn put(block: &mut [u8], offset: usize, floats: &[f32]) {
    let bytes: &[u8] = bytemuck::cast_slice(floats);
    if let Some(dst) = block.get_mut(offset..offset + bytes.len()) {
        dst.copy_from_slice(bytes);
    }
}

/// Writes `value` at `offset`. Sampler values are bound separately and ignored here.
pub(super) fn write_uniform(block: &mut [u8], offset: u32, value: &UniformValue) {
    let at = offset as usize;
    match value {
        UniformValue::Float(v) => put(block, at, &[*v]),
        UniformValue::Int(v) => {
            if let Some(dst) = block.get_mut(at..at + 4) {
                dst.copy_from_slice(&v.to_ne_bytes());
            }
        }
        UniformValue::Vec2(v) => put(block, at, v),
        UniformValue::Vec3(v) => put(block, at, v),
        UniformValue::Vec4(v) => put(block, at, v),
        UniformValue::Mat3(m) => {
            // mat3x3 columns are padded to vec4.
            let m = m.as_array();
            for col in 0..3 {
                put(block, at + col * 16, &m[col * 3..col * 3 + 3]);
            }
        }
        UniformValue::Mat4(m) => put(block, at, m),
        UniformValue::Sampler(_) => {}
    }
}

fn factor(f: BlendFactor) -> wgpu::BlendFactor {
    match f {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcColor => wgpu::BlendFactor::Src,
        BlendFactor::OneMinusSrcColor => wgpu::BlendFactor::OneMinusSrc,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendFactor::DstColor => wgpu::BlendFactor::Dst,
        BlendFactor::OneMinusDstColor => wgpu::BlendFactor::OneMinusDst,
        BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
        BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
    }
}

pub(super) fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: factor(mode.src),
        dst_factor: factor(mode.dst),
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState { color: component, alpha: component }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Mat3;

    fn decl(kind: UniformKind) -> UniformDecl {
        UniformDecl { name: String::new(), kind }
    }

    #[test]
    fn offsets_follow_wgsl_alignment() {
        let layout = uniform_layout(&[
            decl(UniformKind::Float),
            decl(UniformKind::Mat3),
            decl(UniformKind::Sampler2D),
            decl(UniformKind::Vec2),
            decl(UniformKind::Vec3),
        ]);
        assert_eq!(layout.slots, vec![Some(0), Some(16), None, Some(64), Some(80)]);
        assert_eq!(layout.size, 96);
    }

    #[test]
    fn empty_block_is_still_bindable() {
        assert_eq!(uniform_layout(&[decl(UniformKind::Sampler2D)]).size, 16);
    }

    #[test]
    fn mat3_columns_are_padded() {
        let mut block = vec![0u8; 48];
        let m = Mat3::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        write_uniform(&mut block, 0, &UniformValue::Mat3(m));
        let floats: Vec<f32> = block
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(floats, [1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0, 7.0, 8.0, 9.0, 0.0]);
    }
}
