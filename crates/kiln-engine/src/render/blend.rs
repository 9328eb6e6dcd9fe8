/// Framebuffer blend mode.
///
/// | mode     | src factor | dst factor          |
/// |----------|------------|---------------------|
/// | Opaque   | (disabled) | (disabled)          |
/// | Alpha    | SrcAlpha   | OneMinusSrcAlpha    |
/// | Additive | One        | One                 |
/// | Multiply | Dst        | Zero                |
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Opaque,
    #[default]
    Alpha,
    Additive,
    Multiply,
}

impl BlendMode {
    /// wgpu blend state for this mode. `None` disables blending.
    pub fn to_wgpu(self) -> Option<wgpu::BlendState> {
        let (src, dst) = match self {
            BlendMode::Opaque => return None,
            BlendMode::Alpha => (wgpu::BlendFactor::SrcAlpha, wgpu::BlendFactor::OneMinusSrcAlpha),
            BlendMode::Additive => (wgpu::BlendFactor::One, wgpu::BlendFactor::One),
            BlendMode::Multiply => (wgpu::BlendFactor::Dst, wgpu::BlendFactor::Zero),
        };
        let component = wgpu::BlendComponent {
            src_factor: src,
            dst_factor: dst,
            operation: wgpu::BlendOperation::Add,
        };
        Some(wgpu::BlendState { color: component, alpha: component })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_disables_blending() {
        assert!(BlendMode::Opaque.to_wgpu().is_none());
    }

    #[test]
    fn factor_table() {
        let alpha = BlendMode::Alpha.to_wgpu().unwrap();
        assert_eq!(alpha.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(alpha.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);

        let add = BlendMode::Additive.to_wgpu().unwrap();
        assert_eq!((add.color.src_factor, add.color.dst_factor), (wgpu::BlendFactor::One, wgpu::BlendFactor::One));

        let mul = BlendMode::Multiply.to_wgpu().unwrap();
        assert_eq!((mul.color.src_factor, mul.color.dst_factor), (wgpu::BlendFactor::Dst, wgpu::BlendFactor::Zero));
    }
}
