use std::borrow::Cow;

pub(crate) const QUAD: &str = include_str!("../shaders/quad.wgsl");
pub(crate) const SEED: &str = include_str!("../shaders/seed.wgsl");
pub(crate) const JFA_COMMON: &str = include_str!("../shaders/jfa_common.wgsl");
pub(crate) const JFA_FRAGMENT: &str = include_str!("../shaders/jfa_fragment.wgsl");
pub(crate) const JFA_COMPUTE: &str = include_str!("../shaders/jfa_compute.wgsl");
pub(crate) const JFA_STAR: &str = include_str!("../shaders/jfa_star.wgsl");
pub(crate) const JFA_ONE_SHOT: &str = include_str!("../shaders/jfa_one_shot.wgsl");
pub(crate) const DISTANCE_FIELD: &str = include_str!("../shaders/distance_field.wgsl");
pub(crate) const RADIANCE_COMMON: &str = include_str!("../shaders/radiance_common.wgsl");
pub(crate) const RADIANCE_FRAGMENT: &str = include_str!("../shaders/radiance_fragment.wgsl");
pub(crate) const RADIANCE_COMPUTE: &str = include_str!("../shaders/radiance_compute.wgsl");
pub(crate) const SHOW: &str = include_str!("../shaders/show.wgsl");

/// Concatenates WGSL fragments (shared declarations first) into one module.
pub(crate) fn create_module(
    device: &wgpu::Device,
    label: &str,
    parts: &[&str],
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(parts.join("\n"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(parts: &[&str]) {
        let source = parts.join("\n");
        let module = naga::front::wgsl::parse_str(&source)
            .unwrap_or_else(|err| panic!("{}", err.emit_to_string(&source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap_or_else(|err| panic!("{err:?}"));
    }

    #[test]
    fn every_module_validates() {
        validate(&[QUAD]);
        validate(&[SEED]);
        validate(&[JFA_COMMON, JFA_FRAGMENT]);
        validate(&[JFA_COMMON, JFA_COMPUTE]);
        validate(&[JFA_COMMON, JFA_STAR]);
        validate(&[JFA_COMMON, JFA_ONE_SHOT]);
        validate(&[DISTANCE_FIELD]);
        validate(&[RADIANCE_COMMON, RADIANCE_FRAGMENT]);
        validate(&[RADIANCE_COMMON, RADIANCE_COMPUTE]);
        validate(&[SHOW]);
    }
}
