use std::borrow::Cow;

use anyhow::{anyhow, Result};
use wgpu::naga::ShaderStage;

/// Builds a GLSL module and turns naga validation failures into errors
/// instead of leaving them to the device's uncaptured error handler.
fn glsl_module(
    device: &wgpu::Device,
    label: &str,
    source: &'static str,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(source),
            stage,
            defines: &[],
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(anyhow!("failed to compile {label}: {err}")),
        None => Ok(module),
    }
}

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    glsl_module(
        device,
        "fullscreen triangle vertex",
        VERTEX_SHADER_GLSL,
        ShaderStage::Vertex,
    )
}

pub(crate) fn compile_background_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    glsl_module(
        device,
        "colorbends fragment",
        BACKGROUND_SHADER_GLSL,
        ShaderStage::Fragment,
    )
}

pub(crate) fn compile_overlay_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    glsl_module(
        device,
        "overlay fragment",
        OVERLAY_SHADER_GLSL,
        ShaderStage::Fragment,
    )
}

pub(crate) fn compile_text_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    glsl_module(
        device,
        "text composite fragment",
        TEXT_SHADER_GLSL,
        ShaderStage::Fragment,
    )
}

/// Minimal full-screen triangle vertex shader. `v_uv` has its origin in the
/// bottom-left corner.
pub const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// Layered sinusoidal warp field. The block layout must match
/// [`crate::ColorBendsUniforms`].
pub const BACKGROUND_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform ColorBendsParams {
    vec2 uCanvas;
    vec2 uRot;
    vec2 uPointer;
    float uTime;
    float uSpeed;
    float uScale;
    float uFrequency;
    float uWarpStrength;
    float uMouseInfluence;
    float uParallax;
    float uNoise;
    int uColorCount;
    int uTransparent;
    vec3 uColors[8];
} params;

const int MAX_COLORS = 8;

float bendField(vec2 s, float phase, float t) {
    float freq = params.uFrequency;
    vec2 r = sin(1.5 * (s.yx * freq) + 2.0 * cos(s * freq));
    float m0 = length(r + sin(5.0 * r.y * freq - 3.0 * t + phase) / 4.0);

    float kBelow = clamp(params.uWarpStrength, 0.0, 1.0);
    float kMix = pow(kBelow, 0.3);
    float gain = 1.0 + max(params.uWarpStrength - 1.0, 0.0);
    vec2 warped = s + (r - s) * kBelow * gain;
    float m1 = length(warped + sin(5.0 * warped.y * freq - 3.0 * t + phase) / 4.0);

    float m = mix(m0, m1, kMix);
    return 1.0 - exp(-6.0 / exp(6.0 * m));
}

void main() {
    float t = params.uTime * params.uSpeed;
    vec2 p = v_uv * 2.0 - 1.0;
    p += params.uPointer * params.uParallax * 0.1;

    vec2 rp = vec2(
        p.x * params.uRot.x - p.y * params.uRot.y,
        p.x * params.uRot.y + p.y * params.uRot.x
    );
    vec2 q = vec2(rp.x * (params.uCanvas.x / params.uCanvas.y), rp.y);
    q /= max(params.uScale, 0.0001);
    q /= 0.5 + 0.2 * dot(q, q);
    q += 0.2 * cos(t) - 7.56;
    q += (params.uPointer - rp) * params.uMouseInfluence * 0.2;

    vec3 col = vec3(0.0);
    float a = 1.0;
    bool transparent = params.uTransparent > 0;

    if (params.uColorCount > 0) {
        vec2 s = q;
        vec3 sumCol = vec3(0.0);
        float cover = 0.0;
        for (int i = 0; i < MAX_COLORS; ++i) {
            if (i >= params.uColorCount) {
                break;
            }
            s -= 0.01;
            float w = bendField(s, float(i), t);
            sumCol += params.uColors[i] * w;
            cover = max(cover, w);
        }
        col = clamp(sumCol, 0.0, 1.0);
        a = transparent ? cover : 1.0;
    } else {
        vec2 s = q;
        s -= 0.01;
        float red = bendField(s, 0.0, t);
        s -= 0.01;
        float green = bendField(s, 1.0, t);
        s -= 0.01;
        float blue = bendField(s, 2.0, t);
        col = vec3(red, green, blue);
        a = transparent ? max(max(red, green), blue) : 1.0;
    }

    if (params.uNoise > 0.0001) {
        float n = fract(sin(dot(gl_FragCoord.xy + vec2(params.uTime), vec2(12.9898, 78.233))) * 43758.5453123);
        col += (n - 0.5) * params.uNoise;
        col = clamp(col, 0.0, 1.0);
    }

    vec3 rgb = transparent ? col * a : col;
    outColor = vec4(rgb, a);
}
";

/// Signed-distance rounded rectangles in logical pixels. The block layout
/// must match `OverlayUniforms`.
pub const OVERLAY_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

struct Panel {
    vec4 rect;
    vec4 fill;
    vec4 fillEnd;
    vec4 border;
    vec4 glow;
    vec4 shape;
};

layout(std140, set = 0, binding = 0) uniform OverlayParams {
    vec4 viewport;
    Panel panels[16];
} overlay;

const int MAX_PANELS = 16;

float sdRoundedRect(vec2 p, vec2 halfSize, float radius) {
    vec2 q = abs(p) - halfSize + vec2(radius);
    return length(max(q, vec2(0.0))) + min(max(q.x, q.y), 0.0) - radius;
}

vec4 over(vec4 src, vec4 dst) {
    return src + dst * (1.0 - src.a);
}

void main() {
    vec2 p = gl_FragCoord.xy / max(overlay.viewport.z, 0.0001);
    int count = int(overlay.viewport.w);
    vec4 acc = vec4(0.0);

    for (int i = 0; i < MAX_PANELS; ++i) {
        if (i >= count) {
            break;
        }
        Panel panel = overlay.panels[i];
        vec2 halfSize = panel.rect.zw * 0.5;
        vec2 center = panel.rect.xy + halfSize;
        float d = sdRoundedRect(p - center, halfSize, panel.shape.x);

        if (panel.shape.w > 0.0 && d > 0.0) {
            float falloff = 1.0 - smoothstep(0.0, panel.shape.w, d);
            float glowAlpha = panel.glow.a * falloff * falloff;
            acc = over(vec4(panel.glow.rgb * glowAlpha, glowAlpha), acc);
        }

        vec4 fill = panel.fill;
        if (panel.shape.z > 0.5) {
            vec2 dir = vec2(0.70710678);
            float span = max(dot(panel.rect.zw, dir), 0.0001);
            float g = clamp(dot(p - panel.rect.xy, dir) / span, 0.0, 1.0);
            fill = mix(panel.fill, panel.fillEnd, g);
        }

        vec4 color = fill;
        if (panel.shape.y > 0.0) {
            float inner = clamp(0.5 - (d + panel.shape.y), 0.0, 1.0);
            color = mix(panel.border, fill, inner);
        }

        float coverage = clamp(0.5 - d, 0.0, 1.0);
        float alpha = color.a * coverage;
        acc = over(vec4(color.rgb * alpha, alpha), acc);
    }

    outColor = acc;
}
";

/// Samples the rasterised text layer, which is already premultiplied and
/// matches the surface pixel for pixel.
pub const TEXT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(set = 0, binding = 0) uniform texture2D uTextLayer;
layout(set = 0, binding = 1) uniform sampler uTextSampler;

void main() {
    vec2 uv = vec2(v_uv.x, 1.0 - v_uv.y);
    outColor = texture(sampler2D(uTextLayer, uTextSampler), uv);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_block_declares_every_uniform_in_order() {
        let names = [
            "vec2 uCanvas",
            "vec2 uRot",
            "vec2 uPointer",
            "float uTime",
            "float uSpeed",
            "float uScale",
            "float uFrequency",
            "float uWarpStrength",
            "float uMouseInfluence",
            "float uParallax",
            "float uNoise",
            "int uColorCount",
            "int uTransparent",
            "vec3 uColors[8]",
        ];
        let mut cursor = 0;
        for name in names {
            let found = BACKGROUND_SHADER_GLSL[cursor..]
                .find(name)
                .unwrap_or_else(|| panic!("{name} missing or out of order"));
            cursor += found + name.len();
        }
        assert!(BACKGROUND_SHADER_GLSL.contains("layout(std140, set = 0, binding = 0)"));
    }

    #[test]
    fn background_loop_is_bounded_by_palette_capacity() {
        assert!(BACKGROUND_SHADER_GLSL.contains(&format!(
            "const int MAX_COLORS = {};",
            crate::palette::MAX_COLORS
        )));
        assert!(BACKGROUND_SHADER_GLSL.contains("43758.5453123"));
    }

    #[test]
    fn overlay_block_capacity_matches_host() {
        assert!(OVERLAY_SHADER_GLSL.contains(&format!(
            "Panel panels[{}];",
            crate::overlay::MAX_PANELS
        )));
    }

    #[test]
    fn text_composite_flips_uv_to_top_left_origin() {
        assert!(TEXT_SHADER_GLSL.contains("1.0 - v_uv.y"));
        assert!(TEXT_SHADER_GLSL.contains("binding = 0) uniform texture2D"));
        assert!(TEXT_SHADER_GLSL.contains("binding = 1) uniform sampler"));
    }

    #[test]
    fn shaders_share_the_uv_varying() {
        for source in [
            VERTEX_SHADER_GLSL,
            BACKGROUND_SHADER_GLSL,
            OVERLAY_SHADER_GLSL,
            TEXT_SHADER_GLSL,
        ] {
            assert!(source.starts_with("#version 450"));
            assert!(source.contains("layout(location = 0)"));
            assert!(source.contains("vec2 v_uv;"));
        }
    }
}
