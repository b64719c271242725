use anyhow::{anyhow, Result};
use glam::{Mat4, Vec3, Vec4};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::common::{CameraParams, DrawItem, LightParams};

/// Renderer backed by a 2D canvas for WebAssembly builds.
///
/// Each mesh is drawn as the screen-space rectangle covering its projected
/// bounds, in draw-list order.
pub struct Renderer {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    size: (u32, u32),
    view_proj: Mat4,
    light: LightParams,
}

impl Renderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let context = canvas
            .get_context("2d")
            .map_err(|err| anyhow!("failed to query canvas context: {err:?}"))?
            .ok_or_else(|| anyhow!("canvas does not support 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| anyhow!("failed to cast canvas context"))?;

        let size = (canvas.width(), canvas.height());
        Ok(Self {
            canvas,
            context,
            size,
            view_proj: Mat4::IDENTITY,
            light: LightParams::default(),
        })
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Updates the canvas dimensions to match the browser layout.
    pub fn resize(&mut self, new_size: (u32, u32)) {
        if new_size.0 == 0 || new_size.1 == 0 {
            return;
        }
        self.size = new_size;
        self.canvas.set_width(new_size.0);
        self.canvas.set_height(new_size.1);
    }

    pub fn update_globals(&mut self, camera: &CameraParams, light: &LightParams) {
        self.view_proj = camera.view_proj;
        self.light = light.clone();
    }

    pub fn render(&mut self, items: &[DrawItem]) -> Result<(), JsValue> {
        let (width, height) = (self.size.0 as f64, self.size.1 as f64);
        self.context.set_global_alpha(1.0);
        self.context.set_fill_style(&"#9ec7eb".into());
        self.context.fill_rect(0.0, 0.0, width, height);

        let tint = self.light.color * self.light.intensity.clamp(0.1, 1.0);
        for item in items {
            let Some((min, max)) = project_bounds(self.view_proj * item.model) else {
                continue;
            };
            let x = (min.x as f64 + 1.0) * 0.5 * width;
            let y = (1.0 - max.y as f64) * 0.5 * height;
            let w = (max.x - min.x) as f64 * 0.5 * width;
            let h = (max.y - min.y) as f64 * 0.5 * height;
            self.context.set_global_alpha(item.color.w as f64);
            self.context.set_fill_style(&css_color(item.color, tint).into());
            self.context.fill_rect(x, y, w, h);
        }
        self.context.set_global_alpha(1.0);
        Ok(())
    }
}

/// NDC extent of the unit cube under `clip`, or `None` when any corner lies
/// behind the camera or the box is entirely off screen.
fn project_bounds(clip: Mat4) -> Option<(Vec3, Vec3)> {
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for corner in 0..8u32 {
        let local = Vec4::new(
            if corner & 1 == 0 { -0.5 } else { 0.5 },
            if corner & 2 == 0 { -0.5 } else { 0.5 },
            if corner & 4 == 0 { -0.5 } else { 0.5 },
            1.0,
        );
        let projected = clip * local;
        if projected.w <= f32::EPSILON {
            return None;
        }
        let ndc = projected.truncate() / projected.w;
        min = min.min(ndc);
        max = max.max(ndc);
    }
    let off_screen = max.x < -1.0 || min.x > 1.0 || max.y < -1.0 || min.y > 1.0;
    (!off_screen).then_some((min, max))
}

fn css_color(color: Vec4, tint: Vec3) -> String {
    let rgb = (color.truncate() * tint).clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
    format!("rgb({}, {}, {})", rgb.x as u8, rgb.y as u8, rgb.z as u8)
}
