use std::io::{self, Write};

use log::error;
use parking_lot::RwLock;

use crate::popup::PopupView;
use crate::render::{build_draw_list, CameraParams, DrawItem, LightParams};
use crate::scene::NodeKind;
use crate::scene_index::SceneIndex;
use crate::walkthrough::Walkthrough;

/// Drawable size shared between the window/canvas and the event handlers.
#[derive(Debug)]
pub struct SharedViewport {
    size: RwLock<(u32, u32)>,
}

impl SharedViewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: RwLock::new((width.max(1), height.max(1))),
        }
    }

    pub fn update(&self, width: u32, height: u32) {
        *self.size.write() = (width.max(1), height.max(1));
    }

    pub fn size(&self) -> (u32, u32) {
        *self.size.read()
    }
}

/// Size pointer positions are measured in.
///
/// Browser pointer offsets are CSS pixels, so the layout size wins over the
/// backing-store size; an element that has not been laid out yet reports 0
/// and falls back to the backing store.
pub fn pointer_viewport(client: (i32, i32), backing: (u32, u32)) -> (u32, u32) {
    match client {
        (width, height) if width > 0 && height > 0 => (width as u32, height as u32),
        _ => (backing.0.max(1), backing.1.max(1)),
    }
}

/// Everything a renderer needs for one frame.
pub struct Frame {
    pub camera: CameraParams,
    pub light: LightParams,
    pub items: Vec<DrawItem>,
}

pub fn frame(walkthrough: &Walkthrough) -> Frame {
    Frame {
        camera: walkthrough.camera_params(),
        light: light_from_index(walkthrough.index()),
        items: build_draw_list(walkthrough.index()),
    }
}

/// First light of the model, or a default key light.
pub fn light_from_index(index: &SceneIndex) -> LightParams {
    index
        .iter()
        .find(|(_, node)| node.kind == NodeKind::Light)
        .map(|(_, light)| LightParams {
            position: light.world_position(),
            color: light.color,
            intensity: light.intensity.max(0.1),
        })
        .unwrap_or_default()
}

/// One-line description of what the popup panel shows.
pub fn describe_popup(view: &PopupView) -> String {
    match view {
        PopupView::Hidden => "hidden".to_string(),
        PopupView::NoContent { title } => format!("\"{title}\" (no content)"),
        PopupView::Page {
            title,
            page,
            total,
            nav,
            ..
        } => {
            let mut line = format!("\"{title}\" page {}/{total}", page + 1);
            if nav.prev {
                line.push_str(" [prev]");
            }
            if nav.next {
                line.push_str(" [next]");
            }
            line
        }
    }
}

pub fn write_summary(out: &mut impl Write, walkthrough: &Walkthrough) -> io::Result<()> {
    let index = walkthrough.index();
    let meshes = index.iter().filter(|(_, node)| node.is_mesh()).count();
    let state = walkthrough.state();
    writeln!(out, "Walkthrough state:")?;
    writeln!(out, " room: {}", state.room)?;
    writeln!(
        out,
        " camera: {} ({})",
        walkthrough.active_camera(),
        walkthrough.camera_view().name
    )?;
    let power = match state.power {
        Some(mode) => format!("{mode:?}").to_lowercase(),
        None => "unset".to_string(),
    };
    writeln!(out, " menu started: {} (power {power})", yes_no(state.menu_started))?;
    writeln!(out, " oven armed: {}", yes_no(state.oven_armed))?;
    writeln!(out, " return visible: {}", yes_no(walkthrough.return_visible()))?;
    writeln!(out, " cursor: {}", walkthrough.cursor().as_css())?;
    writeln!(out, " popup: {}", describe_popup(&walkthrough.popup_view()))?;
    if let PopupView::Page { text, .. } = walkthrough.popup_view() {
        writeln!(out, "   {text}")?;
    }
    writeln!(
        out,
        " visible meshes: {}/{meshes}",
        walkthrough.visible_mesh_count()
    )?;
    Ok(())
}

pub fn print_summary(walkthrough: &Walkthrough) {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    if let Err(err) = write_summary(&mut lock, walkthrough) {
        error!("failed to print summary: {err}");
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
