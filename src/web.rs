//! Browser front end.
//!
//! The page owns the DOM for the intro menu, the popup panel and the return
//! button; it forwards button presses to [`WasmWalkthrough`] and reads back
//! what to show. Pointer events on the canvas and the frame loop are wired
//! here.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use glam::Vec2;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{window, HtmlCanvasElement, MouseEvent, Response};

use crate::app;
use crate::assets::AssetSlot;
use crate::config::WalkthroughConfig;
use crate::error::AssetKind;
use crate::interaction::PowerMode;
use crate::popup::{PopupCatalog, PopupView};
use crate::render::Renderer;
use crate::scene::Scene;
use crate::walkthrough::Walkthrough;

#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub struct WasmWalkthrough {
    inner: Rc<RefCell<WebApp>>,
    _listeners: Vec<Closure<dyn FnMut(MouseEvent)>>,
}

#[wasm_bindgen]
impl WasmWalkthrough {
    /// Attaches to `canvas_id` and starts fetching the model and popup text.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        scene_url: String,
        text_url: String,
        config_json: Option<String>,
    ) -> Result<WasmWalkthrough, JsValue> {
        let config = match config_json {
            Some(json) => WalkthroughConfig::from_json_str(&json).map_err(to_js)?,
            None => WalkthroughConfig::default(),
        };
        let canvas = find_canvas(canvas_id).map_err(to_js)?;
        let renderer = Renderer::new(canvas.clone()).map_err(to_js)?;

        let scene = Arc::new(AssetSlot::new(AssetKind::Model));
        let text = Arc::new(AssetSlot::new(AssetKind::PopupText));
        fetch_into(scene_url, Arc::clone(&scene), |xml| Scene::from_xml(&xml));
        fetch_into(text_url, Arc::clone(&text), |json| {
            PopupCatalog::from_json_str(&json)
        });

        let mut walkthrough = Walkthrough::new(config);
        let (width, height) = css_size(&canvas);
        walkthrough.resize(width, height);
        let inner = Rc::new(RefCell::new(WebApp {
            walkthrough,
            renderer,
            canvas: canvas.clone(),
            scene,
            text,
        }));

        let listeners = vec![
            listen(&canvas, "click", Rc::clone(&inner), |app, position| {
                app.walkthrough.pointer_click(position);
            })?,
            listen(&canvas, "mousemove", Rc::clone(&inner), |app, position| {
                app.walkthrough.pointer_move(position);
                app.sync_cursor();
            })?,
        ];

        start_frame_loop(Rc::clone(&inner)).map_err(to_js)?;
        Ok(Self {
            inner,
            _listeners: listeners,
        })
    }

    pub fn turn_on(&self) -> bool {
        self.inner.borrow_mut().walkthrough.start_menu(PowerMode::On).is_applied()
    }

    pub fn turn_off(&self) -> bool {
        self.inner.borrow_mut().walkthrough.start_menu(PowerMode::Off).is_applied()
    }

    pub fn return_to_exterior(&self) -> bool {
        self.inner.borrow_mut().walkthrough.return_to_exterior().is_applied()
    }

    pub fn popup_next(&self) -> bool {
        self.inner.borrow_mut().walkthrough.popup_next()
    }

    pub fn popup_prev(&self) -> bool {
        self.inner.borrow_mut().walkthrough.popup_prev()
    }

    pub fn popup_close(&self) -> bool {
        self.inner.borrow_mut().walkthrough.popup_close()
    }

    pub fn resize(&self, width: u32, height: u32) {
        let mut app = self.inner.borrow_mut();
        app.renderer.resize((width, height));
        let (css_width, css_height) = css_size(&app.canvas);
        app.walkthrough.resize(css_width, css_height);
    }

    pub fn intro_visible(&self) -> bool {
        self.inner.borrow().walkthrough.intro_visible()
    }

    pub fn return_visible(&self) -> bool {
        self.inner.borrow().walkthrough.return_visible()
    }

    pub fn popup_visible(&self) -> bool {
        self.inner.borrow().walkthrough.popup_visible()
    }

    pub fn popup_title(&self) -> Option<String> {
        match self.inner.borrow().walkthrough.popup_view() {
            PopupView::Hidden => None,
            PopupView::NoContent { title } | PopupView::Page { title, .. } => Some(title),
        }
    }

    /// Current page text, or the "no content" message.
    pub fn popup_text(&self) -> Option<String> {
        match self.inner.borrow().walkthrough.popup_view() {
            PopupView::Hidden => None,
            PopupView::NoContent { .. } => Some(crate::popup::NO_CONTENT.to_string()),
            PopupView::Page { text, .. } => Some(text),
        }
    }

    pub fn popup_has_prev(&self) -> bool {
        self.inner.borrow().walkthrough.popup_view().nav().prev
    }

    pub fn popup_has_next(&self) -> bool {
        self.inner.borrow().walkthrough.popup_view().nav().next
    }
}

struct WebApp {
    walkthrough: Walkthrough,
    renderer: Renderer,
    canvas: HtmlCanvasElement,
    scene: Arc<AssetSlot<Scene>>,
    text: Arc<AssetSlot<PopupCatalog>>,
}

impl WebApp {
    fn render_frame(&mut self) -> Result<()> {
        if let Some(result) = self.scene.take() {
            self.walkthrough.on_scene_loaded(result);
        }
        if let Some(result) = self.text.take() {
            self.walkthrough.on_popup_text_loaded(result);
        }
        let (width, height) = css_size(&self.canvas);
        let viewport = self.walkthrough.viewport();
        if (width, height) != (viewport.width, viewport.height) {
            self.walkthrough.resize(width, height);
        }
        let frame = app::frame(&self.walkthrough);
        self.renderer.update_globals(&frame.camera, &frame.light);
        self.renderer.render(&frame.items).map_err(|err| {
            let message = err
                .as_string()
                .unwrap_or_else(|| "unknown canvas error".to_string());
            anyhow!("render failed: {message}")
        })
    }

    fn sync_cursor(&self) {
        let css = self.walkthrough.cursor().as_css();
        if let Err(err) = self.canvas.style().set_property("cursor", css) {
            web_sys::console::warn_1(&err);
        }
    }
}

/// Canvas size in the CSS pixels that mouse offsets are reported in.
fn css_size(canvas: &HtmlCanvasElement) -> (u32, u32) {
    app::pointer_viewport(
        (canvas.client_width(), canvas.client_height()),
        (canvas.width(), canvas.height()),
    )
}

fn find_canvas(canvas_id: &str) -> Result<HtmlCanvasElement> {
    let document = window()
        .and_then(|window| window.document())
        .ok_or_else(|| anyhow!("document not available"))?;
    document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| anyhow!("canvas element `{canvas_id}` not found"))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| anyhow!("element `{canvas_id}` is not a canvas"))
}

fn listen(
    canvas: &HtmlCanvasElement,
    event: &str,
    app: Rc<RefCell<WebApp>>,
    handler: impl Fn(&mut WebApp, Vec2) + 'static,
) -> Result<Closure<dyn FnMut(MouseEvent)>, JsValue> {
    let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
        let position = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
        // A frame callback may hold the borrow; drop the event rather than panic.
        if let Ok(mut app) = app.try_borrow_mut() {
            handler(&mut app, position);
        }
    }) as Box<dyn FnMut(MouseEvent)>);
    canvas.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    Ok(closure)
}

fn fetch_into<T: 'static>(
    url: String,
    slot: Arc<AssetSlot<T>>,
    parse: impl FnOnce(String) -> Result<T> + 'static,
) {
    spawn_local(async move {
        let result = fetch_text(&url).await.and_then(parse);
        slot.fulfil(result);
    });
}

async fn fetch_text(url: &str) -> Result<String> {
    let window = window().ok_or_else(|| anyhow!("window not available"))?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|err| anyhow!("fetch of {url} failed: {err:?}"))?
        .dyn_into::<Response>()
        .map_err(|_| anyhow!("fetch of {url} did not yield a response"))?;
    if !response.ok() {
        bail!("fetch of {url} returned HTTP {}", response.status());
    }
    let body = response
        .text()
        .map_err(|err| anyhow!("unable to read {url}: {err:?}"))?;
    JsFuture::from(body)
        .await
        .map_err(|err| anyhow!("unable to read {url}: {err:?}"))?
        .as_string()
        .ok_or_else(|| anyhow!("{url} is not text"))
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn start_frame_loop(app: Rc<RefCell<WebApp>>) -> Result<()> {
    let callback: FrameCallback = Rc::new(RefCell::new(None));
    let next = Rc::clone(&callback);
    *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        if let Err(err) = app.borrow_mut().render_frame() {
            web_sys::console::error_1(&JsValue::from_str(&format!("{err:#}")));
        }
        if let Some(closure) = next.borrow().as_ref() {
            if let Err(err) = request_frame(closure) {
                web_sys::console::error_1(&JsValue::from_str(&format!("{err:#}")));
            }
        }
    }) as Box<dyn FnMut()>));

    let first = callback.borrow();
    let closure = first
        .as_ref()
        .ok_or_else(|| anyhow!("frame callback missing"))?;
    request_frame(closure)
}

fn request_frame(closure: &Closure<dyn FnMut()>) -> Result<()> {
    window()
        .ok_or_else(|| anyhow!("window not available"))?
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("requestAnimationFrame failed: {err:?}"))?;
    Ok(())
}

fn to_js(err: anyhow::Error) -> JsValue {
    js_sys::Error::new(&format!("{err:#}")).into()
}
