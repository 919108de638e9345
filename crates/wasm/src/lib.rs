#![deny(unsafe_code)]
//! WASM bindings: drives a [`ParticleField`] on an HTML canvas.
//!
//! `ParticleCanvas` owns the frame loop. Frames are scheduled with
//! `requestAnimationFrame` only while an `IntersectionObserver` reports the
//! canvas on screen; leaving the viewport simply stops scheduling. Pointer
//! and touch positions are written by event listeners and read once per
//! frame. A [`FrameMonitor`] owned by the loop feeds quality tier changes
//! back into the field.
//!
//! ```js
//! const field = new ParticleCanvas(canvas, "contact", 42n, "{}");
//! field.start();
//! ```

mod surface;

use folio_core::{FrameMonitor, Palette, QualityTier, Rgba};
use folio_flow::{ParticleField, VisibilityGate};
use folio_scene::SceneKind;
use gloo::events::EventListener;
use gloo::render::{request_animation_frame, AnimationFrame};
use glam::DVec2;
use js_sys::Array;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Event, HtmlCanvasElement, IntersectionObserver,
    IntersectionObserverEntry, MouseEvent, TouchEvent, Window,
};

pub use surface::CanvasSurface;

/// Stylesheet custom properties read as the particle palette, in order.
const PALETTE_VARS: [&str; 4] = [
    "--accent-primary",
    "--accent-secondary",
    "--accent-tertiary",
    "--accent-highlight",
];

/// Maps a client-space position into canvas pixels, accounting for CSS
/// scaling of the canvas element.
pub fn canvas_point(client: DVec2, origin: DVec2, css_size: DVec2, pixel_size: DVec2) -> DVec2 {
    let scale = DVec2::new(
        if css_size.x > 0.0 { pixel_size.x / css_size.x } else { 1.0 },
        if css_size.y > 0.0 { pixel_size.y / css_size.y } else { 1.0 },
    );
    (client - origin) * scale
}

type ObserverCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;

struct State {
    field: ParticleField,
    gate: VisibilityGate,
    monitor: FrameMonitor,
    frame: Option<AnimationFrame>,
    listeners: Vec<EventListener>,
    observer: Option<(IntersectionObserver, ObserverCallback)>,
    running: bool,
}

struct Inner {
    canvas: HtmlCanvasElement,
    ctx: Option<CanvasRenderingContext2d>,
    state: RefCell<State>,
}

/// A particle field bound to a canvas element.
#[wasm_bindgen]
pub struct ParticleCanvas {
    inner: Rc<Inner>,
}

#[wasm_bindgen]
impl ParticleCanvas {
    /// Builds the field for `canvas` from a preset name and a JSON object of
    /// overrides. Colors come from the stylesheet's accent variables when
    /// present.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        preset: &str,
        seed: u64,
        params_json: &str,
    ) -> Result<ParticleCanvas, JsValue> {
        let params: serde_json::Value = if params_json.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(params_json)
                .map_err(|e| JsValue::from_str(&format!("invalid params JSON: {e}")))?
        };
        let (width, height) = fit_to_layout(&canvas);
        let mut scene = SceneKind::from_name(preset, width, height, seed, &params)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        if params.get("palette").is_none() {
            if let Some(palette) = web_sys::window().and_then(|w| stylesheet_palette(&w, &canvas)) {
                scene.field_mut().set_palette(palette);
            }
        }
        let field = scene.into_field();

        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok());

        Ok(ParticleCanvas {
            inner: Rc::new(Inner {
                canvas,
                ctx,
                state: RefCell::new(State {
                    field,
                    gate: VisibilityGate::new(),
                    monitor: FrameMonitor::default(),
                    frame: None,
                    listeners: Vec::new(),
                    observer: None,
                    running: false,
                }),
            }),
        })
    }

    /// Attaches listeners and the visibility observer. Frames start once the
    /// canvas is reported on screen.
    pub fn start(&self) -> Result<(), JsValue> {
        if self.inner.state.borrow().running {
            return Ok(());
        }
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let listeners = self.inner.attach_listeners(&window);
        let observer = self.inner.observe()?;
        let mut state = self.inner.state.borrow_mut();
        state.listeners = listeners;
        state.observer = Some(observer);
        state.running = true;
        Ok(())
    }

    /// Detaches everything and cancels the pending frame.
    pub fn stop(&self) {
        let mut state = self.inner.state.borrow_mut();
        state.running = false;
        state.frame = None;
        state.listeners.clear();
        if let Some((observer, _callback)) = state.observer.take() {
            observer.disconnect();
        }
        state.gate.set_visible(false);
        state.monitor.stop();
    }

    /// Re-reads the canvas layout size and re-initializes the field.
    pub fn resize(&self) -> Result<(), JsValue> {
        self.inner.resize()
    }

    /// Sets the pointer in canvas pixels.
    pub fn set_pointer(&self, x: f64, y: f64) {
        self.inner
            .state
            .borrow_mut()
            .field
            .set_pointer(Some(DVec2::new(x, y)));
    }

    pub fn clear_pointer(&self) {
        self.inner.state.borrow_mut().field.set_pointer(None);
    }

    /// Replaces the palette with a built-in one by name.
    pub fn set_palette(&self, name: &str) -> Result<(), JsValue> {
        let palette = Palette::from_name(name).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.state.borrow_mut().field.set_palette(palette);
        Ok(())
    }

    /// Current quality tier name.
    pub fn quality(&self) -> String {
        self.inner.state.borrow().field.quality().name().to_string()
    }

    pub fn particle_count(&self) -> usize {
        self.inner.state.borrow().field.particles().len()
    }

    pub fn is_visible(&self) -> bool {
        self.inner.state.borrow().gate.is_visible()
    }
}

impl Drop for ParticleCanvas {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Inner {
    fn schedule(self: &Rc<Self>) {
        let mut state = self.state.borrow_mut();
        if state.frame.is_some() || !state.running || !state.gate.is_visible() {
            return;
        }
        let inner = Rc::clone(self);
        state.frame = Some(request_animation_frame(move |timestamp| {
            inner.frame(timestamp);
        }));
    }

    fn frame(self: &Rc<Self>, timestamp: f64) {
        {
            let mut state = self.state.borrow_mut();
            state.frame = None;
            if !state.running {
                return;
            }
            let State {
                field,
                gate,
                monitor,
                ..
            } = &mut *state;
            if let Some(tier) = monitor.record(timestamp) {
                field.apply_quality(tier);
            }
            if !gate.advance(field, timestamp) {
                return;
            }
            if let Some(ctx) = &self.ctx {
                let mut surface = CanvasSurface::new(
                    ctx,
                    f64::from(self.canvas.width()),
                    f64::from(self.canvas.height()),
                );
                field.render(&mut surface);
            }
        }
        self.schedule();
    }

    fn set_visible(self: &Rc<Self>, visible: bool) {
        {
            let mut state = self.state.borrow_mut();
            if state.gate.set_visible(visible) {
                state.monitor.start();
            } else if !visible {
                state.frame = None;
                state.monitor.stop();
            }
        }
        self.schedule();
    }

    fn resize(&self) -> Result<(), JsValue> {
        let (width, height) = fit_to_layout(&self.canvas);
        self.state
            .borrow_mut()
            .field
            .resize(width, height)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    fn pointer_from_client(&self, client_x: f64, client_y: f64) -> DVec2 {
        let rect = self.canvas.get_bounding_client_rect();
        canvas_point(
            DVec2::new(client_x, client_y),
            DVec2::new(rect.left(), rect.top()),
            DVec2::new(rect.width(), rect.height()),
            DVec2::new(f64::from(self.canvas.width()), f64::from(self.canvas.height())),
        )
    }

    fn attach_listeners(self: &Rc<Self>, window: &Window) -> Vec<EventListener> {
        let mut listeners = Vec::with_capacity(5);

        let inner = Rc::clone(self);
        listeners.push(EventListener::new(window, "mousemove", move |event: &Event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let p = inner.pointer_from_client(f64::from(event.client_x()), f64::from(event.client_y()));
            inner.state.borrow_mut().field.set_pointer(Some(p));
        }));

        let inner = Rc::clone(self);
        listeners.push(EventListener::new(window, "touchmove", move |event: &Event| {
            let Some(event) = event.dyn_ref::<TouchEvent>() else {
                return;
            };
            let Some(touch) = event.touches().get(0) else {
                return;
            };
            let p = inner.pointer_from_client(f64::from(touch.client_x()), f64::from(touch.client_y()));
            inner.state.borrow_mut().field.set_pointer(Some(p));
        }));

        let inner = Rc::clone(self);
        listeners.push(EventListener::new(&self.canvas, "mouseleave", move |_| {
            inner.state.borrow_mut().field.set_pointer(None);
        }));

        let inner = Rc::clone(self);
        listeners.push(EventListener::new(window, "touchend", move |_| {
            inner.state.borrow_mut().field.set_pointer(None);
        }));

        let inner = Rc::clone(self);
        listeners.push(EventListener::new(window, "resize", move |_| {
            // A collapsed layout reports zero size; keep the previous field.
            let _ = inner.resize();
        }));

        listeners
    }

    fn observe(self: &Rc<Self>) -> Result<(IntersectionObserver, ObserverCallback), JsValue> {
        let inner = Rc::clone(self);
        let callback: ObserverCallback =
            Closure::new(move |entries: Array, _observer: IntersectionObserver| {
                let visible = entries
                    .iter()
                    .filter_map(|e| e.dyn_into::<IntersectionObserverEntry>().ok())
                    .last()
                    .map(|e| e.is_intersecting());
                if let Some(visible) = visible {
                    inner.set_visible(visible);
                }
            });
        let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref())?;
        observer.observe(&self.canvas);
        Ok((observer, callback))
    }
}

/// Sizes the canvas backing store to its layout box and returns the size.
fn fit_to_layout(canvas: &HtmlCanvasElement) -> (usize, usize) {
    let width = canvas.client_width().max(0) as u32;
    let height = canvas.client_height().max(0) as u32;
    if width > 0 && height > 0 {
        canvas.set_width(width);
        canvas.set_height(height);
    }
    (canvas.width() as usize, canvas.height() as usize)
}

/// Builds a palette from the stylesheet accent variables, skipping unset
/// ones. Malformed values fall back to white.
fn stylesheet_palette(window: &Window, canvas: &HtmlCanvasElement) -> Option<Palette> {
    let style = window.get_computed_style(canvas).ok()??;
    let values: Vec<String> = PALETTE_VARS
        .iter()
        .filter_map(|name| style.get_property_value(name).ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return None;
    }
    let refs: Vec<&str> = values.iter().map(String::as_str).collect();
    Palette::from_css_lossy(&refs, Rgba::WHITE).ok()
}

/// Exposes the tier names so the page can style itself to match.
#[wasm_bindgen]
pub fn quality_tiers() -> Vec<String> {
    [QualityTier::Full, QualityTier::Reduced, QualityTier::Minimal]
        .iter()
        .map(|t| t.name().to_string())
        .collect()
}

/// Preset names accepted by the `ParticleCanvas` constructor.
#[wasm_bindgen]
pub fn list_presets() -> Vec<String> {
    SceneKind::list_presets().into_iter().map(String::from).collect()
}
