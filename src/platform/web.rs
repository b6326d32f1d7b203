//! Browser glue: canvas text mask, frame scheduling, DOM listeners
//!
//! Everything here is a thin adapter between `web_sys` and the controller.
//! Callbacks only hold weak references to the app, so dropping the mounted
//! app frees the whole graph.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, Event, EventTarget, HtmlCanvasElement, MouseEvent,
    Node, TouchEvent, Window,
};

use super::input::InputEvent;
use super::lifecycle::{Controller, FrameHandle, Host, Phase};
use crate::nav::{self, Destination};
use crate::renderer::{RenderState, Vertex, build_frame};
use crate::settings::{Settings, query_param};
use crate::sim::{InputMode, MaskError, MaskSource, Scene, TextLayout, Viewport};

const FONT_FAMILY: &str = "Georgia, serif";

const OVERLAY_STYLE: &str = "position:fixed;left:0;right:0;bottom:100px;z-index:10;\
    display:flex;flex-direction:column;align-items:center;gap:24px;pointer-events:none;";
const NAV_STYLE: &str = "display:flex;flex-direction:row;gap:16px;";
const BUTTON_STYLE: &str = "pointer-events:auto;padding:12px 24px;border:none;\
    border-radius:12px;color:#ffffff;font-size:1rem;cursor:pointer;";
const HINT_STYLE: &str = "margin:0;font-family:Georgia,serif;font-size:0.875rem;\
    color:rgba(255,255,255,0.9);";

thread_local! {
    static MOUNTED: RefCell<Option<Rc<RefCell<App>>>> = const { RefCell::new(None) };
}

/// Text mask drawn on a detached canvas and read back with `getImageData`
pub struct CanvasText {
    canvas: HtmlCanvasElement,
}

impl CanvasText {
    pub fn new(document: &Document) -> Result<Self, JsValue> {
        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()?;
        Ok(Self { canvas })
    }

    fn context(&self) -> Result<CanvasRenderingContext2d, MaskError> {
        self.canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or(MaskError::ContextUnavailable)
    }
}

impl MaskSource for CanvasText {
    fn rasterize(
        &mut self,
        viewport: Viewport,
        text: &str,
        layout: &TextLayout,
    ) -> Result<Vec<u8>, MaskError> {
        self.canvas.set_width(viewport.width);
        self.canvas.set_height(viewport.height);
        let ctx = self.context()?;

        let (w, h) = (viewport.width as f64, viewport.height as f64);
        ctx.clear_rect(0.0, 0.0, w, h);
        ctx.set_font(&format!("bold {}px {}", layout.font_size, FONT_FAMILY));
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        ctx.set_fill_style_str("#ffffff");
        ctx.fill_text_with_max_width(
            text,
            layout.center.x as f64,
            layout.center.y as f64,
            layout.max_width as f64,
        )
        .map_err(|e| MaskError::ReadRejected(format!("{:?}", e)))?;

        let image = ctx
            .get_image_data(0.0, 0.0, w, h)
            .map_err(|e| MaskError::ReadRejected(format!("{:?}", e)))?;
        ctx.clear_rect(0.0, 0.0, w, h);

        Ok(image.data().chunks_exact(4).map(|px| px[3]).collect())
    }
}

type Callback = Closure<dyn FnMut(Event)>;

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Callback,
}

/// Every DOM subscription made for the mounted surface
#[derive(Default)]
struct Listeners {
    active: Vec<Listener>,
    /// Detached but kept alive; a listener may be detaching itself
    retired: Vec<Listener>,
}

impl Listeners {
    fn add(&mut self, target: &EventTarget, kind: &'static str, callback: Callback) {
        match target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref()) {
            Ok(()) => self.active.push(Listener {
                target: target.clone(),
                kind,
                callback,
            }),
            Err(e) => log::warn!("Failed to listen for {}: {:?}", kind, e),
        }
    }

    fn detach_all(&mut self) {
        for listener in self.active.drain(..) {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.kind,
                listener.callback.as_ref().unchecked_ref(),
            );
            self.retired.push(listener);
        }
    }
}

/// `Host` backed by the browser window
struct WebHost {
    window: Window,
    frame: Option<Closure<dyn FnMut(f64)>>,
    listeners: Listeners,
    /// Nav buttons and hint added next to the canvas
    overlay: Option<Element>,
}

impl Host for WebHost {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        let frame = self.frame.as_ref()?;
        self.window
            .request_animation_frame(frame.as_ref().unchecked_ref())
            .ok()
            .map(FrameHandle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let _ = self.window.cancel_animation_frame(handle.0);
    }

    fn detach_listeners(&mut self) {
        self.listeners.detach_all();
    }

    fn remove_overlay(&mut self) {
        if let Some(overlay) = self.overlay.take() {
            overlay.remove();
        }
    }
}

/// Mounted landing page
struct App {
    controller: Controller<CanvasText>,
    host: WebHost,
    render_state: Option<RenderState>,
    vertices: Vec<Vertex>,
    settings: Settings,
    canvas: HtmlCanvasElement,
}

impl App {
    fn frame(&mut self, time: f64) {
        let App {
            controller,
            host,
            render_state,
            vertices,
            settings,
            ..
        } = self;

        if controller.on_frame(time, host).is_none() {
            return;
        }
        build_frame(vertices, controller.scene(), settings.effective_glow());

        let Some(rs) = render_state else { return };
        match rs.render(vertices, controller.scene().viewport()) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => rs.reconfigure(),
            Err(e) => log::warn!("Render error: {:?}", e),
        }

        if settings.show_fps && controller.frames() % 120 == 0 {
            log::info!(
                "{} fps, {} particles",
                controller.fps(),
                controller.scene().pool().len()
            );
        }
    }

    fn event(&mut self, event: InputEvent) {
        let App {
            controller, host, ..
        } = self;
        controller.handle_event(event, host);
    }

    /// Resize the backing store and rebuild the field
    fn resize(&mut self) {
        let viewport = logical_viewport(&self.host.window);
        let (width, height) = physical_size(&self.host.window, viewport);
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        if let Some(rs) = &mut self.render_state {
            rs.resize(width, height);
        }
        self.event(InputEvent::Resize(viewport));
    }

    fn teardown(&mut self) -> bool {
        let App {
            controller, host, ..
        } = self;
        controller.teardown(host)
    }
}

fn logical_viewport(window: &Window) -> Viewport {
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as i32;
    Viewport::from_client(dim(window.inner_width()), dim(window.inner_height()))
}

fn physical_size(window: &Window, viewport: Viewport) -> (u32, u32) {
    let dpr = window.device_pixel_ratio();
    (
        (viewport.width as f64 * dpr) as u32,
        (viewport.height as f64 * dpr) as u32,
    )
}

/// Run `f` against the app if it is still alive and not already borrowed
fn with_app(app: &Weak<RefCell<App>>, f: impl FnOnce(&mut App)) {
    let Some(app) = app.upgrade() else { return };
    if let Ok(mut app) = app.try_borrow_mut() {
        f(&mut app);
    }
}

fn surface_point(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    Vec2::new(
        client_x as f32 - rect.left() as f32,
        client_y as f32 - rect.top() as f32,
    )
}

fn first_touch(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Option<Vec2> {
    event
        .touches()
        .get(0)
        .map(|t| surface_point(canvas, t.client_x(), t.client_y()))
}

/// Build the nav buttons and hint over the canvas.
///
/// Returns the overlay root and each button with its destination.
fn build_overlay(
    document: &Document,
    canvas: &HtmlCanvasElement,
) -> Result<(Element, Vec<(Destination, Element)>), JsValue> {
    let root = document.create_element("div")?;
    root.set_attribute("style", OVERLAY_STYLE)?;

    let bar = document.create_element("nav")?;
    bar.set_attribute("style", NAV_STYLE)?;
    let mut buttons = Vec::with_capacity(Destination::ALL.len());
    for destination in Destination::ALL {
        let button = document.create_element("button")?;
        let (from, to) = destination.accent();
        button.set_attribute("type", "button")?;
        button.set_attribute("data-nav", destination.key())?;
        button.set_attribute(
            "style",
            &format!("{}background:linear-gradient(to right,{},{});", BUTTON_STYLE, from, to),
        )?;
        button.set_text_content(Some(destination.label()));
        bar.append_child(&button)?;
        buttons.push((destination, button));
    }

    let hint = document.create_element("p")?;
    hint.set_attribute("style", HINT_STYLE)?;
    hint.set_text_content(Some(nav::HINT));

    root.append_child(&bar)?;
    root.append_child(&hint)?;

    let parent: Node = match canvas.parent_node() {
        Some(parent) => parent,
        None => document
            .body()
            .ok_or_else(|| JsValue::from_str("no body"))?
            .into(),
    };
    parent.append_child(&root)?;
    Ok((root, buttons))
}

fn setup_listeners(app: &Rc<RefCell<App>>, document: &Document) {
    let (window, canvas) = {
        let a = app.borrow();
        (a.host.window.clone(), a.canvas.clone())
    };
    let mut listeners = Listeners::default();

    // Pointer input on the canvas
    let pointer_handlers: [(&'static str, fn(&HtmlCanvasElement, &Event) -> Option<InputEvent>); 6] = [
        ("mousemove", |canvas, event| {
            let e = event.dyn_ref::<MouseEvent>()?;
            Some(InputEvent::PointerMove(surface_point(canvas, e.client_x(), e.client_y())))
        }),
        ("mouseleave", |_, _| Some(InputEvent::PointerLeave)),
        ("touchstart", |canvas, event| {
            let e = event.dyn_ref::<TouchEvent>()?;
            Some(InputEvent::TouchStart(first_touch(canvas, e)))
        }),
        ("touchmove", |canvas, event| {
            let e = event.dyn_ref::<TouchEvent>()?;
            let point = first_touch(canvas, e)?;
            event.prevent_default();
            Some(InputEvent::TouchMove(point))
        }),
        ("touchend", |_, _| Some(InputEvent::TouchEnd)),
        ("touchcancel", |_, _| Some(InputEvent::TouchEnd)),
    ];
    for (kind, handler) in pointer_handlers {
        let weak = Rc::downgrade(app);
        let surface = canvas.clone();
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Some(input) = handler(&surface, &event) {
                with_app(&weak, |app| app.event(input));
            }
        });
        listeners.add(&canvas, kind, callback);
    }

    // Window resize
    {
        let weak = Rc::downgrade(app);
        let callback = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            with_app(&weak, App::resize);
        });
        listeners.add(&window, "resize", callback);
    }

    // Page going away
    {
        let weak = Rc::downgrade(app);
        let callback = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            with_app(&weak, |app| {
                app.teardown();
            });
        });
        listeners.add(&window, "pagehide", callback);
    }

    // Navigation buttons
    let buttons = match build_overlay(document, &canvas) {
        Ok((root, buttons)) => {
            app.borrow_mut().host.overlay = Some(root);
            buttons
        }
        Err(e) => {
            log::warn!("Navigation unavailable: {:?}", e);
            Vec::new()
        }
    };
    for (destination, button) in buttons {
        let weak = Rc::downgrade(app);
        let location = window.location();
        let callback = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            with_app(&weak, |app| {
                app.teardown();
            });
            log::info!("Navigating to {}", destination.label());
            if let Err(e) = location.set_href(destination.route()) {
                log::error!("Navigation failed: {:?}", e);
            }
        });
        listeners.add(&button, "click", callback);
    }

    app.borrow_mut().host.listeners = listeners;
}

async fn init_renderer(canvas: &HtmlCanvasElement, width: u32, height: u32) -> Option<RenderState> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
        ..Default::default()
    });

    let surface = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
        Ok(surface) => surface,
        Err(e) => {
            log::error!("Failed to create surface: {}", e);
            return None;
        }
    };

    let adapter = match instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        })
        .await
    {
        Ok(adapter) => adapter,
        Err(e) => {
            log::error!("No graphics adapter: {}", e);
            return None;
        }
    };
    log::info!("Using adapter: {:?}", adapter.get_info().name);

    match RenderState::new(surface, &adapter, width, height).await {
        Ok(rs) => Some(rs),
        Err(e) => {
            log::error!("Failed to create device: {}", e);
            None
        }
    }
}

/// Mount the particle field on `#canvas` and start the frame loop
pub async fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    // Fails only if a logger is already installed
    let _ = console_log::init_with_level(log::Level::Info);

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas: HtmlCanvasElement = document
        .get_element_by_id("canvas")
        .ok_or_else(|| JsValue::from_str("no #canvas element"))?
        .dyn_into()?;

    let mut settings = Settings::load();
    // `?quality=low|medium|high` overrides and persists the preset
    if let Ok(search) = window.location().search() {
        if let Some(quality) = query_param(&search, "quality") {
            if settings.apply_quality(quality) {
                settings.save();
            }
        }
    }
    log::info!(
        "Glory particles starting ({} quality)",
        settings.quality.as_str()
    );

    let viewport = logical_viewport(&window);
    let (width, height) = physical_size(&window, viewport);
    canvas.set_width(width);
    canvas.set_height(height);

    let render_state = init_renderer(&canvas, width, height).await;

    let touch = js_sys::Reflect::has(&window, &JsValue::from_str("ontouchstart")).unwrap_or(false);
    let mode = if touch {
        InputMode::Touch
    } else {
        InputMode::Pointer
    };

    let seed = js_sys::Date::now() as u64;
    let scene = Scene::from_settings(seed, &settings);
    let controller = Controller::new(scene, CanvasText::new(&document)?, mode);

    let app = Rc::new(RefCell::new(App {
        controller,
        host: WebHost {
            window: window.clone(),
            frame: None,
            listeners: Listeners::default(),
            overlay: None,
        },
        render_state,
        vertices: Vec::new(),
        settings,
        canvas,
    }));

    // One closure reused for every frame
    let weak = Rc::downgrade(&app);
    let frame = Closure::<dyn FnMut(f64)>::new(move |time: f64| {
        with_app(&weak, |app| app.frame(time));
    });
    app.borrow_mut().host.frame = Some(frame);

    setup_listeners(&app, &document);

    let phase = {
        let mut a = app.borrow_mut();
        let App {
            controller, host, ..
        } = &mut *a;
        controller.mount(viewport, host)
    };
    if phase != Phase::Running {
        log::warn!("Particle field not running yet ({:?})", phase);
    }

    MOUNTED.with(|mounted| *mounted.borrow_mut() = Some(app));
    Ok(())
}

/// Tear down and drop the mounted field.
///
/// If a field callback is still on the stack the teardown is deferred to a
/// microtask, so listeners are never freed while still attached.
#[wasm_bindgen]
pub fn unmount() {
    let Some(app) = MOUNTED.with(|mounted| mounted.borrow_mut().take()) else {
        return;
    };
    if try_teardown(&app) {
        return;
    }

    log::warn!("Field busy, deferring unmount");
    wasm_bindgen_futures::spawn_local(async move {
        if !try_teardown(&app) {
            // Dropping now would free closures the page still calls
            log::error!("Field still busy after deferral, keeping it alive");
            std::mem::forget(app);
        }
    });
}

/// Tear down if no callback holds the app. True once it is torn down.
fn try_teardown(app: &Rc<RefCell<App>>) -> bool {
    match app.try_borrow_mut() {
        Ok(mut app) => {
            app.teardown();
            true
        }
        Err(_) => false,
    }
}
