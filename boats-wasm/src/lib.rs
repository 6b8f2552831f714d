//! Browser driver for the talking boats sketches: canvas drawing, Web Audio
//! playback and pointer input around a `boats_core::Sketch`.

pub mod audio;
pub mod canvas;

use boats_core::{
    Bounds, FrameRateMeter, MouseButton, PointerEvent, Preset, SinkId, Sketch, SketchSettings, Vector2D,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement, MouseEvent, TouchEvent};

pub use audio::WebAudioEngine;
pub use canvas::CanvasRenderer;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

/// Forwards `log` records from the simulation to the browser console
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            console_log!("[{}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn init_logging(debug: bool) {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    // A second sketch on the same page keeps the first logger
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn random_seed() -> u64 {
    let mut bytes = [0u8; 8];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => u64::from_le_bytes(bytes),
        Err(err) => {
            log::warn!("no secure random source ({}), seeding from Math.random", err);
            (js_sys::Math::random() * u64::MAX as f64) as u64
        }
    }
}

fn preset_named(name: &str) -> Result<Preset, JsValue> {
    match name {
        "talking_boats" => Ok(Preset::TalkingBoats),
        "nine_voices" => Ok(Preset::NineVoices),
        other => Err(JsValue::from_str(&format!("unknown preset '{}'", other))),
    }
}

#[wasm_bindgen]
pub struct TalkingBoats {
    sketch: Sketch,
    canvas: HtmlCanvasElement,
    renderer: CanvasRenderer,
    audio: WebAudioEngine,
    meter: FrameRateMeter,
    inverted: bool,
}

#[wasm_bindgen]
impl TalkingBoats {
    /// `settings_json` overrides the preset's defaults. Each stem URL becomes
    /// one voice: boats claim the first ones, stereo channels the rest.
    #[wasm_bindgen(constructor)]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        canvas_id: &str,
        width: f64,
        height: f64,
        preset: &str,
        settings_json: Option<String>,
        stems: Vec<String>,
        images: Vec<String>,
        debug: bool,
    ) -> Result<TalkingBoats, JsValue> {
        init_logging(debug);

        let settings = match settings_json {
            Some(json) => SketchSettings::from_json(&json)
                .map_err(|err| JsValue::from_str(&format!("invalid settings: {}", err)))?,
            None => SketchSettings::preset(preset_named(preset)?),
        };
        console_log!("Initializing {:?} with {} stems", settings.preset, stems.len());

        let window = web_sys::window().ok_or("no global window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or("canvas not found")?
            .dyn_into::<HtmlCanvasElement>()?;

        canvas.set_width(width as u32);
        canvas.set_height(height as u32);

        let context = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let renderer = CanvasRenderer::new(context, &images, width, height);

        let boat_count = settings.boat_count.min(stems.len());
        let stereo_count = settings.stereo_channels.min(stems.len() - boat_count);
        let mut audio = WebAudioEngine::new()?;
        let boat_sinks = stems[..boat_count]
            .iter()
            .map(|url| audio.add_spatial_voice(url))
            .collect::<Result<Vec<SinkId>, JsValue>>()?;
        let stereo_sinks = stems[boat_count..boat_count + stereo_count]
            .iter()
            .map(|url| audio.add_stereo_voice(url))
            .collect::<Result<Vec<SinkId>, JsValue>>()?;

        let bounds = Bounds::new(width as f32, height as f32);
        let mut sketch = Sketch::new(settings, bounds, random_seed());
        sketch.spawn_boats(&boat_sinks, &renderer.image_ids());
        sketch.bind_stereo_channels(&stereo_sinks);

        Ok(TalkingBoats {
            sketch,
            canvas,
            renderer,
            audio,
            meter: FrameRateMeter::default(),
            inverted: false,
        })
    }

    /// Call from `requestAnimationFrame` with its timestamp
    pub fn frame(&mut self, timestamp: f64) {
        let fps = self.meter.tick(timestamp);
        self.sketch.tick(fps, &mut self.audio, &mut self.renderer);
    }

    /// Start button: unlock audio and start every voice
    pub fn start(&mut self) -> bool {
        let started = self.sketch.start_audio(&mut self.audio);
        if started {
            console_log!("Audio started at {:.1} BPM", self.audio.bpm());
        }
        started
    }

    /// Randomize button: restart every voice with a jittered rate and offset.
    /// The first press inverts the page colours.
    pub fn randomize(&mut self) -> Result<(), JsValue> {
        self.sketch.randomize(&mut self.audio);
        if !self.inverted {
            invert_colors()?;
            self.inverted = true;
        }
        Ok(())
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.canvas.set_width(width as u32);
        self.canvas.set_height(height as u32);
        self.renderer.resize(width, height);
        self.sketch.resize(width as f32, height as f32);
        console_log!("Resized to {}x{}", width, height);
    }

    pub fn handle_mouse_drag(&mut self, event: MouseEvent) {
        let button = match event.buttons() {
            b if b & 1 != 0 => MouseButton::Primary,
            b if b & 2 != 0 => MouseButton::Secondary,
            _ => MouseButton::Other,
        };
        let at = self.canvas_point(event.client_x() as f64, event.client_y() as f64);
        self.sketch.pointer(PointerEvent::MouseDrag { at, button });
    }

    pub fn handle_touch_move(&mut self, event: TouchEvent) {
        event.prevent_default();
        let touches = event.touches();
        let Some(first) = touches.item(0) else {
            return;
        };
        let first = self.canvas_point(first.client_x() as f64, first.client_y() as f64);
        self.sketch.pointer(PointerEvent::TouchMove {
            first,
            touches: touches.length() as usize,
        });
    }

    pub fn handle_touch_end(&mut self) {
        self.sketch.pointer(PointerEvent::TouchEnd);
    }

    pub fn bird_count(&self) -> usize {
        self.sketch.birds.len()
    }

    pub fn boat_count(&self) -> usize {
        self.sketch.boats.len()
    }

    /// Latest frame report as a plain JS object
    pub fn status(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.sketch.report())?)
    }

    fn canvas_point(&self, client_x: f64, client_y: f64) -> Vector2D {
        let canvas_element: &Element = self.canvas.as_ref();
        let rect = canvas_element.get_bounding_client_rect();
        Vector2D::new((client_x - rect.left()) as f32, (client_y - rect.top()) as f32)
    }
}

fn invert_colors() -> Result<(), JsValue> {
    let body = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.body())
        .ok_or("no document body")?;
    let style = body.style();
    style.set_property("filter", "invert(1)")?;
    style.set_property("transition", "filter 0.5s ease-in-out")?;
    Ok(())
}
