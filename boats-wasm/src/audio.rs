use boats_core::{AudioEngine, AudioPosition, SinkId};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AudioBuffer, AudioContext, AudioNode, AudioParam, DynamicsCompressorNode, HtmlAudioElement,
    PannerNode, PanningModelType, StereoPannerNode,
};

const REVERB_DECAY_SECS: f32 = 2.8;
const REVERB_WET: f32 = 0.4;
const LIMITER_THRESHOLD_DB: f32 = -2.0;

enum Pan {
    /// HRTF panner moved by a boat
    Spatial(PannerNode),
    /// Left/right pan following a bird
    Stereo(StereoPannerNode),
}

struct Voice {
    element: HtmlAudioElement,
    pan: Pan,
}

/// Web Audio graph: every stem plays through its own panner into one shared
/// compressor, then a reverb send and a limiter. Voices are created suspended
/// and start after `resume`.
pub struct WebAudioEngine {
    context: AudioContext,
    compressor: DynamicsCompressorNode,
    voices: Vec<Voice>,
    started: bool,
    bpm: f32,
}

impl WebAudioEngine {
    pub fn new() -> Result<Self, JsValue> {
        let context = AudioContext::new()?;
        let compressor = context.create_dynamics_compressor()?;
        compressor.threshold().set_value(-24.0);
        compressor.ratio().set_value(3.0);
        compressor.attack().set_value(0.02);
        compressor.release().set_value(0.15);

        let limiter = context.create_dynamics_compressor()?;
        limiter.threshold().set_value(LIMITER_THRESHOLD_DB);
        limiter.ratio().set_value(20.0);
        limiter.attack().set_value(0.003);
        limiter.release().set_value(0.1);
        limiter.connect_with_audio_node(&context.destination())?;

        let dry = context.create_gain()?;
        dry.gain().set_value(1.0 - REVERB_WET);
        compressor.connect_with_audio_node(&dry)?;
        dry.connect_with_audio_node(&limiter)?;

        let reverb = context.create_convolver()?;
        reverb.set_buffer(Some(&impulse_response(&context, REVERB_DECAY_SECS)?));
        let wet = context.create_gain()?;
        wet.gain().set_value(REVERB_WET);
        compressor.connect_with_audio_node(&reverb)?;
        reverb.connect_with_audio_node(&wet)?;
        wet.connect_with_audio_node(&limiter)?;

        Ok(Self {
            context,
            compressor,
            voices: Vec::new(),
            started: false,
            bpm: 0.0,
        })
    }

    /// Add a looping stem routed through a 3D panner
    pub fn add_spatial_voice(&mut self, url: &str) -> Result<SinkId, JsValue> {
        let panner = self.context.create_panner()?;
        panner.set_panning_model(PanningModelType::Hrtf);
        self.add_voice(url, Pan::Spatial(panner))
    }

    /// Add a looping stem routed through a stereo panner
    pub fn add_stereo_voice(&mut self, url: &str) -> Result<SinkId, JsValue> {
        let panner = self.context.create_stereo_panner()?;
        self.add_voice(url, Pan::Stereo(panner))
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// `None` for an unknown sink
    pub fn is_paused(&self, sink: SinkId) -> Option<bool> {
        self.voices.get(sink.0).map(|voice| voice.element.paused())
    }

    fn add_voice(&mut self, url: &str, pan: Pan) -> Result<SinkId, JsValue> {
        let element = HtmlAudioElement::new_with_src(url)?;
        element.set_loop(true);
        element.set_cross_origin(Some("anonymous"));

        let source = self.context.create_media_element_source(&element)?;
        let pan_node: &AudioNode = match &pan {
            Pan::Spatial(node) => node.as_ref(),
            Pan::Stereo(node) => node.as_ref(),
        };
        source.connect_with_audio_node(pan_node)?;
        pan_node.connect_with_audio_node(&self.compressor)?;

        self.voices.push(Voice { element, pan });
        Ok(SinkId(self.voices.len() - 1))
    }

    fn ramp(&self, param: &AudioParam, value: f32, ramp_time: f32) -> Result<(), JsValue> {
        let now = self.context.current_time();
        param.cancel_scheduled_values(now)?;
        param.set_value_at_time(param.value(), now)?;
        param.linear_ramp_to_value_at_time(value, now + ramp_time as f64)?;
        Ok(())
    }

    fn play(element: &HtmlAudioElement) {
        if let Err(err) = element.play() {
            log::warn!("could not start playback: {:?}", err);
        }
    }
}

impl AudioEngine for WebAudioEngine {
    fn is_started(&self) -> bool {
        self.started
    }

    fn resume(&mut self) {
        if let Err(err) = self.context.resume() {
            log::warn!("audio context did not resume: {:?}", err);
            return;
        }
        self.started = true;
    }

    fn ramp_panner(&mut self, sink: SinkId, target: AudioPosition, ramp_time: f32) {
        let Some(Voice {
            pan: Pan::Spatial(panner),
            ..
        }) = self.voices.get(sink.0)
        else {
            return;
        };

        let params = [
            (panner.position_x(), target.x),
            (panner.position_y(), target.y),
            (panner.position_z(), target.z),
        ];
        for (param, value) in params {
            if let Err(err) = self.ramp(&param, value, ramp_time) {
                log::warn!("panner ramp failed on voice {}: {:?}", sink.0, err);
            }
        }
    }

    fn set_stereo_pan(&mut self, sink: SinkId, pan: f32) {
        if let Some(Voice {
            pan: Pan::Stereo(panner),
            ..
        }) = self.voices.get(sink.0)
        {
            panner.pan().set_value(pan.clamp(-1.0, 1.0));
        }
    }

    fn set_bpm(&mut self, bpm: f32) {
        self.bpm = bpm;
        log::debug!("transport at {:.2} BPM", bpm);
    }

    fn set_playback_rate(&mut self, rate: f32) {
        for voice in &self.voices {
            voice.element.set_playback_rate(rate as f64);
        }
    }

    fn start_player(&mut self, sink: SinkId, delay: f32, rate: f32) {
        let Some(voice) = self.voices.get(sink.0) else {
            return;
        };
        let element = voice.element.clone();
        if let Err(err) = element.pause() {
            log::warn!("could not stop voice {}: {:?}", sink.0, err);
        }
        element.set_playback_rate(rate as f64);
        element.set_current_time(0.0);

        if delay <= 0.0 {
            Self::play(&element);
            return;
        }

        let Some(window) = web_sys::window() else {
            Self::play(&element);
            return;
        };
        let callback = Closure::once_into_js(move || Self::play(&element));
        let millis = (delay * 1000.0).round() as i32;
        if let Err(err) =
            window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis)
        {
            log::warn!("could not schedule voice {}: {:?}", sink.0, err);
        }
    }
}

/// Stereo noise burst with a quadratic decay, used as the reverb tail
fn impulse_response(context: &AudioContext, decay_secs: f32) -> Result<AudioBuffer, JsValue> {
    let rate = context.sample_rate();
    let length = (rate * decay_secs).max(1.0) as u32;
    let buffer = context.create_buffer(2, length, rate)?;

    for channel in 0..2 {
        let mut samples: Vec<f32> = (0..length)
            .map(|i| {
                let fade = 1.0 - i as f32 / length as f32;
                (js_sys::Math::random() as f32 * 2.0 - 1.0) * fade * fade
            })
            .collect();
        buffer.copy_to_channel(&mut samples, channel)?;
    }
    Ok(buffer)
}
