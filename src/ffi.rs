// C-compatible FFI bindings for host applications (Swift/iOS, JNI/Android).
//
// Safety requirements:
// - All handles must be created by this module and not fabricated
// - A handle must not be used after `sinegen_release`
// - Null handles are accepted everywhere and treated as "not created"
//
// Control functions may be called from any non-real-time thread. The
// `sinegen_render*` and `sinegen_device_*` functions (host-driven builds)
// are meant for the host's audio thread and never block.

use log::{info, warn};
use spin::Mutex;

use crate::config::{DEFAULT_FREQUENCY, GeneratorConfig};
use crate::generator::SignalGenerator;

#[cfg(feature = "cpal")]
use crate::device::CpalDevice;
#[cfg(not(feature = "cpal"))]
use crate::device::{HostDevice, HostStream};

#[cfg(feature = "ios")]
use log::LevelFilter;
#[cfg(feature = "ios")]
use oslog::OsLogger;

// Logger subsystem identifier
#[cfg(feature = "ios")]
const LOG_SUBSYSTEM: &str = "com.sinegen.engine";

#[cfg(feature = "cpal")]
type PlatformDevice = CpalDevice;
#[cfg(not(feature = "cpal"))]
type PlatformDevice = HostDevice;

// ═══════════════════════════════════════════════════════════════════════════
// Logger Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the oslog logger.
///
/// Call once at application startup. Logs appear in Console.app and
/// Xcode's debug console.
#[cfg(feature = "ios")]
#[unsafe(no_mangle)]
pub extern "C" fn sinegen_init_logger() {
    OsLogger::new(LOG_SUBSYSTEM)
        .level_filter(LevelFilter::Debug)
        .init()
        .ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Opaque Handle Type
// ═══════════════════════════════════════════════════════════════════════════

/// Opaque handle owning one signal generator.
pub struct SinegenHandle {
    /// Control-thread state. Only control functions lock it.
    generator: Mutex<SignalGenerator<PlatformDevice>>,

    /// Audio-thread entry point for host-driven builds.
    #[cfg(not(feature = "cpal"))]
    stream: HostStream,
}

impl SinegenHandle {
    fn new(config: GeneratorConfig) -> Self {
        let device = PlatformDevice::new();
        #[cfg(not(feature = "cpal"))]
        let stream = device.stream();

        Self {
            generator: Mutex::new(SignalGenerator::new(device, config)),
            #[cfg(not(feature = "cpal"))]
            stream,
        }
    }
}

/// Borrow the handle, or `None` for null.
///
/// # Safety
/// `handle` must be null or a live pointer from `sinegen_create*`.
unsafe fn handle_ref<'a>(handle: *const SinegenHandle) -> Option<&'a SinegenHandle> {
    unsafe { handle.as_ref() }
}

// ═══════════════════════════════════════════════════════════════════════════
// Creation / Destruction
// ═══════════════════════════════════════════════════════════════════════════

/// Get the default configuration values.
#[unsafe(no_mangle)]
pub extern "C" fn sinegen_default_config() -> GeneratorConfig {
    GeneratorConfig::default()
}

/// Create a generator with default configuration.
///
/// Returns an opaque pointer that must be freed with `sinegen_release`.
#[unsafe(no_mangle)]
pub extern "C" fn sinegen_create() -> *mut SinegenHandle {
    unsafe { sinegen_create_with_config(std::ptr::null()) }
}

/// Create a generator with custom configuration.
///
/// # Safety
/// `config` must be null (defaults) or point to a valid `GeneratorConfig`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinegen_create_with_config(
    config: *const GeneratorConfig,
) -> *mut SinegenHandle {
    let cfg = if config.is_null() {
        GeneratorConfig::default()
    } else {
        unsafe { std::ptr::read(config) }
    };

    info!("Creating signal generator: {:?}", cfg);
    Box::into_raw(Box::new(SinegenHandle::new(cfg)))
}

/// Stop playback, close the stream and free the handle.
///
/// The stream is closed before the memory is released, so the render
/// callback cannot run on a freed generator.
///
/// # Safety
/// `handle` must be null or a pointer returned by `sinegen_create*`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinegen_release(handle: *mut SinegenHandle) {
    info!("Releasing signal generator");
    if handle.is_null() {
        return;
    }
    let handle = unsafe { Box::from_raw(handle) };
    handle.generator.lock().release();
    drop(handle);
}

// ═══════════════════════════════════════════════════════════════════════════
// Control
// ═══════════════════════════════════════════════════════════════════════════

/// Open the output stream. Returns `false` if the device could not be opened.
///
/// # Safety
/// `handle` must be null or a live pointer from `sinegen_create*`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinegen_initialize(handle: *mut SinegenHandle) -> bool {
    info!("Initializing signal generator");
    let Some(handle) = (unsafe { handle_ref(handle) }) else {
        warn!("sinegen_initialize called with null handle");
        return false;
    };
    handle.generator.lock().initialize().is_ok()
}

/// Start playback.
///
/// # Safety
/// `handle` must be null or a live pointer from `sinegen_create*`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinegen_start(handle: *mut SinegenHandle) {
    info!("Starting audio");
    if let Some(handle) = unsafe { handle_ref(handle) } {
        handle.generator.lock().start();
    }
}

/// Stop playback.
///
/// # Safety
/// `handle` must be null or a live pointer from `sinegen_create*`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinegen_stop(handle: *mut SinegenHandle) {
    info!("Stopping audio");
    if let Some(handle) = unsafe { handle_ref(handle) } {
        handle.generator.lock().stop();
    }
}

/// Set the volume (clamped to [0, 1]).
///
/// # Safety
/// `handle` must be null or a live pointer from `sinegen_create*`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinegen_set_volume(handle: *mut SinegenHandle, volume: f32) {
    info!("Setting volume to {}", volume);
    if let Some(handle) = unsafe { handle_ref(handle) } {
        handle.generator.lock().set_volume(volume);
    }
}

/// Set the frequency in Hz (clamped to [20, 20000]).
///
/// # Safety
/// `handle` must be null or a live pointer from `sinegen_create*`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinegen_set_frequency(handle: *mut SinegenHandle, frequency: f32) {
    info!("Setting frequency to {}", frequency);
    if let Some(handle) = unsafe { handle_ref(handle) } {
        handle.generator.lock().set_frequency(frequency);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Readback
// ═══════════════════════════════════════════════════════════════════════════

/// Whether playback is on. `false` for a null handle.
///
/// # Safety
/// `handle` must be null or a live pointer from `sinegen_create*`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinegen_is_playing(handle: *const SinegenHandle) -> bool {
    match unsafe { handle_ref(handle) } {
        Some(handle) => handle.generator.lock().is_playing(),
        None => false,
    }
}

/// Current volume. `0.0` for a null handle.
///
/// # Safety
/// `handle` must be null or a live pointer from `sinegen_create*`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinegen_get_volume(handle: *const SinegenHandle) -> f32 {
    match unsafe { handle_ref(handle) } {
        Some(handle) => handle.generator.lock().get_volume(),
        None => 0.0,
    }
}

/// Current frequency in Hz. `440.0` for a null handle.
///
/// # Safety
/// `handle` must be null or a live pointer from `sinegen_create*`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinegen_get_frequency(handle: *const SinegenHandle) -> f32 {
    match unsafe { handle_ref(handle) } {
        Some(handle) => handle.generator.lock().get_frequency(),
        None => DEFAULT_FREQUENCY,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Host-Driven Device (audio thread)
// ═══════════════════════════════════════════════════════════════════════════

/// Report that the host's output stream is starting at `sample_rate` Hz.
///
/// # Safety
/// `handle` must be null or a live pointer from `sinegen_create*`.
#[cfg(not(feature = "cpal"))]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinegen_device_about_to_start(
    handle: *const SinegenHandle,
    sample_rate: f64,
) {
    if let Some(handle) = unsafe { handle_ref(handle) } {
        handle.stream.about_to_start(sample_rate);
    }
}

/// Report that the host's output stream has stopped.
///
/// # Safety
/// `handle` must be null or a live pointer from `sinegen_create*`.
#[cfg(not(feature = "cpal"))]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinegen_device_stopped(handle: *const SinegenHandle) {
    if let Some(handle) = unsafe { handle_ref(handle) } {
        handle.stream.stopped();
    }
}

/// Render `frames` frames into separate left/right buffers.
///
/// A null output pointer is skipped; with only one non-null buffer the
/// signal is rendered mono into it. A null handle writes silence.
///
/// # Safety
/// - `handle` must be null or a live pointer from `sinegen_create*`
/// - Non-null output buffers must have space for `frames` floats
#[cfg(not(feature = "cpal"))]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinegen_render(
    handle: *const SinegenHandle,
    frames: u32,
    output_left: *mut f32,
    output_right: *mut f32,
) {
    let total_frames = frames as usize;

    let left = (!output_left.is_null())
        .then(|| unsafe { std::slice::from_raw_parts_mut(output_left, total_frames) });
    let right = (!output_right.is_null())
        .then(|| unsafe { std::slice::from_raw_parts_mut(output_right, total_frames) });

    let Some(handle) = (unsafe { handle_ref(handle) }) else {
        for out in [left, right].into_iter().flatten() {
            out.fill(0.0);
        }
        return;
    };

    match (left, right) {
        (Some(left), Some(right)) => handle.stream.render_channels(&mut [left, right]),
        (Some(mono), None) | (None, Some(mono)) => handle.stream.render_channels(&mut [mono]),
        (None, None) => {}
    }
}

/// Render `frames` stereo frames into an interleaved buffer `[L0, R0, L1, R1, ...]`.
///
/// # Safety
/// - `handle` must be null or a live pointer from `sinegen_create*`
/// - `output` must have space for `frames * 2` floats
#[cfg(not(feature = "cpal"))]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinegen_render_interleaved(
    handle: *const SinegenHandle,
    frames: u32,
    output: *mut f32,
) {
    if output.is_null() {
        return;
    }
    let out = unsafe { std::slice::from_raw_parts_mut(output, frames as usize * 2) };

    match unsafe { handle_ref(handle) } {
        Some(handle) => handle.stream.render_interleaved(out, 2),
        None => out.fill(0.0),
    }
}
