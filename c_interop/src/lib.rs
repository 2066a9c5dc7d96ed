#![deny(improper_ctypes_definitions)]

//! C entry points for platform bridges (JNI shims, Swift, C#).
//!
//! A host creates one context per GL context, passes the returned pointer to
//! every call, and finally hands it to `edgeview_destroy`. All calls for one
//! context must come from the thread that owns its GL context. A null context
//! pointer is logged and ignored.

use std::ffi::{c_char, c_void, CStr};

use common::LogConfig;
use edgeview::{GlowBackend, PipelineConfig, StatsSnapshot, TextureHandle};

use crate::ctx::Context;

mod ctx;

/// Resolves a GL function by name, e.g. a wrapper around `eglGetProcAddress`.
pub type GlLoaderFn = extern "C" fn(name: *const c_char, user_data: *mut c_void) -> *const c_void;

/// Installs console logging at `level` (`"info"`, `"edgeview=debug"`, ...).
/// Null selects the default level. Returns false if logging was already set up.
#[no_mangle]
pub extern "C" fn edgeview_setup_logging(level: *const c_char) -> bool {
    let config = match read_str(level) {
        Some(level) => LogConfig::with_level(&level),
        None => LogConfig::default(),
    };

    match common::setup_logging(&config) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("edgeview logging setup failed: {e:#}");
            false
        }
    }
}

/// Creates a context drawing through the host's current GL context.
#[no_mangle]
pub extern "C" fn edgeview_create(loader: GlLoaderFn, user_data: *mut c_void) -> *mut c_void {
    create_gl(loader, user_data, PipelineConfig::default())
}

/// Like `edgeview_create` with a JSON configuration. Invalid JSON or values
/// are logged and the defaults are used.
#[no_mangle]
pub extern "C" fn edgeview_create_with_config(
    loader: GlLoaderFn,
    user_data: *mut c_void,
    config_json: *const c_char,
) -> *mut c_void {
    create_gl(loader, user_data, parse_config(config_json))
}

/// Creates a context backed by the in-memory software GL, for host-side tests.
#[no_mangle]
pub extern "C" fn edgeview_create_headless() -> *mut c_void {
    into_raw(Context::headless(PipelineConfig::default()))
}

#[no_mangle]
pub extern "C" fn edgeview_destroy(ctx: *mut c_void) {
    if ctx.is_null() {
        return;
    }
    // Dropping the pipeline releases its GPU resources.
    drop(unsafe { Box::from_raw(ctx as *mut Context) });
}

#[no_mangle]
pub extern "C" fn edgeview_init(ctx: *mut c_void) {
    if let Some(context) = get_context(ctx, "init") {
        context.pipeline.init();
    }
}

#[no_mangle]
pub extern "C" fn edgeview_resize(ctx: *mut c_void, width: i32, height: i32) {
    if let Some(context) = get_context(ctx, "resize") {
        context.pipeline.resize(width, height);
    }
}

#[no_mangle]
pub extern "C" fn edgeview_process_and_render(
    ctx: *mut c_void,
    input_texture: u32,
    width: i32,
    height: i32,
) {
    if let Some(context) = get_context(ctx, "process_and_render") {
        context
            .pipeline
            .process_and_render(TextureHandle(input_texture), width, height);
    }
}

#[no_mangle]
pub extern "C" fn edgeview_render_only(ctx: *mut c_void) {
    if let Some(context) = get_context(ctx, "render_only") {
        context.pipeline.render_only();
    }
}

#[no_mangle]
pub extern "C" fn edgeview_release(ctx: *mut c_void) {
    if let Some(context) = get_context(ctx, "release") {
        context.pipeline.release();
    }
}

/// Copies frame statistics into `out`. Returns false on null pointers.
#[no_mangle]
pub extern "C" fn edgeview_stats(ctx: *mut c_void, out: *mut StatsSnapshot) -> bool {
    if out.is_null() {
        return false;
    }
    let Some(context) = get_context(ctx, "stats") else {
        return false;
    };

    unsafe { out.write(context.pipeline.stats_snapshot()) };
    true
}

fn create_gl(loader: GlLoaderFn, user_data: *mut c_void, config: PipelineConfig) -> *mut c_void {
    let gl = unsafe { GlowBackend::from_loader(|name| loader(name.as_ptr(), user_data)) };
    tracing::info!("GL backend created: {gl:?}");
    into_raw(Context::with_gl(gl, config))
}

fn into_raw(context: Context) -> *mut c_void {
    Box::into_raw(Box::new(context)) as *mut c_void
}

pub(crate) fn get_context<'a>(ctx: *mut c_void, call: &str) -> Option<&'a mut Context> {
    let context = unsafe { (ctx as *mut Context).as_mut() };
    if context.is_none() {
        tracing::error!("edgeview_{call} called with a null context");
    }
    context
}

fn read_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let s = unsafe { CStr::from_ptr(ptr) };
    Some(s.to_string_lossy().into_owned())
}

fn parse_config(json: *const c_char) -> PipelineConfig {
    let Some(json) = read_str(json) else {
        return PipelineConfig::default();
    };

    PipelineConfig::from_json(&json).unwrap_or_else(|e| {
        tracing::error!("Invalid pipeline config, using defaults: {e}");
        PipelineConfig::default()
    })
}
