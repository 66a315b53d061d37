use thiserror::Error;

use crate::config::ConfigError;

/// Fatal startup failures. None of these are recovered from; they are
/// logged and shown to the user.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("page is missing {0}")]
    Dom(&'static str),
    #[error("failed to create rendering surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no GPU adapter available: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to open GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface has no supported texture format")]
    NoSurfaceFormat,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("browser call failed: {0}")]
    Js(String),
    #[cfg(not(target_arch = "wasm32"))]
    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[cfg(not(target_arch = "wasm32"))]
    #[error("failed to open window: {0}")]
    Window(#[from] winit::error::OsError),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for AppError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        AppError::Js(format!("{value:?}"))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<AppError> for wasm_bindgen::JsValue {
    fn from(err: AppError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}
