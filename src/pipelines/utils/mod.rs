use crate::core::error::{EmotionError, Result};
use crate::core::ModelOptions;
use candle_core::backend::BackendDevice;
use candle_core::{CudaDevice, Device};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;

/// Environment variable naming the visible accelerator devices.
pub const CUDA_VISIBLE_DEVICES: &str = "CUDA_VISIBLE_DEVICES";

/// Accelerator index from `CUDA_VISIBLE_DEVICES`.
///
/// Only the first character of the variable is interpreted: a digit selects
/// that device index, anything else (or an unset variable) disables the
/// accelerator. This mirrors the pretrained artifact's serving convention,
/// so misconfigured values downgrade to CPU without a warning.
pub fn visible_cuda_device() -> Option<usize> {
    let places = std::env::var(CUDA_VISIBLE_DEVICES).ok()?;
    places.chars().next()?.to_digit(10).map(|d| d as usize)
}

/// Initialize a CUDA device by index.
///
/// Caches one `CudaDevice` per GPU to avoid stream mismatches when reusing
/// cached models. Synchronizes before returning so pending operations from
/// previous models are complete.
pub fn init_cuda_device(index: usize) -> Result<Device> {
    static CUDA_DEVICE_CACHE: Lazy<Mutex<HashMap<usize, CudaDevice>>> =
        Lazy::new(|| Mutex::new(HashMap::new()));

    let mut cache = CUDA_DEVICE_CACHE.lock().unwrap();
    if let Some(dev) = cache.get(&index) {
        dev.synchronize().map_err(|e| {
            EmotionError::Device(format!("Failed to sync CUDA device {index}: {e}"))
        })?;
        return Ok(Device::Cuda(dev.clone()));
    }

    let dev = CudaDevice::new_with_stream(index).map_err(|e| {
        EmotionError::Device(format!("Failed to init CUDA device {index}: {e}"))
    })?;
    cache.insert(index, dev.clone());
    Ok(Device::Cuda(dev))
}

/// Utility to generate a cache key for model options.
pub fn build_cache_key<O: ModelOptions>(options: &O) -> String {
    options.cache_key()
}
