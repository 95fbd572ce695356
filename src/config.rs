// =============================================================================
// CONFIGURATION - Load settings from config.toml
// =============================================================================
//
// This module handles loading and parsing configuration from config.toml.
// Provides sensible defaults if config file is missing or has errors.
// Vulkan enums are written as lowercase strings and converted here.

use anyhow::{Context, Result};
use ash::vk;
use log::LevelFilter;
use serde::Deserialize;
use std::ffi::CString;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub application: ApplicationConfig,
    pub window: WindowConfig,
    pub instance: InstanceConfig,
    pub device: DeviceConfig,
    pub swapchain: SwapchainConfig,
    pub logging: LoggingConfig,
}

/// Application info handed to the driver
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub name: String,
    pub engine_name: String,
    /// Enable VK_LAYER_KHRONOS_validation and the debug messenger
    pub validation: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "Vulkan Sample".to_string(),
            engine_name: "Vulkan Engine".to_string(),
            validation: false,
        }
    }
}

/// Window settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vulkan Walkthrough".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Extra instance extensions and layers (surface extensions are always added)
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct InstanceConfig {
    pub extensions: Vec<String>,
    pub layers: Vec<String>,
}

/// Logical device settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub extensions: Vec<String>,
    /// One queue per entry
    pub queue_priorities: Vec<f32>,
    /// Any of "graphics", "compute", "transfer", "sparse_binding"
    pub queue_flags: Vec<String>,
    /// Queue family must be able to present to the window
    pub presentation: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["VK_KHR_swapchain".to_string()],
            queue_priorities: vec![1.0],
            queue_flags: vec!["graphics".to_string()],
            presentation: true,
        }
    }
}

/// Swapchain settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SwapchainConfig {
    pub present_mode: String,
    pub format: String,
    pub color_space: String,
}

impl Default for SwapchainConfig {
    fn default() -> Self {
        Self {
            present_mode: "fifo".to_string(),
            format: "b8g8r8a8_unorm".to_string(),
            color_space: "srgb_nonlinear".to_string(),
        }
    }
}

/// Where the resource manager's own log lines go
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// "console" or "file"
    pub sink: String,
    pub file: PathBuf,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            sink: "console".to_string(),
            file: PathBuf::from("vulkan_walkthrough.log"),
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults if not found
    pub fn load() -> Self {
        Self::load_from_path("config.toml").unwrap_or_else(|e| {
            log::warn!("Failed to load config.toml: {:#}. Using defaults.", e);
            Config::default()
        })
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        log::info!("Loaded configuration from {:?}", path);
        log::debug!("Config: {:?}", config);

        Ok(config)
    }
}

impl SwapchainConfig {
    /// Get present mode as Vulkan enum
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        match self.present_mode.to_lowercase().as_str() {
            "immediate" => vk::PresentModeKHR::IMMEDIATE,
            "mailbox" => vk::PresentModeKHR::MAILBOX,
            "fifo" => vk::PresentModeKHR::FIFO,
            "fifo_relaxed" => vk::PresentModeKHR::FIFO_RELAXED,
            _ => {
                log::warn!(
                    "Unknown present mode '{}', defaulting to FIFO",
                    self.present_mode
                );
                vk::PresentModeKHR::FIFO
            }
        }
    }

    pub fn surface_format(&self) -> vk::SurfaceFormatKHR {
        let format = match self.format.to_lowercase().as_str() {
            "b8g8r8a8_unorm" => vk::Format::B8G8R8A8_UNORM,
            "b8g8r8a8_srgb" => vk::Format::B8G8R8A8_SRGB,
            "r8g8b8a8_unorm" => vk::Format::R8G8B8A8_UNORM,
            "r8g8b8a8_srgb" => vk::Format::R8G8B8A8_SRGB,
            "a2b10g10r10_unorm" => vk::Format::A2B10G10R10_UNORM_PACK32,
            "r16g16b16a16_sfloat" => vk::Format::R16G16B16A16_SFLOAT,
            _ => {
                log::warn!("Unknown format '{}', defaulting to B8G8R8A8_UNORM", self.format);
                vk::Format::B8G8R8A8_UNORM
            }
        };

        let color_space = match self.color_space.to_lowercase().as_str() {
            "srgb_nonlinear" => vk::ColorSpaceKHR::SRGB_NONLINEAR,
            "extended_srgb_linear" => vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
            "hdr10_st2084" => vk::ColorSpaceKHR::HDR10_ST2084_EXT,
            _ => {
                log::warn!(
                    "Unknown color space '{}', defaulting to SRGB_NONLINEAR",
                    self.color_space
                );
                vk::ColorSpaceKHR::SRGB_NONLINEAR
            }
        };

        vk::SurfaceFormatKHR { format, color_space }
    }
}

impl DeviceConfig {
    /// Union of the configured queue capabilities
    pub fn queue_flags(&self) -> vk::QueueFlags {
        self.queue_flags
            .iter()
            .fold(vk::QueueFlags::empty(), |flags, name| {
                flags
                    | match name.to_lowercase().as_str() {
                        "graphics" => vk::QueueFlags::GRAPHICS,
                        "compute" => vk::QueueFlags::COMPUTE,
                        "transfer" => vk::QueueFlags::TRANSFER,
                        "sparse_binding" => vk::QueueFlags::SPARSE_BINDING,
                        _ => {
                            log::warn!("Unknown queue flag '{}', ignoring", name);
                            vk::QueueFlags::empty()
                        }
                    }
            })
    }

    pub fn extension_names(&self) -> Vec<CString> {
        c_strings(&self.extensions)
    }
}

impl InstanceConfig {
    pub fn extension_names(&self) -> Vec<CString> {
        c_strings(&self.extensions)
    }

    pub fn layer_names(&self) -> Vec<CString> {
        c_strings(&self.layers)
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or_else(|_| {
            log::warn!("Unknown log level '{}', defaulting to info", self.level);
            LevelFilter::Info
        })
    }

    pub fn to_file(&self) -> bool {
        self.sink.eq_ignore_ascii_case("file")
    }
}

/// Names with an interior NUL are dropped with a warning
fn c_strings(names: &[String]) -> Vec<CString> {
    names
        .iter()
        .filter_map(|name| match CString::new(name.as_str()) {
            Ok(name) => Some(name),
            Err(_) => {
                log::warn!("Ignoring name with interior NUL: {:?}", name);
                None
            }
        })
        .collect()
}
