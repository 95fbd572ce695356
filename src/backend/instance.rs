// Vulkan entry and instance
//
// Responsibilities:
// - Enumerate instance extensions and layers once, cache them
// - Refuse to create an instance with anything not in those caches
// - Enumerate physical devices
// - Optional debug messenger routed into the injected logger

use ash::extensions::ext::DebugUtils;
use ash::vk;
use std::cell::OnceCell;
use std::ffi::{c_char, c_void, CStr, CString};
use std::rc::Rc;

use super::error::{check, non_null, unsupported, Result};
use super::physical_device::PhysicalDevice;
use super::surface::SurfaceProvider;
use super::Driver;
use crate::Logger;

/// Name of an enumerated extension
pub(crate) fn extension_name(props: &vk::ExtensionProperties) -> &CStr {
    unsafe { CStr::from_ptr(props.extension_name.as_ptr()) }
}

pub(crate) fn layer_name(props: &vk::LayerProperties) -> &CStr {
    unsafe { CStr::from_ptr(props.layer_name.as_ptr()) }
}

pub(crate) fn has_extension(available: &[vk::ExtensionProperties], name: &CStr) -> bool {
    available.iter().any(|props| extension_name(props) == name)
}

/// Everything needed to create an instance
#[derive(Debug, Clone)]
pub struct InstanceDesc {
    pub application_name: CString,
    pub application_version: u32,
    pub engine_name: CString,
    pub engine_version: u32,
    pub api_version: u32,
    pub extensions: Vec<CString>,
    pub layers: Vec<CString>,
}

impl Default for InstanceDesc {
    fn default() -> Self {
        Self {
            application_name: c"Vulkan Sample".to_owned(),
            application_version: vk::make_api_version(0, 1, 0, 0),
            engine_name: c"Vulkan Engine".to_owned(),
            engine_version: vk::make_api_version(0, 1, 0, 0),
            api_version: vk::API_VERSION_1_0,
            extensions: Vec::new(),
            layers: Vec::new(),
        }
    }
}

/// Driver plus the cached instance-level enumerations
pub struct Entry {
    driver: Rc<dyn Driver>,
    logger: Logger,
    extensions: OnceCell<Vec<vk::ExtensionProperties>>,
    layers: OnceCell<Vec<vk::LayerProperties>>,
}

impl Entry {
    pub fn new(driver: Rc<dyn Driver>, logger: Logger) -> Self {
        Self {
            driver,
            logger,
            extensions: OnceCell::new(),
            layers: OnceCell::new(),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Supported instance extensions, enumerated on first use
    pub fn instance_extensions(&self) -> Result<&[vk::ExtensionProperties]> {
        if let Some(extensions) = self.extensions.get() {
            return Ok(extensions);
        }

        let extensions = check(
            &self.logger,
            "vkEnumerateInstanceExtensionProperties",
            self.driver.enumerate_instance_extensions(),
        )?;
        if extensions.is_empty() {
            return Err(unsupported(&self.logger, "Instance extension", "(none reported)"));
        }

        Ok(self.extensions.get_or_init(|| extensions))
    }

    /// Available instance layers, enumerated on first use. May be empty.
    pub fn instance_layers(&self) -> Result<&[vk::LayerProperties]> {
        if let Some(layers) = self.layers.get() {
            return Ok(layers);
        }

        let layers = check(
            &self.logger,
            "vkEnumerateInstanceLayerProperties",
            self.driver.enumerate_instance_layers(),
        )?;
        Ok(self.layers.get_or_init(|| layers))
    }

    pub fn is_instance_extension_supported(&self, name: &CStr) -> Result<bool> {
        Ok(has_extension(self.instance_extensions()?, name))
    }

    pub fn log_instance_extensions(&self) {
        let Ok(extensions) = self.instance_extensions() else {
            return;
        };

        log_info!(self.logger, "Instance Extension Properties:");
        for props in extensions {
            log_info!(
                self.logger,
                "Name: {}, Version: {}",
                extension_name(props).to_string_lossy(),
                props.spec_version
            );
        }
    }

    /// Instance extensions the window's display needs for presentation
    pub fn required_surface_extensions(&self, window: &dyn SurfaceProvider) -> Result<Vec<CString>> {
        check(
            &self.logger,
            "vkEnumerateRequiredExtensions",
            self.driver.required_surface_extensions(window.display_handle()),
        )
    }

    pub fn create_instance(&self, desc: &InstanceDesc) -> Result<Instance> {
        let supported = self.instance_extensions()?;
        for extension in &desc.extensions {
            if !has_extension(supported, extension) {
                return Err(unsupported(
                    &self.logger,
                    "Instance extension",
                    extension.to_string_lossy(),
                ));
            }
        }

        if !desc.layers.is_empty() {
            let available = self.instance_layers()?;
            for layer in &desc.layers {
                if !available.iter().any(|props| layer_name(props) == layer.as_c_str()) {
                    return Err(unsupported(&self.logger, "Instance layer", layer.to_string_lossy()));
                }
            }
        }

        let app_info = vk::ApplicationInfo::builder()
            .application_name(&desc.application_name)
            .application_version(desc.application_version)
            .engine_name(&desc.engine_name)
            .engine_version(desc.engine_version)
            .api_version(desc.api_version);

        let extensions: Vec<*const c_char> = desc.extensions.iter().map(|e| e.as_ptr()).collect();
        let layers: Vec<*const c_char> = desc.layers.iter().map(|l| l.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers);

        let handle = check(
            &self.logger,
            "vkCreateInstance",
            self.driver.create_instance(&create_info),
        )?;
        let handle = non_null(&self.logger, "vkCreateInstance", handle)?;

        log_info!(
            self.logger,
            "Created Vulkan instance for {} ({} extensions, {} layers)",
            desc.application_name.to_string_lossy(),
            desc.extensions.len(),
            desc.layers.len()
        );

        Ok(Instance {
            shared: Rc::new(InstanceShared {
                driver: self.driver.clone(),
                logger: self.logger.clone(),
                handle,
                extensions: desc.extensions.clone(),
            }),
        })
    }
}

pub(crate) struct InstanceShared {
    driver: Rc<dyn Driver>,
    logger: Logger,
    handle: vk::Instance,
    extensions: Vec<CString>,
}

impl InstanceShared {
    pub(crate) fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub(crate) fn logger(&self) -> &Logger {
        &self.logger
    }

    pub(crate) fn handle(&self) -> vk::Instance {
        self.handle
    }

    pub(crate) fn is_extension_enabled(&self, name: &CStr) -> bool {
        self.extensions.iter().any(|e| e.as_c_str() == name)
    }
}

impl Drop for InstanceShared {
    fn drop(&mut self) {
        if self.handle != vk::Instance::null() {
            log_info!(self.logger, "Destroying Vulkan instance");
            self.driver.destroy_instance(self.handle);
            self.handle = vk::Instance::null();
        }
    }
}

/// Scoped Vulkan instance. Destroyed once every child object is gone.
pub struct Instance {
    shared: Rc<InstanceShared>,
}

impl Instance {
    pub fn handle(&self) -> vk::Instance {
        self.shared.handle
    }

    pub fn is_extension_enabled(&self, name: &CStr) -> bool {
        self.shared.is_extension_enabled(name)
    }

    pub(crate) fn shared(&self) -> &Rc<InstanceShared> {
        &self.shared
    }

    /// Every physical device, in driver order. An empty list is a failure.
    pub fn physical_devices(&self) -> Result<Vec<PhysicalDevice>> {
        let logger = &self.shared.logger;
        let handles = check(
            logger,
            "vkEnumeratePhysicalDevices",
            self.shared.driver.enumerate_physical_devices(self.shared.handle),
        )?;

        if handles.is_empty() {
            return Err(unsupported(logger, "Physical device", "(none reported)"));
        }

        Ok(handles
            .into_iter()
            .map(|handle| PhysicalDevice::new(self.shared.clone(), handle))
            .collect())
    }

    /// Route validation messages into the logger. Needs VK_EXT_debug_utils.
    pub fn create_debug_messenger(
        &self,
        severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    ) -> Result<DebugMessenger> {
        if !self.is_extension_enabled(DebugUtils::name()) {
            return Err(unsupported(
                &self.shared.logger,
                "Instance extension",
                DebugUtils::name().to_string_lossy(),
            ));
        }

        // Boxed so the callback's user-data pointer stays put
        let sink = Box::new(self.shared.logger.clone());

        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(severity)
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback))
            .user_data(sink.as_ref() as *const Logger as *mut c_void);

        let handle = check(
            &self.shared.logger,
            "vkCreateDebugUtilsMessengerEXT",
            self.shared
                .driver
                .create_debug_messenger(self.shared.handle, &create_info),
        )?;

        Ok(DebugMessenger {
            instance: self.shared.clone(),
            handle,
            _sink: sink,
        })
    }
}

/// Validation-layer messenger; keeps the logger it reports to alive
pub struct DebugMessenger {
    instance: Rc<InstanceShared>,
    handle: vk::DebugUtilsMessengerEXT,
    _sink: Box<Logger>,
}

impl DebugMessenger {
    pub fn handle(&self) -> vk::DebugUtilsMessengerEXT {
        self.handle
    }
}

impl Drop for DebugMessenger {
    fn drop(&mut self) {
        if self.handle != vk::DebugUtilsMessengerEXT::null() {
            self.instance
                .driver
                .destroy_debug_messenger(self.instance.handle, self.handle);
            self.handle = vk::DebugUtilsMessengerEXT::null();
        }
    }
}

unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    p_user_data: *mut c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || p_user_data.is_null() || (*p_callback_data).p_message.is_null() {
        return vk::FALSE;
    }

    let logger = &*(p_user_data as *const Logger);
    let message = CStr::from_ptr((*p_callback_data).p_message).to_string_lossy();

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => log_error!(logger, "[Vulkan] {}", message),
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => log_warn!(logger, "[Vulkan] {}", message),
        _ => logger.log(log::Level::Debug, format_args!("[Vulkan] {}", message)),
    }

    vk::FALSE
}
