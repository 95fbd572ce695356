// Ash driver - the real Vulkan backend
//
// Loads the Vulkan library and keeps the function tables for the one
// instance and the one device the walkthrough creates. Calls naming a handle
// that is not loaded fail with ERROR_INITIALIZATION_FAILED (queries return
// defaults, destroys are skipped).

use ash::extensions::{ext::DebugUtils, khr};
use ash::prelude::VkResult;
use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::cell::RefCell;
use std::ffi::{c_void, CStr, CString};
use std::rc::Rc;

use super::Driver;

struct LoadedInstance {
    instance: ash::Instance,
    surface: khr::Surface,
    debug_utils: DebugUtils,
}

struct LoadedDevice {
    device: ash::Device,
    swapchain: khr::Swapchain,
}

pub struct AshDriver {
    entry: ash::Entry,
    instance: RefCell<Option<Rc<LoadedInstance>>>,
    device: RefCell<Option<Rc<LoadedDevice>>>,
}

impl AshDriver {
    /// Load the Vulkan library
    pub fn load() -> Result<Self, ash::LoadingError> {
        let entry = unsafe { ash::Entry::load() }?;
        Ok(Self {
            entry,
            instance: RefCell::new(None),
            device: RefCell::new(None),
        })
    }

    fn instance(&self, handle: vk::Instance) -> VkResult<Rc<LoadedInstance>> {
        self.instance
            .borrow()
            .as_ref()
            .filter(|loaded| loaded.instance.handle() == handle)
            .cloned()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }

    fn device(&self, handle: vk::Device) -> VkResult<Rc<LoadedDevice>> {
        self.device
            .borrow()
            .as_ref()
            .filter(|loaded| loaded.device.handle() == handle)
            .cloned()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }
}

impl Driver for AshDriver {
    // Entry enumeration is safe in some ash releases
    #[allow(unused_unsafe)]
    fn enumerate_instance_extensions(&self) -> VkResult<Vec<vk::ExtensionProperties>> {
        unsafe {
            self.entry.enumerate_instance_extension_properties(None)
        }
    }

    #[allow(unused_unsafe)]
    fn enumerate_instance_layers(&self) -> VkResult<Vec<vk::LayerProperties>> {
        unsafe {
            self.entry.enumerate_instance_layer_properties()
        }
    }

    fn required_surface_extensions(&self, display: RawDisplayHandle) -> VkResult<Vec<CString>> {
        let names = ash_window::enumerate_required_extensions(display)?;
        Ok(names
            .iter()
            .map(|&name| unsafe { CStr::from_ptr(name) }.to_owned())
            .collect())
    }

    fn create_instance(&self, info: &vk::InstanceCreateInfo) -> VkResult<vk::Instance> {
        if self.instance.borrow().is_some() {
            return Err(vk::Result::ERROR_TOO_MANY_OBJECTS);
        }

        let instance = unsafe { self.entry.create_instance(info, None) }?;
        let surface = khr::Surface::new(&self.entry, &instance);
        let debug_utils = DebugUtils::new(&self.entry, &instance);
        let handle = instance.handle();

        *self.instance.borrow_mut() = Some(Rc::new(LoadedInstance {
            instance,
            surface,
            debug_utils,
        }));
        Ok(handle)
    }

    fn destroy_instance(&self, instance: vk::Instance) {
        if let Ok(loaded) = self.instance(instance) {
            self.instance.borrow_mut().take();
            unsafe { loaded.instance.destroy_instance(None) };
        }
    }

    fn enumerate_physical_devices(&self, instance: vk::Instance) -> VkResult<Vec<vk::PhysicalDevice>> {
        let loaded = self.instance(instance)?;
        unsafe { loaded.instance.enumerate_physical_devices() }
    }

    fn physical_device_properties(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties {
        self.instance(instance)
            .map(|loaded| unsafe { loaded.instance.get_physical_device_properties(physical_device) })
            .unwrap_or_default()
    }

    fn physical_device_features(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures {
        self.instance(instance)
            .map(|loaded| unsafe { loaded.instance.get_physical_device_features(physical_device) })
            .unwrap_or_default()
    }

    fn physical_device_memory_properties(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceMemoryProperties {
        self.instance(instance)
            .map(|loaded| unsafe {
                loaded
                    .instance
                    .get_physical_device_memory_properties(physical_device)
            })
            .unwrap_or_default()
    }

    fn queue_family_properties(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        self.instance(instance)
            .map(|loaded| unsafe {
                loaded
                    .instance
                    .get_physical_device_queue_family_properties(physical_device)
            })
            .unwrap_or_default()
    }

    fn enumerate_device_extensions(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::ExtensionProperties>> {
        let loaded = self.instance(instance)?;
        unsafe {
            loaded
                .instance
                .enumerate_device_extension_properties(physical_device)
        }
    }

    fn create_debug_messenger(
        &self,
        instance: vk::Instance,
        info: &vk::DebugUtilsMessengerCreateInfoEXT,
    ) -> VkResult<vk::DebugUtilsMessengerEXT> {
        let loaded = self.instance(instance)?;
        unsafe { loaded.debug_utils.create_debug_utils_messenger(info, None) }
    }

    fn destroy_debug_messenger(&self, instance: vk::Instance, messenger: vk::DebugUtilsMessengerEXT) {
        if let Ok(loaded) = self.instance(instance) {
            unsafe {
                loaded
                    .debug_utils
                    .destroy_debug_utils_messenger(messenger, None)
            };
        }
    }

    fn create_surface(
        &self,
        instance: vk::Instance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> VkResult<vk::SurfaceKHR> {
        let loaded = self.instance(instance)?;
        unsafe { ash_window::create_surface(&self.entry, &loaded.instance, display, window, None) }
    }

    fn destroy_surface(&self, instance: vk::Instance, surface: vk::SurfaceKHR) {
        if let Ok(loaded) = self.instance(instance) {
            unsafe { loaded.surface.destroy_surface(surface, None) };
        }
    }

    fn surface_support(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        let loaded = self.instance(instance)?;
        unsafe {
            loaded.surface.get_physical_device_surface_support(
                physical_device,
                queue_family_index,
                surface,
            )
        }
    }

    fn surface_capabilities(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        let loaded = self.instance(instance)?;
        unsafe {
            loaded
                .surface
                .get_physical_device_surface_capabilities(physical_device, surface)
        }
    }

    fn surface_present_modes(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        let loaded = self.instance(instance)?;
        unsafe {
            loaded
                .surface
                .get_physical_device_surface_present_modes(physical_device, surface)
        }
    }

    fn surface_formats(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        let loaded = self.instance(instance)?;
        unsafe {
            loaded
                .surface
                .get_physical_device_surface_formats(physical_device, surface)
        }
    }

    fn create_device(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
        info: &vk::DeviceCreateInfo,
    ) -> VkResult<vk::Device> {
        let loaded = self.instance(instance)?;
        if self.device.borrow().is_some() {
            return Err(vk::Result::ERROR_TOO_MANY_OBJECTS);
        }

        let device = unsafe { loaded.instance.create_device(physical_device, info, None) }?;
        let swapchain = khr::Swapchain::new(&loaded.instance, &device);
        let handle = device.handle();

        *self.device.borrow_mut() = Some(Rc::new(LoadedDevice { device, swapchain }));
        Ok(handle)
    }

    fn destroy_device(&self, device: vk::Device) {
        if let Ok(loaded) = self.device(device) {
            self.device.borrow_mut().take();
            unsafe { loaded.device.destroy_device(None) };
        }
    }

    fn get_device_queue(&self, device: vk::Device, family_index: u32, queue_index: u32) -> vk::Queue {
        self.device(device)
            .map(|loaded| unsafe { loaded.device.get_device_queue(family_index, queue_index) })
            .unwrap_or_default()
    }

    fn device_wait_idle(&self, device: vk::Device) -> VkResult<()> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.device_wait_idle() }
    }

    fn create_swapchain(
        &self,
        device: vk::Device,
        info: &vk::SwapchainCreateInfoKHR,
    ) -> VkResult<vk::SwapchainKHR> {
        let loaded = self.device(device)?;
        unsafe { loaded.swapchain.create_swapchain(info, None) }
    }

    fn destroy_swapchain(&self, device: vk::Device, swapchain: vk::SwapchainKHR) {
        if let Ok(loaded) = self.device(device) {
            unsafe { loaded.swapchain.destroy_swapchain(swapchain, None) };
        }
    }

    fn get_swapchain_images(&self, device: vk::Device, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        let loaded = self.device(device)?;
        unsafe { loaded.swapchain.get_swapchain_images(swapchain) }
    }

    fn acquire_next_image(
        &self,
        device: vk::Device,
        swapchain: vk::SwapchainKHR,
        timeout: u64,
        semaphore: vk::Semaphore,
        fence: vk::Fence,
    ) -> VkResult<(u32, bool)> {
        let loaded = self.device(device)?;
        unsafe {
            loaded
                .swapchain
                .acquire_next_image(swapchain, timeout, semaphore, fence)
        }
    }

    fn queue_present(&self, device: vk::Device, queue: vk::Queue, info: &vk::PresentInfoKHR) -> VkResult<bool> {
        let loaded = self.device(device)?;
        unsafe { loaded.swapchain.queue_present(queue, info) }
    }

    fn create_command_pool(
        &self,
        device: vk::Device,
        info: &vk::CommandPoolCreateInfo,
    ) -> VkResult<vk::CommandPool> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.create_command_pool(info, None) }
    }

    fn destroy_command_pool(&self, device: vk::Device, pool: vk::CommandPool) {
        if let Ok(loaded) = self.device(device) {
            unsafe { loaded.device.destroy_command_pool(pool, None) };
        }
    }

    fn reset_command_pool(
        &self,
        device: vk::Device,
        pool: vk::CommandPool,
        flags: vk::CommandPoolResetFlags,
    ) -> VkResult<()> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.reset_command_pool(pool, flags) }
    }

    fn allocate_command_buffers(
        &self,
        device: vk::Device,
        info: &vk::CommandBufferAllocateInfo,
    ) -> VkResult<Vec<vk::CommandBuffer>> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.allocate_command_buffers(info) }
    }

    fn free_command_buffers(&self, device: vk::Device, pool: vk::CommandPool, buffers: &[vk::CommandBuffer]) {
        if let Ok(loaded) = self.device(device) {
            unsafe { loaded.device.free_command_buffers(pool, buffers) };
        }
    }

    fn begin_command_buffer(
        &self,
        device: vk::Device,
        buffer: vk::CommandBuffer,
        info: &vk::CommandBufferBeginInfo,
    ) -> VkResult<()> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.begin_command_buffer(buffer, info) }
    }

    fn end_command_buffer(&self, device: vk::Device, buffer: vk::CommandBuffer) -> VkResult<()> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.end_command_buffer(buffer) }
    }

    fn reset_command_buffer(
        &self,
        device: vk::Device,
        buffer: vk::CommandBuffer,
        flags: vk::CommandBufferResetFlags,
    ) -> VkResult<()> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.reset_command_buffer(buffer, flags) }
    }

    fn cmd_pipeline_barrier(
        &self,
        device: vk::Device,
        buffer: vk::CommandBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        buffer_barriers: &[vk::BufferMemoryBarrier],
        image_barriers: &[vk::ImageMemoryBarrier],
    ) {
        if let Ok(loaded) = self.device(device) {
            unsafe {
                loaded.device.cmd_pipeline_barrier(
                    buffer,
                    src_stage,
                    dst_stage,
                    vk::DependencyFlags::empty(),
                    &[],
                    buffer_barriers,
                    image_barriers,
                )
            };
        }
    }

    fn queue_submit(
        &self,
        device: vk::Device,
        queue: vk::Queue,
        submits: &[vk::SubmitInfo],
        fence: vk::Fence,
    ) -> VkResult<()> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.queue_submit(queue, submits, fence) }
    }

    fn create_semaphore(&self, device: vk::Device, info: &vk::SemaphoreCreateInfo) -> VkResult<vk::Semaphore> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.create_semaphore(info, None) }
    }

    fn destroy_semaphore(&self, device: vk::Device, semaphore: vk::Semaphore) {
        if let Ok(loaded) = self.device(device) {
            unsafe { loaded.device.destroy_semaphore(semaphore, None) };
        }
    }

    fn create_fence(&self, device: vk::Device, info: &vk::FenceCreateInfo) -> VkResult<vk::Fence> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.create_fence(info, None) }
    }

    fn destroy_fence(&self, device: vk::Device, fence: vk::Fence) {
        if let Ok(loaded) = self.device(device) {
            unsafe { loaded.device.destroy_fence(fence, None) };
        }
    }

    fn reset_fences(&self, device: vk::Device, fences: &[vk::Fence]) -> VkResult<()> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.reset_fences(fences) }
    }

    fn wait_for_fences(&self, device: vk::Device, fences: &[vk::Fence], wait_all: bool, timeout: u64) -> VkResult<()> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.wait_for_fences(fences, wait_all, timeout) }
    }

    fn create_buffer(&self, device: vk::Device, info: &vk::BufferCreateInfo) -> VkResult<vk::Buffer> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.create_buffer(info, None) }
    }

    fn destroy_buffer(&self, device: vk::Device, buffer: vk::Buffer) {
        if let Ok(loaded) = self.device(device) {
            unsafe { loaded.device.destroy_buffer(buffer, None) };
        }
    }

    fn buffer_memory_requirements(&self, device: vk::Device, buffer: vk::Buffer) -> vk::MemoryRequirements {
        self.device(device)
            .map(|loaded| unsafe { loaded.device.get_buffer_memory_requirements(buffer) })
            .unwrap_or_default()
    }

    fn bind_buffer_memory(
        &self,
        device: vk::Device,
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VkResult<()> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.bind_buffer_memory(buffer, memory, offset) }
    }

    fn create_buffer_view(&self, device: vk::Device, info: &vk::BufferViewCreateInfo) -> VkResult<vk::BufferView> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.create_buffer_view(info, None) }
    }

    fn destroy_buffer_view(&self, device: vk::Device, view: vk::BufferView) {
        if let Ok(loaded) = self.device(device) {
            unsafe { loaded.device.destroy_buffer_view(view, None) };
        }
    }

    fn create_image(&self, device: vk::Device, info: &vk::ImageCreateInfo) -> VkResult<vk::Image> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.create_image(info, None) }
    }

    fn destroy_image(&self, device: vk::Device, image: vk::Image) {
        if let Ok(loaded) = self.device(device) {
            unsafe { loaded.device.destroy_image(image, None) };
        }
    }

    fn image_memory_requirements(&self, device: vk::Device, image: vk::Image) -> vk::MemoryRequirements {
        self.device(device)
            .map(|loaded| unsafe { loaded.device.get_image_memory_requirements(image) })
            .unwrap_or_default()
    }

    fn bind_image_memory(
        &self,
        device: vk::Device,
        image: vk::Image,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VkResult<()> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.bind_image_memory(image, memory, offset) }
    }

    fn create_image_view(&self, device: vk::Device, info: &vk::ImageViewCreateInfo) -> VkResult<vk::ImageView> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.create_image_view(info, None) }
    }

    fn destroy_image_view(&self, device: vk::Device, view: vk::ImageView) {
        if let Ok(loaded) = self.device(device) {
            unsafe { loaded.device.destroy_image_view(view, None) };
        }
    }

    fn create_sampler(&self, device: vk::Device, info: &vk::SamplerCreateInfo) -> VkResult<vk::Sampler> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.create_sampler(info, None) }
    }

    fn destroy_sampler(&self, device: vk::Device, sampler: vk::Sampler) {
        if let Ok(loaded) = self.device(device) {
            unsafe { loaded.device.destroy_sampler(sampler, None) };
        }
    }

    fn allocate_memory(&self, device: vk::Device, info: &vk::MemoryAllocateInfo) -> VkResult<vk::DeviceMemory> {
        let loaded = self.device(device)?;
        unsafe { loaded.device.allocate_memory(info, None) }
    }

    fn free_memory(&self, device: vk::Device, memory: vk::DeviceMemory) {
        if let Ok(loaded) = self.device(device) {
            unsafe { loaded.device.free_memory(memory, None) };
        }
    }

    fn map_memory(
        &self,
        device: vk::Device,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> VkResult<*mut c_void> {
        let loaded = self.device(device)?;
        unsafe {
            loaded
                .device
                .map_memory(memory, offset, size, vk::MemoryMapFlags::empty())
        }
    }

    fn unmap_memory(&self, device: vk::Device, memory: vk::DeviceMemory) {
        if let Ok(loaded) = self.device(device) {
            unsafe { loaded.device.unmap_memory(memory) };
        }
    }
}
