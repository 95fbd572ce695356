// Driver - the graphics backend seen by the resource manager
//
// One method per Vulkan entry point the manager forwards to. Handles are the
// raw `vk` handle types so a driver can be swapped (ash for real hardware, a
// recording driver in tests) without touching the wrappers.

use ash::prelude::VkResult;
use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::{c_void, CString};

pub trait Driver {
    // ─── Entry ───────────────────────────────────────────────────────────────
    fn enumerate_instance_extensions(&self) -> VkResult<Vec<vk::ExtensionProperties>>;
    fn enumerate_instance_layers(&self) -> VkResult<Vec<vk::LayerProperties>>;
    /// Instance extensions needed to present to windows on this display
    fn required_surface_extensions(&self, display: RawDisplayHandle) -> VkResult<Vec<CString>>;
    fn create_instance(&self, info: &vk::InstanceCreateInfo) -> VkResult<vk::Instance>;
    fn destroy_instance(&self, instance: vk::Instance);

    // ─── Instance ────────────────────────────────────────────────────────────
    fn enumerate_physical_devices(&self, instance: vk::Instance) -> VkResult<Vec<vk::PhysicalDevice>>;
    fn physical_device_properties(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties;
    fn physical_device_features(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures;
    fn physical_device_memory_properties(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceMemoryProperties;
    fn queue_family_properties(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties>;
    fn enumerate_device_extensions(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::ExtensionProperties>>;
    fn create_debug_messenger(
        &self,
        instance: vk::Instance,
        info: &vk::DebugUtilsMessengerCreateInfoEXT,
    ) -> VkResult<vk::DebugUtilsMessengerEXT>;
    fn destroy_debug_messenger(&self, instance: vk::Instance, messenger: vk::DebugUtilsMessengerEXT);

    // ─── Surface ─────────────────────────────────────────────────────────────
    fn create_surface(
        &self,
        instance: vk::Instance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> VkResult<vk::SurfaceKHR>;
    fn destroy_surface(&self, instance: vk::Instance, surface: vk::SurfaceKHR);
    fn surface_support(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool>;
    fn surface_capabilities(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR>;
    fn surface_present_modes(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>>;
    fn surface_formats(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>>;

    // ─── Device ──────────────────────────────────────────────────────────────
    fn create_device(
        &self,
        instance: vk::Instance,
        physical_device: vk::PhysicalDevice,
        info: &vk::DeviceCreateInfo,
    ) -> VkResult<vk::Device>;
    fn destroy_device(&self, device: vk::Device);
    fn get_device_queue(&self, device: vk::Device, family_index: u32, queue_index: u32) -> vk::Queue;
    fn device_wait_idle(&self, device: vk::Device) -> VkResult<()>;

    // ─── Swapchain ───────────────────────────────────────────────────────────
    fn create_swapchain(
        &self,
        device: vk::Device,
        info: &vk::SwapchainCreateInfoKHR,
    ) -> VkResult<vk::SwapchainKHR>;
    fn destroy_swapchain(&self, device: vk::Device, swapchain: vk::SwapchainKHR);
    fn get_swapchain_images(&self, device: vk::Device, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>>;
    fn acquire_next_image(
        &self,
        device: vk::Device,
        swapchain: vk::SwapchainKHR,
        timeout: u64,
        semaphore: vk::Semaphore,
        fence: vk::Fence,
    ) -> VkResult<(u32, bool)>;
    fn queue_present(&self, device: vk::Device, queue: vk::Queue, info: &vk::PresentInfoKHR) -> VkResult<bool>;

    // ─── Commands ────────────────────────────────────────────────────────────
    fn create_command_pool(
        &self,
        device: vk::Device,
        info: &vk::CommandPoolCreateInfo,
    ) -> VkResult<vk::CommandPool>;
    fn destroy_command_pool(&self, device: vk::Device, pool: vk::CommandPool);
    fn reset_command_pool(
        &self,
        device: vk::Device,
        pool: vk::CommandPool,
        flags: vk::CommandPoolResetFlags,
    ) -> VkResult<()>;
    fn allocate_command_buffers(
        &self,
        device: vk::Device,
        info: &vk::CommandBufferAllocateInfo,
    ) -> VkResult<Vec<vk::CommandBuffer>>;
    fn free_command_buffers(&self, device: vk::Device, pool: vk::CommandPool, buffers: &[vk::CommandBuffer]);
    fn begin_command_buffer(
        &self,
        device: vk::Device,
        buffer: vk::CommandBuffer,
        info: &vk::CommandBufferBeginInfo,
    ) -> VkResult<()>;
    fn end_command_buffer(&self, device: vk::Device, buffer: vk::CommandBuffer) -> VkResult<()>;
    fn reset_command_buffer(
        &self,
        device: vk::Device,
        buffer: vk::CommandBuffer,
        flags: vk::CommandBufferResetFlags,
    ) -> VkResult<()>;
    fn cmd_pipeline_barrier(
        &self,
        device: vk::Device,
        buffer: vk::CommandBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        buffer_barriers: &[vk::BufferMemoryBarrier],
        image_barriers: &[vk::ImageMemoryBarrier],
    );
    fn queue_submit(
        &self,
        device: vk::Device,
        queue: vk::Queue,
        submits: &[vk::SubmitInfo],
        fence: vk::Fence,
    ) -> VkResult<()>;

    // ─── Synchronization ─────────────────────────────────────────────────────
    fn create_semaphore(&self, device: vk::Device, info: &vk::SemaphoreCreateInfo) -> VkResult<vk::Semaphore>;
    fn destroy_semaphore(&self, device: vk::Device, semaphore: vk::Semaphore);
    fn create_fence(&self, device: vk::Device, info: &vk::FenceCreateInfo) -> VkResult<vk::Fence>;
    fn destroy_fence(&self, device: vk::Device, fence: vk::Fence);
    fn reset_fences(&self, device: vk::Device, fences: &[vk::Fence]) -> VkResult<()>;
    fn wait_for_fences(&self, device: vk::Device, fences: &[vk::Fence], wait_all: bool, timeout: u64) -> VkResult<()>;

    // ─── Memory-backed resources ─────────────────────────────────────────────
    fn create_buffer(&self, device: vk::Device, info: &vk::BufferCreateInfo) -> VkResult<vk::Buffer>;
    fn destroy_buffer(&self, device: vk::Device, buffer: vk::Buffer);
    fn buffer_memory_requirements(&self, device: vk::Device, buffer: vk::Buffer) -> vk::MemoryRequirements;
    fn bind_buffer_memory(
        &self,
        device: vk::Device,
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VkResult<()>;
    fn create_buffer_view(&self, device: vk::Device, info: &vk::BufferViewCreateInfo) -> VkResult<vk::BufferView>;
    fn destroy_buffer_view(&self, device: vk::Device, view: vk::BufferView);

    fn create_image(&self, device: vk::Device, info: &vk::ImageCreateInfo) -> VkResult<vk::Image>;
    fn destroy_image(&self, device: vk::Device, image: vk::Image);
    fn image_memory_requirements(&self, device: vk::Device, image: vk::Image) -> vk::MemoryRequirements;
    fn bind_image_memory(
        &self,
        device: vk::Device,
        image: vk::Image,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VkResult<()>;
    fn create_image_view(&self, device: vk::Device, info: &vk::ImageViewCreateInfo) -> VkResult<vk::ImageView>;
    fn destroy_image_view(&self, device: vk::Device, view: vk::ImageView);
    fn create_sampler(&self, device: vk::Device, info: &vk::SamplerCreateInfo) -> VkResult<vk::Sampler>;
    fn destroy_sampler(&self, device: vk::Device, sampler: vk::Sampler);

    fn allocate_memory(&self, device: vk::Device, info: &vk::MemoryAllocateInfo) -> VkResult<vk::DeviceMemory>;
    fn free_memory(&self, device: vk::Device, memory: vk::DeviceMemory);
    fn map_memory(
        &self,
        device: vk::Device,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> VkResult<*mut c_void>;
    fn unmap_memory(&self, device: vk::Device, memory: vk::DeviceMemory);
}
