// Recording driver for tests
//
// Hands out fresh non-null handles, records every call in order, and fails
// a named call once when told to.

use ash::prelude::VkResult;
use ash::vk;
use raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, XlibDisplayHandle, XlibWindowHandle,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::{c_char, c_void, CStr, CString};
use std::rc::Rc;

use super::{Device, DeviceDesc, Driver, Entry, Instance, InstanceDesc, SurfaceProvider};
use crate::Logger;

#[derive(Debug, Clone, Copy)]
pub struct SubmitRecord {
    pub wait: usize,
    pub command_buffers: usize,
    pub signal: usize,
    pub fence: u64,
}

#[derive(Debug, Clone)]
pub struct BarrierRecord {
    pub buffers: Vec<vk::BufferMemoryBarrier>,
    pub images: Vec<vk::ImageMemoryBarrier>,
}

#[derive(Default)]
pub struct Recorder {
    calls: RefCell<Vec<(&'static str, u64)>>,
    next_handle: Cell<u64>,
    failures: RefCell<HashMap<&'static str, vk::Result>>,
    fence_flags: RefCell<Vec<vk::FenceCreateFlags>>,
    swapchains: RefCell<Vec<(u32, u64)>>,
    pools: RefCell<Vec<(vk::CommandPoolCreateFlags, u32)>>,
    submits: RefCell<Vec<SubmitRecord>>,
    barriers: RefCell<Vec<BarrierRecord>>,
    bind_offsets: RefCell<Vec<vk::DeviceSize>>,
    allocated_types: RefCell<Vec<u32>>,
    images: RefCell<Vec<(vk::ImageCreateFlags, u32)>>,
    buffer_sizes: RefCell<HashMap<u64, vk::DeviceSize>>,
    memory: RefCell<HashMap<u64, Box<[u8]>>>,
}

pub struct MockDriver {
    pub instance_extensions: Vec<&'static CStr>,
    pub instance_layers: Vec<&'static CStr>,
    pub device_extensions: Vec<&'static CStr>,
    pub physical_device_count: u32,
    pub queue_families: Vec<vk::QueueFamilyProperties>,
    /// Families the surface reports presentation support for
    pub present_families: Vec<u32>,
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    pub memory_type_bits: u32,
    pub swapchain_image_count: u32,
    pub null_queues: bool,
    pub null_memory: bool,
    pub recorder: Recorder,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self {
            instance_extensions: vec![c"VK_KHR_surface", c"VK_KHR_xlib_surface", c"VK_EXT_debug_utils"],
            instance_layers: Vec::new(),
            device_extensions: vec![c"VK_KHR_swapchain", c"VK_KHR_external_memory"],
            physical_device_count: 1,
            queue_families: vec![family(
                vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
                2,
            )],
            present_families: vec![0],
            capabilities: capabilities(),
            formats: vec![
                surface_format(),
                vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
            ],
            present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
            memory_properties: memory_properties(),
            memory_type_bits: 0b111,
            swapchain_image_count: 3,
            null_queues: false,
            null_memory: false,
            recorder: Recorder::default(),
        }
    }
}

impl MockDriver {
    /// Fail the next call to `op` with `result`
    pub fn fail(&self, op: &'static str, result: vk::Result) {
        self.recorder.failures.borrow_mut().insert(op, result);
    }

    pub fn count(&self, op: &str) -> usize {
        self.recorder.calls.borrow().iter().filter(|(name, _)| *name == op).count()
    }

    /// Index of the first call to `op`
    pub fn position(&self, op: &str) -> usize {
        self.recorder
            .calls
            .borrow()
            .iter()
            .position(|(name, _)| *name == op)
            .unwrap_or_else(|| panic!("{op} was never called"))
    }

    pub fn last_position(&self, op: &str) -> usize {
        self.recorder
            .calls
            .borrow()
            .iter()
            .rposition(|(name, _)| *name == op)
            .unwrap_or_else(|| panic!("{op} was never called"))
    }

    /// Raw handles passed to a destroy call, in order
    pub fn destroyed(&self, op: &str) -> Vec<u64> {
        self.recorder
            .calls
            .borrow()
            .iter()
            .filter(|(name, _)| *name == op)
            .map(|&(_, raw)| raw)
            .collect()
    }

    pub fn fence_flags(&self) -> Vec<vk::FenceCreateFlags> {
        self.recorder.fence_flags.borrow().clone()
    }

    pub fn swapchain_min_image_counts(&self) -> Vec<u32> {
        self.recorder.swapchains.borrow().iter().map(|&(count, _)| count).collect()
    }

    /// `old_swapchain` of every create call, raw
    pub fn old_swapchains(&self) -> Vec<u64> {
        self.recorder.swapchains.borrow().iter().map(|&(_, old)| old).collect()
    }

    pub fn pool_infos(&self) -> Vec<(vk::CommandPoolCreateFlags, u32)> {
        self.recorder.pools.borrow().clone()
    }

    pub fn submits(&self) -> Vec<SubmitRecord> {
        self.recorder.submits.borrow().clone()
    }

    pub fn barriers(&self) -> Vec<BarrierRecord> {
        self.recorder.barriers.borrow().clone()
    }

    pub fn bind_offsets(&self) -> Vec<vk::DeviceSize> {
        self.recorder.bind_offsets.borrow().clone()
    }

    pub fn allocated_types(&self) -> Vec<u32> {
        self.recorder.allocated_types.borrow().clone()
    }

    /// (flags, array layers) of every image created
    pub fn image_infos(&self) -> Vec<(vk::ImageCreateFlags, u32)> {
        self.recorder.images.borrow().clone()
    }

    pub fn memory_contents(&self, memory: vk::DeviceMemory) -> Vec<u8> {
        self.recorder
            .memory
            .borrow()
            .get(&vk::Handle::as_raw(memory))
            .map(|bytes| bytes.to_vec())
            .unwrap_or_default()
    }

    fn call(&self, op: &'static str) -> VkResult<()> {
        self.record(op, 0);
        match self.recorder.failures.borrow_mut().remove(op) {
            Some(result) => Err(result),
            None => Ok(()),
        }
    }

    fn record(&self, op: &'static str, raw: u64) {
        self.recorder.calls.borrow_mut().push((op, raw));
    }

    fn new_handle<H: vk::Handle>(&self) -> H {
        let next = self.recorder.next_handle.get() + 1;
        self.recorder.next_handle.set(next);
        H::from_raw(0x1000 + next)
    }

    fn create<H: vk::Handle>(&self, op: &'static str) -> VkResult<H> {
        self.call(op)?;
        Ok(self.new_handle())
    }

    fn destroy<H: vk::Handle>(&self, op: &'static str, handle: H) {
        self.record(op, handle.as_raw());
    }
}

fn c_chars<const N: usize>(name: &CStr) -> [c_char; N] {
    let mut out = [0 as c_char; N];
    for (slot, &byte) in out.iter_mut().zip(name.to_bytes()).take(N - 1) {
        *slot = byte as c_char;
    }
    out
}

fn extension(name: &CStr) -> vk::ExtensionProperties {
    vk::ExtensionProperties {
        extension_name: c_chars(name),
        spec_version: 1,
    }
}

impl Driver for MockDriver {
    fn enumerate_instance_extensions(&self) -> VkResult<Vec<vk::ExtensionProperties>> {
        self.call("enumerate_instance_extensions")?;
        Ok(self.instance_extensions.iter().map(|name| extension(name)).collect())
    }

    fn enumerate_instance_layers(&self) -> VkResult<Vec<vk::LayerProperties>> {
        self.call("enumerate_instance_layers")?;
        Ok(self
            .instance_layers
            .iter()
            .map(|name| vk::LayerProperties {
                layer_name: c_chars(name),
                ..Default::default()
            })
            .collect())
    }

    fn required_surface_extensions(&self, _display: RawDisplayHandle) -> VkResult<Vec<CString>> {
        self.call("required_surface_extensions")?;
        Ok(vec![c"VK_KHR_surface".to_owned(), c"VK_KHR_xlib_surface".to_owned()])
    }

    fn create_instance(&self, _info: &vk::InstanceCreateInfo) -> VkResult<vk::Instance> {
        self.create("create_instance")
    }

    fn destroy_instance(&self, instance: vk::Instance) {
        self.destroy("destroy_instance", instance);
    }

    fn enumerate_physical_devices(&self, _instance: vk::Instance) -> VkResult<Vec<vk::PhysicalDevice>> {
        self.call("enumerate_physical_devices")?;
        Ok((0..self.physical_device_count as u64)
            .map(|i| vk::Handle::from_raw(0x100 + i))
            .collect())
    }

    fn physical_device_properties(
        &self,
        _instance: vk::Instance,
        _physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties {
        vk::PhysicalDeviceProperties {
            api_version: vk::API_VERSION_1_0,
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            device_name: c_chars(c"Mock GPU"),
            ..Default::default()
        }
    }

    fn physical_device_features(
        &self,
        _instance: vk::Instance,
        _physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures {
        vk::PhysicalDeviceFeatures {
            sampler_anisotropy: vk::TRUE,
            ..Default::default()
        }
    }

    fn physical_device_memory_properties(
        &self,
        _instance: vk::Instance,
        _physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceMemoryProperties {
        self.memory_properties
    }

    fn queue_family_properties(
        &self,
        _instance: vk::Instance,
        _physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        self.record("queue_family_properties", 0);
        self.queue_families.clone()
    }

    fn enumerate_device_extensions(
        &self,
        _instance: vk::Instance,
        _physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::ExtensionProperties>> {
        self.call("enumerate_device_extensions")?;
        Ok(self.device_extensions.iter().map(|name| extension(name)).collect())
    }

    fn create_debug_messenger(
        &self,
        _instance: vk::Instance,
        _info: &vk::DebugUtilsMessengerCreateInfoEXT,
    ) -> VkResult<vk::DebugUtilsMessengerEXT> {
        self.create("create_debug_messenger")
    }

    fn destroy_debug_messenger(&self, _instance: vk::Instance, messenger: vk::DebugUtilsMessengerEXT) {
        self.destroy("destroy_debug_messenger", messenger);
    }

    fn create_surface(
        &self,
        _instance: vk::Instance,
        _display: RawDisplayHandle,
        _window: RawWindowHandle,
    ) -> VkResult<vk::SurfaceKHR> {
        self.create("create_surface")
    }

    fn destroy_surface(&self, _instance: vk::Instance, surface: vk::SurfaceKHR) {
        self.destroy("destroy_surface", surface);
    }

    fn surface_support(
        &self,
        _instance: vk::Instance,
        _physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        self.call("surface_support")?;
        Ok(self.present_families.contains(&queue_family_index))
    }

    fn surface_capabilities(
        &self,
        _instance: vk::Instance,
        _physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        self.call("surface_capabilities")?;
        Ok(self.capabilities)
    }

    fn surface_present_modes(
        &self,
        _instance: vk::Instance,
        _physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        self.call("surface_present_modes")?;
        Ok(self.present_modes.clone())
    }

    fn surface_formats(
        &self,
        _instance: vk::Instance,
        _physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        self.call("surface_formats")?;
        Ok(self.formats.clone())
    }

    fn create_device(
        &self,
        _instance: vk::Instance,
        _physical_device: vk::PhysicalDevice,
        _info: &vk::DeviceCreateInfo,
    ) -> VkResult<vk::Device> {
        self.create("create_device")
    }

    fn destroy_device(&self, device: vk::Device) {
        self.destroy("destroy_device", device);
    }

    fn get_device_queue(&self, _device: vk::Device, _family_index: u32, _queue_index: u32) -> vk::Queue {
        self.record("get_device_queue", 0);
        if self.null_queues {
            vk::Queue::null()
        } else {
            self.new_handle()
        }
    }

    fn device_wait_idle(&self, _device: vk::Device) -> VkResult<()> {
        self.call("device_wait_idle")
    }

    fn create_swapchain(
        &self,
        _device: vk::Device,
        info: &vk::SwapchainCreateInfoKHR,
    ) -> VkResult<vk::SwapchainKHR> {
        self.call("create_swapchain")?;
        self.recorder
            .swapchains
            .borrow_mut()
            .push((info.min_image_count, vk::Handle::as_raw(info.old_swapchain)));
        Ok(self.new_handle())
    }

    fn destroy_swapchain(&self, _device: vk::Device, swapchain: vk::SwapchainKHR) {
        self.destroy("destroy_swapchain", swapchain);
    }

    fn get_swapchain_images(&self, _device: vk::Device, _swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        self.call("get_swapchain_images")?;
        Ok((0..self.swapchain_image_count).map(|_| self.new_handle()).collect())
    }

    fn acquire_next_image(
        &self,
        _device: vk::Device,
        _swapchain: vk::SwapchainKHR,
        _timeout: u64,
        _semaphore: vk::Semaphore,
        _fence: vk::Fence,
    ) -> VkResult<(u32, bool)> {
        self.call("acquire_next_image")?;
        Ok((0, false))
    }

    fn queue_present(&self, _device: vk::Device, _queue: vk::Queue, _info: &vk::PresentInfoKHR) -> VkResult<bool> {
        self.call("queue_present")?;
        Ok(false)
    }

    fn create_command_pool(
        &self,
        _device: vk::Device,
        info: &vk::CommandPoolCreateInfo,
    ) -> VkResult<vk::CommandPool> {
        self.call("create_command_pool")?;
        self.recorder
            .pools
            .borrow_mut()
            .push((info.flags, info.queue_family_index));
        Ok(self.new_handle())
    }

    fn destroy_command_pool(&self, _device: vk::Device, pool: vk::CommandPool) {
        self.destroy("destroy_command_pool", pool);
    }

    fn reset_command_pool(
        &self,
        _device: vk::Device,
        _pool: vk::CommandPool,
        _flags: vk::CommandPoolResetFlags,
    ) -> VkResult<()> {
        self.call("reset_command_pool")
    }

    fn allocate_command_buffers(
        &self,
        _device: vk::Device,
        info: &vk::CommandBufferAllocateInfo,
    ) -> VkResult<Vec<vk::CommandBuffer>> {
        self.call("allocate_command_buffers")?;
        Ok((0..info.command_buffer_count).map(|_| self.new_handle()).collect())
    }

    fn free_command_buffers(&self, _device: vk::Device, _pool: vk::CommandPool, buffers: &[vk::CommandBuffer]) {
        for &buffer in buffers {
            self.destroy("free_command_buffers", buffer);
        }
    }

    fn begin_command_buffer(
        &self,
        _device: vk::Device,
        _buffer: vk::CommandBuffer,
        _info: &vk::CommandBufferBeginInfo,
    ) -> VkResult<()> {
        self.call("begin_command_buffer")
    }

    fn end_command_buffer(&self, _device: vk::Device, _buffer: vk::CommandBuffer) -> VkResult<()> {
        self.call("end_command_buffer")
    }

    fn reset_command_buffer(
        &self,
        _device: vk::Device,
        _buffer: vk::CommandBuffer,
        _flags: vk::CommandBufferResetFlags,
    ) -> VkResult<()> {
        self.call("reset_command_buffer")
    }

    fn cmd_pipeline_barrier(
        &self,
        _device: vk::Device,
        _buffer: vk::CommandBuffer,
        _src_stage: vk::PipelineStageFlags,
        _dst_stage: vk::PipelineStageFlags,
        buffer_barriers: &[vk::BufferMemoryBarrier],
        image_barriers: &[vk::ImageMemoryBarrier],
    ) {
        self.record("cmd_pipeline_barrier", 0);
        self.recorder.barriers.borrow_mut().push(BarrierRecord {
            buffers: buffer_barriers.to_vec(),
            images: image_barriers.to_vec(),
        });
    }

    fn queue_submit(
        &self,
        _device: vk::Device,
        _queue: vk::Queue,
        submits: &[vk::SubmitInfo],
        fence: vk::Fence,
    ) -> VkResult<()> {
        self.call("queue_submit")?;
        let mut records = self.recorder.submits.borrow_mut();
        for submit in submits {
            records.push(SubmitRecord {
                wait: submit.wait_semaphore_count as usize,
                command_buffers: submit.command_buffer_count as usize,
                signal: submit.signal_semaphore_count as usize,
                fence: vk::Handle::as_raw(fence),
            });
        }
        Ok(())
    }

    fn create_semaphore(&self, _device: vk::Device, _info: &vk::SemaphoreCreateInfo) -> VkResult<vk::Semaphore> {
        self.create("create_semaphore")
    }

    fn destroy_semaphore(&self, _device: vk::Device, semaphore: vk::Semaphore) {
        self.destroy("destroy_semaphore", semaphore);
    }

    fn create_fence(&self, _device: vk::Device, info: &vk::FenceCreateInfo) -> VkResult<vk::Fence> {
        self.call("create_fence")?;
        self.recorder.fence_flags.borrow_mut().push(info.flags);
        Ok(self.new_handle())
    }

    fn destroy_fence(&self, _device: vk::Device, fence: vk::Fence) {
        self.destroy("destroy_fence", fence);
    }

    fn reset_fences(&self, _device: vk::Device, _fences: &[vk::Fence]) -> VkResult<()> {
        self.call("reset_fences")
    }

    fn wait_for_fences(
        &self,
        _device: vk::Device,
        _fences: &[vk::Fence],
        _wait_all: bool,
        _timeout: u64,
    ) -> VkResult<()> {
        self.call("wait_for_fences")
    }

    fn create_buffer(&self, _device: vk::Device, info: &vk::BufferCreateInfo) -> VkResult<vk::Buffer> {
        let buffer: vk::Buffer = self.create("create_buffer")?;
        self.recorder
            .buffer_sizes
            .borrow_mut()
            .insert(vk::Handle::as_raw(buffer), info.size);
        Ok(buffer)
    }

    fn destroy_buffer(&self, _device: vk::Device, buffer: vk::Buffer) {
        self.destroy("destroy_buffer", buffer);
    }

    fn buffer_memory_requirements(&self, _device: vk::Device, buffer: vk::Buffer) -> vk::MemoryRequirements {
        let size = self
            .recorder
            .buffer_sizes
            .borrow()
            .get(&vk::Handle::as_raw(buffer))
            .copied()
            .unwrap_or_default();
        vk::MemoryRequirements {
            size,
            alignment: 256,
            memory_type_bits: self.memory_type_bits,
        }
    }

    fn bind_buffer_memory(
        &self,
        _device: vk::Device,
        _buffer: vk::Buffer,
        _memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VkResult<()> {
        self.call("bind_buffer_memory")?;
        self.recorder.bind_offsets.borrow_mut().push(offset);
        Ok(())
    }

    fn create_buffer_view(&self, _device: vk::Device, _info: &vk::BufferViewCreateInfo) -> VkResult<vk::BufferView> {
        self.create("create_buffer_view")
    }

    fn destroy_buffer_view(&self, _device: vk::Device, view: vk::BufferView) {
        self.destroy("destroy_buffer_view", view);
    }

    fn create_image(&self, _device: vk::Device, info: &vk::ImageCreateInfo) -> VkResult<vk::Image> {
        self.call("create_image")?;
        self.recorder
            .images
            .borrow_mut()
            .push((info.flags, info.array_layers));
        Ok(self.new_handle())
    }

    fn destroy_image(&self, _device: vk::Device, image: vk::Image) {
        self.destroy("destroy_image", image);
    }

    fn image_memory_requirements(&self, _device: vk::Device, _image: vk::Image) -> vk::MemoryRequirements {
        vk::MemoryRequirements {
            size: 4096,
            alignment: 4096,
            memory_type_bits: self.memory_type_bits,
        }
    }

    fn bind_image_memory(
        &self,
        _device: vk::Device,
        _image: vk::Image,
        _memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VkResult<()> {
        self.call("bind_image_memory")?;
        self.recorder.bind_offsets.borrow_mut().push(offset);
        Ok(())
    }

    fn create_image_view(&self, _device: vk::Device, _info: &vk::ImageViewCreateInfo) -> VkResult<vk::ImageView> {
        self.create("create_image_view")
    }

    fn destroy_image_view(&self, _device: vk::Device, view: vk::ImageView) {
        self.destroy("destroy_image_view", view);
    }

    fn create_sampler(&self, _device: vk::Device, _info: &vk::SamplerCreateInfo) -> VkResult<vk::Sampler> {
        self.create("create_sampler")
    }

    fn destroy_sampler(&self, _device: vk::Device, sampler: vk::Sampler) {
        self.destroy("destroy_sampler", sampler);
    }

    fn allocate_memory(&self, _device: vk::Device, info: &vk::MemoryAllocateInfo) -> VkResult<vk::DeviceMemory> {
        self.call("allocate_memory")?;
        self.recorder
            .allocated_types
            .borrow_mut()
            .push(info.memory_type_index);
        if self.null_memory {
            return Ok(vk::DeviceMemory::null());
        }

        let memory: vk::DeviceMemory = self.new_handle();
        self.recorder.memory.borrow_mut().insert(
            vk::Handle::as_raw(memory),
            vec![0u8; info.allocation_size as usize].into_boxed_slice(),
        );
        Ok(memory)
    }

    fn free_memory(&self, _device: vk::Device, memory: vk::DeviceMemory) {
        self.destroy("free_memory", memory);
    }

    fn map_memory(
        &self,
        _device: vk::Device,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> VkResult<*mut c_void> {
        self.call("map_memory")?;
        let mut backing = self.recorder.memory.borrow_mut();
        let bytes = backing
            .get_mut(&vk::Handle::as_raw(memory))
            .ok_or(vk::Result::ERROR_MEMORY_MAP_FAILED)?;
        if offset + size > bytes.len() as u64 {
            return Err(vk::Result::ERROR_MEMORY_MAP_FAILED);
        }
        Ok(bytes[offset as usize..].as_mut_ptr() as *mut c_void)
    }

    fn unmap_memory(&self, _device: vk::Device, _memory: vk::DeviceMemory) {
        self.record("unmap_memory", 0);
    }
}

/// A window that is never shown
pub struct Window {
    pub size: (u32, u32),
}

impl Default for Window {
    fn default() -> Self {
        Self { size: (1024, 768) }
    }
}

impl SurfaceProvider for Window {
    fn display_handle(&self) -> RawDisplayHandle {
        RawDisplayHandle::Xlib(XlibDisplayHandle::empty())
    }

    fn window_handle(&self) -> RawWindowHandle {
        RawWindowHandle::Xlib(XlibWindowHandle::empty())
    }

    fn pixel_size(&self) -> (u32, u32) {
        self.size
    }
}

pub fn family(flags: vk::QueueFlags, queue_count: u32) -> vk::QueueFamilyProperties {
    vk::QueueFamilyProperties {
        queue_flags: flags,
        queue_count,
        ..Default::default()
    }
}

pub fn surface_format() -> vk::SurfaceFormatKHR {
    vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_UNORM,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    }
}

pub fn capabilities() -> vk::SurfaceCapabilitiesKHR {
    vk::SurfaceCapabilitiesKHR {
        min_image_count: 2,
        max_image_count: 8,
        current_extent: vk::Extent2D {
            width: 1024,
            height: 768,
        },
        min_image_extent: vk::Extent2D { width: 1, height: 1 },
        max_image_extent: vk::Extent2D {
            width: 4096,
            height: 4096,
        },
        max_image_array_layers: 1,
        supported_transforms: vk::SurfaceTransformFlagsKHR::IDENTITY,
        current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
        supported_composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
        supported_usage_flags: vk::ImageUsageFlags::COLOR_ATTACHMENT,
    }
}

/// 0: device local, 1: host visible + coherent, 2: host visible + coherent + cached
fn memory_properties() -> vk::PhysicalDeviceMemoryProperties {
    let mut props = vk::PhysicalDeviceMemoryProperties {
        memory_type_count: 3,
        memory_heap_count: 2,
        ..Default::default()
    };
    let host = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
    props.memory_types[0] = vk::MemoryType {
        property_flags: vk::MemoryPropertyFlags::DEVICE_LOCAL,
        heap_index: 0,
    };
    props.memory_types[1] = vk::MemoryType {
        property_flags: host,
        heap_index: 1,
    };
    props.memory_types[2] = vk::MemoryType {
        property_flags: host | vk::MemoryPropertyFlags::HOST_CACHED,
        heap_index: 1,
    };
    props.memory_heaps[0] = vk::MemoryHeap {
        size: 1 << 30,
        flags: vk::MemoryHeapFlags::DEVICE_LOCAL,
    };
    props.memory_heaps[1] = vk::MemoryHeap {
        size: 1 << 30,
        flags: vk::MemoryHeapFlags::empty(),
    };
    props
}

/// Surface-capable instance description matching the mock's extensions
pub fn instance_desc() -> InstanceDesc {
    InstanceDesc {
        extensions: vec![c"VK_KHR_surface".to_owned(), c"VK_KHR_xlib_surface".to_owned()],
        ..Default::default()
    }
}

pub fn instance(driver: &Rc<MockDriver>) -> (Entry, Instance) {
    let entry = Entry::new(driver.clone(), Logger::console());
    let instance = entry.create_instance(&instance_desc()).unwrap();
    (entry, instance)
}

/// Device on the first physical device and family 0, with VK_KHR_swapchain
pub fn device(instance: &Instance) -> Device {
    instance
        .physical_devices()
        .unwrap()
        .remove(0)
        .create_device(&DeviceDesc::new(0))
        .unwrap()
}
