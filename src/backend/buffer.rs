// Buffers and buffer views
//
// create -> memory requirements -> memory type -> allocate -> bind at 0.
// The wrapper exists before memory is allocated, so a failure at any later
// step still destroys the buffer on the way out.

use ash::vk;
use std::rc::Rc;

use super::device::{Device, DeviceShared};
use super::error::{check, non_null, unsupported, Result};
use super::memory;

pub(crate) struct BufferShared {
    device: Rc<DeviceShared>,
    handle: vk::Buffer,
    memory: vk::DeviceMemory,
    memory_flags: vk::MemoryPropertyFlags,
    size: vk::DeviceSize,
}

impl Drop for BufferShared {
    fn drop(&mut self) {
        let driver = self.device.driver();
        if self.handle != vk::Buffer::null() {
            driver.destroy_buffer(self.device.handle(), self.handle);
            self.handle = vk::Buffer::null();
        }
        if self.memory != vk::DeviceMemory::null() {
            driver.free_memory(self.device.handle(), self.memory);
            self.memory = vk::DeviceMemory::null();
        }
    }
}

pub struct Buffer {
    shared: Rc<BufferShared>,
}

impl Device {
    /// Create a buffer bound to fresh memory with at least `memory_flags`
    pub fn create_buffer(
        &self,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        memory_flags: vk::MemoryPropertyFlags,
    ) -> Result<Buffer> {
        let device = self.shared();
        let logger = device.logger();

        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let handle = check(
            logger,
            "vkCreateBuffer",
            device.driver().create_buffer(device.handle(), &buffer_info),
        )?;
        let handle = non_null(logger, "vkCreateBuffer", handle)?;

        let mut shared = BufferShared {
            device: device.clone(),
            handle,
            memory: vk::DeviceMemory::null(),
            memory_flags: vk::MemoryPropertyFlags::empty(),
            size,
        };

        let requirements = device.driver().buffer_memory_requirements(device.handle(), handle);
        let (memory, flags) = memory::allocate(device, &requirements, memory_flags)?;
        shared.memory = memory;
        shared.memory_flags = flags;

        check(
            logger,
            "vkBindBufferMemory",
            device
                .driver()
                .bind_buffer_memory(device.handle(), handle, memory, 0),
        )?;

        Ok(Buffer {
            shared: Rc::new(shared),
        })
    }

    /// Create a host-visible buffer and fill it with data
    pub fn create_buffer_with_data<T: Copy>(&self, usage: vk::BufferUsageFlags, data: &[T]) -> Result<Buffer> {
        let size = std::mem::size_of_val(data) as vk::DeviceSize;
        let buffer = self.create_buffer(
            size,
            usage,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        buffer.write(0, data)?;
        Ok(buffer)
    }
}

impl Buffer {
    pub fn handle(&self) -> vk::Buffer {
        self.shared.handle
    }

    pub fn memory(&self) -> vk::DeviceMemory {
        self.shared.memory
    }

    pub fn size(&self) -> vk::DeviceSize {
        self.shared.size
    }

    /// Full property flags of the memory type backing this buffer
    pub fn memory_flags(&self) -> vk::MemoryPropertyFlags {
        self.shared.memory_flags
    }

    /// Copy `data` in at byte `offset`. Host-visible, coherent memory only.
    pub fn write<T: Copy>(&self, offset: vk::DeviceSize, data: &[T]) -> Result<()> {
        let device = &self.shared.device;
        let logger = device.logger();

        let host_flags = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        if !self.shared.memory_flags.contains(host_flags) {
            return Err(unsupported(
                logger,
                "Host write",
                format!("{:?}", self.shared.memory_flags),
            ));
        }

        let bytes = std::mem::size_of_val(data) as vk::DeviceSize;
        if offset.checked_add(bytes).map_or(true, |end| end > self.shared.size) {
            return Err(unsupported(
                logger,
                "Buffer range",
                format!("{}..+{} of {}", offset, bytes, self.shared.size),
            ));
        }
        if bytes == 0 {
            return Ok(());
        }

        let ptr = check(
            logger,
            "vkMapMemory",
            device
                .driver()
                .map_memory(device.handle(), self.shared.memory, offset, bytes),
        )?;

        // SAFETY: the mapping covers `bytes` bytes and does not alias `data`
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr() as *const u8, ptr as *mut u8, bytes as usize);
        }
        device.driver().unmap_memory(device.handle(), self.shared.memory);
        Ok(())
    }

    /// Texel view over `range` bytes starting at `offset`
    pub fn create_view(&self, format: vk::Format, offset: vk::DeviceSize, range: vk::DeviceSize) -> Result<BufferView> {
        let device = &self.shared.device;
        let view_info = vk::BufferViewCreateInfo::builder()
            .buffer(self.shared.handle)
            .format(format)
            .offset(offset)
            .range(range);

        let handle = check(
            device.logger(),
            "vkCreateBufferView",
            device.driver().create_buffer_view(device.handle(), &view_info),
        )?;
        let handle = non_null(device.logger(), "vkCreateBufferView", handle)?;

        Ok(BufferView {
            buffer: self.shared.clone(),
            handle,
        })
    }
}

/// Keeps its buffer alive
pub struct BufferView {
    buffer: Rc<BufferShared>,
    handle: vk::BufferView,
}

impl BufferView {
    pub fn handle(&self) -> vk::BufferView {
        self.handle
    }
}

impl Drop for BufferView {
    fn drop(&mut self) {
        if self.handle != vk::BufferView::null() {
            let device = &self.buffer.device;
            device.driver().destroy_buffer_view(device.handle(), self.handle);
            self.handle = vk::BufferView::null();
        }
    }
}
