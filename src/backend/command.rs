// Command pools, command buffers and queue submission
//
// A pool is tied to the device's queue family. Buffers keep their pool
// alive and free themselves back into it on drop.

use ash::vk;
use std::rc::Rc;

use super::device::{Device, DeviceShared};
use super::error::{check, non_null, Result};
use super::sync::{Fence, Semaphore};

pub(crate) struct PoolShared {
    device: Rc<DeviceShared>,
    handle: vk::CommandPool,
}

impl PoolShared {
    pub(crate) fn device(&self) -> &DeviceShared {
        &self.device
    }
}

impl Drop for PoolShared {
    fn drop(&mut self) {
        if self.handle != vk::CommandPool::null() {
            self.device
                .driver()
                .destroy_command_pool(self.device.handle(), self.handle);
            self.handle = vk::CommandPool::null();
        }
    }
}

pub struct CommandPool {
    shared: Rc<PoolShared>,
}

impl Device {
    /// Command pool for this device's queue family
    pub fn create_command_pool(&self, flags: vk::CommandPoolCreateFlags) -> Result<CommandPool> {
        let device = self.shared();
        let create_info = vk::CommandPoolCreateInfo::builder()
            .flags(flags)
            .queue_family_index(device.queue_family_index());

        let handle = check(
            device.logger(),
            "vkCreateCommandPool",
            device.driver().create_command_pool(device.handle(), &create_info),
        )?;
        let handle = non_null(device.logger(), "vkCreateCommandPool", handle)?;

        Ok(CommandPool {
            shared: Rc::new(PoolShared {
                device: device.clone(),
                handle,
            }),
        })
    }

    /// One vkQueueSubmit for the whole batch, signalling `fence` if given
    pub fn submit(&self, queue_index: usize, batch: &SubmitBatch, fence: Option<&Fence>) -> Result<()> {
        let device = self.shared();
        let queue = device.queue(queue_index)?;

        let wait_semaphores: Vec<vk::Semaphore> = batch.wait.iter().map(|(s, _)| s.handle()).collect();
        let wait_stages: Vec<vk::PipelineStageFlags> = batch.wait.iter().map(|&(_, stage)| stage).collect();
        let command_buffers: Vec<vk::CommandBuffer> =
            batch.command_buffers.iter().map(|cb| cb.handle).collect();
        let signal_semaphores: Vec<vk::Semaphore> = batch.signal.iter().map(|s| s.handle()).collect();

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        check(
            device.logger(),
            "vkQueueSubmit",
            device.driver().queue_submit(
                device.handle(),
                queue,
                std::slice::from_ref(&submit_info),
                fence.map_or(vk::Fence::null(), Fence::handle),
            ),
        )
    }
}

impl CommandPool {
    pub fn handle(&self) -> vk::CommandPool {
        self.shared.handle
    }

    /// Allocate `count` buffers at `level`. Zero asks nothing of the driver.
    pub fn allocate(&self, count: u32, level: vk::CommandBufferLevel) -> Result<Vec<CommandBuffer>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let device = &self.shared.device;
        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(self.shared.handle)
            .level(level)
            .command_buffer_count(count);

        let handles = check(
            device.logger(),
            "vkAllocateCommandBuffers",
            device.driver().allocate_command_buffers(device.handle(), &alloc_info),
        )?;

        Ok(handles
            .into_iter()
            .map(|handle| CommandBuffer {
                pool: self.shared.clone(),
                handle,
                level,
            })
            .collect())
    }

    /// Reset every buffer allocated from this pool
    pub fn reset(&self, release_resources: bool) -> Result<()> {
        let flags = if release_resources {
            vk::CommandPoolResetFlags::RELEASE_RESOURCES
        } else {
            vk::CommandPoolResetFlags::empty()
        };

        let device = &self.shared.device;
        check(
            device.logger(),
            "vkResetCommandPool",
            device
                .driver()
                .reset_command_pool(device.handle(), self.shared.handle, flags),
        )
    }
}

pub struct CommandBuffer {
    pool: Rc<PoolShared>,
    handle: vk::CommandBuffer,
    level: vk::CommandBufferLevel,
}

impl CommandBuffer {
    pub fn handle(&self) -> vk::CommandBuffer {
        self.handle
    }

    pub fn level(&self) -> vk::CommandBufferLevel {
        self.level
    }

    pub(crate) fn pool(&self) -> &PoolShared {
        &self.pool
    }

    /// Secondary buffers take `inheritance`; it is ignored for primaries
    pub fn begin(
        &self,
        usage: vk::CommandBufferUsageFlags,
        inheritance: Option<&vk::CommandBufferInheritanceInfo>,
    ) -> Result<()> {
        let mut begin_info = vk::CommandBufferBeginInfo::builder().flags(usage);
        if let (vk::CommandBufferLevel::SECONDARY, Some(inheritance)) = (self.level, inheritance) {
            begin_info = begin_info.inheritance_info(inheritance);
        }

        let device = &self.pool.device;
        check(
            device.logger(),
            "vkBeginCommandBuffer",
            device
                .driver()
                .begin_command_buffer(device.handle(), self.handle, &begin_info),
        )
    }

    pub fn end(&self) -> Result<()> {
        let device = &self.pool.device;
        check(
            device.logger(),
            "vkEndCommandBuffer",
            device.driver().end_command_buffer(device.handle(), self.handle),
        )
    }

    pub fn reset(&self, release_resources: bool) -> Result<()> {
        let flags = if release_resources {
            vk::CommandBufferResetFlags::RELEASE_RESOURCES
        } else {
            vk::CommandBufferResetFlags::empty()
        };

        let device = &self.pool.device;
        check(
            device.logger(),
            "vkResetCommandBuffer",
            device
                .driver()
                .reset_command_buffer(device.handle(), self.handle, flags),
        )
    }
}

impl Drop for CommandBuffer {
    fn drop(&mut self) {
        if self.handle != vk::CommandBuffer::null() {
            let device = &self.pool.device;
            device
                .driver()
                .free_command_buffers(device.handle(), self.pool.handle, &[self.handle]);
            self.handle = vk::CommandBuffer::null();
        }
    }
}

/// Everything one vkQueueSubmit carries
#[derive(Default)]
pub struct SubmitBatch<'a> {
    /// Semaphores to wait on, each with the stage that waits
    pub wait: Vec<(&'a Semaphore, vk::PipelineStageFlags)>,
    pub command_buffers: Vec<&'a CommandBuffer>,
    pub signal: Vec<&'a Semaphore>,
}

impl<'a> SubmitBatch<'a> {
    pub fn new(command_buffers: &[&'a CommandBuffer]) -> Self {
        Self {
            command_buffers: command_buffers.to_vec(),
            ..Default::default()
        }
    }

    pub fn wait(mut self, semaphore: &'a Semaphore, stage: vk::PipelineStageFlags) -> Self {
        self.wait.push((semaphore, stage));
        self
    }

    pub fn signal(mut self, semaphore: &'a Semaphore) -> Self {
        self.signal.push(semaphore);
        self
    }
}
