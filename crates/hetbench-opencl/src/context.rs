//! Per-device execution context: queue, compiled kernel, device buffers.
//!
//! Every handle is owned by exactly one context and released when it goes
//! out of scope (the `opencl3` wrappers release their OpenCL objects on
//! `Drop`), so cleanup runs on every exit path, including a failure
//! mid-construction. No context outlives one multiply/solve invocation.

use crate::device::ClDevice;
use crate::error::{EngineError, Result};
use crate::kernel::{KernelSource, Scalar};
use opencl3::command_queue::{CommandQueue, CL_QUEUE_PROFILING_ENABLE};
use opencl3::context::Context;
use opencl3::kernel::Kernel;
use opencl3::memory::{Buffer, cl_mem_flags};
use opencl3::program::Program;
use opencl3::types::CL_BLOCKING;
use tracing::debug;

/// One device's compiled kernel bound to a profiling-enabled queue.
pub struct KernelContext {
    pub(crate) context: Context,
    pub(crate) queue: CommandQueue,
    pub(crate) kernel: Kernel,
    /// Keeps the program alive for the kernel's lifetime.
    #[allow(dead_code)]
    program: Program,
    device_name: String,
}

impl KernelContext {
    /// Create a context on `device` and compile `source` into a launchable
    /// kernel. The queue is created with profiling enabled so every launch
    /// reports device start/end timestamps.
    ///
    /// # Errors
    ///
    /// [`EngineError::Compilation`] if the device compiler rejects the
    /// source; [`EngineError::ResourceCreation`] for any other setup
    /// failure.
    pub fn build(device: &ClDevice, source: &KernelSource) -> Result<Self> {
        let context =
            Context::from_device(&device.device).map_err(|e| EngineError::cl("create_context", e))?;
        let queue =
            CommandQueue::create_default_with_properties(&context, CL_QUEUE_PROFILING_ENABLE, 0)
                .map_err(|e| EngineError::cl("create_command_queue", e))?;

        let program = Program::create_and_build_from_source(&context, &source.source, "")
            .map_err(|log| EngineError::Compilation {
                entry_point: source.entry_point.to_string(),
                log: log.to_string(),
            })?;
        let kernel = Kernel::create(&program, &source.entry_point)
            .map_err(|e| EngineError::cl("create_kernel", e))?;

        debug!("kernel '{}' built for {}", source.entry_point, device.device_name);
        Ok(Self { context, queue, kernel, program, device_name: device.device_name.clone() })
    }

    /// Name of the device this context is bound to.
    #[must_use]
    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl std::fmt::Debug for KernelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelContext").field("device_name", &self.device_name).finish()
    }
}

/// A typed device-resident buffer with blocking transfers.
pub struct DeviceBuffer<T: Scalar> {
    pub(crate) inner: Buffer<T>,
    len: usize,
    label: &'static str,
}

impl<T: Scalar> DeviceBuffer<T> {
    /// Allocate `len` elements on the context's device.
    pub fn create(
        ctx: &KernelContext,
        label: &'static str,
        len: usize,
        flags: cl_mem_flags,
    ) -> Result<Self> {
        let inner = unsafe {
            Buffer::<T>::create(&ctx.context, flags, len, std::ptr::null_mut()).map_err(|e| {
                EngineError::ResourceCreation {
                    stage: "create_buffer",
                    reason: format!("{label} ({len} elems): {e}"),
                }
            })?
        };
        Ok(Self { inner, len, label })
    }

    /// Allocate and upload in one step.
    pub fn create_with(
        ctx: &KernelContext,
        label: &'static str,
        data: &[T],
        flags: cl_mem_flags,
    ) -> Result<Self> {
        let mut buffer = Self::create(ctx, label, data.len(), flags)?;
        buffer.write(ctx, data)?;
        Ok(buffer)
    }

    /// Blocking upload of `data` starting at element 0.
    ///
    /// # Panics
    ///
    /// Panics if `data` exceeds the buffer's capacity.
    pub fn write(&mut self, ctx: &KernelContext, data: &[T]) -> Result<()> {
        assert!(data.len() <= self.len, "{}: write of {} into {}", self.label, data.len(), self.len);
        unsafe {
            ctx.queue
                .enqueue_write_buffer(&mut self.inner, CL_BLOCKING, 0, data, &[])
                .map_err(|e| EngineError::ResourceCreation {
                    stage: "enqueue_write_buffer",
                    reason: format!("{}: {e}", self.label),
                })?;
        }
        Ok(())
    }

    /// Blocking download of `out.len()` elements starting at element
    /// `start` into `out`.
    ///
    /// # Panics
    ///
    /// Panics if `start + out.len()` exceeds the buffer's capacity.
    pub fn read_into(&self, ctx: &KernelContext, start: usize, out: &mut [T]) -> Result<()> {
        assert!(
            start + out.len() <= self.len,
            "{}: read [{start}, {}) out of {}",
            self.label,
            start + out.len(),
            self.len
        );
        let byte_offset = start * std::mem::size_of::<T>();
        unsafe {
            ctx.queue
                .enqueue_read_buffer(&self.inner, CL_BLOCKING, byte_offset, out, &[])
                .map_err(|e| EngineError::ResourceCreation {
                    stage: "enqueue_read_buffer",
                    reason: format!("{}: {e}", self.label),
                })?;
        }
        Ok(())
    }

    /// Number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T: Scalar> std::fmt::Debug for DeviceBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("label", &self.label)
            .field("len", &self.len)
            .field("elem_size", &std::mem::size_of::<T>())
            .finish()
    }
}
