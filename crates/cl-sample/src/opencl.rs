// ─── OpenCL-Runtime über opencl3 ──────────────────────────────────────

use std::ptr;

use opencl3::{
    command_queue::CommandQueue,
    context::Context,
    device::{
        Device, CL_DEVICE_TYPE_ACCELERATOR, CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_CPU,
        CL_DEVICE_TYPE_GPU,
    },
    kernel::Kernel,
    memory::{Buffer, CL_MEM_READ_ONLY, CL_MEM_READ_WRITE, CL_MEM_WRITE_ONLY},
    platform::{get_platforms, Platform},
    program::Program,
    types::{cl_device_type, cl_mem_flags, cl_uint, CL_BLOCKING},
};

use crate::error::{AtStage, ClError, Result, Stage};
use crate::runtime::{DeviceInfo, DeviceKind, MemAccess, PlatformInfo, Runtime};

const CL_DEVICE_NOT_FOUND: i32 = -1;

/// The system OpenCL ICD loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCl;

impl DeviceKind {
    pub fn device_type(self) -> cl_device_type {
        match self {
            DeviceKind::Gpu         => CL_DEVICE_TYPE_GPU,
            DeviceKind::Cpu         => CL_DEVICE_TYPE_CPU,
            DeviceKind::Accelerator => CL_DEVICE_TYPE_ACCELERATOR,
            DeviceKind::All         => CL_DEVICE_TYPE_ALL,
        }
    }
}

impl MemAccess {
    pub fn flags(self) -> cl_mem_flags {
        match self {
            MemAccess::ReadOnly  => CL_MEM_READ_ONLY,
            MemAccess::WriteOnly => CL_MEM_WRITE_ONLY,
            MemAccess::ReadWrite => CL_MEM_READ_WRITE,
        }
    }
}

impl Runtime for OpenCl {
    type Platform = Platform;
    type Device   = Device;
    type Context  = Context;
    type Queue    = CommandQueue;
    type Buffer   = Buffer<u8>;
    type Program  = Program;
    type Kernel   = Kernel;

    fn platforms(&self) -> Result<Vec<Platform>> {
        get_platforms().at(Stage::Platform)
    }

    fn platform_info(&self, platform: &Platform) -> Result<PlatformInfo> {
        Ok(PlatformInfo {
            name:    platform.name().at(Stage::Platform)?,
            vendor:  platform.vendor().at(Stage::Platform)?,
            version: platform.version().at(Stage::Platform)?,
        })
    }

    fn devices(&self, platform: &Platform, kind: DeviceKind) -> Result<Vec<Device>> {
        match platform.get_devices(kind.device_type()) {
            Ok(ids) => Ok(ids.into_iter().map(Device::new).collect()),
            // kein passendes Gerät ist kein Fehler
            Err(e) if e.0 == CL_DEVICE_NOT_FOUND => Ok(Vec::new()),
            Err(e) => Err(ClError::Api { stage: Stage::Device, code: e.0 }),
        }
    }

    fn device_info(&self, device: &Device) -> Result<DeviceInfo> {
        Ok(DeviceInfo {
            name:             device.name().at(Stage::Device)?,
            vendor:           device.vendor().at(Stage::Device)?,
            compute_units:    device.max_compute_units().at(Stage::Device)?,
            global_mem_bytes: device.global_mem_size().at(Stage::Device)?,
        })
    }

    fn create_context(&self, device: &Device) -> Result<Context> {
        Context::from_device(device).at(Stage::Context)
    }

    #[allow(deprecated)]
    fn create_queue(&self, context: &Context, device: &Device) -> Result<CommandQueue> {
        CommandQueue::create(context, device.id(), 0).at(Stage::Queue)
    }

    fn create_buffer(&self, context: &Context, access: MemAccess, bytes: usize)
        -> Result<Buffer<u8>> {
        if bytes == 0 {
            return Err(ClError::InvalidSize(bytes));
        }
        Buffer::<u8>::create(context, access.flags(), bytes, ptr::null_mut())
            .at(Stage::Buffer)
    }

    fn build_program(&self, context: &Context, source: &str, options: &str) -> Result<Program> {
        // opencl3 liefert hier das Build-Log als String
        Program::create_and_build_from_source(context, source, options)
            .map_err(|log| ClError::Build { log })
    }

    fn create_kernel(&self, program: &Program, name: &str) -> Result<Kernel> {
        Kernel::create(program, name).at(Stage::Kernel)
    }

    fn set_buffer_arg(&self, kernel: &mut Kernel, index: u32, buffer: &Buffer<u8>) -> Result<()> {
        kernel.set_arg(index as cl_uint, buffer).at(Stage::Argument)
    }

    fn set_scalar_arg(&self, kernel: &mut Kernel, index: u32, value: u32) -> Result<()> {
        let value: cl_uint = value;
        kernel.set_arg(index as cl_uint, &value).at(Stage::Argument)
    }

    fn write_buffer(&self, queue: &CommandQueue, buffer: &mut Buffer<u8>, data: &[u8])
        -> Result<()> {
        queue.enqueue_write_buffer(buffer, CL_BLOCKING, 0, data, &[])
            .at(Stage::Write)?;   // blockierend
        Ok(())
    }

    fn enqueue_kernel(&self, queue: &CommandQueue, kernel: &Kernel, global: usize) -> Result<()> {
        let global = [global, 1, 1];
        queue.enqueue_nd_range_kernel(
            kernel.get(), 1,
            ptr::null(), global.as_ptr(),
            ptr::null(), &[])
            .at(Stage::Enqueue)?;
        Ok(())
    }

    fn read_buffer(&self, queue: &CommandQueue, buffer: &mut Buffer<u8>, out: &mut [u8])
        -> Result<()> {
        queue.enqueue_read_buffer(buffer, CL_BLOCKING, 0, out, &[])
            .at(Stage::ReadBack)?;
        Ok(())
    }

    fn finish(&self, queue: &CommandQueue) -> Result<()> {
        queue.finish().at(Stage::Finish)
    }
}
