//! Scoped ownership of every handle acquired during one run.
//!
//! Acquisition order is platform → device → context → queue → buffers →
//! program → kernel. [`Session`]'s `Drop` releases whatever subset was
//! acquired in the reverse order, so an early `?` anywhere in the sequence
//! cleans up exactly what exists.

use bytemuck::{cast_slice, cast_slice_mut};
use log::{debug, info};

#[cfg(feature = "metrics")]
use std::{sync::atomic::Ordering, time::Instant};

#[cfg(feature = "metrics")]
use crate::metrics::{record, ALLOCS, ALLOC_BYTES};

use crate::config::{SampleConfig, BUFFER_COUNT};
use crate::error::{ClError, Result, Stage};
use crate::runtime::{DeviceKind, MemAccess, Runtime};

/// Device access of buffer `i`: 0 is the kernel input, 1 the output.
const BUFFER_ACCESS: [MemAccess; BUFFER_COUNT] = [MemAccess::ReadOnly, MemAccess::WriteOnly];

pub struct Session<'rt, R: Runtime> {
    rt: &'rt R,
    platform: R::Platform,
    device: R::Device,
    elements: usize,
    context: Option<R::Context>,
    queue: Option<R::Queue>,
    buffers: Vec<R::Buffer>,
    program: Option<R::Program>,
    kernel: Option<R::Kernel>,
}

/// Returned by the ICD loader when no OpenCL driver is installed.
pub const CL_PLATFORM_NOT_FOUND_KHR: i32 = -1001;

/// All platforms, never empty. Zero platforms, and a loader without any
/// installed driver, are both [`ClError::NoPlatform`].
pub fn list_platforms<R: Runtime>(rt: &R) -> Result<Vec<R::Platform>> {
    match rt.platforms() {
        Ok(platforms) if platforms.is_empty() => Err(ClError::NoPlatform),
        Ok(platforms) => Ok(platforms),
        Err(ClError::Api { stage: Stage::Platform, code: CL_PLATFORM_NOT_FOUND_KHR }) => {
            Err(ClError::NoPlatform)
        }
        Err(e) => Err(e),
    }
}

/// Picks platform `index`. No platform at all is [`ClError::NoPlatform`].
pub fn select_platform<R: Runtime>(rt: &R, index: usize) -> Result<R::Platform> {
    let mut platforms = list_platforms(rt)?;
    let count = platforms.len();
    if index >= count {
        return Err(ClError::PlatformIndex { index, count });
    }
    Ok(platforms.swap_remove(index))
}

pub fn select_device<R: Runtime>(
    rt: &R,
    platform: &R::Platform,
    kind: DeviceKind,
    index: usize,
) -> Result<R::Device> {
    let mut devices = rt.devices(platform, kind)?;
    if devices.is_empty() {
        return Err(ClError::NoDevice { kind });
    }
    let count = devices.len();
    if index >= count {
        return Err(ClError::DeviceIndex { index, count });
    }
    Ok(devices.swap_remove(index))
}

impl<'rt, R: Runtime> Session<'rt, R> {
    /// Acquires platform, device, context, queue and both buffers.
    pub fn open(rt: &'rt R, cfg: &SampleConfig) -> Result<Self> {
        cfg.validate()?;

        let platform = select_platform(rt, cfg.platform_index)?;
        let device = select_device(rt, &platform, cfg.device_kind, cfg.device_index)?;
        debug!("selected platform {} / {} device {}",
               cfg.platform_index, cfg.device_kind, cfg.device_index);

        let mut session = Session {
            rt,
            platform,
            device,
            elements: cfg.elements,
            context: None,
            queue: None,
            buffers: Vec::with_capacity(BUFFER_COUNT),
            program: None,
            kernel: None,
        };

        #[cfg(feature = "metrics")]
        let t = Instant::now();
        let context: &R::Context = session.context.insert(rt.create_context(&session.device)?);
        #[cfg(feature = "metrics")]
        record(Stage::Context, t);
        debug!("acquired context");

        #[cfg(feature = "metrics")]
        let t = Instant::now();
        session.queue = Some(rt.create_queue(context, &session.device)?);
        #[cfg(feature = "metrics")]
        record(Stage::Queue, t);
        debug!("acquired command queue");

        let bytes = cfg.buffer_bytes();
        for access in BUFFER_ACCESS {
            #[cfg(feature = "metrics")]
            let t = Instant::now();
            session.buffers.push(rt.create_buffer(context, access, bytes)?);
            #[cfg(feature = "metrics")]
            {
                record(Stage::Buffer, t);
                ALLOCS.fetch_add(1, Ordering::Relaxed);
                ALLOC_BYTES.fetch_add(bytes, Ordering::Relaxed);
            }
            debug!("acquired {access:?} buffer ({bytes} bytes)");
        }

        info!("session open: {} element(s) per buffer", cfg.elements);
        Ok(session)
    }

    /// Builds `source` and creates kernel `name`. A previously loaded
    /// kernel and program are released first.
    pub fn load_kernel(&mut self, source: &str, name: &str, options: &str) -> Result<()> {
        release(&mut self.kernel, Stage::Kernel);
        release(&mut self.program, Stage::Program);

        let context = self.context.as_ref().ok_or(ClError::NotReady(Stage::Context))?;

        #[cfg(feature = "metrics")]
        let t = Instant::now();
        let program = self.program.insert(self.rt.build_program(context, source, options)?);
        #[cfg(feature = "metrics")]
        record(Stage::Program, t);
        debug!("acquired program");

        self.kernel = Some(self.rt.create_kernel(program, name)?);
        debug!("acquired kernel `{name}`");
        Ok(())
    }

    /// Uploads `input`, binds (input, output, count) and runs the kernel
    /// over one work item per element. Returns once the queue is drained.
    pub fn dispatch(&mut self, input: &[f32]) -> Result<()> {
        self.check_len(input.len())?;
        let count = u32::try_from(self.elements).map_err(|_| ClError::InvalidSize(self.elements))?;

        let rt = self.rt;
        let (Some(queue), Some(kernel)) = (self.queue.as_ref(), self.kernel.as_mut()) else {
            return Err(ClError::NotReady(Stage::Enqueue));
        };
        let [input_buf, output_buf] = self.buffers.as_mut_slice() else {
            return Err(ClError::NotReady(Stage::Buffer));
        };

        #[cfg(feature = "metrics")]
        let t = Instant::now();
        rt.write_buffer(queue, input_buf, cast_slice(input))?;
        #[cfg(feature = "metrics")]
        record(Stage::Write, t);

        rt.set_buffer_arg(kernel, 0, input_buf)?;
        rt.set_buffer_arg(kernel, 1, output_buf)?;
        rt.set_scalar_arg(kernel, 2, count)?;

        #[cfg(feature = "metrics")]
        let t = Instant::now();
        rt.enqueue_kernel(queue, kernel, self.elements)?;
        rt.finish(queue)?;                        // Kernel fertig
        #[cfg(feature = "metrics")]
        record(Stage::Enqueue, t);

        debug!("kernel ran over {} work item(s)", self.elements);
        Ok(())
    }

    /// Blocking read of the output buffer into `out`.
    pub fn read_back(&mut self, out: &mut [f32]) -> Result<()> {
        self.check_len(out.len())?;
        let queue = self.queue.as_ref().ok_or(ClError::NotReady(Stage::ReadBack))?;
        let output_buf = self.buffers.get_mut(1).ok_or(ClError::NotReady(Stage::ReadBack))?;

        #[cfg(feature = "metrics")]
        let t = Instant::now();
        self.rt.read_buffer(queue, output_buf, cast_slice_mut(out))?;
        #[cfg(feature = "metrics")]
        record(Stage::ReadBack, t);
        Ok(())
    }

    pub fn platform(&self) -> &R::Platform {
        &self.platform
    }

    pub fn device(&self) -> &R::Device {
        &self.device
    }

    pub fn elements(&self) -> usize {
        self.elements
    }

    /// Releasable handles currently held, in creation order.
    pub fn acquired(&self) -> Vec<Stage> {
        let mut held = Vec::new();
        if self.context.is_some() { held.push(Stage::Context); }
        if self.queue.is_some()   { held.push(Stage::Queue); }
        held.extend(self.buffers.iter().map(|_| Stage::Buffer));
        if self.program.is_some() { held.push(Stage::Program); }
        if self.kernel.is_some()  { held.push(Stage::Kernel); }
        held
    }

    fn check_len(&self, actual: usize) -> Result<()> {
        if actual != self.elements {
            return Err(ClError::LengthMismatch { expected: self.elements, actual });
        }
        Ok(())
    }
}

fn release<T>(slot: &mut Option<T>, stage: Stage) {
    if let Some(handle) = slot.take() {
        drop(handle);
        debug!("released {}", stage.as_str());
    }
}

impl<R: Runtime> Drop for Session<'_, R> {
    fn drop(&mut self) {
        release(&mut self.kernel, Stage::Kernel);
        release(&mut self.program, Stage::Program);
        while let Some(buf) = self.buffers.pop() {
            drop(buf);
            #[cfg(feature = "metrics")]
            {
                ALLOCS.fetch_sub(1, Ordering::Relaxed);
                ALLOC_BYTES.fetch_sub(self.elements * std::mem::size_of::<f32>(), Ordering::Relaxed);
            }
            debug!("released buffer {}", self.buffers.len());
        }
        release(&mut self.queue, Stage::Queue);
        release(&mut self.context, Stage::Context);
    }
}
