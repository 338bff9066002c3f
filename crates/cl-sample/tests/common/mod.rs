//! In-memory `Runtime` that records every creation and release.

#![allow(dead_code)]

use std::{cell::RefCell, collections::HashMap, path::PathBuf, rc::Rc};

use bytemuck::cast_slice;
use cl_sample::{
    ClError, DeviceInfo, DeviceKind, MemAccess, PlatformInfo, Result, Runtime, SampleConfig, Stage,
};

pub type Log = Rc<RefCell<Vec<String>>>;

pub struct Handle {
    name: String,
    log: Log,
}

impl Handle {
    fn new(name: impl Into<String>, log: &Log) -> Self {
        let name = name.into();
        log.borrow_mut().push(format!("create {name}"));
        Handle { name, log: Rc::clone(log) }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.log.borrow_mut().push(format!("release {}", self.name));
    }
}

pub struct MockBuffer {
    id: usize,
    _handle: Handle,
}

pub struct MockKernel {
    args: HashMap<u32, usize>,
    count: u32,
    _handle: Handle,
}

#[derive(Default)]
pub struct MockRuntime {
    pub log: Log,
    pub platforms: usize,
    pub devices: usize,
    /// `(stage, n)`: the n-th call (0-based) for `stage` fails.
    pub fail: Option<(Stage, usize)>,
    /// Status code of the injected failure, `CL_OUT_OF_RESOURCES` if unset.
    pub fail_code: Option<i32>,
    /// Kernel adds one instead of squaring.
    pub wrong_result: bool,
    pub calls: RefCell<HashMap<Stage, usize>>,
    pub memory: RefCell<HashMap<usize, Vec<f32>>>,
    pub next_buffer: RefCell<usize>,
}

impl MockRuntime {
    pub fn new() -> Self {
        MockRuntime { platforms: 1, devices: 1, ..Default::default() }
    }

    pub fn failing(stage: Stage, nth: usize) -> Self {
        MockRuntime { fail: Some((stage, nth)), ..Self::new() }
    }

    fn check(&self, stage: Stage) -> Result<()> {
        let mut calls = self.calls.borrow_mut();
        let n = calls.entry(stage).or_insert(0);
        let this = *n;
        *n += 1;
        match self.fail {
            Some((s, nth)) if s == stage && nth == this => {
                Err(ClError::Api { stage, code: self.fail_code.unwrap_or(-5) })
            }
            _ => Ok(()),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn releases(&self) -> Vec<String> {
        self.events().into_iter().filter(|e| e.starts_with("release")).collect()
    }
}

impl Runtime for MockRuntime {
    type Platform = usize;
    type Device   = usize;
    type Context  = Handle;
    type Queue    = Handle;
    type Buffer   = MockBuffer;
    type Program  = Handle;
    type Kernel   = MockKernel;

    fn platforms(&self) -> Result<Vec<usize>> {
        self.check(Stage::Platform)?;
        Ok((0..self.platforms).collect())
    }

    fn platform_info(&self, platform: &usize) -> Result<PlatformInfo> {
        Ok(PlatformInfo {
            name: format!("mock platform {platform}"),
            vendor: "mock".into(),
            version: "OpenCL 1.2".into(),
        })
    }

    fn devices(&self, _platform: &usize, kind: DeviceKind) -> Result<Vec<usize>> {
        self.check(Stage::Device)?;
        if kind == DeviceKind::Accelerator {
            return Ok(Vec::new());
        }
        Ok((0..self.devices).collect())
    }

    fn device_info(&self, device: &usize) -> Result<DeviceInfo> {
        Ok(DeviceInfo {
            name: format!("mock device {device}"),
            vendor: "mock".into(),
            compute_units: 8,
            global_mem_bytes: 1 << 30,
        })
    }

    fn create_context(&self, _device: &usize) -> Result<Handle> {
        self.check(Stage::Context)?;
        Ok(Handle::new("context", &self.log))
    }

    fn create_queue(&self, _context: &Handle, _device: &usize) -> Result<Handle> {
        self.check(Stage::Queue)?;
        Ok(Handle::new("queue", &self.log))
    }

    fn create_buffer(&self, _context: &Handle, access: MemAccess, bytes: usize)
        -> Result<MockBuffer> {
        self.check(Stage::Buffer)?;
        let mut next = self.next_buffer.borrow_mut();
        let id = *next;
        *next += 1;
        self.memory.borrow_mut().insert(id, vec![0.0; bytes / 4]);
        let name = match access {
            MemAccess::ReadOnly => "input",
            MemAccess::WriteOnly => "output",
            MemAccess::ReadWrite => "scratch",
        };
        Ok(MockBuffer { id, _handle: Handle::new(format!("buffer {name}"), &self.log) })
    }

    fn build_program(&self, _context: &Handle, source: &str, _options: &str) -> Result<Handle> {
        if self.check(Stage::Program).is_err() || !source.contains("__kernel") {
            return Err(ClError::Build { log: "error: expected kernel".into() });
        }
        Ok(Handle::new("program", &self.log))
    }

    fn create_kernel(&self, _program: &Handle, name: &str) -> Result<MockKernel> {
        self.check(Stage::Kernel)?;
        if name != "square" {
            return Err(ClError::Api { stage: Stage::Kernel, code: -46 });
        }
        Ok(MockKernel { args: HashMap::new(), count: 0, _handle: Handle::new("kernel", &self.log) })
    }

    fn set_buffer_arg(&self, kernel: &mut MockKernel, index: u32, buffer: &MockBuffer)
        -> Result<()> {
        self.check(Stage::Argument)?;
        kernel.args.insert(index, buffer.id);
        Ok(())
    }

    fn set_scalar_arg(&self, kernel: &mut MockKernel, _index: u32, value: u32) -> Result<()> {
        self.check(Stage::Argument)?;
        kernel.count = value;
        Ok(())
    }

    fn write_buffer(&self, _queue: &Handle, buffer: &mut MockBuffer, data: &[u8]) -> Result<()> {
        self.check(Stage::Write)?;
        let values = data
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        self.memory.borrow_mut().insert(buffer.id, values);
        Ok(())
    }

    fn enqueue_kernel(&self, _queue: &Handle, kernel: &MockKernel, global: usize) -> Result<()> {
        self.check(Stage::Enqueue)?;
        let mut memory = self.memory.borrow_mut();
        let input = memory[&kernel.args[&0]].clone();
        let out = memory.get_mut(&kernel.args[&1]).expect("output buffer bound");
        for i in 0..global.min(kernel.count as usize) {
            out[i] = if self.wrong_result { input[i] + 1.0 } else { input[i] * input[i] };
        }
        Ok(())
    }

    fn read_buffer(&self, _queue: &Handle, buffer: &mut MockBuffer, out: &mut [u8]) -> Result<()> {
        self.check(Stage::ReadBack)?;
        out.copy_from_slice(cast_slice(&self.memory.borrow()[&buffer.id]));
        Ok(())
    }

    fn finish(&self, _queue: &Handle) -> Result<()> {
        self.check(Stage::Finish)
    }
}

pub fn kernel_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("kernel/square.cl")
}

pub fn config(elements: usize) -> SampleConfig {
    SampleConfig { elements, kernel_path: kernel_path(), ..SampleConfig::default() }
}

pub const FULL_RELEASE: [&str; 6] = [
    "release kernel",
    "release program",
    "release buffer output",
    "release buffer input",
    "release queue",
    "release context",
];
