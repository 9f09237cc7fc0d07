//! Булево умножение матриц на устройстве

use super::kernels::{build_options, KernelSource, KERNEL_NAME};
use super::types::{BoolMatrix, ProductShape, TILE_SIDE};
use crate::accelerator::Accelerator;
use crate::error::{Error, Result};
use crate::opencl::types::{CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY};
use crate::opencl::{Buffer, CommandQueue, Context, Device, Kernel, Program};
use crate::utils::LapTimer;

/// Ресурсы одного вызова: контекст, очередь и собранное ядро `with_tiles`.
///
/// Поля освобождаются в порядке объявления: ядро, программа, очередь, контекст.
pub struct ProductPipeline {
    kernel: Kernel,
    _program: Program,
    queue: CommandQueue,
    context: Context,
}

impl ProductPipeline {
    pub fn new(device: &Device, source: &KernelSource) -> Result<Self> {
        let text = source.load()?;
        let context = Context::new(device)?;
        let queue = CommandQueue::new(&context, device)?;
        let program = Program::build(&context, device, &text, &build_options())?;
        let kernel = Kernel::new(&program, KERNEL_NAME)?;
        Ok(Self {
            kernel,
            _program: program,
            queue,
            context,
        })
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// Запускает `c = a * b` (или `c = a | a * b` при `accumulate`) и ждёт завершения
    pub fn enqueue_product(
        &self,
        a: &Buffer,
        b: &Buffer,
        c: &Buffer,
        shape: ProductShape,
        accumulate: bool,
    ) -> Result<()> {
        // ProductShape гарантирует, что размеры помещаются в u32
        self.kernel.set_buffer_arg(0, a)?;
        self.kernel.set_buffer_arg(1, b)?;
        self.kernel.set_buffer_arg(2, c)?;
        self.kernel.set_u32_arg(3, shape.m as u32)?;
        self.kernel.set_u32_arg(4, shape.p as u32)?;
        self.kernel.set_u32_arg(5, shape.n as u32)?;
        self.kernel.set_u32_arg(6, accumulate as u32)?;

        let event = self
            .kernel
            .enqueue_2d(&self.queue, shape.global_work_size(), [TILE_SIDE, TILE_SIDE])?;
        event.wait()
    }
}

impl Accelerator {
    /// Булево произведение выровненных буферов: `c` перезаписывается целиком.
    ///
    /// Длины `a`, `b`, `c` должны быть `m*p`, `p*n`, `m*n`.
    pub fn multiply_padded(&self, a: &[u8], b: &[u8], c: &mut [u8], shape: ProductShape) -> Result<()> {
        self.run_product(a, b, c, shape, 1).map(|_| ())
    }

    /// Булево произведение матриц
    pub fn multiply(&self, a: &BoolMatrix, b: &BoolMatrix) -> Result<BoolMatrix> {
        self.multiply_timed(a, b, 1).map(|(product, _)| product)
    }

    /// Повторяет запуск ядра `laps` раз и возвращает результат и время кругов
    pub fn multiply_timed(&self, a: &BoolMatrix, b: &BoolMatrix, laps: usize) -> Result<(BoolMatrix, LapTimer)> {
        let shape = ProductShape::for_operands(a, b)?;
        let mut c = vec![0u8; shape.out_len()];
        let timer = self.run_product(a.as_bytes(), b.as_bytes(), &mut c, shape, laps)?;
        let product = BoolMatrix::from_parts(a.rows(), b.cols(), shape.m, shape.n, c);
        Ok((product, timer))
    }

    fn run_product(&self, a: &[u8], b: &[u8], c: &mut [u8], shape: ProductShape, laps: usize) -> Result<LapTimer> {
        shape.check_lengths(a.len(), b.len(), c.len())?;
        if laps == 0 {
            return Err(Error::InvalidInput("at least one lap is required".into()));
        }

        let pipeline = ProductPipeline::new(self.device(), &self.config().kernel)?;
        let a_buffer = Buffer::from_bytes(pipeline.context(), CL_MEM_READ_ONLY, a)?;
        let b_buffer = Buffer::from_bytes(pipeline.context(), CL_MEM_READ_ONLY, b)?;
        let c_buffer = Buffer::new(pipeline.context(), CL_MEM_WRITE_ONLY, c.len())?;

        log::debug!(
            "boolean product {}x{} * {}x{}, {} lap(s)",
            shape.m,
            shape.p,
            shape.p,
            shape.n,
            laps
        );

        let mut timer = LapTimer::new();
        for _ in 0..laps {
            pipeline.enqueue_product(&a_buffer, &b_buffer, &c_buffer, shape, false)?;
            timer.next_lap();
        }

        c_buffer.read_into(pipeline.queue(), c)?;
        Ok(timer)
    }
}
