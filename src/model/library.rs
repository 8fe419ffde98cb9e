//! Hardware model compiled into a shared library.
//!
//! Simulators such as Verilator emit C++; a thin shim wraps the generated class in a C ABI that
//! this backend loads at runtime, so the testbench builds without the simulation present. The
//! shim exports:
//!
//! ```c
//! typedef struct { uint16_t addr; uint8_t data; uint8_t write; } tb_bus_t;
//! typedef struct { uint16_t pc; uint8_t a, x, y, status, sp, fetch, dma; } tb_cpu_t;
//!
//! void *tb_model_new(void);
//! void  tb_model_free(void *model);
//! void  tb_set_rst_n(void *model, uint8_t level);   /* active low */
//! void  tb_set_clk(void *model, uint8_t level);
//! void  tb_eval(void *model);
//! void  tb_time_inc(void *model, uint64_t units);
//! void  tb_cpu_bus(void *model, tb_bus_t *out);     /* write = cpu_rw_o */
//! void  tb_set_cpu_d_i(void *model, uint8_t data);
//! void  tb_ppu_bus(void *model, tb_bus_t *out);     /* write = ppu_rw_o */
//! void  tb_set_ppu_d_i(void *model, uint8_t data);
//! void  tb_raster(void *model, uint16_t *x, uint16_t *y);
//! uint8_t tb_color_o(void *model);
//! void  tb_cpu_regs(void *model, tb_cpu_t *out);    /* fetch = get_state() == 1 */
//! void  tb_final(void *model);
//! ```

use std::ffi::c_void;
use std::path::Path;

use libloading::Library;
use log::info;

use crate::model::{BusPins, CpuSnapshot, HardwareModel, ModelError, RasterPosition};

#[repr(C)]
#[derive(Default)]
struct RawBus {
    addr: u16,
    data: u8,
    write: u8,
}

#[repr(C)]
#[derive(Default)]
struct RawCpu {
    pc: u16,
    a: u8,
    x: u8,
    y: u8,
    status: u8,
    sp: u8,
    fetch: u8,
    dma: u8,
}

type Handle = *mut c_void;

/// Entry points resolved from the library. Valid for as long as the library stays loaded.
struct Exports {
    free: unsafe extern "C" fn(Handle),
    set_rst_n: unsafe extern "C" fn(Handle, u8),
    set_clk: unsafe extern "C" fn(Handle, u8),
    eval: unsafe extern "C" fn(Handle),
    time_inc: unsafe extern "C" fn(Handle, u64),
    cpu_bus: unsafe extern "C" fn(Handle, *mut RawBus),
    set_cpu_d_i: unsafe extern "C" fn(Handle, u8),
    ppu_bus: unsafe extern "C" fn(Handle, *mut RawBus),
    set_ppu_d_i: unsafe extern "C" fn(Handle, u8),
    raster: unsafe extern "C" fn(Handle, *mut u16, *mut u16),
    color_o: unsafe extern "C" fn(Handle) -> u8,
    cpu_regs: unsafe extern "C" fn(Handle, *mut RawCpu),
    finalize: unsafe extern "C" fn(Handle),
}

fn symbol<T: Copy>(lib: &Library, name: &'static str) -> Result<T, ModelError> {
    // SAFETY: the caller names the C signature documented in the module header.
    unsafe { lib.get::<T>(name.as_bytes()) }
        .map(|sym| *sym)
        .map_err(|source| ModelError::MissingSymbol { symbol: name, source })
}

/// A simulation instance living inside a dynamically loaded library.
pub struct LibraryModel {
    handle: Handle,
    exports: Exports,
    finished: bool,
    // Dropped last so `exports` never outlives the code it points into.
    _lib: Library,
}

impl LibraryModel {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        // SAFETY: loading runs the library's initialisers; the shim is trusted code.
        let lib = unsafe { Library::new(path) }.map_err(ModelError::Load)?;

        let new: unsafe extern "C" fn() -> Handle = symbol(&lib, "tb_model_new")?;
        let exports = Exports {
            free: symbol(&lib, "tb_model_free")?,
            set_rst_n: symbol(&lib, "tb_set_rst_n")?,
            set_clk: symbol(&lib, "tb_set_clk")?,
            eval: symbol(&lib, "tb_eval")?,
            time_inc: symbol(&lib, "tb_time_inc")?,
            cpu_bus: symbol(&lib, "tb_cpu_bus")?,
            set_cpu_d_i: symbol(&lib, "tb_set_cpu_d_i")?,
            ppu_bus: symbol(&lib, "tb_ppu_bus")?,
            set_ppu_d_i: symbol(&lib, "tb_set_ppu_d_i")?,
            raster: symbol(&lib, "tb_raster")?,
            color_o: symbol(&lib, "tb_color_o")?,
            cpu_regs: symbol(&lib, "tb_cpu_regs")?,
            finalize: symbol(&lib, "tb_final")?,
        };

        // SAFETY: `tb_model_new` takes no arguments and returns an owned instance or null.
        let handle = unsafe { new() };
        if handle.is_null() {
            return Err(ModelError::Instantiate);
        }
        info!("loaded hardware model from {}", path.display());

        Ok(Self {
            handle,
            exports,
            finished: false,
            _lib: lib,
        })
    }

    fn read_bus(&self, f: unsafe extern "C" fn(Handle, *mut RawBus)) -> BusPins {
        let mut raw = RawBus::default();
        // SAFETY: `handle` is live until drop and `raw` is a valid out-pointer.
        unsafe { f(self.handle, &mut raw) };
        BusPins {
            addr: raw.addr,
            data: raw.data,
            write: raw.write != 0,
        }
    }
}

// SAFETY (all calls below): `handle` came from `tb_model_new`, is non-null, and is freed only in
// `Drop`; the function pointers stay valid while `_lib` is loaded.
impl HardwareModel for LibraryModel {
    fn set_reset(&mut self, asserted: bool) {
        unsafe { (self.exports.set_rst_n)(self.handle, u8::from(!asserted)) }
    }

    fn set_clock(&mut self, high: bool) {
        unsafe { (self.exports.set_clk)(self.handle, u8::from(high)) }
    }

    fn eval(&mut self) {
        unsafe { (self.exports.eval)(self.handle) }
    }

    fn advance_time(&mut self, units: u64) {
        unsafe { (self.exports.time_inc)(self.handle, units) }
    }

    fn cpu_bus(&self) -> BusPins {
        self.read_bus(self.exports.cpu_bus)
    }

    fn set_cpu_data(&mut self, data: u8) {
        unsafe { (self.exports.set_cpu_d_i)(self.handle, data) }
    }

    fn ppu_bus(&self) -> BusPins {
        self.read_bus(self.exports.ppu_bus)
    }

    fn set_ppu_data(&mut self, data: u8) {
        unsafe { (self.exports.set_ppu_d_i)(self.handle, data) }
    }

    fn raster(&self) -> RasterPosition {
        let (mut x, mut y) = (0u16, 0u16);
        unsafe { (self.exports.raster)(self.handle, &mut x, &mut y) };
        RasterPosition { x, y }
    }

    fn color(&self) -> u8 {
        unsafe { (self.exports.color_o)(self.handle) & 0x3F }
    }

    fn cpu_state(&self) -> CpuSnapshot {
        let mut raw = RawCpu::default();
        unsafe { (self.exports.cpu_regs)(self.handle, &mut raw) };
        CpuSnapshot {
            pc: raw.pc,
            a: raw.a,
            x: raw.x,
            y: raw.y,
            status: raw.status,
            sp: raw.sp,
            fetch: raw.fetch != 0,
            dma: raw.dma != 0,
        }
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            unsafe { (self.exports.finalize)(self.handle) }
        }
    }
}

impl Drop for LibraryModel {
    fn drop(&mut self) {
        self.finish();
        // SAFETY: last use of `handle`.
        unsafe { (self.exports.free)(self.handle) }
    }
}
