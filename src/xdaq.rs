use anyhow::{Context, Result};
use libloading::Library;
use log::info;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::ffi::CString;
use std::os::raw::{c_char, c_double, c_int};
use crate::eis::EisError;
use crate::source::{ImpedanceReading, ImpedanceSource};
use crate::stim::{PulseParams, StimController};
/// Connection parameters marshalled to the vendor library as JSON.
#[derive(Serialize)]
struct XdaqInputParams {
    device_index: i32,
    serial_number: String,
    timeout_ms: i32,
    rhs: bool,
}
impl XdaqInputParams {
    fn for_device(device_index: i32) -> Self {
        Self {
            device_index,
            serial_number: String::new(),
            timeout_ms: 5000,
            rhs: true,
        }
    }
}
struct XdaqApi {
    #[allow(dead_code)]
    lib: Library,
    open_device: unsafe extern "C" fn(*const c_char) -> c_int,
    close_device: unsafe extern "C" fn(c_int) -> c_int,
    get_sample_rate: unsafe extern "C" fn(c_int, *mut c_double) -> c_int,
    measure_impedance: unsafe extern "C" fn(
        c_int,
        c_double,
        c_double,
        *const c_int,
        c_int,
        *mut c_double,
        *mut c_double,
    ) -> c_int,
    enable_stim: unsafe extern "C" fn(c_int, c_int, c_int, c_int, *const c_char) -> c_int,
    disable_stim: unsafe extern "C" fn(c_int, c_int, c_int) -> c_int,
    manual_trigger: unsafe extern "C" fn(c_int, c_int, c_int) -> c_int,
    set_stim_cmd_mode: unsafe extern "C" fn(c_int, c_int) -> c_int,
    run_steps: unsafe extern "C" fn(c_int, c_int, c_int) -> c_int,
}
impl XdaqApi {
    fn load() -> Result<Self> {
        // The vendor control library must be on the loader path.
        let lib = unsafe { Library::new(libloading::library_filename("xdaqcontroller")) }
            .context("xdaqcontroller library not found on the loader path")?;
        // Safety: signatures follow the vendor C API headers.
        unsafe {
            Ok(Self {
                open_device: *lib.get(b"xdaq_open_device\0")?,
                close_device: *lib.get(b"xdaq_close_device\0")?,
                get_sample_rate: *lib.get(b"xdaq_get_sample_rate\0")?,
                measure_impedance: *lib.get(b"xdaq_measure_impedance\0")?,
                enable_stim: *lib.get(b"xdaq_enable_stim\0")?,
                disable_stim: *lib.get(b"xdaq_disable_stim\0")?,
                manual_trigger: *lib.get(b"xdaq_manual_trigger\0")?,
                set_stim_cmd_mode: *lib.get(b"xdaq_set_stim_cmd_mode\0")?,
                run_steps: *lib.get(b"xdaq_run_steps\0")?,
                lib,
            })
        }
    }
    fn instance() -> Result<&'static XdaqApi> {
        static API: OnceCell<XdaqApi> = OnceCell::new();
        API.get_or_try_init(Self::load)
    }
    fn check(code: c_int, call: &'static str) -> Result<()> {
        if code == 0 {
            Ok(())
        } else {
            Err(EisError::Driver { call, code }.into())
        }
    }
}
/// Session on one XDAQ acquisition unit. Measurement and stimulation are
/// delegated entirely to the vendor library; this type only sequences calls.
pub struct XdaqSession {
    api: &'static XdaqApi,
    handle: c_int,
    sample_rate_hz: f64,
    released: bool,
}
impl XdaqSession {
    pub fn open(device_index: i32) -> Result<Self> {
        let api = XdaqApi::instance()?;
        let params = XdaqInputParams::for_device(device_index);
        let json = serde_json::to_string(&params)?;
        let input =
            CString::new(json).context("failed to encode XDAQ input params to a C string")?;
        let handle = unsafe { (api.open_device)(input.as_ptr()) };
        if handle < 0 {
            return Err(EisError::Driver {
                call: "xdaq_open_device",
                code: handle,
            }
            .into());
        }
        let mut sample_rate_hz: c_double = 0.0;
        XdaqApi::check(
            unsafe { (api.get_sample_rate)(handle, &mut sample_rate_hz as *mut c_double) },
            "xdaq_get_sample_rate",
        )?;
        info!("connected to XDAQ device {device_index}, sample rate {sample_rate_hz} Hz");
        Ok(Self {
            api,
            handle,
            sample_rate_hz,
            released: false,
        })
    }
    pub fn close(&mut self) -> Result<()> {
        if !self.released {
            XdaqApi::check(
                unsafe { (self.api.close_device)(self.handle) },
                "xdaq_close_device",
            )?;
            self.released = true;
        }
        Ok(())
    }
}
impl ImpedanceSource for XdaqSession {
    fn measure_impedance(
        &mut self,
        frequency_hz: f64,
        channels: &[usize],
    ) -> Result<ImpedanceReading> {
        let channel_ids: Vec<c_int> = channels.iter().map(|&c| c as c_int).collect();
        let mut magnitudes_ohm = vec![0.0f64; channels.len()];
        let mut phases_deg = vec![0.0f64; channels.len()];
        // 0.2 s of samples per frequency point, the duration the lab settled on.
        XdaqApi::check(
            unsafe {
                (self.api.measure_impedance)(
                    self.handle,
                    frequency_hz,
                    0.2,
                    channel_ids.as_ptr(),
                    channel_ids.len() as c_int,
                    magnitudes_ohm.as_mut_ptr(),
                    phases_deg.as_mut_ptr(),
                )
            },
            "xdaq_measure_impedance",
        )?;
        Ok(ImpedanceReading {
            magnitudes_ohm,
            phases_deg,
        })
    }
}
impl StimController for XdaqSession {
    fn enable_stim(
        &mut self,
        stream: i32,
        channel: usize,
        trigger_source: i32,
        params: &PulseParams,
    ) -> Result<()> {
        let json = serde_json::to_string(params)?;
        let input =
            CString::new(json).context("failed to encode stim params to a C string")?;
        XdaqApi::check(
            unsafe {
                (self.api.enable_stim)(
                    self.handle,
                    stream,
                    channel as c_int,
                    trigger_source,
                    input.as_ptr(),
                )
            },
            "xdaq_enable_stim",
        )
    }
    fn disable_stim(&mut self, stream: i32, channel: usize) -> Result<()> {
        XdaqApi::check(
            unsafe { (self.api.disable_stim)(self.handle, stream, channel as c_int) },
            "xdaq_disable_stim",
        )
    }
    fn manual_trigger(&mut self, trigger_id: i32, on: bool) -> Result<()> {
        XdaqApi::check(
            unsafe { (self.api.manual_trigger)(self.handle, trigger_id, on as c_int) },
            "xdaq_manual_trigger",
        )
    }
    fn set_stim_cmd_mode(&mut self, on: bool) -> Result<()> {
        XdaqApi::check(
            unsafe { (self.api.set_stim_cmd_mode)(self.handle, on as c_int) },
            "xdaq_set_stim_cmd_mode",
        )
    }
    fn run_and_discard(&mut self, steps: u64) -> Result<()> {
        XdaqApi::check(
            unsafe { (self.api.run_steps)(self.handle, steps as c_int, 1) },
            "xdaq_run_steps",
        )
    }
    fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }
}
impl Drop for XdaqSession {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
