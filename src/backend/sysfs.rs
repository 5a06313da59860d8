use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use log::debug;

use crate::error::{GpioError, GpioResult};
use crate::gpio::SysfsGateway;

/// Gateway over the real filesystem. Each call opens the control file, uses it
/// and lets the handle close when it goes out of scope.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsGateway;

impl FsGateway {
    pub fn new() -> Self {
        Self
    }
}

impl SysfsGateway for FsGateway {
    fn write(&self, path: &Path, content: &str) -> GpioResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| {
                debug!("open {} for write: {e}", path.display());
                GpioError::from_io(&e, GpioError::WriteFailed)
            })?;

        file.write_all(content.as_bytes()).map_err(|e| {
            debug!("write {content:?} to {}: {e}", path.display());
            GpioError::from_io(&e, GpioError::WriteFailed)
        })
    }

    fn read(&self, path: &Path) -> GpioResult<String> {
        let mut file = File::open(path).map_err(|e| {
            debug!("open {} for read: {e}", path.display());
            GpioError::from_io(&e, GpioError::ReadFailed)
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            debug!("read {}: {e}", path.display());
            GpioError::from_io(&e, GpioError::ReadFailed)
        })?;

        contents.truncate(contents.trim_end().len());
        Ok(contents)
    }
}
