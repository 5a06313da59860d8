use std::io;

use thiserror::Error;

pub type GpioResult<T> = Result<T, GpioError>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpioError {
    #[error("GPIO pin not exported")]
    PinNotExported,
    #[error("Invalid GPIO direction")]
    InvalidDirection,
    #[error("Failed to read GPIO value")]
    ReadFailed,
    #[error("Failed to write GPIO value")]
    WriteFailed,
    #[error("Permission denied accessing GPIO")]
    PermissionDenied,
    #[error("GPIO device is busy")]
    DeviceBusy,
}

// Linux errno values.
const EPERM: i32 = 1;
const EACCES: i32 = 13;
const EBUSY: i32 = 16;

impl GpioError {
    /// Classifies an OS error, falling back to `fallback` for anything that is
    /// neither an access refusal nor a busy resource.
    ///
    /// `EPERM` is the kernel refusing the operation itself (a value written to
    /// an input line), not file access control, so it takes the fallback.
    pub(crate) fn from_io(err: &io::Error, fallback: GpioError) -> GpioError {
        match err.raw_os_error() {
            Some(EACCES) => GpioError::PermissionDenied,
            Some(EBUSY) => GpioError::DeviceBusy,
            Some(EPERM) => fallback,
            _ => match err.kind() {
                io::ErrorKind::PermissionDenied => GpioError::PermissionDenied,
                io::ErrorKind::ResourceBusy => GpioError::DeviceBusy,
                _ => fallback,
            },
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("GPIO{0} is not a usable pin on this board")]
pub struct InvalidPinNumber(pub u32);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParsePinError {
    #[error("{0:?} is not a GPIO number")]
    NotANumber(String),
    #[error(transparent)]
    OutOfRange(#[from] InvalidPinNumber),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
