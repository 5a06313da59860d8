//! Userspace control of Raspberry Pi GPIO lines through the sysfs
//! `/sys/class/gpio` interface.
//!
//! A [`GpioPin`] exports its line when created and unexports it when dropped.
//! [`GpioPinGroup`] drives several pins together. All file access goes through
//! a [`SysfsGateway`]: [`FsGateway`] for the real filesystem, [`MockGateway`]
//! for tests.

pub mod backend;
pub mod config;
pub mod error;
pub mod gpio;
pub mod group;

pub use backend::{FsGateway, MockGateway};
pub use config::{GpioConfig, SettleConfig};
pub use error::{ConfigError, GpioError, GpioResult, InvalidPinNumber, ParsePinError};
pub use gpio::{Direction, GpioController, GpioPin, PinNumber, SysfsGateway, Value};
pub use group::GpioPinGroup;
