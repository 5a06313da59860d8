use std::fmt;
use std::ops::Not;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::config::{GpioConfig, SettleConfig};
use crate::error::{GpioError, GpioResult, InvalidPinNumber, ParsePinError};
use crate::group::GpioPinGroup;

macro_rules! pin_numbers {
    ($($name:ident = $line:literal),* $(,)?) => {
        /// GPIO lines broken out on the Raspberry Pi 3B header.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u8)]
        pub enum PinNumber {
            $($name = $line),*
        }

        impl PinNumber {
            pub const ALL: &'static [PinNumber] = &[$(PinNumber::$name),*];
        }

        impl TryFrom<u8> for PinNumber {
            type Error = InvalidPinNumber;

            fn try_from(line: u8) -> Result<Self, Self::Error> {
                match line {
                    $($line => Ok(PinNumber::$name),)*
                    _ => Err(InvalidPinNumber(line.into())),
                }
            }
        }
    };
}

pin_numbers! {
    Gpio2 = 2,   // I2C1 SDA
    Gpio3 = 3,   // I2C1 SCL
    Gpio4 = 4,   // GPCLK0
    Gpio5 = 5,
    Gpio6 = 6,
    Gpio7 = 7,   // SPI0 CE1
    Gpio8 = 8,   // SPI0 CE0
    Gpio9 = 9,   // SPI0 MISO
    Gpio10 = 10, // SPI0 MOSI
    Gpio11 = 11, // SPI0 SCLK
    Gpio12 = 12, // PWM0
    Gpio13 = 13, // PWM1
    Gpio14 = 14, // UART TXD
    Gpio15 = 15, // UART RXD
    Gpio16 = 16,
    Gpio17 = 17,
    Gpio18 = 18, // PWM0
    Gpio19 = 19, // SPI1 MISO
    Gpio20 = 20, // SPI1 MOSI
    Gpio21 = 21, // SPI1 SCLK
    Gpio22 = 22,
    Gpio23 = 23,
    Gpio24 = 24,
    Gpio25 = 25,
    Gpio26 = 26,
    Gpio27 = 27,
}

impl PinNumber {
    pub fn line(self) -> u8 {
        self as u8
    }
}

impl From<PinNumber> for u8 {
    fn from(pin: PinNumber) -> Self {
        pin.line()
    }
}

impl TryFrom<u32> for PinNumber {
    type Error = InvalidPinNumber;

    fn try_from(line: u32) -> Result<Self, Self::Error> {
        u8::try_from(line)
            .map_err(|_| InvalidPinNumber(line))
            .and_then(PinNumber::try_from)
    }
}

impl FromStr for PinNumber {
    type Err = ParsePinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix("GPIO")
            .or_else(|| s.strip_prefix("gpio"))
            .unwrap_or(s);
        let line: u32 = digits
            .parse()
            .map_err(|_| ParsePinError::NotANumber(s.to_string()))?;
        Ok(PinNumber::try_from(line)?)
    }
}

impl fmt::Display for PinNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.line())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn as_sysfs(self) -> &'static str {
        match self {
            Direction::Input => "in",
            Direction::Output => "out",
        }
    }
}

impl FromStr for Direction {
    type Err = GpioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Direction::Input),
            "out" => Ok(Direction::Output),
            _ => Err(GpioError::ReadFailed),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sysfs())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Low = 0,
    High = 1,
}

impl Value {
    pub fn as_sysfs(self) -> &'static str {
        match self {
            Value::Low => "0",
            Value::High => "1",
        }
    }

    pub fn is_high(self) -> bool {
        self == Value::High
    }
}

impl Not for Value {
    type Output = Value;

    fn not(self) -> Self::Output {
        match self {
            Value::Low => Value::High,
            Value::High => Value::Low,
        }
    }
}

impl From<bool> for Value {
    fn from(high: bool) -> Self {
        if high { Value::High } else { Value::Low }
    }
}

impl FromStr for Value {
    type Err = GpioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(Value::Low),
            "1" => Ok(Value::High),
            _ => Err(GpioError::ReadFailed),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sysfs())
    }
}

/// File-level access to the sysfs GPIO control files.
///
/// Implementations open, use and close the file within each call and never
/// retry; every failure is reported through the closed [`GpioError`] set.
pub trait SysfsGateway: Send + Sync {
    fn write(&self, path: &Path, content: &str) -> GpioResult<()>;
    fn read(&self, path: &Path) -> GpioResult<String>;
}

/// An exported sysfs GPIO line.
///
/// The pin is exported when the handle is created and unexported when it is
/// dropped or [`released`](GpioPin::release). Handles are not `Clone`: at most
/// one handle owns a given export.
pub struct GpioPin<G: SysfsGateway + ?Sized> {
    gateway: Arc<G>,
    pin: PinNumber,
    path: PathBuf,
    unexport_path: PathBuf,
    exported: bool,
}

impl<G: SysfsGateway + ?Sized> GpioPin<G> {
    /// Exports `pin` and applies `direction`.
    pub fn new(
        gateway: Arc<G>,
        config: &GpioConfig,
        pin: PinNumber,
        direction: Direction,
    ) -> GpioResult<Self> {
        let (handle, status) = Self::claim(gateway, config, pin, direction);
        status.map(|_| handle)
    }

    /// Like [`GpioPin::new`], but always hands back the handle together with
    /// the outcome. On failure the handle is inert (a pin exported before the
    /// initial direction failed is unexported again) and every operation on it
    /// reports [`GpioError::PinNotExported`].
    pub fn claim(
        gateway: Arc<G>,
        config: &GpioConfig,
        pin: PinNumber,
        direction: Direction,
    ) -> (Self, GpioResult<()>) {
        let mut handle = Self {
            gateway,
            pin,
            path: config.pin_path(pin.line()),
            unexport_path: config.unexport_path(),
            exported: false,
        };

        let status = handle
            .export(&config.export_path())
            .and_then(|_| handle.apply_initial_direction(direction, &config.settle));
        if status.is_err() {
            handle.unexport();
        }

        (handle, status)
    }

    fn export(&mut self, export_path: &Path) -> GpioResult<()> {
        self.gateway.write(export_path, &self.pin.to_string())?;
        self.exported = true;
        info!("Exported GPIO{}", self.pin);
        Ok(())
    }

    fn apply_initial_direction(
        &mut self,
        direction: Direction,
        settle: &SettleConfig,
    ) -> GpioResult<()> {
        let attempts = settle.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.set_direction(direction) {
                Err(GpioError::PermissionDenied) if attempt < attempts => {
                    debug!(
                        "GPIO{} direction not writable yet (attempt {attempt}/{attempts})",
                        self.pin
                    );
                    thread::sleep(settle.delay());
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn ensure_exported(&self) -> GpioResult<()> {
        if self.exported {
            Ok(())
        } else {
            Err(GpioError::PinNotExported)
        }
    }

    fn direction_path(&self) -> PathBuf {
        self.path.join("direction")
    }

    fn value_path(&self) -> PathBuf {
        self.path.join("value")
    }

    pub fn pin_number(&self) -> PinNumber {
        self.pin
    }

    /// The `gpio<N>` control directory of this pin.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_ready(&self) -> bool {
        self.exported
    }

    pub fn set_direction(&mut self, direction: Direction) -> GpioResult<()> {
        self.ensure_exported()?;
        self.gateway
            .write(&self.direction_path(), direction.as_sysfs())
            .map_err(|e| match e {
                GpioError::WriteFailed => GpioError::InvalidDirection,
                other => other,
            })
    }

    pub fn get_direction(&self) -> GpioResult<Direction> {
        self.ensure_exported()?;
        self.gateway.read(&self.direction_path())?.parse()
    }

    /// Writes `value` without checking the current direction; writing an input
    /// pin fails with whatever the kernel reports for the write.
    pub fn set_value(&mut self, value: Value) -> GpioResult<()> {
        self.ensure_exported()?;
        self.gateway.write(&self.value_path(), value.as_sysfs())
    }

    pub fn get_value(&self) -> GpioResult<Value> {
        self.ensure_exported()?;
        self.gateway.read(&self.value_path())?.parse()
    }

    /// Read-complement-write. Not atomic with respect to other writers.
    pub fn toggle(&mut self) -> GpioResult<Value> {
        let next = !self.get_value()?;
        self.set_value(next)?;
        Ok(next)
    }

    /// Drives the pin high for `duration`, blocking the calling thread, then
    /// low. If the low write fails the pin is left high and that error is
    /// returned.
    pub fn pulse(&mut self, duration: Duration) -> GpioResult<()> {
        self.set_value(Value::High)?;
        thread::sleep(duration);
        self.set_value(Value::Low)
    }

    /// Moves the export out of `self`, leaving behind an inert handle whose
    /// drop does not unexport.
    pub fn transfer(&mut self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            pin: self.pin,
            path: self.path.clone(),
            unexport_path: self.unexport_path.clone(),
            exported: std::mem::replace(&mut self.exported, false),
        }
    }

    /// Unexports the pin now. Failures are logged, never returned.
    pub fn release(mut self) {
        self.unexport();
    }

    fn unexport(&mut self) {
        if !self.exported {
            return;
        }
        self.exported = false;
        match self
            .gateway
            .write(&self.unexport_path, &self.pin.to_string())
        {
            Ok(()) => info!("Unexported GPIO{}", self.pin),
            Err(e) => warn!("Failed to unexport GPIO{}: {e}", self.pin),
        }
    }
}

impl<G: SysfsGateway + ?Sized> Drop for GpioPin<G> {
    fn drop(&mut self) {
        self.unexport();
    }
}

impl<G: SysfsGateway + ?Sized> fmt::Debug for GpioPin<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpioPin")
            .field("pin", &self.pin)
            .field("path", &self.path)
            .field("exported", &self.exported)
            .finish()
    }
}

/// Binds one configuration to one gateway and hands out pins and groups.
pub struct GpioController<G: SysfsGateway + ?Sized> {
    config: Arc<GpioConfig>,
    gateway: Arc<G>,
}

impl<G: SysfsGateway + ?Sized> Clone for GpioController<G> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<G: SysfsGateway + ?Sized> GpioController<G> {
    pub fn new(config: Arc<GpioConfig>, gateway: Arc<G>) -> Self {
        Self { config, gateway }
    }

    pub fn config(&self) -> &GpioConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub fn open(&self, pin: PinNumber, direction: Direction) -> GpioResult<GpioPin<G>> {
        GpioPin::new(self.gateway.clone(), &self.config, pin, direction)
    }

    pub fn claim(&self, pin: PinNumber, direction: Direction) -> (GpioPin<G>, GpioResult<()>) {
        GpioPin::claim(self.gateway.clone(), &self.config, pin, direction)
    }

    pub fn open_group<I>(&self, pins: I, direction: Direction) -> GpioResult<GpioPinGroup<G>>
    where
        I: IntoIterator,
        I::Item: Into<PinNumber>,
    {
        GpioPinGroup::new(self.gateway.clone(), &self.config, pins, direction)
    }
}
