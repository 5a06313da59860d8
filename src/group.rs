use std::fmt;
use std::sync::Arc;

use log::warn;

use crate::config::GpioConfig;
use crate::error::GpioResult;
use crate::gpio::{Direction, GpioPin, PinNumber, SysfsGateway, Value};

/// A fixed, ordered set of exported pins driven together.
///
/// Bulk operations visit members in order and stop at the first error; pins
/// already changed by that call are left as they are.
pub struct GpioPinGroup<G: SysfsGateway + ?Sized> {
    pins: Vec<GpioPin<G>>,
}

impl<G: SysfsGateway + ?Sized> GpioPinGroup<G> {
    /// Exports every pin in order. The group is all-or-nothing: on the first
    /// failure the pins exported so far are unexported again and the error is
    /// returned; later pins are never touched.
    pub fn new<I>(
        gateway: Arc<G>,
        config: &GpioConfig,
        pins: I,
        direction: Direction,
    ) -> GpioResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<PinNumber>,
    {
        let pins = pins.into_iter();
        let mut members = Vec::with_capacity(pins.size_hint().0);
        for pin in pins {
            let pin = pin.into();
            match GpioPin::new(gateway.clone(), config, pin, direction) {
                Ok(handle) => members.push(handle),
                Err(e) => {
                    if !members.is_empty() {
                        warn!(
                            "GPIO{pin} failed ({e}), releasing {} pin(s) already exported",
                            members.len()
                        );
                    }
                    return Err(e);
                }
            }
        }
        Ok(Self { pins: members })
    }

    pub fn set_all_direction(&mut self, direction: Direction) -> GpioResult<()> {
        self.pins
            .iter_mut()
            .try_for_each(|pin| pin.set_direction(direction))
    }

    pub fn set_all_value(&mut self, value: Value) -> GpioResult<()> {
        self.pins.iter_mut().try_for_each(|pin| pin.set_value(value))
    }

    pub fn get_all_values(&self) -> GpioResult<Vec<Value>> {
        self.pins.iter().map(GpioPin::get_value).collect()
    }

    pub fn toggle_all(&mut self) -> GpioResult<Vec<Value>> {
        self.pins.iter_mut().map(GpioPin::toggle).collect()
    }

    pub fn get(&self, index: usize) -> Option<&GpioPin<G>> {
        self.pins.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut GpioPin<G>> {
        self.pins.get_mut(index)
    }

    pub fn size(&self) -> usize {
        self.pins.len()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GpioPin<G>> {
        self.pins.iter()
    }

    pub fn pin_numbers(&self) -> Vec<PinNumber> {
        self.pins.iter().map(GpioPin::pin_number).collect()
    }
}

impl<G: SysfsGateway + ?Sized> fmt::Debug for GpioPinGroup<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.pins.iter()).finish()
    }
}
