use std::path::{Component, Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::config::DEFAULT_SYSFS_GPIO_PATH;
use crate::error::{GpioError, GpioResult};
use crate::gpio::{SysfsGateway, Value};

/// In-memory stand-in for the sysfs GPIO tree.
///
/// Models the parts of the kernel contract the pin handles rely on: exporting
/// creates `gpio<N>` (direction `in`, value `0`), exporting twice is busy,
/// values can only be written while the direction is `out`. Every attempted
/// write is recorded, and failures can be injected per path.
pub struct MockGateway {
    base: PathBuf,
    state: Mutex<MockState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Default)]
struct MockState {
    pins: FxHashMap<u8, MockPinState>, // keyed by line
    writes: Vec<WriteRecord>,
    write_faults: FxHashMap<PathBuf, Fault>,
    read_faults: FxHashMap<PathBuf, Fault>,
}

#[derive(Clone)]
struct MockPinState {
    direction: String,
    value: String,
}

impl Default for MockPinState {
    fn default() -> Self {
        Self {
            direction: "in".into(),
            value: "0".into(),
        }
    }
}

struct Fault {
    error: GpioError,
    skip: usize, // matching calls that still go through first
    remaining: Option<usize>, // None = until cleared
}

#[derive(Clone, Copy)]
enum Target {
    Export,
    Unexport,
    Direction(u8),
    Value(u8),
    Unknown,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new(DEFAULT_SYSFS_GPIO_PATH)
    }
}

impl MockGateway {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base: base.into(),
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn export_path(&self) -> PathBuf {
        self.base.join("export")
    }

    pub fn unexport_path(&self) -> PathBuf {
        self.base.join("unexport")
    }

    pub fn direction_path(&self, line: impl Into<u8>) -> PathBuf {
        self.base.join(format!("gpio{}", line.into())).join("direction")
    }

    pub fn value_path(&self, line: impl Into<u8>) -> PathBuf {
        self.base.join(format!("gpio{}", line.into())).join("value")
    }

    /// Marks a line as exported without recording a write, as if another
    /// process had claimed it.
    pub fn export_externally(&self, line: impl Into<u8>) {
        self.state
            .lock()
            .pins
            .insert(line.into(), MockPinState::default());
    }

    pub fn is_exported(&self, line: impl Into<u8>) -> bool {
        self.state.lock().pins.contains_key(&line.into())
    }

    pub fn exported(&self) -> Vec<u8> {
        let mut lines: Vec<u8> = self.state.lock().pins.keys().copied().collect();
        lines.sort_unstable();
        lines
    }

    /// Drives the level seen on an exported line, regardless of direction.
    /// Returns `false` if the line is not exported.
    pub fn set_input(&self, line: impl Into<u8>, value: Value) -> bool {
        self.set_raw_value(line, value.as_sysfs())
    }

    /// Overwrites the `value` file content verbatim.
    pub fn set_raw_value(&self, line: impl Into<u8>, content: &str) -> bool {
        match self.state.lock().pins.get_mut(&line.into()) {
            Some(pin) => {
                pin.value = content.to_string();
                true
            }
            None => false,
        }
    }

    /// Overwrites the `direction` file content verbatim.
    pub fn set_raw_direction(&self, line: impl Into<u8>, content: &str) -> bool {
        match self.state.lock().pins.get_mut(&line.into()) {
            Some(pin) => {
                pin.direction = content.to_string();
                true
            }
            None => false,
        }
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.state.lock().writes.clone()
    }

    pub fn writes_to(&self, path: &Path) -> Vec<String> {
        self.state
            .lock()
            .writes
            .iter()
            .filter(|w| w.path == path)
            .map(|w| w.content.clone())
            .collect()
    }

    pub fn write_count(&self, path: &Path) -> usize {
        self.state
            .lock()
            .writes
            .iter()
            .filter(|w| w.path == path)
            .count()
    }

    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }

    /// Every write to `path` fails with `error` until [`clear_faults`](Self::clear_faults).
    pub fn fail_writes(&self, path: impl Into<PathBuf>, error: GpioError) {
        self.state.lock().write_faults.insert(
            path.into(),
            Fault {
                error,
                skip: 0,
                remaining: None,
            },
        );
    }

    /// The next `times` writes to `path` fail with `error`.
    pub fn fail_next_writes(&self, path: impl Into<PathBuf>, error: GpioError, times: usize) {
        if times == 0 {
            return;
        }
        self.state.lock().write_faults.insert(
            path.into(),
            Fault {
                error,
                skip: 0,
                remaining: Some(times),
            },
        );
    }

    /// Only the `nth` (1-based) upcoming write to `path` fails with `error`.
    pub fn fail_nth_write(&self, path: impl Into<PathBuf>, nth: usize, error: GpioError) {
        if nth == 0 {
            return;
        }
        self.state.lock().write_faults.insert(
            path.into(),
            Fault {
                error,
                skip: nth - 1,
                remaining: Some(1),
            },
        );
    }

    pub fn fail_reads(&self, path: impl Into<PathBuf>, error: GpioError) {
        self.state.lock().read_faults.insert(
            path.into(),
            Fault {
                error,
                skip: 0,
                remaining: None,
            },
        );
    }

    pub fn clear_faults(&self) {
        let mut state = self.state.lock();
        state.write_faults.clear();
        state.read_faults.clear();
    }

    fn target(&self, path: &Path) -> Target {
        let Ok(rel) = path.strip_prefix(&self.base) else {
            return Target::Unknown;
        };
        let parts: Vec<&str> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();

        match parts.as_slice() {
            ["export"] => Target::Export,
            ["unexport"] => Target::Unexport,
            [dir, file] => {
                let Some(line) = dir
                    .strip_prefix("gpio")
                    .and_then(|n| n.parse::<u8>().ok())
                else {
                    return Target::Unknown;
                };
                match *file {
                    "direction" => Target::Direction(line),
                    "value" => Target::Value(line),
                    _ => Target::Unknown,
                }
            }
            _ => Target::Unknown,
        }
    }
}

fn take_fault(faults: &mut FxHashMap<PathBuf, Fault>, path: &Path) -> Option<GpioError> {
    let fault = faults.get_mut(path)?;
    if fault.skip > 0 {
        fault.skip -= 1;
        return None;
    }
    let error = fault.error;
    let exhausted = match &mut fault.remaining {
        Some(n) => {
            *n -= 1;
            *n == 0
        }
        None => false,
    };
    if exhausted {
        faults.remove(path);
    }
    Some(error)
}

fn parse_line(content: &str) -> GpioResult<u8> {
    content.trim().parse().map_err(|_| GpioError::WriteFailed)
}

impl SysfsGateway for MockGateway {
    fn write(&self, path: &Path, content: &str) -> GpioResult<()> {
        let target = self.target(path);
        let mut state = self.state.lock();

        state.writes.push(WriteRecord {
            path: path.to_path_buf(),
            content: content.to_string(),
        });
        if let Some(error) = take_fault(&mut state.write_faults, path) {
            return Err(error);
        }

        match target {
            Target::Export => {
                let line = parse_line(content)?;
                if state.pins.contains_key(&line) {
                    return Err(GpioError::DeviceBusy);
                }
                state.pins.insert(line, MockPinState::default());
                Ok(())
            }
            Target::Unexport => {
                let line = parse_line(content)?;
                state
                    .pins
                    .remove(&line)
                    .map(|_| ())
                    .ok_or(GpioError::WriteFailed)
            }
            Target::Direction(line) => {
                let pin = state.pins.get_mut(&line).ok_or(GpioError::WriteFailed)?;
                let (direction, value) = match content {
                    "in" => ("in", None),
                    "out" | "low" => ("out", Some("0")),
                    "high" => ("out", Some("1")),
                    _ => return Err(GpioError::WriteFailed),
                };
                pin.direction = direction.to_string();
                if let Some(value) = value {
                    pin.value = value.to_string();
                }
                Ok(())
            }
            Target::Value(line) => {
                let pin = state.pins.get_mut(&line).ok_or(GpioError::WriteFailed)?;
                if pin.direction != "out" {
                    return Err(GpioError::WriteFailed);
                }
                let value: Value = content.parse().map_err(|_| GpioError::WriteFailed)?;
                pin.value = value.as_sysfs().to_string();
                Ok(())
            }
            Target::Unknown => Err(GpioError::WriteFailed),
        }
    }

    fn read(&self, path: &Path) -> GpioResult<String> {
        let target = self.target(path);
        let mut state = self.state.lock();

        if let Some(error) = take_fault(&mut state.read_faults, path) {
            return Err(error);
        }

        let pin = match target {
            Target::Direction(line) | Target::Value(line) => {
                state.pins.get(&line).ok_or(GpioError::ReadFailed)?
            }
            _ => return Err(GpioError::ReadFailed),
        };

        Ok(match target {
            Target::Direction(_) => pin.direction.clone(),
            _ => pin.value.clone(),
        })
    }
}
