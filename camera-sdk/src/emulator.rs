// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Software camera implementing [`Sdk`] and [`Device`].
//!
//! Each emulated camera is described by a [`DeviceProfile`] and produces a
//! scrolling test pattern in its current `PixelFormat` at its configured
//! `AcquisitionFrameRate`. Feature access follows the rules of real GenICam
//! devices: features are only accessible while the device is open,
//! `PixelFormat` and the binning features are locked while grabbing, numeric
//! writes outside the reported bounds are rejected, and `BalanceRatio` is
//! multiplexed by `BalanceRatioSelector`.
//!
//! An [`EmulatorControl`] handle exposes fault injection and raw state
//! inspection for tests.
//!
//! # Example
//!
//! ```
//! use camera_sdk::emulator::{DeviceProfile, EmulatedSdk};
//! use camera_sdk::{Device, Sdk};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sdk = EmulatedSdk::new([DeviceProfile::new("DEVICE123", "daA1280-54uc")]);
//! sdk.initialize()?;
//!
//! let info = sdk.enumerate_devices()?.remove(0);
//! let device = sdk.create_device(&info)?;
//! device.open()?;
//! device.start_grabbing()?;
//!
//! let result = device.retrieve_result(Duration::from_secs(1))?;
//! assert!(result.is_some_and(|r| r.grab_succeeded()));
//! # Ok(())
//! # }
//! ```

use crate::{
    feature::{Access, Bounds, Feature, FeatureKind},
    grab::{BufferPool, GrabResult},
    pattern,
    pixel::PixelType,
    runtime::RuntimeGuard,
    Device, DeviceInfo, Sdk, SdkError,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    error::Error,
    fs::File,
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

const POOL_DEPTH: usize = 4;

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Numeric feature configuration: bounds plus the power-on value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloatSetting {
    pub min: f64,
    pub max: f64,
    pub value: f64,
}

impl FloatSetting {
    pub const fn new(min: f64, max: f64, value: f64) -> Self {
        Self { min, max, value }
    }
}

/// Description of one emulated camera.
///
/// Profiles deserialize from JSON with every field optional, so a profile
/// file only needs to spell out what differs from the defaults:
///
/// ```json
/// [
///   { "serial": "40012345", "model": "a2A1920-51gcPRO", "width": 1920, "height": 1200 },
///   { "serial": "40067890", "model": "daA1280-54um", "pixel_formats": ["Mono8"],
///     "pixel_format": "Mono8", "missing": ["BalanceRatio", "BalanceRatioSelector"] }
/// ]
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    pub serial: String,
    pub model: String,
    pub vendor: String,
    /// Sensor width in pixels, before binning.
    pub width: u32,
    /// Sensor height in pixels, before binning.
    pub height: u32,
    /// Settable `PixelFormat` entries.
    pub pixel_formats: Vec<String>,
    /// Power-on `PixelFormat` entry.
    pub pixel_format: String,
    /// Exposure time in microseconds.
    pub exposure: FloatSetting,
    /// Gain in dB.
    pub gain: FloatSetting,
    /// Acquisition frame rate in Hz.
    pub frame_rate: FloatSetting,
    /// White balance ratio bounds; `value` is the power-on ratio of every
    /// channel.
    pub balance_ratio: FloatSetting,
    pub brightness: FloatSetting,
    /// Largest hardware binning factor. Values below 2 remove the binning
    /// features altogether.
    pub max_binning: i64,
    /// Features the device does not implement.
    pub missing: Vec<Feature>,
    /// Features that can be read but never written.
    pub read_only: Vec<Feature>,
    /// Features that can be written but never read.
    pub write_only: Vec<Feature>,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            serial: "0".to_string(),
            model: "Emulated Camera".to_string(),
            vendor: "EdgeFirst".to_string(),
            width: 640,
            height: 480,
            pixel_formats: ["Mono8", "RGB8", "BGR8", "YUV422_8", "YCbCr422_8"]
                .map(String::from)
                .to_vec(),
            pixel_format: "RGB8".to_string(),
            exposure: FloatSetting::new(20.0, 1_000_000.0, 5_000.0),
            gain: FloatSetting::new(0.0, 24.0, 0.0),
            frame_rate: FloatSetting::new(1.0, 120.0, 60.0),
            balance_ratio: FloatSetting::new(1.0, 15.984375, 1.0),
            brightness: FloatSetting::new(-1.0, 1.0, 0.0),
            max_binning: 4,
            missing: Vec::new(),
            read_only: Vec::new(),
            write_only: Vec::new(),
        }
    }
}

impl DeviceProfile {
    pub fn new(serial: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the power-on pixel format, adding it to the settable entries if
    /// needed.
    pub fn with_pixel_format(mut self, entry: &str) -> Self {
        if !self.pixel_formats.iter().any(|e| e == entry) {
            self.pixel_formats.push(entry.to_string());
        }
        self.pixel_format = entry.to_string();
        self
    }

    pub fn with_max_binning(mut self, max_binning: i64) -> Self {
        self.max_binning = max_binning;
        self
    }

    pub fn without(mut self, feature: Feature) -> Self {
        self.missing.push(feature);
        self
    }

    pub fn read_only(mut self, feature: Feature) -> Self {
        self.read_only.push(feature);
        self
    }

    /// Loads a JSON array of profiles.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a JSON array of
    /// profile objects.
    pub fn load(path: &Path) -> Result<Vec<DeviceProfile>, Box<dyn Error>> {
        let file = File::open(path)?;
        let profiles: Vec<DeviceProfile> = serde_json::from_reader(file)?;
        Ok(profiles)
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            serial: self.serial.clone(),
            model: self.model.clone(),
            vendor: self.vendor.clone(),
        }
    }

    fn nodes(&self) -> HashMap<Feature, Node> {
        let mut nodes = HashMap::new();
        let auto = ["Off", "Once", "Continuous"];

        nodes.insert(Feature::ExposureTime, Node::float(self.exposure));
        nodes.insert(Feature::ExposureAuto, Node::enumeration("Off", &auto));
        nodes.insert(
            Feature::ExposureMode,
            Node::enumeration("Timed", &["Timed", "TriggerWidth"]),
        );
        nodes.insert(
            Feature::ExposureTimeMode,
            Node::enumeration("Standard", &["Standard", "UltraShort"]),
        );
        nodes.insert(Feature::Gain, Node::float(self.gain));
        nodes.insert(Feature::GainAuto, Node::enumeration("Off", &auto));
        nodes.insert(Feature::GainSelector, Node::enumeration("All", &["All"]));
        nodes.insert(Feature::AcquisitionFrameRate, Node::float(self.frame_rate));
        nodes.insert(Feature::AcquisitionFrameRateEnable, Node::boolean(false));
        nodes.insert(Feature::BalanceRatio, Node::float(self.balance_ratio));
        nodes.insert(
            Feature::BalanceRatioSelector,
            Node::enumeration("Red", &["Red", "Green", "Blue"]),
        );
        nodes.insert(Feature::BalanceWhiteAuto, Node::enumeration("Off", &auto));
        let formats: Vec<&str> = self.pixel_formats.iter().map(String::as_str).collect();
        nodes.insert(
            Feature::PixelFormat,
            Node::enumeration(&self.pixel_format, &formats),
        );
        nodes.insert(Feature::BslBrightness, Node::float(self.brightness));
        for (feature, size) in [(Feature::Width, self.width), (Feature::Height, self.height)] {
            let mut node = Node::integer(i64::from(size), f64::from(size));
            node.writable = false;
            nodes.insert(feature, node);
        }

        if self.max_binning > 1 {
            let max = self.max_binning as f64;
            for feature in [Feature::BinningHorizontal, Feature::BinningVertical] {
                nodes.insert(feature, Node::integer(1, max));
            }
            for feature in [Feature::BinningHorizontalMode, Feature::BinningVerticalMode] {
                nodes.insert(feature, Node::enumeration("Sum", &["Sum", "Average"]));
            }
        }

        for feature in &self.missing {
            nodes.remove(feature);
        }
        for feature in &self.read_only {
            if let Some(node) = nodes.get_mut(feature) {
                node.writable = false;
            }
        }
        for feature in &self.write_only {
            if let Some(node) = nodes.get_mut(feature) {
                node.readable = false;
            }
        }
        nodes
    }
}

#[derive(Clone, Debug)]
enum Value {
    Float(f64),
    Integer(i64),
    Boolean(bool),
    Enumeration(String),
}

#[derive(Clone, Debug)]
struct Node {
    value: Value,
    min: f64,
    max: f64,
    entries: Vec<String>,
    readable: bool,
    writable: bool,
}

impl Node {
    fn new(value: Value, min: f64, max: f64, entries: Vec<String>) -> Self {
        Self {
            value,
            min,
            max,
            entries,
            readable: true,
            writable: true,
        }
    }

    fn float(setting: FloatSetting) -> Self {
        Self::new(
            Value::Float(setting.value),
            setting.min,
            setting.max,
            Vec::new(),
        )
    }

    fn integer(value: i64, max: f64) -> Self {
        Self::new(Value::Integer(value), 1.0, max, Vec::new())
    }

    fn boolean(value: bool) -> Self {
        Self::new(Value::Boolean(value), 0.0, 1.0, Vec::new())
    }

    fn enumeration(value: &str, entries: &[&str]) -> Self {
        Self::new(
            Value::Enumeration(value.to_string()),
            0.0,
            0.0,
            entries.iter().map(|e| e.to_string()).collect(),
        )
    }
}

#[derive(Default)]
struct Faults {
    stalled: bool,
    failed_grabs: usize,
    write_faults: Vec<(Feature, Option<String>)>,
    panic_on: Option<Feature>,
}

struct State {
    attached: bool,
    owner: Option<u64>,
    grabbing: bool,
    /// Bumped on every start/stop/close so blocked retrievals notice.
    epoch: u64,
    nodes: HashMap<Feature, Node>,
    balance: [f64; 3],
    block_id: u64,
    next_frame: Instant,
    faults: Faults,
    opens: usize,
    closes: usize,
}

impl State {
    fn check_open(&self, id: u64) -> Result<(), SdkError> {
        if self.owner == Some(id) {
            Ok(())
        } else {
            Err(SdkError::NotOpen)
        }
    }

    fn locked_while_grabbing(feature: Feature) -> bool {
        matches!(
            feature,
            Feature::PixelFormat
                | Feature::BinningHorizontal
                | Feature::BinningVertical
                | Feature::BinningHorizontalMode
                | Feature::BinningVerticalMode
        )
    }

    fn readable(&self, feature: Feature) -> bool {
        self.nodes.get(&feature).is_some_and(|n| n.readable)
    }

    fn writable(&self, feature: Feature) -> bool {
        self.nodes.get(&feature).is_some_and(|n| n.writable)
            && !(self.grabbing && Self::locked_while_grabbing(feature))
    }

    fn read_node(&self, id: u64, feature: Feature, kind: FeatureKind) -> Result<&Node, SdkError> {
        self.check_open(id)?;
        if !self.readable(feature) {
            return Err(SdkError::AccessDenied {
                feature,
                access: Access::Read,
            });
        }
        check_kind(feature, kind)?;
        self.nodes.get(&feature).ok_or(SdkError::AccessDenied {
            feature,
            access: Access::Read,
        })
    }

    fn write_check(&self, id: u64, feature: Feature, kind: FeatureKind) -> Result<(), SdkError> {
        self.check_open(id)?;
        if !self.writable(feature) {
            return Err(SdkError::AccessDenied {
                feature,
                access: Access::Write,
            });
        }
        check_kind(feature, kind)?;
        let selected = selector_of(feature).and_then(|s| self.enum_value(s));
        let faulted = self.faults.write_faults.iter().any(|(f, entry)| {
            *f == feature && entry.as_ref().map_or(true, |e| Some(e) == selected.as_ref())
        });
        if faulted {
            return Err(SdkError::Transport(format!(
                "emulated write failure on {feature}"
            )));
        }
        Ok(())
    }

    fn enum_value(&self, feature: Feature) -> Option<String> {
        match self.nodes.get(&feature).map(|n| &n.value) {
            Some(Value::Enumeration(entry)) => Some(entry.clone()),
            _ => None,
        }
    }

    fn int_value(&self, feature: Feature) -> Option<i64> {
        match self.nodes.get(&feature).map(|n| &n.value) {
            Some(Value::Integer(v)) => Some(*v),
            _ => None,
        }
    }

    fn balance_channel(&self) -> usize {
        match self.enum_value(Feature::BalanceRatioSelector).as_deref() {
            Some("Green") => 1,
            Some("Blue") => 2,
            _ => 0,
        }
    }

    fn frame_period(&self) -> Duration {
        let fps = match self.nodes.get(&Feature::AcquisitionFrameRate).map(|n| &n.value) {
            Some(Value::Float(fps)) => *fps,
            _ => 30.0,
        };
        Duration::from_secs_f64(1.0 / fps.max(0.1))
    }
}

fn check_kind(feature: Feature, kind: FeatureKind) -> Result<(), SdkError> {
    if feature.kind() == kind {
        return Ok(());
    }
    let expected = match kind {
        FeatureKind::Float => "float",
        FeatureKind::Integer => "integer",
        FeatureKind::Boolean => "boolean",
        FeatureKind::Enumeration => "enumeration",
    };
    Err(SdkError::TypeMismatch { feature, expected })
}

fn selector_of(feature: Feature) -> Option<Feature> {
    match feature {
        Feature::BalanceRatio => Some(Feature::BalanceRatioSelector),
        Feature::Gain => Some(Feature::GainSelector),
        _ => None,
    }
}

struct Shared {
    info: DeviceInfo,
    width: u32,
    height: u32,
    state: Mutex<State>,
    wake: Condvar,
    pool: BufferPool,
}

impl Shared {
    fn new(profile: &DeviceProfile) -> Self {
        let value = profile.balance_ratio.value;
        Self {
            info: profile.info(),
            width: profile.width,
            height: profile.height,
            state: Mutex::new(State {
                attached: true,
                owner: None,
                grabbing: false,
                epoch: 0,
                nodes: profile.nodes(),
                balance: [value; 3],
                block_id: 0,
                next_frame: Instant::now(),
                faults: Faults::default(),
                opens: 0,
                closes: 0,
            }),
            wake: Condvar::new(),
            pool: BufferPool::new(POOL_DEPTH),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The emulated SDK runtime.
pub struct EmulatedSdk {
    devices: Vec<Arc<Shared>>,
    runtime: Mutex<Option<RuntimeGuard>>,
    init_failure: Mutex<Option<String>>,
}

impl EmulatedSdk {
    pub fn new(profiles: impl IntoIterator<Item = DeviceProfile>) -> Self {
        let devices = profiles
            .into_iter()
            .map(|profile| Arc::new(Shared::new(&profile)))
            .collect();
        Self {
            devices,
            runtime: Mutex::new(None),
            init_failure: Mutex::new(None),
        }
    }

    /// Fault injection and inspection handle for the camera with `serial`.
    pub fn control(&self, serial: &str) -> Option<EmulatorControl> {
        self.find(serial).map(|shared| EmulatorControl { shared })
    }

    /// Makes the next [`Sdk::initialize`] calls fail with `reason`, or succeed
    /// again with `None`.
    pub fn fail_initialization(&self, reason: Option<String>) {
        *self
            .init_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = reason;
    }

    fn find(&self, serial: &str) -> Option<Arc<Shared>> {
        self.devices
            .iter()
            .find(|shared| shared.info.serial == serial)
            .cloned()
    }

    fn require_runtime(&self) -> Result<(), SdkError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(SdkError::NotInitialized)
        }
    }
}

impl Sdk for EmulatedSdk {
    fn initialize(&self) -> Result<(), SdkError> {
        let mut runtime = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        if runtime.is_some() {
            return Ok(());
        }
        let failure = self
            .init_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(reason) = failure {
            return Err(SdkError::Runtime(reason));
        }
        *runtime = Some(RuntimeGuard::acquire());
        info!(devices = self.devices.len(), "emulated SDK initialized");
        Ok(())
    }

    fn terminate(&self) {
        let guard = self
            .runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if guard.is_some() {
            info!("emulated SDK terminated");
        }
    }

    fn is_initialized(&self) -> bool {
        self.runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, SdkError> {
        self.require_runtime()?;
        Ok(self
            .devices
            .iter()
            .filter(|shared| shared.lock().attached)
            .map(|shared| shared.info.clone())
            .collect())
    }

    fn create_device(&self, info: &DeviceInfo) -> Result<Box<dyn Device>, SdkError> {
        self.require_runtime()?;
        match self.find(&info.serial) {
            Some(shared) if shared.lock().attached => Ok(Box::new(EmulatedDevice {
                id: NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed),
                shared,
            })),
            _ => Err(SdkError::DeviceNotFound(info.serial.clone())),
        }
    }
}

/// Device object handed out by [`EmulatedSdk::create_device`].
pub struct EmulatedDevice {
    id: u64,
    shared: Arc<Shared>,
}

impl EmulatedDevice {
    fn fault_point(&self, feature: Feature) {
        let fault = self.shared.lock().faults.panic_on == Some(feature);
        if fault {
            panic!("emulated driver fault while accessing {feature}");
        }
    }
}

impl Device for EmulatedDevice {
    fn info(&self) -> &DeviceInfo {
        &self.shared.info
    }

    fn open(&self) -> Result<(), SdkError> {
        let mut state = self.shared.lock();
        if !state.attached {
            return Err(SdkError::DeviceNotFound(self.shared.info.serial.clone()));
        }
        match state.owner {
            Some(owner) if owner == self.id => Ok(()),
            Some(_) => Err(SdkError::DeviceBusy(self.shared.info.serial.clone())),
            None => {
                state.owner = Some(self.id);
                state.opens += 1;
                debug!(serial = %self.shared.info.serial, "emulated device opened");
                Ok(())
            }
        }
    }

    fn close(&self) -> Result<(), SdkError> {
        let mut state = self.shared.lock();
        if state.owner == Some(self.id) {
            state.owner = None;
            state.grabbing = false;
            state.epoch += 1;
            state.closes += 1;
            self.shared.wake.notify_all();
            debug!(serial = %self.shared.info.serial, "emulated device closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.shared.lock().owner == Some(self.id)
    }

    fn start_grabbing(&self) -> Result<(), SdkError> {
        let mut state = self.shared.lock();
        state.check_open(self.id)?;
        if !state.grabbing {
            state.grabbing = true;
            state.epoch += 1;
            state.next_frame = Instant::now() + state.frame_period();
        }
        Ok(())
    }

    fn stop_grabbing(&self) -> Result<(), SdkError> {
        let mut state = self.shared.lock();
        if state.owner == Some(self.id) && state.grabbing {
            state.grabbing = false;
            state.epoch += 1;
            self.shared.wake.notify_all();
        }
        Ok(())
    }

    fn is_grabbing(&self) -> bool {
        let state = self.shared.lock();
        state.owner == Some(self.id) && state.grabbing
    }

    fn retrieve_result(&self, timeout: Duration) -> Result<Option<GrabResult>, SdkError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock();
        state.check_open(self.id)?;
        let epoch = state.epoch;

        loop {
            if state.owner != Some(self.id) || !state.grabbing || state.epoch != epoch {
                return Ok(None);
            }
            let now = Instant::now();
            if !state.faults.stalled && now >= state.next_frame {
                break;
            }
            if now >= deadline {
                return Ok(None);
            }
            let until = if state.faults.stalled {
                deadline
            } else {
                state.next_frame.min(deadline)
            };
            state = match self.shared.wake.wait_timeout(state, until - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }

        state.next_frame = Instant::now() + state.frame_period();
        state.block_id += 1;
        let block_id = state.block_id;

        let pixel_type = state
            .enum_value(Feature::PixelFormat)
            .and_then(|entry| PixelType::from_symbolic(&entry))
            .unwrap_or(PixelType::Mono8);

        if state.faults.failed_grabs > 0 {
            state.faults.failed_grabs -= 1;
            return Ok(Some(GrabResult::failed(
                block_id,
                pixel_type,
                "emulated frame transfer error",
            )));
        }

        let bin_h = state.int_value(Feature::BinningHorizontal).unwrap_or(1).max(1) as u32;
        let bin_v = state.int_value(Feature::BinningVertical).unwrap_or(1).max(1) as u32;
        drop(state);

        let mut width = self.shared.width / bin_h;
        let height = self.shared.height / bin_v;
        if matches!(pixel_type, PixelType::Yuv422Yuyv | PixelType::Yuv422Uyvy) {
            width &= !1;
        }

        let mut buffer = self.shared.pool.acquire(pixel_type.buffer_len(width, height));
        pattern::fill(&mut buffer, width, height, pixel_type, block_id);
        Ok(Some(GrabResult::succeeded(
            block_id, width, height, pixel_type, buffer,
        )))
    }

    fn is_readable(&self, feature: Feature) -> bool {
        let state = self.shared.lock();
        state.owner == Some(self.id) && state.readable(feature)
    }

    fn is_writable(&self, feature: Feature) -> bool {
        let state = self.shared.lock();
        state.owner == Some(self.id) && state.writable(feature)
    }

    fn float(&self, feature: Feature) -> Result<f64, SdkError> {
        self.fault_point(feature);
        let state = self.shared.lock();
        let node = state.read_node(self.id, feature, FeatureKind::Float)?;
        if feature == Feature::BalanceRatio {
            return Ok(state.balance[state.balance_channel()]);
        }
        match node.value {
            Value::Float(v) => Ok(v),
            _ => Err(SdkError::TypeMismatch {
                feature,
                expected: "float",
            }),
        }
    }

    fn set_float(&self, feature: Feature, value: f64) -> Result<(), SdkError> {
        self.fault_point(feature);
        let mut state = self.shared.lock();
        state.write_check(self.id, feature, FeatureKind::Float)?;
        let (min, max) = match state.nodes.get(&feature) {
            Some(node) => (node.min, node.max),
            None => return Err(SdkError::NotOpen),
        };
        if !(min..=max).contains(&value) {
            return Err(SdkError::OutOfRange {
                feature,
                value,
                min,
                max,
            });
        }
        if feature == Feature::BalanceRatio {
            let channel = state.balance_channel();
            state.balance[channel] = value;
        } else if let Some(node) = state.nodes.get_mut(&feature) {
            node.value = Value::Float(value);
        }
        Ok(())
    }

    fn float_bounds(&self, feature: Feature) -> Result<Bounds<f64>, SdkError> {
        self.fault_point(feature);
        let state = self.shared.lock();
        let node = state.read_node(self.id, feature, FeatureKind::Float)?;
        Ok(Bounds::new(node.min, node.max))
    }

    fn integer(&self, feature: Feature) -> Result<i64, SdkError> {
        self.fault_point(feature);
        let state = self.shared.lock();
        match state.read_node(self.id, feature, FeatureKind::Integer)?.value {
            Value::Integer(v) => Ok(v),
            _ => Err(SdkError::TypeMismatch {
                feature,
                expected: "integer",
            }),
        }
    }

    fn set_integer(&self, feature: Feature, value: i64) -> Result<(), SdkError> {
        self.fault_point(feature);
        let mut state = self.shared.lock();
        state.write_check(self.id, feature, FeatureKind::Integer)?;
        if let Some(node) = state.nodes.get_mut(&feature) {
            if !(node.min..=node.max).contains(&(value as f64)) {
                return Err(SdkError::OutOfRange {
                    feature,
                    value: value as f64,
                    min: node.min,
                    max: node.max,
                });
            }
            node.value = Value::Integer(value);
        }
        let (size, sensor) = match feature {
            Feature::BinningHorizontal => (Feature::Width, self.shared.width),
            Feature::BinningVertical => (Feature::Height, self.shared.height),
            _ => return Ok(()),
        };
        if let Some(node) = state.nodes.get_mut(&size) {
            node.value = Value::Integer(i64::from(sensor) / value.max(1));
        }
        Ok(())
    }

    fn integer_bounds(&self, feature: Feature) -> Result<Bounds<i64>, SdkError> {
        self.fault_point(feature);
        let state = self.shared.lock();
        let node = state.read_node(self.id, feature, FeatureKind::Integer)?;
        Ok(Bounds::new(node.min as i64, node.max as i64))
    }

    fn boolean(&self, feature: Feature) -> Result<bool, SdkError> {
        self.fault_point(feature);
        let state = self.shared.lock();
        match state.read_node(self.id, feature, FeatureKind::Boolean)?.value {
            Value::Boolean(v) => Ok(v),
            _ => Err(SdkError::TypeMismatch {
                feature,
                expected: "boolean",
            }),
        }
    }

    fn set_boolean(&self, feature: Feature, value: bool) -> Result<(), SdkError> {
        self.fault_point(feature);
        let mut state = self.shared.lock();
        state.write_check(self.id, feature, FeatureKind::Boolean)?;
        if let Some(node) = state.nodes.get_mut(&feature) {
            node.value = Value::Boolean(value);
        }
        Ok(())
    }

    fn enumeration(&self, feature: Feature) -> Result<String, SdkError> {
        self.fault_point(feature);
        let state = self.shared.lock();
        match &state
            .read_node(self.id, feature, FeatureKind::Enumeration)?
            .value
        {
            Value::Enumeration(entry) => Ok(entry.clone()),
            _ => Err(SdkError::TypeMismatch {
                feature,
                expected: "enumeration",
            }),
        }
    }

    fn set_enumeration(&self, feature: Feature, entry: &str) -> Result<(), SdkError> {
        self.fault_point(feature);
        let mut state = self.shared.lock();
        state.write_check(self.id, feature, FeatureKind::Enumeration)?;
        if let Some(node) = state.nodes.get_mut(&feature) {
            if !node.entries.iter().any(|e| e == entry) {
                return Err(SdkError::InvalidEntry {
                    feature,
                    entry: entry.to_string(),
                });
            }
            node.value = Value::Enumeration(entry.to_string());
        }
        Ok(())
    }

    fn settable_entries(&self, feature: Feature) -> Result<Vec<String>, SdkError> {
        self.fault_point(feature);
        let state = self.shared.lock();
        Ok(state
            .read_node(self.id, feature, FeatureKind::Enumeration)?
            .entries
            .clone())
    }
}

impl Drop for EmulatedDevice {
    fn drop(&mut self) {
        if self.is_open() {
            warn!(serial = %self.shared.info.serial, "emulated device dropped while open");
            let _ = self.close();
        }
    }
}

/// Fault injection and raw inspection of one emulated camera.
///
/// Inspection methods bypass access rules, so tests can observe what the
/// device actually holds.
#[derive(Clone)]
pub struct EmulatorControl {
    shared: Arc<Shared>,
}

impl EmulatorControl {
    /// Overrides the access flags of `feature`.
    pub fn set_access(&self, feature: Feature, readable: bool, writable: bool) {
        if let Some(node) = self.shared.lock().nodes.get_mut(&feature) {
            node.readable = readable;
            node.writable = writable;
        }
    }

    /// Every write to `feature` fails with a transport error.
    pub fn fail_writes(&self, feature: Feature) {
        self.shared.lock().faults.write_faults.push((feature, None));
    }

    /// Writes to `feature` fail while its selector is set to `entry`.
    pub fn fail_writes_when(&self, feature: Feature, entry: &str) {
        self.shared
            .lock()
            .faults
            .write_faults
            .push((feature, Some(entry.to_string())));
    }

    /// A stalled camera keeps grabbing but never delivers a frame.
    pub fn set_stalled(&self, stalled: bool) {
        self.shared.lock().faults.stalled = stalled;
        self.shared.wake.notify_all();
    }

    /// The next `count` grabs complete with a failed status.
    pub fn fail_next_grabs(&self, count: usize) {
        self.shared.lock().faults.failed_grabs = count;
    }

    /// Any access to `feature` panics inside the driver.
    pub fn panic_on(&self, feature: Option<Feature>) {
        self.shared.lock().faults.panic_on = feature;
    }

    pub fn clear_faults(&self) {
        self.shared.lock().faults = Faults::default();
        self.shared.wake.notify_all();
    }

    /// Detached cameras disappear from enumeration and cannot be opened.
    pub fn set_attached(&self, attached: bool) {
        self.shared.lock().attached = attached;
    }

    pub fn is_open(&self) -> bool {
        self.shared.lock().owner.is_some()
    }

    pub fn is_grabbing(&self) -> bool {
        self.shared.lock().grabbing
    }

    pub fn open_count(&self) -> usize {
        self.shared.lock().opens
    }

    pub fn close_count(&self) -> usize {
        self.shared.lock().closes
    }

    /// Block id of the most recent grab.
    pub fn frames_delivered(&self) -> u64 {
        self.shared.lock().block_id
    }

    pub fn float(&self, feature: Feature) -> Option<f64> {
        match self.shared.lock().nodes.get(&feature).map(|n| &n.value) {
            Some(Value::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn integer(&self, feature: Feature) -> Option<i64> {
        self.shared.lock().int_value(feature)
    }

    pub fn boolean(&self, feature: Feature) -> Option<bool> {
        match self.shared.lock().nodes.get(&feature).map(|n| &n.value) {
            Some(Value::Boolean(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn enumeration(&self, feature: Feature) -> Option<String> {
        self.shared.lock().enum_value(feature)
    }

    /// Red, green and blue balance ratios.
    pub fn balance(&self) -> [f64; 3] {
        self.shared.lock().balance
    }

    pub fn idle_buffers(&self) -> usize {
        self.shared.pool.idle()
    }
}
