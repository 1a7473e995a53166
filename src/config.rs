// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use serde::{Deserialize, Serialize};
use std::{error::Error, fs::File, path::Path, time::Duration};

/// Per-attempt retrieve timeout used when none is configured.
pub const DEFAULT_RETRIEVE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Overall await deadline used when none is configured.
pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(15000);

/// Timing of a blocking frame await.
///
/// The await loop issues retrieves of at most `retrieve_timeout` each while the
/// camera keeps grabbing, and gives up once `deadline` has elapsed since the
/// call started. Retries are always bounded by the deadline; a stalled camera
/// makes the await fail with a timeout rather than hang.
///
/// Durations serialize as integer milliseconds:
///
/// ```json
/// { "retrieve_timeout": 5000, "deadline": 15000 }
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionPolicy {
    #[serde(with = "millis")]
    pub retrieve_timeout: Duration,
    #[serde(with = "millis")]
    pub deadline: Duration,
}

impl Default for AcquisitionPolicy {
    fn default() -> Self {
        Self {
            retrieve_timeout: DEFAULT_RETRIEVE_TIMEOUT,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

impl AcquisitionPolicy {
    pub fn new(retrieve_timeout: Duration, deadline: Duration) -> Self {
        Self {
            retrieve_timeout,
            deadline,
        }
    }

    /// Single attempt: the await ends with the first retrieve.
    pub fn single_attempt(retrieve_timeout: Duration) -> Self {
        Self::new(retrieve_timeout, retrieve_timeout)
    }
}

/// Bridge-wide settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub acquisition: AcquisitionPolicy,
}

impl BridgeConfig {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object
    /// matching [`BridgeConfig`].
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u128::from(u64::MAX)) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
