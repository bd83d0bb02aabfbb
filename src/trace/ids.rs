//! Provider and event identities used in trace counters.

use std::fmt;
use std::str::FromStr;

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::errors::{HarnessError, Result};

/// Event id within a provider. Small, non-negative.
pub type EventId = u16;

/// 128-bit trace provider identity, written in canonical
/// `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProviderId(u128);

impl ProviderId {
    /// Build from a raw 128-bit value.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    /// Raw 128-bit value.
    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0
    }

    /// Parse the canonical hyphenated form. Case-insensitive on hex digits.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || HarnessError::InvalidProviderId {
            value: text.to_string(),
        };

        let bytes = text.as_bytes();
        if bytes.len() != 36
            || bytes[8] != b'-'
            || bytes[13] != b'-'
            || bytes[18] != b'-'
            || bytes[23] != b'-'
        {
            return Err(invalid());
        }

        let mut value: u128 = 0;
        for (index, byte) in bytes.iter().enumerate() {
            if matches!(index, 8 | 13 | 18 | 23) {
                continue;
            }
            let digit = match byte {
                b'0'..=b'9' => byte - b'0',
                b'a'..=b'f' => byte - b'a' + 10,
                b'A'..=b'F' => byte - b'A' + 10,
                _ => return Err(invalid()),
            };
            value = (value << 4) | u128::from(digit);
        }
        Ok(Self(value))
    }
}

impl FromStr for ProviderId {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xffff_ffff_ffff
        )
    }
}

impl Serialize for ProviderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProviderId {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}

// Kernel providers and their event ids.

/// Kernel PERF_INFO provider.
pub const PERF_INFO: ProviderId = ProviderId::from_u128(0xce1dbfb4_137e_4da6_87b0_3f59aa102cbc);
/// Sampled-profile event under [`PERF_INFO`].
pub const PERF_INFO_SAMPLED_PROFILE: EventId = 46;

/// Kernel thread provider.
pub const THREAD: ProviderId = ProviderId::from_u128(0x3d6fa8d1_fe05_11d0_9dda_00c04fd7ba7c);
/// Context-switch event under [`THREAD`].
pub const THREAD_CSWITCH: EventId = 36;
/// Ready-thread event under [`THREAD`].
pub const THREAD_READY_THREAD: EventId = 50;

/// Kernel stack-walk provider.
pub const STACK_WALK: ProviderId = ProviderId::from_u128(0xdef2fe46_7bd6_4b80_bd94_f57fe20d0ce3);
/// Stack-walk event.
pub const STACK_WALK_EVENT: EventId = 32;
/// Stack-walk rundown definition event.
pub const STACK_WALK_RUNDOWN_DEFINITION: EventId = 36;
/// Kernel-mode stack key reference event.
pub const STACK_WALK_REFERENCE_KERNEL: EventId = 37;
/// User-mode stack key reference event.
pub const STACK_WALK_REFERENCE_USER: EventId = 38;

// User providers emitted by the profile test helper, two manifest-based and
// two TraceLogging-based.

/// Manifest-based test provider A.
pub const MB_A: ProviderId = ProviderId::from_u128(0x382b5c97_a095_4f52_bbb6_f3b011b33563);
/// Manifest-based test provider B.
pub const MB_B: ProviderId = ProviderId::from_u128(0x465646f1_41d0_4bd2_8173_dbf7ff6cc9e2);
/// TraceLogging test provider A.
pub const TL_A: ProviderId = ProviderId::from_u128(0x11b83188_f8a1_5301_5690_e964fd71beba);
/// TraceLogging test provider B.
pub const TL_B: ProviderId = ProviderId::from_u128(0x7ae7cc76_bdaf_5e8a_1b73_d85398dbadd3);
