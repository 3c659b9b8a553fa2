//! Decoding of the single byte returned by the `STATUS?` query.
//!
//! Bit layout of the status byte:
//!
//! | Bit(s) | Meaning                                  |
//! |--------|------------------------------------------|
//! | 0      | Channel 1 mode (`0` = CC, `1` = CV)      |
//! | 1      | Channel 2 mode (`0` = CC, `1` = CV)      |
//! | 2-3    | Tracking mode (`00`, `01`, `10`)         |
//! | 4-5    | Unused                                   |
//! | 6      | Channel 1 output (`0` = off, `1` = on)   |
//! | 7      | Channel 2 output (`0` = off, `1` = on)   |
//!
//! Every field is looked up in its own table of `(pattern, variant)` pairs, so fields never
//! influence each other and any byte decodes to some [`StatusReport`].

use core::fmt;

use strum_macros::{Display, EnumIter};

/// Relationship between the two output channels.
#[derive(Debug, Display, EnumIter, PartialEq, Eq, Clone, Copy)]
pub enum TrackingMode {
    #[strum(to_string = "independent")]
    Independent,
    #[strum(to_string = "in series")]
    Series,
    #[strum(to_string = "in parallel")]
    Parallel,
    /// Bits 2-3 both set. The device documents no meaning for this combination.
    #[strum(to_string = "unknown")]
    Unknown,
}

/// Whether a channel's output is enabled.
#[derive(Debug, Display, EnumIter, PartialEq, Eq, Clone, Copy)]
pub enum OutputState {
    #[strum(to_string = "ON")]
    On,
    #[strum(to_string = "OFF")]
    Off,
    #[strum(to_string = "unknown")]
    Unknown,
}

/// Regulation mode a channel is currently operating in.
#[derive(Debug, Display, EnumIter, PartialEq, Eq, Clone, Copy)]
pub enum ChannelMode {
    #[strum(to_string = "Constant Voltage")]
    ConstantVoltage,
    #[strum(to_string = "Constant Current")]
    ConstantCurrent,
    #[strum(to_string = "unknown")]
    Unknown,
}

/// One field of the status byte: the bits it occupies and what each bit pattern means.
struct Field<T: 'static> {
    mask: u8,
    patterns: &'static [(u8, T)],
    fallback: T,
}

impl<T: Copy> Field<T> {
    fn decode(&self, byte: u8) -> T {
        let bits = byte & self.mask;
        self.patterns
            .iter()
            .find(|(pattern, _)| *pattern == bits)
            .map(|(_, variant)| *variant)
            .unwrap_or(self.fallback)
    }
}

const CH1_MODE: Field<ChannelMode> = Field {
    mask: 0b0000_0001,
    patterns: &[
        (0b0000_0000, ChannelMode::ConstantCurrent),
        (0b0000_0001, ChannelMode::ConstantVoltage),
    ],
    fallback: ChannelMode::Unknown,
};

const CH2_MODE: Field<ChannelMode> = Field {
    mask: 0b0000_0010,
    patterns: &[
        (0b0000_0000, ChannelMode::ConstantCurrent),
        (0b0000_0010, ChannelMode::ConstantVoltage),
    ],
    fallback: ChannelMode::Unknown,
};

const TRACKING: Field<TrackingMode> = Field {
    mask: 0b0000_1100,
    patterns: &[
        (0b0000_0000, TrackingMode::Independent),
        (0b0000_0100, TrackingMode::Series),
        (0b0000_1000, TrackingMode::Parallel),
    ],
    fallback: TrackingMode::Unknown,
};

const CH1_OUTPUT: Field<OutputState> = Field {
    mask: 0b0100_0000,
    patterns: &[
        (0b0000_0000, OutputState::Off),
        (0b0100_0000, OutputState::On),
    ],
    fallback: OutputState::Unknown,
};

const CH2_OUTPUT: Field<OutputState> = Field {
    mask: 0b1000_0000,
    patterns: &[
        (0b0000_0000, OutputState::Off),
        (0b1000_0000, OutputState::On),
    ],
    fallback: OutputState::Unknown,
};

/// State of a single output channel.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ChannelStatus {
    pub output: OutputState,
    pub mode: ChannelMode,
}

/// Decoded view of a status byte.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct StatusReport {
    pub tracking: TrackingMode,
    pub channel_1: ChannelStatus,
    pub channel_2: ChannelStatus,
}

impl StatusReport {
    /// Decode the first byte of a raw `STATUS?` reply.
    ///
    /// Returns `None` for an empty reply.
    pub fn from_reply(reply: &[u8]) -> Option<Self> {
        reply.first().map(|&byte| decode(byte))
    }
}

impl From<u8> for StatusReport {
    fn from(value: u8) -> Self {
        decode(value)
    }
}

/// Decode a status byte. Total: reserved bits are ignored and unmapped patterns become `Unknown`.
pub fn decode(byte: u8) -> StatusReport {
    StatusReport {
        tracking: TRACKING.decode(byte),
        channel_1: ChannelStatus {
            output: CH1_OUTPUT.decode(byte),
            mode: CH1_MODE.decode(byte),
        },
        channel_2: ChannelStatus {
            output: CH2_OUTPUT.decode(byte),
            mode: CH2_MODE.decode(byte),
        },
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tracking mode: {}", self.tracking)?;
        writeln!(f, "Channel 1: Output: {}", self.channel_1.output)?;
        writeln!(f, "Channel 1: Mode: {}", self.channel_1.mode)?;
        writeln!(f, "Channel 2: Output: {}", self.channel_2.output)?;
        write!(f, "Channel 2: Mode: {}", self.channel_2.mode)
    }
}
