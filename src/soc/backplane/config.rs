//! Attach-time configuration: which host bus carries the backplane and how
//! its window is laid out.
use std::fmt;

use crate::soc::host::HostAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusKind {
    /// The backplane is memory mapped into the host.
    Direct,
    /// A PCI-style BAR0 aperture steered through configuration registers.
    Windowed,
    /// SDIO/SPI: backplane addresses are used as is.
    Serial,
}

/// Register set steering the wrapper half of the BAR0 window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowGeneration {
    #[default]
    Gen1,
    Gen2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachConfig {
    bus: BusKind,
    enum_base: u32,
    bar0: Option<HostAddr>,
    slice: u8,
    generation: WindowGeneration,
    fast_window: bool,
}

impl AttachConfig {
    pub fn builder(bus: BusKind, enum_base: u32) -> AttachConfigBuilder {
        AttachConfigBuilder::new(bus, enum_base)
    }

    pub fn bus(&self) -> BusKind {
        self.bus
    }

    /// Physical base of chip-common, where the ROM pointer lives.
    pub fn enum_base(&self) -> u32 {
        self.enum_base
    }

    pub fn bar0(&self) -> Option<HostAddr> {
        self.bar0
    }

    pub fn slice(&self) -> u8 {
        self.slice
    }

    pub fn generation(&self) -> WindowGeneration {
        self.generation
    }

    /// Whether BAR0 exposes chip-common and the bus core at fixed offsets.
    pub fn fast_window(&self) -> bool {
        self.fast_window
    }
}

#[derive(Debug)]
pub struct AttachConfigBuilder {
    bus: BusKind,
    enum_base: u32,
    bar0: Option<HostAddr>,
    slice: u8,
    generation: WindowGeneration,
    fast_window: bool,
}

impl AttachConfigBuilder {
    pub fn new(bus: BusKind, enum_base: u32) -> Self {
        Self {
            bus,
            enum_base,
            bar0: None,
            slice: 0,
            generation: WindowGeneration::Gen1,
            fast_window: true,
        }
    }

    pub fn bar0(mut self, addr: HostAddr) -> Self {
        self.bar0 = Some(addr);
        self
    }

    pub fn slice(mut self, slice: u8) -> Self {
        self.slice = slice;
        self
    }

    pub fn generation(mut self, generation: WindowGeneration) -> Self {
        self.generation = generation;
        self
    }

    pub fn fast_window(mut self, fast: bool) -> Self {
        self.fast_window = fast;
        self
    }

    pub fn build(self) -> Result<AttachConfig, ConfigError> {
        if self.bus == BusKind::Windowed && self.bar0.is_none() {
            return Err(ConfigError::MissingWindow);
        }
        if self.slice != 0 && self.bus != BusKind::Windowed {
            return Err(ConfigError::SliceWithoutWindow { slice: self.slice });
        }
        if self.slice > 2 {
            return Err(ConfigError::SliceOutOfRange { slice: self.slice });
        }
        Ok(AttachConfig {
            bus: self.bus,
            enum_base: self.enum_base,
            bar0: self.bar0,
            slice: self.slice,
            generation: self.generation,
            fast_window: self.fast_window,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingWindow,
    SliceWithoutWindow { slice: u8 },
    SliceOutOfRange { slice: u8 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingWindow => write!(f, "windowed bus requires a BAR0 window address"),
            ConfigError::SliceWithoutWindow { slice } => {
                write!(f, "slice {slice} is only addressable through a windowed bus")
            }
            ConfigError::SliceOutOfRange { slice } => {
                write!(f, "no BAR0 window is defined for slice {slice}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
