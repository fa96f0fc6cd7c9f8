//! DeviceBus owns the simulated backplane's physical address map: it registers
//! devices at fixed base addresses, rejects overlapping spans, and resolves a
//! physical address to the owning device plus the offset inside it. All word
//! accesses issued by the simulated host end up here.
use std::{collections::BTreeMap, sync::Arc};

use crate::soc::device::Device;

use super::{
    error::{BusError, BusResult},
    range::BusRange,
};

pub type DeviceRef = Arc<dyn Device>;

#[derive(Default)]
pub struct DeviceBus {
    devices: Vec<DeviceRef>,
    // Key: start address -> range covering the device span
    map: BTreeMap<u64, BusRange>,
}

impl DeviceBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_device(&mut self, device: DeviceRef, address: u64) -> BusResult<()> {
        let span = device.span();
        if span.end <= span.start {
            return Err(BusError::EmptySpan {
                device: device.name().to_string(),
            });
        }
        let bus_end = address + (span.end - span.start);
        if let Some(existing) = self.first_overlap(address, bus_end) {
            let details = format!(
                "conflicts with device '{}'",
                self.devices[existing.device_id].name()
            );
            return Err(BusError::Overlap { address, details });
        }
        self.devices.push(device);
        let range = BusRange {
            bus_start: address,
            bus_end,
            device_id: self.devices.len() - 1,
        };
        self.map.insert(address, range);
        Ok(())
    }

    pub fn unmap(&mut self, address: u64) -> BusResult<()> {
        let key = self
            .range_for_address(address)
            .map(|range| range.bus_start)
            .ok_or(BusError::NotMapped { address })?;
        self.map.remove(&key);
        Ok(())
    }

    /// Returns the device that owns `address` and the offset of `address` inside it.
    pub fn resolve(&self, address: u64) -> BusResult<(DeviceRef, u64)> {
        let range = self
            .range_for_address(address)
            .ok_or(BusError::NotMapped { address })?;
        Ok((
            self.devices[range.device_id].clone(),
            address - range.bus_start,
        ))
    }

    pub fn read_u32(&self, address: u64) -> BusResult<u32> {
        let (device, offset) = self.resolve(address)?;
        device
            .read_u32(offset)
            .map_err(|source| BusError::DeviceFault {
                device: device.name().to_string(),
                source,
            })
    }

    pub fn write_u32(&self, address: u64, value: u32) -> BusResult<()> {
        let (device, offset) = self.resolve(address)?;
        device
            .write_u32(offset, value)
            .map_err(|source| BusError::DeviceFault {
                device: device.name().to_string(),
                source,
            })
    }

    fn range_for_address(&self, address: u64) -> Option<&BusRange> {
        self.map
            .range(..=address)
            .next_back()
            .and_then(|(_, range)| range.contains(address).then_some(range))
    }

    fn first_overlap(&self, start: u64, end: u64) -> Option<&BusRange> {
        if let Some((_, range)) = self.map.range(..=start).next_back()
            && range.overlaps(start, end)
        {
            return Some(range);
        }
        self.map.range(start..end).next().map(|(_, range)| range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soc::device::RegisterBlock;

    #[test]
    fn register_device_and_resolve_returns_expected_offset() {
        let mut bus = DeviceBus::new();
        bus.map_device(Arc::new(RegisterBlock::new("regs", 0x2000)), 0x4000)
            .expect("register device");

        let (dev, offset) = bus.resolve(0x5004).expect("resolve mapped address");
        assert_eq!(dev.name(), "regs", "resolved handle should map to registered device");
        assert_eq!(offset, 0x1004, "offset should be relative to the device base");
        assert!(bus.resolve(0x6000).is_err(), "address past the span should error");
        assert!(bus.resolve(0x3FFC).is_err(), "address before the span should error");
    }

    #[test]
    fn overlapping_spans_are_rejected() {
        let mut bus = DeviceBus::new();
        bus.map_device(Arc::new(RegisterBlock::new("low", 0x1000)), 0x1000)
            .expect("first mapping");
        let err = bus
            .map_device(Arc::new(RegisterBlock::new("high", 0x1000)), 0x1800)
            .expect_err("overlap should be rejected");
        assert!(matches!(err, BusError::Overlap { address: 0x1800, .. }));
        bus.map_device(Arc::new(RegisterBlock::new("adjacent", 0x1000)), 0x2000)
            .expect("adjacent mapping is fine");
    }

    #[test]
    fn word_access_round_trips_through_device() {
        let mut bus = DeviceBus::new();
        bus.map_device(Arc::new(RegisterBlock::new("regs", 0x1000)), 0x1800_0000)
            .expect("map");
        bus.write_u32(0x1800_0010, 0xCAFE_F00D).expect("write");
        assert_eq!(bus.read_u32(0x1800_0010).expect("read"), 0xCAFE_F00D);
        bus.unmap(0x1800_0000).expect("unmap");
        assert!(bus.read_u32(0x1800_0010).is_err(), "unmapped read should fail");
    }
}
