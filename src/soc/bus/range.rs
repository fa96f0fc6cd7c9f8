#[derive(Debug, Clone)]
pub struct BusRange {
    pub bus_start: u64,
    pub bus_end: u64,
    pub device_id: usize,
}

impl BusRange {
    pub fn contains(&self, addr: u64) -> bool {
        self.bus_start <= addr && addr < self.bus_end
    }

    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        self.bus_start < end && start < self.bus_end
    }
}
