//! Flat list of every wrapper seen during the scan. Only the timeout monitor
//! consumes it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperRole {
    Master,
    Slave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapperInfo {
    pub mfg: u16,
    pub id: u16,
    pub rev: u8,
    pub role: WrapperRole,
    pub addr: u32,
}

impl WrapperInfo {
    pub fn is_slave(&self) -> bool {
        self.role == WrapperRole::Slave
    }
}
