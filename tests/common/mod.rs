//! Simulated chip shared by the integration tests: an enumeration ROM,
//! chip-common, a dual-wrapper radio unit, a PCIe Gen2 bus core, an APB and
//! an ADB bridge, plus an out-of-band router. Every wrapper in the ROM is
//! backed by a [`WrapperModel`].
#![allow(dead_code)]

use std::sync::Arc;

use backplane::soc::backplane::{AttachConfig, Backplane, BusKind, WindowGeneration};
use backplane::soc::backplane::regs::CC_EROM_PTR;
use backplane::soc::bus::DeviceRef;
use backplane::soc::device::{RegisterBlock, WrapperModel};
use backplane::soc::erom::EromBuilder;
use backplane::soc::host::{Host, HostAddr, SimHost, WindowLayout};
use backplane::soc::topology::ids::*;

pub const CC_BASE: u32 = 0x1800_0000;
pub const D11_BASE: u32 = 0x1800_1000;
pub const PCIE_BASE: u32 = 0x1800_2000;
pub const APB_BASE: u32 = 0x1800_4000;
pub const ADB_BASE: u32 = 0x1800_5000;
pub const D11_SECOND: u32 = 0x1800_8000;
pub const D11_PORT1: u64 = 0x2800_0000;
pub const EROM_BASE: u32 = 0x1800_F000;

pub const CC_WRAP: u32 = 0x1810_0000;
pub const D11_WRAP: u32 = 0x1810_1000;
pub const D11_WRAP2: u32 = 0x1810_A000;
pub const D11_SLAVE_WRAP: u32 = 0x1820_1000;
pub const PCIE_WRAP: u32 = 0x1810_2000;
pub const PCIE_SLAVE_WRAP: u32 = 0x1810_3000;
pub const APB_WRAP: u32 = 0x1810_4000;
pub const ADB_WRAP: u32 = 0x1810_5000;
pub const OOB_ROUTER: u32 = 0x1820_0000;

pub const BAR0: HostAddr = 0x4000_0000;

/// Unit indices in scan order.
pub const CC: usize = 0;
pub const D11: usize = 1;
pub const PCIE: usize = 2;

pub const D11_ID: u16 = 0x812;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The ROM image of the simulated chip.
pub fn erom(cc_rev: u8) -> EromBuilder {
    EromBuilder::new()
        .component(MFG_BRCM, CC_CORE_ID, cc_rev, 1, 1, 0, 1)
        .master_port(0, 0)
        .slave(0, CC_BASE as u64, 0x1000)
        .slave_wrapper(0, CC_WRAP)
        .component(MFG_BRCM, D11_ID, 0x30, 1, 2, 2, 1)
        .master_port(0, 1)
        .slave(0, D11_BASE as u64, 0x1000)
        .slave(0, D11_SECOND as u64, 0x2000)
        .slave(1, D11_PORT1, 0x40_0000)
        .master_wrapper(0, D11_WRAP)
        .master_wrapper(1, D11_WRAP2)
        .slave_wrapper(1, D11_SLAVE_WRAP)
        .component(MFG_BRCM, PCIE2_CORE_ID, 0x11, 1, 1, 1, 1)
        .master_port(0, 2)
        .slave(0, PCIE_BASE as u64, 0x1000)
        .master_wrapper(0, PCIE_WRAP)
        .slave_wrapper(0, PCIE_SLAVE_WRAP)
        .component(MFG_ARM, APB_BRIDGE_ID, 0, 0, 1, 0, 1)
        .bridge(0, APB_BASE as u64, 0x1000)
        .slave_wrapper(0, APB_WRAP)
        .component(MFG_ARM, ADB_BRIDGE_ID, 0, 0, 1, 0, 1)
        .slave(0, ADB_BASE as u64, 0x1000)
        .slave_wrapper(0, ADB_WRAP)
        .component(MFG_BRCM, OOB_ROUTER_CORE_ID, 0, 0, 1, 0, 0)
        .slave(0, OOB_ROUTER as u64, 0x1000)
        .end()
}

pub struct Wrappers {
    pub cc: Arc<WrapperModel>,
    pub d11: Arc<WrapperModel>,
    pub d11_second: Arc<WrapperModel>,
    pub d11_slave: Arc<WrapperModel>,
    pub pcie: Arc<WrapperModel>,
    pub pcie_slave: Arc<WrapperModel>,
    pub apb: Arc<WrapperModel>,
    pub adb: Arc<WrapperModel>,
}

pub struct Chip {
    pub sim: Arc<SimHost>,
    pub rom: Arc<RegisterBlock>,
    pub cc: Arc<RegisterBlock>,
    pub d11: Arc<RegisterBlock>,
    pub pcie: Arc<RegisterBlock>,
    pub wrap: Wrappers,
}

impl Chip {
    pub fn direct() -> Self {
        Self::build(None, &erom(0x2B).build())
    }

    pub fn windowed(gen2: bool) -> Self {
        Self::build(Some(layout(gen2)), &erom(0x2B).build())
    }

    pub fn with_cc_rev(cc_rev: u8) -> Self {
        Self::build(None, &erom(cc_rev).build())
    }

    pub fn with_rom(words: &[u32]) -> Self {
        Self::build(None, words)
    }

    pub fn build(window: Option<WindowLayout>, rom_words: &[u32]) -> Self {
        init_tracing();
        let sim = Arc::new(match window {
            Some(layout) => SimHost::with_window(layout),
            None => SimHost::new(),
        });

        let rom = Arc::new(RegisterBlock::with_words("erom", 0x1000, rom_words));
        let cc = Arc::new(RegisterBlock::new("chipcommon", 0x1000));
        let d11 = Arc::new(RegisterBlock::new("d11", 0x1000));
        let pcie = Arc::new(RegisterBlock::new("pcie2", 0x1000));
        cc.set_word(CC_EROM_PTR as u64, EROM_BASE);

        map(&sim, rom.clone(), EROM_BASE);
        map(&sim, cc.clone(), CC_BASE);
        map(&sim, d11.clone(), D11_BASE);
        map(&sim, pcie.clone(), PCIE_BASE);
        map(&sim, Arc::new(RegisterBlock::new("d11-second", 0x2000)), D11_SECOND);

        let wrapper = |name: &str, at: u32| {
            let model = Arc::new(WrapperModel::new(name));
            map(&sim, model.clone(), at);
            model
        };
        let wrap = Wrappers {
            cc: wrapper("cc-wrap", CC_WRAP),
            d11: wrapper("d11-wrap", D11_WRAP),
            d11_second: wrapper("d11-wrap2", D11_WRAP2),
            d11_slave: wrapper("d11-slave-wrap", D11_SLAVE_WRAP),
            pcie: wrapper("pcie-wrap", PCIE_WRAP),
            pcie_slave: wrapper("pcie-slave-wrap", PCIE_SLAVE_WRAP),
            apb: wrapper("apb-wrap", APB_WRAP),
            adb: wrapper("adb-wrap", ADB_WRAP),
        };

        Self {
            sim,
            rom,
            cc,
            d11,
            pcie,
            wrap,
        }
    }

    pub fn host(&self) -> Arc<dyn Host> {
        self.sim.clone()
    }

    /// Direct attach followed by a scan.
    pub fn attach_direct(&self) -> Backplane {
        let config = AttachConfig::builder(BusKind::Direct, CC_BASE)
            .build()
            .expect("direct config");
        self.attach(config)
    }

    pub fn attach_serial(&self) -> Backplane {
        let config = AttachConfig::builder(BusKind::Serial, CC_BASE)
            .build()
            .expect("serial config");
        self.attach(config)
    }

    pub fn attach_windowed(&self, generation: WindowGeneration, slice: u8, fast: bool) -> Backplane {
        let config = AttachConfig::builder(BusKind::Windowed, CC_BASE)
            .bar0(BAR0)
            .generation(generation)
            .slice(slice)
            .fast_window(fast)
            .build()
            .expect("windowed config");
        self.attach(config)
    }

    fn attach(&self, config: AttachConfig) -> Backplane {
        let mut bp = Backplane::attach(self.host(), config);
        bp.scan();
        bp
    }
}

fn map(sim: &SimHost, device: DeviceRef, at: u32) {
    sim.map_device(device, at as u64)
        .expect("map simulated device");
}

pub fn layout(gen2: bool) -> WindowLayout {
    WindowLayout {
        bar0: BAR0,
        gen2,
        chipcommon: CC_BASE as u64,
        bus_core: PCIE_BASE as u64,
    }
}
