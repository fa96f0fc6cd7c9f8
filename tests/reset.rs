mod common;

use backplane::soc::backplane::regs::{IoControl, RESET, wrapper as dmp};
use backplane::soc::backplane::reset::RESET_RELEASE_ATTEMPTS;
use backplane::soc::backplane::{BackplaneError, ResetOutcome, WrapperSlot};
use common::*;

const FGC: u32 = IoControl::FORCE_GATED_CLOCK.bits();
const CLK: u32 = IoControl::CLOCK_EN.bits();

#[test]
fn reset_cycles_every_wrapper_and_ends_on_primary() {
    let chip = Chip::direct();
    let mut bp = chip.attach_direct();
    let guard = bp.mask_interrupts();
    bp.select(&guard, D11, WrapperSlot::Primary).expect("select");
    drop(guard);

    assert_eq!(bp.reset(0x4, 0x8), Ok(ResetOutcome::Released));
    for wrap in [&chip.wrap.d11, &chip.wrap.d11_second] {
        assert_eq!(wrap.reset_asserts(), 1);
        assert_eq!(wrap.release_attempts(), 1);
        assert_eq!(wrap.reset_readbacks(), 2, "assert and release are both read back");
        assert_eq!(wrap.reg(dmp::RESETCTRL), 0);
        assert_eq!(wrap.reg(dmp::IOCTRL), 0x4 | CLK, "reset-only bits and forced clock dropped");
    }
    let focus = bp.focus().expect("focus");
    assert_eq!((focus.unit, focus.slot), (D11, WrapperSlot::Primary));
    assert_eq!(bp.is_core_up(), Ok(true));
}

#[test]
fn stuck_reset_gives_up_after_bounded_attempts() {
    let chip = Chip::direct();
    let mut bp = chip.attach_direct();
    chip.wrap.cc.hold_in_reset(true);
    chip.wrap.cc.set_reset_status(1);
    let guard = bp.mask_interrupts();
    bp.select(&guard, CC, WrapperSlot::Primary).expect("select");
    drop(guard);

    let start = chip.sim.elapsed_us();
    assert_eq!(bp.reset(0, 0), Ok(ResetOutcome::StillInReset));
    assert_eq!(chip.wrap.cc.release_attempts(), RESET_RELEASE_ATTEMPTS);
    assert_eq!(chip.wrap.cc.reset_asserts(), 1);
    assert_eq!(
        chip.wrap.cc.reset_readbacks(),
        1 + RESET_RELEASE_ATTEMPTS,
        "every reset-control write is read back at once"
    );
    assert_eq!(chip.wrap.cc.reg(dmp::IOCTRL), CLK, "clock still enabled on the way out");
    // Three 300us waits around assertion, two per release attempt, plus fixed delays.
    assert_eq!(chip.sim.elapsed_us() - start, 300 * 3 + 600 * 10 + 11);
    assert_eq!(bp.is_core_up(), Ok(false));
}

#[test]
fn disable_holds_unit_in_reset_once() {
    let chip = Chip::direct();
    let mut bp = chip.attach_direct();
    let guard = bp.mask_interrupts();
    bp.select(&guard, D11, WrapperSlot::Primary).expect("select");
    drop(guard);

    bp.disable(0x4).expect("disable");
    assert_eq!(chip.wrap.d11.reg(dmp::RESETCTRL), RESET);
    assert_eq!(chip.wrap.d11.reg(dmp::IOCTRL), 0x4);
    assert_eq!(bp.is_core_up(), Ok(false));

    bp.disable(0x0).expect("disable again");
    assert_eq!(chip.wrap.d11.reset_asserts(), 1, "already in reset, nothing to do");
    assert_eq!(chip.wrap.d11.reg(dmp::IOCTRL), 0x4);
    assert_eq!(chip.wrap.d11_second.reset_asserts(), 0, "only the focused wrapper");
}

#[test]
fn disable_forces_reset_after_both_waits() {
    let chip = Chip::direct();
    let mut bp = chip.attach_direct();
    chip.wrap.pcie.set_reset_status(1);
    let guard = bp.mask_interrupts();
    bp.select(&guard, PCIE, WrapperSlot::Primary).expect("select");
    drop(guard);

    let start = chip.sim.elapsed_us();
    bp.disable(0).expect("disable");
    assert_eq!(chip.sim.elapsed_us() - start, 300 + 10_000 + 11);
    assert_eq!(chip.wrap.pcie.reg(dmp::RESETCTRL), RESET);
}

#[test]
fn force_clocks_reaches_the_secondary_wrapper() {
    let chip = Chip::direct();
    let mut bp = chip.attach_direct();
    chip.wrap.d11.set_reg(dmp::IOCTRL, CLK);
    let guard = bp.mask_interrupts();
    bp.select(&guard, D11, WrapperSlot::Primary).expect("select");
    drop(guard);

    bp.force_clocks(true).expect("force on");
    assert_eq!(chip.wrap.d11.reg(dmp::IOCTRL), CLK | FGC);
    assert_eq!(chip.wrap.d11_second.reg(dmp::IOCTRL), FGC);

    bp.force_clocks(false).expect("force off");
    assert_eq!(chip.wrap.d11.reg(dmp::IOCTRL), CLK);
    assert_eq!(chip.wrap.d11_second.reg(dmp::IOCTRL), 0);
}

#[test]
fn reset_needs_a_focus() {
    let chip = Chip::direct();
    let mut bp = chip.attach_direct();
    assert_eq!(bp.reset(0, 0), Err(BackplaneError::NoFocus));
    assert_eq!(bp.disable(0), Err(BackplaneError::NoFocus));
}
