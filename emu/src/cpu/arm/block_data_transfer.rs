//! # LDM/STM
//!
//! ```text
//!  31  28 27 25 24 23 22 21 20 19 16 15                 0
//! ┌──────┬─────┬──┬──┬──┬──┬──┬─────┬────────────────────┐
//! │ cond │1 0 0│P │U │S │W │L │ Rn  │   register list    │
//! └──────┴─────┴──┴──┴──┴──┴──┴─────┴────────────────────┘
//! ```
//!
//! Registers are always transferred in ascending order, lowest register at
//! the lowest address, whatever the direction. The direction only changes
//! where the block starts:
//!
//! | Mode | First address  | Final base |
//! |------|----------------|------------|
//! | IA   | Rn             | Rn + 4n    |
//! | IB   | Rn + 4         | Rn + 4n    |
//! | DA   | Rn - 4n + 4    | Rn - 4n    |
//! | DB   | Rn - 4n        | Rn - 4n    |

use crate::bitwise::{Bits, count_set_bits};
use crate::bus::SystemBus;
use crate::cpu::arm::handler::BlockAddressing;
use crate::cpu::arm7::Arm7;
use crate::cpu::flags::LoadStoreKind;
use crate::cpu::psr::Flag;
use crate::cpu::registers::REG_PROGRAM_COUNTER;

/// First address of the block and value of the base after write-back.
#[must_use]
pub fn block_bounds(addressing: BlockAddressing, base: u32, count: u32) -> (u32, u32) {
    let size = count * 4;
    match addressing {
        BlockAddressing::IncrementAfter => (base, base.wrapping_add(size)),
        BlockAddressing::IncrementBefore => (base.wrapping_add(4), base.wrapping_add(size)),
        BlockAddressing::DecrementAfter => (
            base.wrapping_sub(size).wrapping_add(4),
            base.wrapping_sub(size),
        ),
        BlockAddressing::DecrementBefore => (base.wrapping_sub(size), base.wrapping_sub(size)),
    }
}

impl<B: SystemBus> Arm7<B> {
    pub(crate) fn block_data_transfer(
        &mut self,
        instruction: u32,
        addressing: BlockAddressing,
        psr_or_user: bool,
        write_back: bool,
        load_store: LoadStoreKind,
    ) {
        let rn = instruction.get_bits(16..=19) as usize;
        let register_list = instruction.get_bits(0..=15);

        if register_list == 0 {
            tracing::debug!("0x{instruction:08X}: empty register list, skipped");
            return;
        }

        let count = count_set_bits(register_list);
        let (start, final_base) = block_bounds(addressing, self.registers.read(rn), count);

        let pc_in_list = register_list.get_bit(15);
        let restore_cpsr = psr_or_user && load_store == LoadStoreKind::Load && pc_in_list;
        let user_bank = psr_or_user && !restore_cpsr;

        let registers = (0..16_usize).filter(|reg| register_list.get_bit(*reg as u8));

        match load_store {
            LoadStoreKind::Store => {
                // The base is updated after the first transfer, so a base
                // that is not the lowest listed register stores its new value.
                let lowest = register_list.trailing_zeros() as usize;

                let mut address = start;
                for (i, reg) in registers.enumerate() {
                    let value = if user_bank {
                        self.registers.read_user(reg)
                    } else {
                        self.registers.read(reg)
                    };
                    let value = if reg == REG_PROGRAM_COUNTER {
                        value.wrapping_add(4)
                    } else if write_back && reg == rn && reg != lowest {
                        final_base
                    } else {
                        value
                    };

                    self.bus.set_sequential(i != 0);
                    self.bus.write_data32(address, value);
                    address = address.wrapping_add(4);
                }

                if write_back {
                    self.registers.write(rn, final_base);
                }
            }
            LoadStoreKind::Load => {
                // A loaded base wins over the written back one.
                if write_back {
                    self.registers.write(rn, final_base);
                }

                let mut address = start;
                for (i, reg) in registers.enumerate() {
                    self.bus.set_sequential(i != 0);
                    let value = self.bus.read_data32(address);
                    address = address.wrapping_add(4);

                    if reg == REG_PROGRAM_COUNTER {
                        self.load_block_program_counter(value, restore_cpsr);
                    } else if user_bank {
                        self.registers.write_user(reg, value);
                    } else {
                        self.registers.write(reg, value);
                    }
                }
            }
        }
    }

    fn load_block_program_counter(&mut self, value: u32, restore_cpsr: bool) {
        if !restore_cpsr {
            self.load_program_counter(value);
            return;
        }

        match self.registers.read_spsr() {
            Some(spsr) => self.registers.write_cpsr(spsr),
            None => tracing::debug!(
                "LDM ^ in {:?} mode has no SPSR to restore",
                self.registers.current_mode()
            ),
        }

        let mask = if self.registers.is_flag(Flag::Thumb) { !1 } else { !3 };
        self.registers.write_pc(value & mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::DataBus;
    use crate::cpu::arm7::tests::{MAIN_RAM, cpu};
    use crate::cpu::cpu_modes::Mode;
    use pretty_assertions::assert_eq;

    #[test]
    fn bounds() {
        let base = 0x1000;
        assert_eq!(
            block_bounds(BlockAddressing::IncrementAfter, base, 3),
            (0x1000, 0x100C)
        );
        assert_eq!(
            block_bounds(BlockAddressing::IncrementBefore, base, 3),
            (0x1004, 0x100C)
        );
        assert_eq!(
            block_bounds(BlockAddressing::DecrementAfter, base, 3),
            (0x0FF8, 0x0FF4)
        );
        assert_eq!(
            block_bounds(BlockAddressing::DecrementBefore, base, 3),
            (0x0FF4, 0x0FF4)
        );
    }

    /// STM{mode} R13!, {R0, R2} then LDM{opposite} R13!, {R1, R3}.
    fn round_trip(stm: u32, ldm: u32, expected_low: u32) {
        let mut cpu = cpu();
        let base = MAIN_RAM + 0x100;
        cpu.registers.write(13, base);
        cpu.registers.write(0, 0xAAAA_AAAA);
        cpu.registers.write(2, 0xBBBB_BBBB);

        cpu.execute(stm);
        assert_eq!(cpu.bus.read_data32(expected_low), 0xAAAA_AAAA);
        assert_eq!(cpu.bus.read_data32(expected_low + 4), 0xBBBB_BBBB);

        cpu.execute(ldm);
        assert_eq!(cpu.registers.read(13), base);
        assert_eq!(cpu.registers.read(1), 0xAAAA_AAAA);
        assert_eq!(cpu.registers.read(3), 0xBBBB_BBBB);
    }

    #[test]
    fn stm_ldm_all_directions() {
        let base = MAIN_RAM + 0x100;
        // STMIA R13!, {R0, R2} / LDMDB R13!, {R1, R3}
        round_trip(0xE8AD_0005, 0xE93D_000A, base);
        // STMIB / LDMDA
        round_trip(0xE9AD_0005, 0xE83D_000A, base + 4);
        // STMDA / LDMIB
        round_trip(0xE82D_0005, 0xE9BD_000A, base - 4);
        // STMDB / LDMIA
        round_trip(0xE92D_0005, 0xE8BD_000A, base - 8);
    }

    #[test]
    fn no_write_back_without_w() {
        let mut cpu = cpu();
        cpu.registers.write(1, MAIN_RAM);

        // STMIA R1, {R0, R2}
        cpu.execute(0xE881_0005);
        assert_eq!(cpu.registers.read(1), MAIN_RAM);
    }

    #[test]
    fn stm_stores_old_base_only_when_lowest() {
        let mut cpu = cpu();
        let base = MAIN_RAM + 0x100;
        cpu.registers.write(0, 0xAAAA_AAAA);
        cpu.registers.write(1, base);

        // STMIA R1!, {R0, R1}
        cpu.execute(0xE8A1_0003);
        assert_eq!(cpu.bus.read_data32(base), 0xAAAA_AAAA);
        assert_eq!(cpu.bus.read_data32(base + 4), base + 8);
        assert_eq!(cpu.registers.read(1), base + 8);

        cpu.registers.write(1, base);
        // STMIA R1!, {R1, R2}
        cpu.execute(0xE8A1_0006);
        assert_eq!(cpu.bus.read_data32(base), base);
        assert_eq!(cpu.registers.read(1), base + 8);
    }

    #[test]
    fn loaded_base_wins() {
        let mut cpu = cpu();
        cpu.bus.write_data32(MAIN_RAM, 0x1234);
        cpu.registers.write(0, MAIN_RAM);

        // LDMIA R0!, {R0}
        cpu.execute(0xE8B0_0001);
        assert_eq!(cpu.registers.read(0), 0x1234);
    }

    #[test]
    fn ldm_with_pc_and_psr_restores_cpsr() {
        let mut cpu = cpu();
        cpu.bus.write_data32(MAIN_RAM, MAIN_RAM + 0x200);
        cpu.registers.write(0, MAIN_RAM);
        cpu.registers.write_spsr(0x6000_0010);

        // LDMIA R0, {PC}^
        cpu.execute(0xE8D0_8000);
        assert_eq!(cpu.registers.current_mode(), Mode::User);
        assert_eq!(cpu.registers.read_cpsr(), 0x6000_0010);
        assert_eq!(cpu.registers.read_pc(), MAIN_RAM + 0x200);
    }

    #[test]
    fn stm_user_bank() {
        let mut cpu = cpu();
        cpu.registers.set_mode(Mode::User);
        cpu.registers.write(13, 0x1111);
        cpu.registers.set_mode(Mode::Irq);
        cpu.registers.write(13, 0x2222);
        cpu.registers.write(0, MAIN_RAM);

        // STMIA R0, {R13}^
        cpu.execute(0xE8C0_2000);
        assert_eq!(cpu.bus.read_data32(MAIN_RAM), 0x1111);

        // LDMIA R0, {R14}^ writes the User R14
        cpu.execute(0xE8D0_4000);
        assert_eq!(cpu.registers.read_user(14), 0x1111);
        assert_eq!(cpu.registers.read(14), 0);
    }

    #[test]
    fn pop_pc() {
        let mut cpu = cpu();
        cpu.bus.write_data32(MAIN_RAM, 7);
        cpu.bus.write_data32(MAIN_RAM + 4, MAIN_RAM + 0x40);
        cpu.registers.write(13, MAIN_RAM);

        // LDMIA SP!, {R0, PC}
        cpu.execute(0xE8BD_8001);
        assert_eq!(cpu.registers.read(0), 7);
        assert_eq!(cpu.registers.read(13), MAIN_RAM + 8);
        assert_eq!(cpu.registers.read_pc(), MAIN_RAM + 0x40);
    }
}
