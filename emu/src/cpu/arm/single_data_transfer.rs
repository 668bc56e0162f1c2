//! # Single register transfers
//!
//! LDR/STR (word and byte), the halfword and signed loads, LDRD/STRD and
//! SWP. They share the addressing scheme:
//!
//! ```text
//! P  U  W
//! 1  x  0   [Rn, offset]       base untouched
//! 1  x  1   [Rn, offset]!      base updated before the access
//! 0  x  x   [Rn], offset       base updated after the access, always
//! ```
//!
//! Unaligned word loads read the aligned word and rotate it right by
//! 8 × (address mod 4), as the ARM7 does. On `ARMv4` an odd LDRH rotates
//! the aligned halfword by 8 and an odd LDRSH loads the addressed byte
//! sign extended; `ARMv5` forces both to the aligned halfword. Stores of R15
//! store the instruction address + 12.

use crate::bitwise::Bits;
use crate::bus::SystemBus;
use crate::config::Architecture;
use crate::cpu::arm::alu_instruction::shift_by_immediate;
use crate::cpu::arm::handler::{HalfwordTransferKind, TransferAddressing, TransferOffset};
use crate::cpu::arm7::Arm7;
use crate::cpu::flags::{Indexing, LoadStoreKind, ReadWriteKind};
use crate::cpu::psr::Flag;
use crate::cpu::registers::{REG_LR, REG_PROGRAM_COUNTER};

/// Where an access goes and what the base becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EffectiveAddress {
    transfer: u32,
    write_back: Option<u32>,
}

fn effective_address(addressing: TransferAddressing, base: u32, offset: u32) -> EffectiveAddress {
    let offset_address = addressing.offsetting.apply(base, offset);

    match addressing.indexing {
        Indexing::Pre => EffectiveAddress {
            transfer: offset_address,
            write_back: addressing.write_back.then_some(offset_address),
        },
        Indexing::Post => EffectiveAddress {
            transfer: base,
            write_back: Some(offset_address),
        },
    }
}

/// Bits 11-8 and 3-0 of the halfword and doubleword immediate forms.
fn split_immediate(instruction: u32) -> u32 {
    (instruction.get_bits(8..=11) << 4) | instruction.get_bits(0..=3)
}

impl<B: SystemBus> Arm7<B> {
    /// Value of `rd` for a store, R15 reads one instruction further ahead.
    fn store_value(&self, rd: usize) -> u32 {
        let value = self.registers.read(rd);
        if rd == REG_PROGRAM_COUNTER {
            value.wrapping_add(4)
        } else {
            value
        }
    }

    fn write_back_base(&mut self, rn: usize, address: Option<u32>) {
        match address {
            Some(_) if rn == REG_PROGRAM_COUNTER => {
                tracing::debug!("write-back to PC ignored");
            }
            Some(address) => self.registers.write(rn, address),
            None => {}
        }
    }

    /// Word load with the ARM7 rotation of unaligned addresses.
    pub(crate) fn read_word_rotated(&mut self, address: u32) -> u32 {
        self.bus
            .read_data32(address)
            .rotate_right((address & 3) * 8)
    }

    pub(crate) fn single_data_transfer(
        &mut self,
        instruction: u32,
        addressing: TransferAddressing,
        offset: TransferOffset,
        kind: ReadWriteKind,
        load_store: LoadStoreKind,
    ) {
        let rn = instruction.get_bits(16..=19) as usize;
        let rd = instruction.get_bits(12..=15) as usize;

        let offset = match offset {
            TransferOffset::Immediate => instruction.get_bits(0..=11),
            TransferOffset::ScaledRegister(shift) => {
                let rm = self.registers.read(instruction.get_bits(0..=3) as usize);
                let carry = self.registers.is_flag(Flag::Carry);
                shift_by_immediate(shift, instruction.get_bits(7..=11), rm, carry).result
            }
        };

        let address = effective_address(addressing, self.registers.read(rn), offset);
        self.bus.set_sequential(false);

        match load_store {
            LoadStoreKind::Store => {
                let value = self.store_value(rd);
                match kind {
                    ReadWriteKind::Word => self.bus.write_data32(address.transfer, value),
                    ReadWriteKind::Byte => self.bus.write_data8(address.transfer, value as u8),
                }
                self.write_back_base(rn, address.write_back);
            }
            LoadStoreKind::Load => {
                let value = match kind {
                    ReadWriteKind::Word => self.read_word_rotated(address.transfer),
                    ReadWriteKind::Byte => u32::from(self.bus.read_data8(address.transfer)),
                };
                self.write_back_base(rn, address.write_back);

                if rd == REG_PROGRAM_COUNTER {
                    self.load_program_counter(value);
                } else {
                    self.registers.write(rd, value);
                }
            }
        }
    }

    pub(crate) fn halfword_transfer(
        &mut self,
        instruction: u32,
        addressing: TransferAddressing,
        immediate: bool,
        kind: HalfwordTransferKind,
        load_store: LoadStoreKind,
    ) {
        let rn = instruction.get_bits(16..=19) as usize;
        let rd = instruction.get_bits(12..=15) as usize;

        let offset = if immediate {
            split_immediate(instruction)
        } else {
            self.registers.read(instruction.get_bits(0..=3) as usize)
        };

        let address = effective_address(addressing, self.registers.read(rn), offset);
        self.bus.set_sequential(false);

        match load_store {
            LoadStoreKind::Store => {
                let value = self.store_value(rd);
                self.bus.write_data16(address.transfer, value as u16);
                self.write_back_base(rn, address.write_back);
            }
            LoadStoreKind::Load => {
                let misaligned =
                    address.transfer & 1 == 1 && self.architecture() < Architecture::V5;
                let value = match kind {
                    HalfwordTransferKind::UnsignedHalfword if misaligned => {
                        u32::from(self.bus.read_data16(address.transfer)).rotate_right(8)
                    }
                    HalfwordTransferKind::UnsignedHalfword => {
                        u32::from(self.bus.read_data16(address.transfer))
                    }
                    HalfwordTransferKind::SignedByte => {
                        u32::from(self.bus.read_data8(address.transfer)).sign_extended(8)
                    }
                    HalfwordTransferKind::SignedHalfword if misaligned => {
                        u32::from(self.bus.read_data8(address.transfer)).sign_extended(8)
                    }
                    HalfwordTransferKind::SignedHalfword => {
                        u32::from(self.bus.read_data16(address.transfer)).sign_extended(16)
                    }
                };
                self.write_back_base(rn, address.write_back);

                if rd == REG_PROGRAM_COUNTER {
                    self.load_program_counter(value);
                } else {
                    self.registers.write(rd, value);
                }
            }
        }
    }

    /// LDRD/STRD: `Rd` and `Rd + 1` at two consecutive words.
    pub(crate) fn doubleword_transfer(
        &mut self,
        instruction: u32,
        addressing: TransferAddressing,
        immediate: bool,
        load_store: LoadStoreKind,
    ) {
        let rn = instruction.get_bits(16..=19) as usize;
        let rd = instruction.get_bits(12..=15) as usize;

        if rd % 2 == 1 || rd == REG_LR {
            tracing::debug!("0x{instruction:08X}: doubleword transfer with Rd=R{rd}, skipped");
            return;
        }

        let offset = if immediate {
            split_immediate(instruction)
        } else {
            self.registers.read(instruction.get_bits(0..=3) as usize)
        };

        let address = effective_address(addressing, self.registers.read(rn), offset);
        if address.transfer % 8 != 0 {
            tracing::debug!(
                "0x{instruction:08X}: doubleword transfer at unaligned 0x{:08X}, skipped",
                address.transfer
            );
            return;
        }

        let second = address.transfer.wrapping_add(4);
        match load_store {
            LoadStoreKind::Store => {
                let low = self.registers.read(rd);
                let high = self.registers.read(rd + 1);
                self.bus.set_sequential(false);
                self.bus.write_data32(address.transfer, low);
                self.bus.set_sequential(true);
                self.bus.write_data32(second, high);
                self.write_back_base(rn, address.write_back);
            }
            LoadStoreKind::Load => {
                self.bus.set_sequential(false);
                let low = self.bus.read_data32(address.transfer);
                self.bus.set_sequential(true);
                let high = self.bus.read_data32(second);
                self.write_back_base(rn, address.write_back);
                self.registers.write(rd, low);
                self.registers.write(rd + 1, high);
            }
        }
    }

    /// SWP/SWPB: load from `[Rn]` into `Rd` and store `Rm` there.
    pub(crate) fn single_data_swap(&mut self, instruction: u32, kind: ReadWriteKind) {
        let rn = instruction.get_bits(16..=19) as usize;
        let rd = instruction.get_bits(12..=15) as usize;
        let rm = instruction.get_bits(0..=3) as usize;

        let address = self.registers.read(rn);
        let source = self.registers.read(rm);

        self.bus.set_sequential(false);
        let loaded = match kind {
            ReadWriteKind::Word => {
                let loaded = self.read_word_rotated(address);
                self.bus.write_data32(address, source);
                loaded
            }
            ReadWriteKind::Byte => {
                let loaded = u32::from(self.bus.read_data8(address));
                self.bus.write_data8(address, source as u8);
                loaded
            }
        };

        self.registers.write(rd, loaded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::DataBus;
    use crate::cpu::arm7::tests::{MAIN_RAM, cpu, cpu_v5};
    use crate::cpu::flags::Offsetting;
    use pretty_assertions::assert_eq;

    #[test]
    fn addressing_modes() {
        let pre = TransferAddressing {
            indexing: Indexing::Pre,
            offsetting: Offsetting::Up,
            write_back: false,
        };
        assert_eq!(
            effective_address(pre, 100, 4),
            EffectiveAddress {
                transfer: 104,
                write_back: None,
            }
        );

        let post = TransferAddressing {
            indexing: Indexing::Post,
            offsetting: Offsetting::Down,
            write_back: false,
        };
        assert_eq!(
            effective_address(post, 100, 4),
            EffectiveAddress {
                transfer: 100,
                write_back: Some(96),
            }
        );
    }

    #[test]
    fn check_str_ldr_immediate() {
        let mut cpu = cpu();
        cpu.registers.write(1, MAIN_RAM);
        cpu.registers.write(0, 0xDEAD_BEEF);

        // STR R0, [R1, #4]!
        cpu.execute(0xE5A1_0004);
        assert_eq!(cpu.bus.read_data32(MAIN_RAM + 4), 0xDEAD_BEEF);
        assert_eq!(cpu.registers.read(1), MAIN_RAM + 4);

        // LDR R2, [R1], #-4
        cpu.execute(0xE411_2004);
        assert_eq!(cpu.registers.read(2), 0xDEAD_BEEF);
        assert_eq!(cpu.registers.read(1), MAIN_RAM);
    }

    #[test]
    fn unaligned_ldr_rotates() {
        let mut cpu = cpu();
        cpu.bus.write_data32(MAIN_RAM, 0x1122_3344);
        cpu.registers.write(1, MAIN_RAM + 1);

        // LDR R0, [R1]
        cpu.execute(0xE591_0000);
        assert_eq!(cpu.registers.read(0), 0x4411_2233);

        cpu.registers.write(1, MAIN_RAM + 2);
        cpu.execute(0xE591_0000);
        assert_eq!(cpu.registers.read(0), 0x3344_1122);
    }

    #[test]
    fn check_byte_transfers() {
        let mut cpu = cpu();
        cpu.registers.write(1, MAIN_RAM);
        cpu.registers.write(0, 0x1234_56AB);

        // STRB R0, [R1, #3]
        cpu.execute(0xE5C1_0003);
        assert_eq!(cpu.bus.read_data32(MAIN_RAM), 0xAB00_0000);

        // LDRB R2, [R1, #3]
        cpu.execute(0xE5D1_2003);
        assert_eq!(cpu.registers.read(2), 0xAB);
    }

    #[test]
    fn check_ldr_scaled_register() {
        let mut cpu = cpu();
        cpu.bus.write_data32(MAIN_RAM + 8, 42);
        cpu.registers.write(1, MAIN_RAM);
        cpu.registers.write(2, 2);

        // LDR R0, [R1, R2, LSL #2]
        cpu.execute(0xE791_0102);
        assert_eq!(cpu.registers.read(0), 42);
        assert_eq!(cpu.registers.read(1), MAIN_RAM);
    }

    #[test]
    fn str_pc_stores_address_plus_12() {
        let mut cpu = cpu();
        cpu.registers.write_pc(MAIN_RAM + 0x40);
        cpu.registers.write(1, MAIN_RAM);

        // STR PC, [R1]
        cpu.execute(0xE581_F000);
        assert_eq!(cpu.bus.read_data32(MAIN_RAM), MAIN_RAM + 0x4C);
    }

    #[test]
    fn ldr_pc_interworking() {
        let mut v4 = cpu();
        v4.bus.write_data32(MAIN_RAM, MAIN_RAM + 0x81);
        v4.registers.write(1, MAIN_RAM);
        // LDR PC, [R1]
        v4.execute(0xE591_F000);
        assert_eq!(v4.registers.read_pc(), MAIN_RAM + 0x80);
        assert!(!v4.registers.is_flag(Flag::Thumb));

        let mut v5 = cpu_v5();
        v5.bus.write_data32(MAIN_RAM, MAIN_RAM + 0x81);
        v5.registers.write(1, MAIN_RAM);
        v5.execute(0xE591_F000);
        assert_eq!(v5.registers.read_pc(), MAIN_RAM + 0x80);
        assert!(v5.registers.is_flag(Flag::Thumb));
    }

    #[test]
    fn check_halfword_and_signed_loads() {
        let mut cpu = cpu();
        cpu.bus.write_data32(MAIN_RAM, 0x8081_F00F);
        cpu.registers.write(1, MAIN_RAM);

        // LDRH R0, [R1, #2]
        cpu.execute(0xE1D1_00B2);
        assert_eq!(cpu.registers.read(0), 0x8081);

        // LDRSH R0, [R1, #2]
        cpu.execute(0xE1D1_00F2);
        assert_eq!(cpu.registers.read(0), 0xFFFF_8081);

        // LDRSB R0, [R1, #1]
        cpu.execute(0xE1D1_00D1);
        assert_eq!(cpu.registers.read(0), 0xFFFF_FFF0);

        // LDRSB R0, [R1, #0]
        cpu.execute(0xE1D1_00D0);
        assert_eq!(cpu.registers.read(0), 0x0F);
    }

    #[test]
    fn odd_halfword_loads() {
        for (mut cpu, ldrh, ldrsh) in [
            (cpu(), 0x0F00_00F0, 0xFFFF_FFF0),
            (cpu_v5(), 0x0000_F00F, 0xFFFF_F00F),
        ] {
            cpu.bus.write_data32(MAIN_RAM, 0x8081_F00F);
            cpu.registers.write(1, MAIN_RAM);

            // LDRH R0, [R1, #1]
            cpu.execute(0xE1D1_00B1);
            assert_eq!(cpu.registers.read(0), ldrh, "{:?}", cpu.architecture());

            // LDRSH R0, [R1, #1]
            cpu.execute(0xE1D1_00F1);
            assert_eq!(cpu.registers.read(0), ldrsh, "{:?}", cpu.architecture());
        }
    }

    #[test]
    fn check_strh_register_offset() {
        let mut cpu = cpu();
        cpu.registers.write(0, 0xAAAA_BEEF);
        cpu.registers.write(1, MAIN_RAM);
        cpu.registers.write(2, 6);

        // STRH R0, [R1, R2]!
        cpu.execute(0xE1A1_00B2);
        assert_eq!(cpu.bus.read_data16(MAIN_RAM + 6), 0xBEEF);
        assert_eq!(cpu.bus.read_data16(MAIN_RAM + 4), 0);
        assert_eq!(cpu.registers.read(1), MAIN_RAM + 6);
    }

    #[test]
    fn check_ldrd_strd() {
        let mut cpu = cpu_v5();
        cpu.registers.write(2, 0x1111_1111);
        cpu.registers.write(3, 0x2222_2222);
        cpu.registers.write(1, MAIN_RAM);

        // STRD R2, [R1, #8]
        cpu.execute(0xE1C1_20F8);
        assert_eq!(cpu.bus.read_data32(MAIN_RAM + 8), 0x1111_1111);
        assert_eq!(cpu.bus.read_data32(MAIN_RAM + 12), 0x2222_2222);

        // LDRD R4, [R1, #8]
        cpu.execute(0xE1C1_40D8);
        assert_eq!(cpu.registers.read(4), 0x1111_1111);
        assert_eq!(cpu.registers.read(5), 0x2222_2222);
    }

    #[test]
    fn ldrd_rejects_odd_register_and_unaligned_address() {
        let mut cpu = cpu_v5();
        cpu.bus.write_data32(MAIN_RAM + 4, 7);
        cpu.registers.write(1, MAIN_RAM);

        // LDRD R3, [R1]
        cpu.execute(0xE1C1_30D0);
        assert_eq!(cpu.registers.read(3), 0);

        // LDRD R4, [R1, #4]
        cpu.execute(0xE1C1_40D4);
        assert_eq!(cpu.registers.read(4), 0);
    }

    #[test]
    fn check_swp() {
        let mut cpu = cpu();
        cpu.bus.write_data32(MAIN_RAM, 0x1234_5678);
        cpu.registers.write(1, MAIN_RAM);
        cpu.registers.write(2, 0xCAFE_BABE);

        // SWP R0, R2, [R1]
        cpu.execute(0xE101_0092);
        assert_eq!(cpu.registers.read(0), 0x1234_5678);
        assert_eq!(cpu.bus.read_data32(MAIN_RAM), 0xCAFE_BABE);

        // SWPB R3, R2, [R1]
        cpu.execute(0xE141_3092);
        assert_eq!(cpu.registers.read(3), 0xBE);
        assert_eq!(cpu.bus.read_data32(MAIN_RAM), 0xCAFE_BABE);
    }

    #[test]
    fn swp_same_register() {
        let mut cpu = cpu();
        cpu.bus.write_data32(MAIN_RAM, 5);
        cpu.registers.write(1, MAIN_RAM);
        cpu.registers.write(0, 9);

        // SWP R0, R0, [R1]
        cpu.execute(0xE101_0090);
        assert_eq!(cpu.registers.read(0), 5);
        assert_eq!(cpu.bus.read_data32(MAIN_RAM), 9);
    }
}
