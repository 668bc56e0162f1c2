//! # ARM7 core
//!
//! [`Arm7`] glues the register file, the decode table and the bus together.
//!
//! ## Prefetch pipeline
//!
//! The core keeps two fetched slots, `current` (the instruction executing)
//! and `next`. While the pipeline is valid R15 holds the address of
//! `current` plus two instructions, which is what software observes when it
//! reads PC:
//!
//! ```text
//!          ARM                 Thumb
//! current  address             address
//! next     address + 4         address + 2
//! R15      address + 8         address + 4
//! ```
//!
//! Any write to R15 (branch, load into PC, exception entry, data processing
//! with `Rd = PC`) invalidates the pipeline and the next step refills it
//! from the new PC.
//!
//! ## Conditions
//!
//! The condition gate lives here and nowhere else: a failed condition
//! means the handler is not called at all. NV never executes, except for
//! `BLX <imm>` on `ARMv5`, which is encoded in the NV space of the branch rows.

use crate::bus::SystemBus;
use crate::config::{Architecture, CpuConfig};
use crate::cpu::arm::decoder::{DispatchTable, build_dispatch_table};
use crate::cpu::arm::handler::ArmHandler;
use crate::cpu::condition::Condition;
use crate::cpu::exception::ExceptionKind;
use crate::cpu::psr::Flag;
use crate::cpu::registers::RegisterFile;
use crate::error::DecodeError;

pub const SIZE_OF_ARM_INSTRUCTION: u32 = 4;
pub const SIZE_OF_THUMB_INSTRUCTION: u32 = 2;

/// An instruction word and the address it was fetched from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fetched {
    pub word: u32,
    pub address: u32,
}

pub struct Arm7<B: SystemBus> {
    pub registers: RegisterFile,
    pub bus: B,

    config: CpuConfig,
    dispatch: DispatchTable,

    pub(crate) current: Fetched,
    pub(crate) next: Fetched,
    pub(crate) pipeline_valid: bool,
}

impl<B: SystemBus> Arm7<B> {
    /// Builds the decode table for `config.architecture` and puts the core
    /// in its reset state: Supervisor mode, IRQ and FIQ disabled, PC at 0.
    pub fn new(config: CpuConfig, bus: B) -> Result<Self, DecodeError> {
        let dispatch = build_dispatch_table(config.architecture)?;

        Ok(Self {
            registers: RegisterFile::default(),
            bus,
            config,
            dispatch,
            current: Fetched::default(),
            next: Fetched::default(),
            pipeline_valid: false,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &CpuConfig {
        &self.config
    }

    #[must_use]
    pub const fn architecture(&self) -> Architecture {
        self.config.architecture
    }

    #[must_use]
    pub const fn dispatch_table(&self) -> &DispatchTable {
        &self.dispatch
    }

    /// The instruction being executed, or the last one executed.
    #[must_use]
    pub const fn current(&self) -> Fetched {
        self.current
    }

    /// Takes the Reset exception regardless of the interrupt masks.
    pub fn reset(&mut self) {
        self.enter_exception(ExceptionKind::Reset);
    }

    /// Pulse of the system clock, forwarded to the bus clock.
    pub fn tick(&self) {
        self.bus.tick();
    }

    pub fn wait_for_tick(&self) -> u64 {
        self.bus.wait_for_tick()
    }

    #[must_use]
    pub fn instruction_size(&self) -> u32 {
        if self.registers.is_flag(Flag::Thumb) {
            SIZE_OF_THUMB_INSTRUCTION
        } else {
            SIZE_OF_ARM_INSTRUCTION
        }
    }

    /// Address exceptions compute their return address from: the executing
    /// instruction, or the next one to run when the pipeline is empty.
    pub(crate) const fn exception_base(&self) -> u32 {
        if self.pipeline_valid {
            self.current.address
        } else {
            self.registers.read_pc()
        }
    }

    /// Address of the instruction following the one executing.
    pub(crate) const fn next_instruction_address(&self) -> u32 {
        self.next.address
    }

    fn fetch(&mut self, address: u32, sequential: bool) -> Fetched {
        self.bus.set_sequential(sequential);
        let word = if self.registers.is_flag(Flag::Thumb) {
            u32::from(self.bus.read_code16(address))
        } else {
            self.bus.read_code32(address)
        };

        Fetched { word, address }
    }

    fn refill_pipeline(&mut self) {
        let size = self.instruction_size();
        let pc = self.registers.read_pc() & !(size - 1);

        self.current = self.fetch(pc, false);
        self.next = self.fetch(pc.wrapping_add(size), true);
        self.registers.set_pc_unflagged(pc.wrapping_add(2 * size));
        self.pipeline_valid = true;
    }

    fn advance_pipeline(&mut self) {
        let size = self.instruction_size();
        let pc = self.registers.read_pc();

        self.current = self.next;
        self.next = self.fetch(pc, true);
        self.registers.set_pc_unflagged(pc.wrapping_add(size));
    }

    /// Executes one instruction.
    pub fn step(&mut self) {
        if self.registers.take_pc_written() || !self.pipeline_valid {
            self.refill_pipeline();
        }

        let current = self.current;
        if self.registers.is_flag(Flag::Thumb) {
            self.execute_thumb(current);
        } else {
            self.execute_arm(current.word);
        }

        if self.registers.take_pc_written() {
            self.refill_pipeline();
        } else {
            self.advance_pipeline();
        }
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    pub fn run_for(&mut self, instructions: usize) {
        for _ in 0..instructions {
            self.step();
        }
    }

    /// Executes `word` as if it had been fetched at the current position.
    ///
    /// R15 reads as the instruction address + 8 while it runs. Afterwards PC
    /// holds the branch target if the instruction wrote it, the following
    /// address otherwise, and the pipeline is left empty.
    pub fn execute(&mut self, word: u32) {
        let address = self.exception_base();
        let size = self.instruction_size();

        self.registers.take_pc_written();
        self.current = Fetched { word, address };
        self.next = Fetched {
            word: 0,
            address: address.wrapping_add(size),
        };
        self.registers.set_pc_unflagged(address.wrapping_add(2 * size));
        self.pipeline_valid = true;

        if size == SIZE_OF_THUMB_INSTRUCTION {
            self.execute_thumb(self.current);
        } else {
            self.execute_arm(word);
        }

        if !self.registers.take_pc_written() {
            self.registers.set_pc_unflagged(address.wrapping_add(size));
        }
        self.pipeline_valid = false;
    }

    fn execute_arm(&mut self, instruction: u32) {
        let handler = self.dispatch.lookup(instruction);
        let condition = Condition::from(instruction);

        if condition == Condition::NV {
            if self.config.architecture >= Architecture::V5
                && matches!(handler, ArmHandler::Branch { .. })
            {
                self.branch_link_exchange_immediate(instruction);
            } else {
                tracing::debug!("0x{instruction:08X}: NV condition, skipped");
            }
            return;
        }

        if !condition.evaluate(self.registers.cpsr()) {
            return;
        }

        match handler {
            ArmHandler::DataProcessing {
                alu_instruction,
                set_conditions,
                operand,
            } => self.data_processing(instruction, alu_instruction, set_conditions, operand),
            ArmHandler::MoveStatusToRegister { spsr } => {
                self.move_status_to_register(instruction, spsr);
            }
            ArmHandler::MoveToStatusRegister { spsr, immediate } => {
                self.move_to_status_register(instruction, spsr, immediate);
            }
            ArmHandler::BranchExchange => self.branch_and_exchange(instruction, false),
            ArmHandler::BranchLinkExchangeRegister => self.branch_and_exchange(instruction, true),
            ArmHandler::CountLeadingZeros => self.count_leading_zeros(instruction),
            ArmHandler::Saturating(op) => self.saturating_add_sub(instruction, op),
            ArmHandler::Breakpoint => self.breakpoint(instruction),
            ArmHandler::HalfwordMultiply { op, x, y } => {
                self.halfword_multiply(instruction, op, x, y);
            }
            ArmHandler::Multiply {
                accumulate,
                set_conditions,
            } => self.multiply(instruction, accumulate, set_conditions),
            ArmHandler::MultiplyLong {
                signed,
                accumulate,
                set_conditions,
            } => self.multiply_long(instruction, signed, accumulate, set_conditions),
            ArmHandler::Swap { kind } => self.single_data_swap(instruction, kind),
            ArmHandler::HalfwordTransfer {
                addressing,
                immediate,
                kind,
                load_store,
            } => self.halfword_transfer(instruction, addressing, immediate, kind, load_store),
            ArmHandler::DoublewordTransfer {
                addressing,
                immediate,
                load_store,
            } => self.doubleword_transfer(instruction, addressing, immediate, load_store),
            ArmHandler::SingleDataTransfer {
                addressing,
                offset,
                kind,
                load_store,
            } => self.single_data_transfer(instruction, addressing, offset, kind, load_store),
            ArmHandler::BlockDataTransfer {
                addressing,
                psr_or_user,
                write_back,
                load_store,
            } => self.block_data_transfer(
                instruction,
                addressing,
                psr_or_user,
                write_back,
                load_store,
            ),
            ArmHandler::Branch { link } => self.branch(instruction, link),
            ArmHandler::SoftwareInterrupt => self.software_interrupt(instruction),
            ArmHandler::Undefined(reason) => self.undefined(instruction, reason),
        }
    }

    fn execute_thumb(&self, fetched: Fetched) {
        tracing::debug!(
            "0x{:08X}: thumb 0x{:04X} not decoded, skipped",
            fetched.address,
            fetched.word
        );
    }
}
