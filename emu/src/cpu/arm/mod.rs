//! # ARM Instruction Set (32-bit)
//!
//! Every ARM instruction is conditional and 32 bits wide. Decoding is done
//! up front by [`decoder`], which fills a 4096 cell table of [`handler`]
//! descriptors. The other submodules hold the handlers themselves, as
//! methods on [`Arm7`](crate::cpu::arm7::Arm7):
//!
//! | Module                   | Instructions                              |
//! |--------------------------|-------------------------------------------|
//! | `data_processing`        | AND..MVN with the 9 shifter operands      |
//! | `psr_transfer`           | MRS, MSR                                  |
//! | `branch`                 | B, BL, BX, BLX                            |
//! | `single_data_transfer`   | LDR/STR, LDRH/STRH/LDRSB/LDRSH, LDRD/STRD, SWP |
//! | `block_data_transfer`    | LDM, STM                                  |
//! | `multiply`               | MUL, MLA, UMULL, UMLAL, SMULL, SMLAL      |
//! | `enhanced_dsp`           | QADD..QDSUB, SMLAxy, SMLAWy, SMULWy, SMLALxy, SMULxy |
//! | `miscellaneous`          | CLZ, SWI, BKPT, undefined                 |

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::cast_lossless)]
pub mod alu_instruction;

#[allow(clippy::cast_possible_truncation)]
pub mod decoder;

pub mod handler;

#[allow(clippy::cast_possible_truncation)]
mod block_data_transfer;

mod branch;

#[allow(clippy::cast_possible_truncation)]
mod data_processing;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::similar_names)]
mod enhanced_dsp;

mod miscellaneous;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::similar_names)]
mod multiply;

#[allow(clippy::cast_possible_truncation)]
mod psr_transfer;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::similar_names)]
mod single_data_transfer;
