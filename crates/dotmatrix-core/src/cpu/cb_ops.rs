use crate::bus::Bus;

use super::cpu::{Cpu, Flag, R8};

#[inline]
fn decode_r8(opcode: u8) -> R8 {
    match opcode & 0x07 {
        0x0 => R8::B,
        0x1 => R8::C,
        0x2 => R8::D,
        0x3 => R8::E,
        0x4 => R8::H,
        0x5 => R8::L,
        0x6 => R8::HlInd,
        _ => R8::A,
    }
}

/// Read-modify-write forms pay for both memory accesses on (HL).
#[inline]
fn rmw_mcycles(r: R8) -> u32 {
    if matches!(r, R8::HlInd) {
        4
    } else {
        2
    }
}

/// BIT only reads, so the (HL) form is one M-cycle cheaper.
#[inline]
fn bit_mcycles(r: R8) -> u32 {
    if matches!(r, R8::HlInd) {
        3
    } else {
        2
    }
}

/// CB-prefixed (0xCBxx) dispatch. Returns M-cycles (prefix fetch included).
pub fn exec(cpu: &mut Cpu, bus: &mut Bus, opcode: u8) -> u32 {
    let r = decode_r8(opcode);

    match opcode {
        // Rotates, shifts, SWAP
        0x00..=0x3F => {
            let v = cpu.read_r8(bus, r);
            let carry_in = cpu.flag(Flag::C) as u8;

            let (res, carry_out) = match (opcode >> 3) & 0x07 {
                // RLC
                0x0 => (v.rotate_left(1), (v & 0x80) != 0),
                // RRC
                0x1 => (v.rotate_right(1), (v & 0x01) != 0),
                // RL: 9-bit rotate through carry
                0x2 => ((v << 1) | carry_in, (v & 0x80) != 0),
                // RR
                0x3 => ((v >> 1) | (carry_in << 7), (v & 0x01) != 0),
                // SLA: bit 0 cleared
                0x4 => (v << 1, (v & 0x80) != 0),
                // SRA: bit 7 preserved (arithmetic shift)
                0x5 => ((v >> 1) | (v & 0x80), (v & 0x01) != 0),
                // SWAP: nibble exchange, carry cleared
                0x6 => (v.rotate_right(4), false),
                // SRL: bit 7 cleared
                _ => (v >> 1, (v & 0x01) != 0),
            };

            cpu.write_r8(bus, r, res);

            cpu.set_flag(Flag::Z, res == 0);
            cpu.set_flag(Flag::N, false);
            cpu.set_flag(Flag::H, false);
            cpu.set_flag(Flag::C, carry_out);

            rmw_mcycles(r)
        }

        // BIT b,r: Z from the tested bit, C untouched.
        0x40..=0x7F => {
            let bit = (opcode >> 3) & 0x07;
            let v = cpu.read_r8(bus, r);
            cpu.set_flag(Flag::Z, (v & (1 << bit)) == 0);
            cpu.set_flag(Flag::N, false);
            cpu.set_flag(Flag::H, true);
            bit_mcycles(r)
        }

        // RES b,r: no flags.
        0x80..=0xBF => {
            let bit = (opcode >> 3) & 0x07;
            let v = cpu.read_r8(bus, r);
            cpu.write_r8(bus, r, v & !(1 << bit));
            rmw_mcycles(r)
        }

        // SET b,r: no flags.
        0xC0..=0xFF => {
            let bit = (opcode >> 3) & 0x07;
            let v = cpu.read_r8(bus, r);
            cpu.write_r8(bus, r, v | (1 << bit));
            rmw_mcycles(r)
        }
    }
}
