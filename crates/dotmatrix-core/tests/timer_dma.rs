use dotmatrix_core::bus::Bus;
use dotmatrix_core::cartridge::Cartridge;
use dotmatrix_core::cpu::Cpu;

fn make_rom() -> Vec<u8> {
    let mut rom = vec![0u8; 0x8000];
    rom[0x0148] = 0x00; // 32KB
    rom
}

fn make_bus() -> Bus {
    Bus::new(Cartridge::from_rom(make_rom()).unwrap())
}

#[test]
fn div_increments_and_resets_on_write() {
    let mut bus = make_bus();

    assert_eq!(bus.read8(0xFF04), 0x00);

    bus.tick(256);
    assert_eq!(bus.read8(0xFF04), 0x01);

    bus.write8(0xFF04, 0xAB); // any value resets
    assert_eq!(bus.read8(0xFF04), 0x00);
}

#[test]
fn div_write_triggers_tima_on_falling_edge() {
    let mut bus = make_bus();

    // Enable timer at 16-cycle rate (input bit 3).
    bus.write8(0xFF07, 0x05);
    bus.write8(0xFF05, 0x00);

    // Counter=8 => selected input bit is high.
    bus.tick(8);
    bus.write8(0xFF04, 0x00);

    // DIV reset creates old=1 -> new=0, so TIMA increments.
    assert_eq!(bus.read8(0xFF05), 0x01);
}

#[test]
fn tima_increment_rates_follow_tac() {
    // TAC frequency select -> T-cycles per TIMA increment.
    for (tac, period) in [(0x04u8, 1024u32), (0x05, 16), (0x06, 64), (0x07, 256)] {
        let mut bus = make_bus();
        bus.write8(0xFF07, tac);

        bus.tick(period - 1);
        assert_eq!(bus.read8(0xFF05), 0x00, "TAC={tac:#04x} too early");

        bus.tick(1);
        assert_eq!(bus.read8(0xFF05), 0x01, "TAC={tac:#04x}");

        bus.tick(period);
        assert_eq!(bus.read8(0xFF05), 0x02, "TAC={tac:#04x} second period");
    }
}

#[test]
fn tima_does_not_count_when_disabled() {
    let mut bus = make_bus();

    bus.write8(0xFF07, 0x01); // fastest rate but bit 2 clear
    bus.tick(4096);
    assert_eq!(bus.read8(0xFF05), 0x00);
}

#[test]
fn tac_write_triggers_tima_on_falling_edge() {
    let mut bus = make_bus();

    bus.write8(0xFF05, 0x00);
    bus.write8(0xFF07, 0x05); // enabled, input bit 3
    bus.tick(8); // selected input bit is high

    // Disabling the timer drops the input: one increment.
    bus.write8(0xFF07, 0x00);
    assert_eq!(bus.read8(0xFF05), 0x01);
}

#[test]
fn tima_overflow_reloads_tma_and_requests_interrupt() {
    let mut bus = make_bus();

    bus.write8(0xFF06, 0xAB); // TMA
    bus.write8(0xFF05, 0xFF); // TIMA
    bus.write8(0xFF07, 0x05); // enable + fastest

    bus.tick(16);

    assert_eq!(bus.read8(0xFF05), 0xAB);
    assert_ne!(bus.iflag & (1 << 2), 0);
}

#[test]
fn timer_interrupt_can_be_serviced_by_cpu() {
    let mut bus = make_bus();
    let mut cpu = Cpu::new();

    cpu.pc = 0x1234;
    cpu.sp = 0xFFFE;
    cpu.ime = true;

    bus.ie = 1 << 2; // Timer

    bus.write8(0xFF06, 0x77);
    bus.write8(0xFF05, 0xFF);
    bus.write8(0xFF07, 0x05);

    bus.tick(16);
    assert_ne!(bus.iflag & (1 << 2), 0);

    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 5);
    assert_eq!(cpu.pc, 0x0050);
    assert_eq!(bus.iflag & (1 << 2), 0);

    assert_eq!(cpu.sp, 0xFFFC);
    assert_eq!(bus.read8(0xFFFC), 0x34);
    assert_eq!(bus.read8(0xFFFD), 0x12);
}

#[test]
fn oam_dma_copies_0xa0_bytes() {
    let mut bus = make_bus();

    for i in 0..0xA0u16 {
        bus.write8(0xC000 + i, i as u8);
    }

    bus.write8(0xFF46, 0xC0);

    for i in 0..0xA0u16 {
        assert_eq!(bus.read8(0xFE00 + i), i as u8);
    }
}

#[test]
fn oam_dma_reads_through_cartridge_banking() {
    // Put a recognizable pattern at the start of ROM bank 1.
    let mut rom = make_rom();
    for i in 0..0xA0usize {
        rom[0x4000 + i] = (0xA0 - i) as u8;
    }
    let mut bus = Bus::new(Cartridge::from_rom(rom).unwrap());

    bus.write8(0xFF46, 0x40);

    for i in 0..0xA0u16 {
        assert_eq!(bus.read8(0xFE00 + i), (0xA0 - i as usize) as u8);
    }
}

#[test]
fn oam_dma_charges_160_mcycles_to_the_cpu() {
    let mut bus = make_bus();
    let mut cpu = Cpu::new();

    // LD A,0xC0 ; LDH (0x46),A -- run it from WRAM.
    bus.write8(0xC100, 0x3E);
    bus.write8(0xC101, 0xC0);
    bus.write8(0xC102, 0xE0);
    bus.write8(0xC103, 0x46);
    cpu.pc = 0xC100;

    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 2);

    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 3 + 160, "transfer cost lands on the writing instruction");

    // The timer ran through the stall: 163 M-cycles into DIV territory.
    // (2 + 163) * 4 = 660 T-cycles => DIV = 660 / 256 = 2.
    assert_eq!(bus.read8(0xFF04), 0x02);
}
