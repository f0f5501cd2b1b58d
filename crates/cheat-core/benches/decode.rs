use cheat_core::{decode, CheatSession, ConsoleBus, HardwareFamily};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_decode(c: &mut Criterion) {
    c.bench_function("decode_genesis_game_genie", |b| {
        b.iter(|| decode(black_box("RFAA-A6VR"), HardwareFamily::MegaDrive))
    });
    c.bench_function("decode_master_game_genie_reference", |b| {
        b.iter(|| decode(black_box("3E5-1AF-2A8"), HardwareFamily::MasterSystem))
    });
}

fn bench_bank_switch(c: &mut Criterion) {
    let rom: Vec<u8> = (0..32 * 0x4000).map(|i: usize| i as u8).collect();
    let mut session = CheatSession::new(ConsoleBus::master_system(rom));
    let codes: Vec<String> = (0..64).map(|i| format!("0080-{:02X}AB", i)).collect();
    session.set_cheat(0, true, &codes.join("+"));

    let mut bank = 0u8;
    c.bench_function("bank_switch_64_patches", |b| {
        b.iter(|| {
            bank = bank.wrapping_add(1) % 32;
            session.write_memory(0xFFFF, bank)
        })
    });
}

criterion_group!(benches, bench_decode, bench_bank_switch);
criterion_main!(benches);
