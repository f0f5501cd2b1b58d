//! Cheat CLI - decode cheat codes and bake ROM patches into images

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use cheat_core::bus::WORK_RAM_START;
use cheat_core::cartridge::{MAPPER_REGISTER_BASE, SLOT_COUNT};
use cheat_core::{decode, CheatSession, ConsoleBus, EngineConfig, HardwareFamily, CODE_JOINER, MAX_CHEATS};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Cheat code tool for Sega 8/16-bit ROMs
#[derive(Parser, Debug)]
#[command(name = "cheat-cli")]
#[command(about = "Decode cheat codes and apply ROM patches", long_about = None)]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the address, data and reference encoded by each code
    Decode {
        /// Console family the codes are written for
        #[arg(short, long, value_enum)]
        family: Family,

        /// Codes to decode; several may be joined with '+'
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Write a copy of a ROM image with the ROM patches applied
    Patch {
        /// Console family the ROM and codes are for
        #[arg(short, long, value_enum)]
        family: Family,

        /// Path to the raw ROM image
        #[arg(short, long)]
        rom: PathBuf,

        /// Where to write the patched image
        #[arg(short, long)]
        out: PathBuf,

        /// Mapper slot selection applied before patching, as SLOT=BANK
        #[arg(short, long = "bank", value_parser = parse_bank)]
        banks: Vec<(usize, u8)>,

        /// Maximum number of cheat entries
        #[arg(long, default_value_t = MAX_CHEATS)]
        capacity: usize,

        /// Codes to apply; several may be joined with '+'
        #[arg(required = true)]
        codes: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Family {
    /// Mega Drive / Genesis
    Md,
    /// Master System / Game Gear
    Sms,
}

impl From<Family> for HardwareFamily {
    fn from(family: Family) -> Self {
        match family {
            Family::Md => HardwareFamily::MegaDrive,
            Family::Sms => HardwareFamily::MasterSystem,
        }
    }
}

fn parse_bank(value: &str) -> Result<(usize, u8), String> {
    let (slot, bank) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SLOT=BANK, got '{}'", value))?;
    let slot: usize = slot.trim().parse().map_err(|e| format!("bad slot: {}", e))?;
    let bank: u8 = bank.trim().parse().map_err(|e| format!("bad bank: {}", e))?;
    if slot >= SLOT_COUNT {
        return Err(format!("slot must be below {}", SLOT_COUNT));
    }
    Ok((slot, bank))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Decode { family, codes } => {
            decode_codes(family.into(), &codes);
            Ok(())
        }
        Command::Patch {
            family,
            rom,
            out,
            banks,
            capacity,
            codes,
        } => patch_rom(family.into(), &rom, &out, &banks, capacity, &codes),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn decode_codes(family: HardwareFamily, codes: &[String]) {
    for piece in codes.iter().flat_map(|code| code.split(CODE_JOINER)) {
        match decode(piece, family) {
            Ok(code) => {
                let reference = code
                    .reference
                    .map_or_else(|| "--".to_string(), |r| format!("${:02X}", r));
                println!(
                    "{:<12} address ${:06X}  data ${:04X}  ref {}  len {}",
                    piece, code.address, code.data, reference, code.len
                );
            }
            Err(e) => println!("{:<12} rejected: {}", piece, e),
        }
    }
}

fn patch_rom(
    family: HardwareFamily,
    rom_path: &Path,
    out: &Path,
    banks: &[(usize, u8)],
    capacity: usize,
    codes: &[String],
) -> anyhow::Result<()> {
    let rom = fs::read(rom_path).with_context(|| format!("failed to read ROM {}", rom_path.display()))?;
    if rom.is_empty() {
        bail!("ROM {} is empty", rom_path.display());
    }

    if !banks.is_empty() && family == HardwareFamily::MegaDrive {
        bail!("--bank only applies to Master System ROMs");
    }

    let bus = match family {
        HardwareFamily::MegaDrive => ConsoleBus::mega_drive(rom),
        HardwareFamily::MasterSystem => ConsoleBus::master_system(rom),
    };
    let mut session = CheatSession::with_config(bus, EngineConfig { capacity });
    for &(slot, bank) in banks {
        session.write_memory(MAPPER_REGISTER_BASE + slot as u32, bank);
    }

    for (index, code) in codes.iter().enumerate() {
        let summary = session.set_cheat(index, true, code);
        if summary.rejected > 0 {
            tracing::warn!(code = code.as_str(), rejected = summary.rejected, "some codes were not recognized");
        }
        if summary.dropped > 0 {
            tracing::warn!(code = code.as_str(), dropped = summary.dropped, "cheat table full");
        }
    }

    let rom_size = session.bus().cartridge().size();
    let mut applied = 0;
    for entry in session.cheats().entries() {
        if entry.address >= WORK_RAM_START {
            println!("${:06X}: RAM patch, cannot be stored in a ROM image", entry.address);
        } else if entry.live.is_some() {
            applied += 1;
        } else if (entry.address as usize) < rom_size {
            println!("${:06X}: reference does not match the mapped bank, not applied", entry.address);
        } else {
            println!("${:06X}: outside the {} byte ROM, not applied", entry.address, rom_size);
        }
    }

    let bus = session.into_bus();
    fs::write(out, bus.cartridge().rom()).with_context(|| format!("failed to write {}", out.display()))?;
    println!("Applied {} ROM patches, wrote {}", applied, out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bank() {
        assert_eq!(parse_bank("2=5"), Ok((2, 5)));
        assert_eq!(parse_bank(" 0 = 31 "), Ok((0, 31)));
        assert!(parse_bank("3=1").is_err());
        assert!(parse_bank("2").is_err());
        assert!(parse_bank("1=300").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["cheat-cli", "decode", "-f", "sms", "3E5-1AF+C010:63"]).unwrap();
        match args.command {
            Command::Decode { family, codes } => {
                assert!(matches!(family, Family::Sms));
                assert_eq!(codes, vec!["3E5-1AF+C010:63".to_string()]);
            }
            _ => panic!("expected decode"),
        }
    }
}
