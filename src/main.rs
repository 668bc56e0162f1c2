use std::{env, error, fs, path::Path, sync::Arc, thread};

use emu::clock::{Clock, ClockSync};
use emu::config::{BusTimings, CpuConfig};
use emu::memory::internal_memory::{InternalMemory, Store};
use emu::{Arm7, Arm7Bus};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed configuration {path}: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },
    #[error("code timing row {row} has a zero wait, the CPU would never consume a tick")]
    ZeroCodeWait { row: usize },
    #[error("usage: casper <image> [config.json] [cycles]")]
    Usage,
    #[error("invalid cycle count {0:?}")]
    Cycles(String),
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct RunnerConfig {
    cpu: CpuConfig,
    timings: BusTimings,
}

impl RunnerConfig {
    fn load(path: &str) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(path, &text)
    }

    /// Every instruction fetch has to wait at least one tick, otherwise the
    /// host would tick a CPU that never consumes.
    fn parse(path: &str, text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|source| ConfigError::Malformed {
            path: path.to_owned(),
            source,
        })?;

        if let Some(row) = config
            .timings
            .code
            .0
            .iter()
            .position(|waits| waits.contains(&0))
        {
            return Err(ConfigError::ZeroCodeWait { row });
        }

        Ok(config)
    }
}

fn read_image(path: &str) -> Result<Vec<u8>, ConfigError> {
    fs::read(Path::new(path)).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })
}

fn main() -> Result<(), Box<dyn error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = env::args().skip(1).collect::<Vec<String>>();
    let image_path = args.first().ok_or(ConfigError::Usage)?;
    let config = match args.get(1) {
        Some(path) => RunnerConfig::load(path)?,
        None => RunnerConfig::default(),
    };
    let cycles = match args.get(2) {
        Some(count) => Some(
            count
                .parse::<u64>()
                .map_err(|_| ConfigError::Cycles(count.clone()))?,
        ),
        None => None,
    };

    let image = read_image(image_path)?;
    tracing::info!("loaded {image_path}, {} bytes", image.len());

    let mut memory = InternalMemory::default();
    memory.load(Store::Bios, 0, &image);

    let clock = Arc::new(ClockSync::new(config.cpu.clock_multiple));
    let bus = Arm7Bus::new(memory, config.timings, Arc::clone(&clock) as Arc<dyn Clock>);
    let mut cpu = Arm7::new(config.cpu, bus)?;
    cpu.reset();

    thread::spawn(move || cpu.run());

    let mut completed = 0;
    while cycles.is_none_or(|limit| completed < limit) {
        clock.tick();
        completed = clock.wait_for_cycle();
    }

    tracing::info!("ran {completed} cycles");
    Ok(())
}
