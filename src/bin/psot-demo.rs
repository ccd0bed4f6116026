// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! psot-demo entry point
//!
//! Runs the ordering-table engine on the headless GPU. Without a scene it
//! builds the moving-squares demo: one flat quad per slot, stacked at the
//! origin, each smaller than the last. Pad 1 is driven by an input script.

use std::path::{Path, PathBuf};

use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use psot::core::config::{env_path, EngineConfig, ENV_ASSETS, ENV_BIOS};
use psot::core::controller::{InputSource, VirtualPad};
use psot::core::engine::Engine;
use psot::core::error::{EngineError, Result};
use psot::core::gpu::{GpuBackend, HeadlessGpu};
use psot::core::memcard::{HostCard, MemoryCard};
use psot::core::scene::{moving_squares, Scene, SlotLayoutRecord};
use psot::core::storage::HostStorage;
use psot::core::texture::TextureCache;
use psot::frontend::snapshot::{save_png, write_trace};
use psot::frontend::{InputScript, PacedGpu, ScriptedInput};

/// Name of the slot layout record on the memory card
const CARD_RECORD: &str = "test";

/// Frames run when neither `--frames` nor a script says otherwise
const DEFAULT_FRAMES: u64 = 300;

#[derive(Parser, Debug)]
#[command(name = "psot-demo")]
#[command(version, about = "Ordering table primitive engine demo", long_about = None)]
struct Cli {
    /// Engine configuration (TOML); defaults to $PSOT_CONFIG
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scene description (TOML); without it the moving-squares demo runs
    #[arg(short, long)]
    scene: Option<PathBuf>,

    /// Controller input script (TOML)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Number of frames to run
    #[arg(short, long)]
    frames: Option<u64>,

    /// Root directory for texture paths; defaults to $PSOT_ASSETS
    #[arg(long)]
    assets: Option<PathBuf>,

    /// BIOS image used for PAL/NTSC detection; defaults to $PSOT_BIOS
    #[arg(long)]
    bios: Option<PathBuf>,

    /// Directory acting as the memory card; slot positions are restored from
    /// and saved to it
    #[arg(long)]
    card: Option<PathBuf>,

    /// Write the last displayed frame as PNG
    #[arg(long)]
    png: Option<PathBuf>,

    /// Write the draw commands of the last frame as JSON
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Pace frames at the video field rate
    #[arg(long)]
    realtime: bool,

    /// Number of slots for the moving-squares demo
    #[arg(short, long)]
    primitives: Option<usize>,
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::from_env()?,
    };

    let scene = cli.scene.as_deref().map(Scene::load).transpose()?;
    if let Some(scene) = &scene {
        config.engine.primitives = scene.slots.len();
    }
    if let Some(primitives) = cli.primitives {
        config.engine.primitives = primitives;
    }

    let bios = match cli.bios.clone().or_else(|| env_path(ENV_BIOS)) {
        Some(path) => Some(read_host_file(&path)?),
        None => None,
    };

    let gpu = if cli.realtime {
        run(&cli, config, scene.as_ref(), bios.as_deref(), PacedGpu::new(HeadlessGpu::new()))?
            .into_inner()
    } else {
        run(&cli, config, scene.as_ref(), bios.as_deref(), HeadlessGpu::new())?
    };

    if let Some(path) = &cli.png {
        save_png(&gpu, path)?;
    }
    if let Some(path) = &cli.trace {
        write_trace(&gpu, path)?;
    }

    Ok(())
}

/// Build the session, run the frame loop and hand the GPU back
fn run<G: GpuBackend>(
    cli: &Cli,
    config: EngineConfig,
    scene: Option<&Scene>,
    bios: Option<&[u8]>,
    gpu: G,
) -> Result<G> {
    let mut engine = Engine::with_bios(config, gpu, bios)?;

    match scene {
        Some(scene) => load_scene(cli, &mut engine, scene)?,
        None => {
            let mut rng = SmallRng::seed_from_u64(engine.config().engine.seed);
            for (slot, param) in moving_squares(engine.ot_size(), &mut rng)
                .into_iter()
                .enumerate()
            {
                engine.set_param(slot, param)?;
            }
            engine.populate_ot();
        }
    }

    let mut card = cli
        .card
        .as_ref()
        .map(|dir| MemoryCard::new(HostCard::new(dir), engine.config().card.poll_limit));
    if let Some(card) = &mut card {
        let len = SlotLayoutRecord::len_for(engine.ot_size());
        match card.read_record(CARD_RECORD, len) {
            Ok(bytes) => {
                let restored = SlotLayoutRecord::decode(&bytes)?.restore(engine.params_mut());
                log::info!("Restored {} slot positions from memory card", restored);
                engine.populate_ot();
            }
            Err(err) => log::warn!("No saved layout: {}", err),
        }
    }

    let (mut input, frames): (Box<dyn InputSource>, u64) = match &cli.script {
        Some(path) => {
            let script = InputScript::load(path)?;
            let frames = cli.frames.unwrap_or_else(|| script.total_frames());
            (Box::new(ScriptedInput::new(&script)?), frames)
        }
        None => (
            Box::new(VirtualPad::new()),
            cli.frames.unwrap_or(DEFAULT_FRAMES),
        ),
    };

    let title = match scene {
        Some(_) => "Ordering Table Engine",
        None => "Ordering Table Example",
    };
    log::info!("Running {} frames", frames);
    for _ in 0..frames {
        engine.set_message(title, "Moving Square", engine.selected_slot() as u32);
        engine.run_frame(input.as_mut())?;
    }

    if let Some(card) = &mut card {
        let record = SlotLayoutRecord::capture(engine.params());
        card.write_record(CARD_RECORD, &record.encode())?;
    }

    log::info!(
        "Finished after {} frames, slot {} selected",
        engine.frames(),
        engine.selected_slot()
    );
    Ok(engine.into_gpu())
}

/// Apply a scene and upload its textures
fn load_scene<G: GpuBackend>(cli: &Cli, engine: &mut Engine<G>, scene: &Scene) -> Result<()> {
    let written = scene.apply(engine.params_mut())?;
    log::info!("Scene defines {} of {} slots", written, engine.ot_size());

    let root = cli
        .assets
        .clone()
        .or_else(|| env_path(ENV_ASSETS))
        .unwrap_or_else(|| PathBuf::from("."));
    let mut storage = HostStorage::new(root);

    let blobs = scene
        .texture_paths()
        .into_iter()
        .map(|path| {
            path.map(|path| TextureCache::load_image_from_storage(&mut storage, path))
                .transpose()
        })
        .collect::<Result<Vec<_>>>()?;
    let sources: Vec<Option<&[u8]>> = blobs.iter().map(Option::as_deref).collect();

    engine.populate_ot();
    let report = engine.populate_tpage(&sources)?;
    if !report.failed.is_empty() {
        log::warn!("{} textures failed to upload", report.failed.len());
    }
    Ok(())
}

fn read_host_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| EngineError::Storage {
        path: path.to_path_buf(),
        source,
    })
}
