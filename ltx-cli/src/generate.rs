/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! `generate` mode: connect, run the generate-again loop for a fixed number
//! of chunks and save each chunk as it arrives.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, bail, Context};
use async_broadcast::{Receiver, TryRecvError};
use ltx_cli::cli_args::Generate;
use ltx_cli::config;
use ltx_client::{
    AppState, ClientEvent, ConditioningAssembler, Dispatcher, EventBus, FrameStore, Generation,
    NativeConnector, Orchestrator, Session, SessionOptions,
};
use ltx_codecs::decoder::Vp9Decoder;
use ltx_codecs::encoder::Vp9Encoder;
use ltx_codecs::{open_image_file, PngImageCodec};
use ltx_types::Command;
use tracing::{debug, error, info, warn};

type LtxOrchestrator = Orchestrator<Vp9Encoder, PngImageCodec, Vp9Decoder>;

enum Step {
    Continue,
    Done,
}

pub async fn generate(args: Generate) -> anyhow::Result<()> {
    let settings = config::load(&args)?;
    info!(
        "generating {} chunks of {} frames at {}x{} (seed {})",
        args.chunks, settings.num_frames, settings.width, settings.height, settings.seed
    );
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let bus = EventBus::new();
    let mut events = bus.subscribe();
    let app_state = Rc::new(RefCell::new(AppState::new(settings.clone(), bus.clone())));

    let mut store = FrameStore::new(settings.width, settings.height);
    if let Some(path) = &args.init_image {
        match open_image_file(path)? {
            Some(image) => {
                info!("conditioning the first chunk on {}", path.display());
                store.push_image_data(image);
            }
            None => bail!("{} is not a supported image", path.display()),
        }
    }
    let assembler = ConditioningAssembler::new(Vp9Encoder::default(), PngImageCodec);
    let mut orchestrator =
        Orchestrator::new(store, assembler, Vp9Decoder).with_max_chunks(args.chunks as usize);

    let options = if args.single_in_flight {
        SessionOptions::single_in_flight()
    } else {
        SessionOptions::queued()
    };
    let (connector, mut channel_events) = NativeConnector::new();
    let mut session = Session::new(connector, options, app_state.clone(), bus);
    let mut dispatcher = Dispatcher::new();

    session.connect(&settings.websocket_url)?;
    if args.single_in_flight {
        dispatcher.enqueue([Command::CreatePipeline]);
    }
    dispatcher.enqueue(orchestrator.start(&app_state.borrow())?);
    dispatcher.pump(&mut session)?;

    loop {
        tokio::select! {
            event = channel_events.recv() => {
                let Some(event) = event else {
                    bail!("connection task ended unexpectedly");
                };
                if let Err(e) = session.handle_event(event) {
                    warn!("failed to handle channel event: {e}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, disconnecting");
                session.disconnect();
                dispatcher.clear();
                continue;
            }
        }

        let step = handle_client_events(
            &mut events,
            &app_state,
            &mut orchestrator,
            &mut dispatcher,
            &args.output_dir,
        )?;
        match step {
            Step::Continue => {
                dispatcher.pump(&mut session)?;
            }
            Step::Done => {
                if orchestrator.finished() {
                    info!(
                        "done: {} chunks in {}",
                        orchestrator.chunks_generated(),
                        args.output_dir.display()
                    );
                    return Ok(());
                }
                return Err(anyhow!(
                    "connection lost after {} of {} chunks",
                    orchestrator.chunks_generated(),
                    args.chunks
                ));
            }
        }

        if orchestrator.finished() && session.connected() {
            session.disconnect();
        }
    }
}

fn handle_client_events(
    events: &mut Receiver<ClientEvent>,
    app_state: &Rc<RefCell<AppState>>,
    orchestrator: &mut LtxOrchestrator,
    dispatcher: &mut Dispatcher,
    output_dir: &Path,
) -> anyhow::Result<Step> {
    loop {
        let event = match events.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Overflowed(missed)) => {
                warn!("missed {missed} client events");
                continue;
            }
            Err(_) => return Ok(Step::Continue),
        };
        match event {
            ClientEvent::Connected => info!("connected"),
            ClientEvent::ConnectionError(notice) => error!("{notice}"),
            ClientEvent::ConnectionLost(reason) => {
                info!("{reason}");
                dispatcher.clear();
                return Ok(Step::Done);
            }
            ClientEvent::Reply { reply_to, kind } => {
                debug!("reply {kind:?} to {reply_to:?}");
            }
            ClientEvent::Output(generation) => {
                let index = orchestrator.chunks_generated();
                let path = write_chunk(output_dir, index, &generation)?;
                info!(
                    "chunk {index} saved to {} (skip {} frames)",
                    path.display(),
                    generation.frames_to_skip
                );
                if let Some(commands) = orchestrator.on_output(&app_state.borrow(), &generation)? {
                    dispatcher.enqueue(commands);
                }
            }
            ClientEvent::SettingsChanged(_) => {}
        }
    }
}

fn write_chunk(output_dir: &Path, index: usize, generation: &Generation) -> anyhow::Result<PathBuf> {
    let path = output_dir.join(format!("chunk_{index:04}.ivf"));
    fs::write(&path, &generation.video_bytes)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
