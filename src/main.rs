//! Nebula Strike headless runner
//!
//! Plays one seeded session on autopilot, logging events as they happen, and
//! prints a JSON summary when the ship is destroyed or the frame limit is hit.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::rc::Rc;
    use std::sync::{Arc, mpsc};
    use std::thread;

    use anyhow::{Context, Result};
    use clap::Parser;
    use glam::Vec2;
    use serde::Serialize;

    use nebula_strike::audio::LogBackend;
    use nebula_strike::consts::FRAME_MS;
    use nebula_strike::lore::{
        LoreTicket, LoreTransport, OfflineLore, PromptedLore, lore_or_fallback,
    };
    use nebula_strike::{
        AudioManager, Cue, CueSink, HostPhase, Lore, LoreBoard, LoreError, LoreSource, Session,
        SessionHooks, Settings,
    };

    #[derive(Parser, Debug)]
    #[command(name = "nebula-strike")]
    #[command(about = "Run a seeded Nebula Strike session on autopilot and print a JSON summary")]
    struct Cli {
        /// Run seed (defaults to the current time)
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long = "frames", default_value_t = 18_000)]
        max_frames: u32,
        /// Simulated wall time per frame (ms)
        #[arg(long, default_value_t = FRAME_MS)]
        frame_ms: f32,
        #[arg(long, default_value_t = 800.0, value_parser = positive_px)]
        width: f32,
        #[arg(long, default_value_t = 600.0, value_parser = positive_px)]
        height: f32,
        /// Settings file; missing or unreadable files fall back to defaults
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Write the effective settings back to --settings
        #[arg(long, requires = "settings")]
        save_settings: bool,
        /// Canned generator reply (JSON) used for every level's lore
        #[arg(long)]
        lore_reply: Option<PathBuf>,
    }

    fn positive_px(s: &str) -> Result<f32, String> {
        let px: f32 = s.parse().map_err(|e| format!("{e}"))?;
        if px.is_finite() && px > 0.0 {
            Ok(px)
        } else {
            Err(format!("arena size must be positive, got {px}"))
        }
    }

    /// Reads a generator reply from disk instead of a remote service
    struct ReplyFile(PathBuf);

    impl LoreTransport for ReplyFile {
        fn complete(&self, _prompt: &str) -> Result<String, LoreError> {
            std::fs::read_to_string(&self.0)
                .map_err(|e| LoreError::Unavailable(format!("{}: {e}", self.0.display())))
        }
    }

    #[derive(Debug, Serialize)]
    struct RunSummary {
        seed: u64,
        frames: u32,
        game_over: bool,
        final_score: u64,
        level: u32,
        health: f32,
        bosses_defeated: usize,
        cues: BTreeMap<&'static str, usize>,
        lore: Lore,
    }

    /// Level-ups seen this frame, waiting for a lore request
    #[derive(Clone, Default)]
    struct Pending(Rc<RefCell<Vec<u32>>>);

    impl SessionHooks for Pending {
        fn on_score(&mut self, score: u64) {
            log::debug!("Score: {score}");
        }

        fn on_level_up(&mut self, level: u32) {
            self.0.borrow_mut().push(level);
        }

        fn on_game_over(&mut self, final_score: u64) {
            log::info!("Ship destroyed, final score {final_score}");
        }
    }

    /// Counts cues before handing them to the mixer
    struct Tally {
        counts: Rc<RefCell<BTreeMap<&'static str, usize>>>,
        inner: AudioManager,
    }

    impl CueSink for Tally {
        fn play(&mut self, cue: Cue) {
            *self.counts.borrow_mut().entry(cue.as_str()).or_default() += 1;
            self.inner.play(cue);
        }
    }

    type LoreReply = (LoreTicket, Result<Lore, LoreError>);

    pub fn run() -> Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .init();

        let cli = Cli::parse();
        let seed = match cli.seed {
            Some(seed) => seed,
            None => std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .context("system clock is before the epoch")?
                .as_millis() as u64,
        };
        let arena = Vec2::new(cli.width, cli.height);

        let settings = match &cli.settings {
            Some(path) => Settings::load(path),
            None => Settings::default(),
        };
        if cli.save_settings {
            if let Some(path) = &cli.settings {
                settings
                    .save(path)
                    .with_context(|| format!("failed to write settings: {}", path.display()))?;
            }
        }

        let lore_source: Arc<dyn LoreSource + Send + Sync> = match cli.lore_reply.clone() {
            Some(path) => Arc::new(PromptedLore::new(ReplyFile(path))),
            None => Arc::new(OfflineLore),
        };

        let mut audio = AudioManager::new(Some(Box::new(LogBackend)));
        audio.apply_settings(&settings);
        let counts = Rc::new(RefCell::new(BTreeMap::new()));
        let pending = Pending::default();

        let mut session = Session::new(seed, settings)
            .with_hooks(Box::new(pending.clone()))
            .with_audio(Box::new(Tally {
                counts: counts.clone(),
                inner: audio,
            }));
        session.set_autopilot(true);

        let mut board = LoreBoard::new();
        let (tx, rx) = mpsc::channel::<LoreReply>();
        let mut fetches = Vec::new();

        session.start(arena);
        let mut frames = 0;
        while frames < cli.max_frames && session.phase() == HostPhase::Playing {
            session.advance(cli.frame_ms, arena);
            frames += 1;

            for level in pending.0.borrow_mut().drain(..) {
                let ticket = board.request(level);
                let tx = tx.clone();
                let source = Arc::clone(&lore_source);
                fetches.push(thread::spawn(move || {
                    let lore = lore_or_fallback(source.as_ref(), level);
                    // Receiver may already be gone at shutdown
                    let _ = tx.send((ticket, Ok(lore)));
                }));
            }
            while let Ok((ticket, result)) = rx.try_recv() {
                if board.resolve(ticket, result) {
                    log::info!("Lore: {}", board.current().title);
                }
            }
        }

        drop(tx);
        for handle in fetches {
            if handle.join().is_err() {
                log::warn!("Lore fetch thread panicked");
            }
        }
        for (ticket, result) in rx.iter() {
            board.resolve(ticket, result);
        }

        let world = session.world();
        let cues = counts.borrow().clone();
        let summary = RunSummary {
            seed,
            frames,
            game_over: session.phase() == HostPhase::GameOver,
            final_score: world.player.score,
            level: world.level,
            health: world.player.health,
            bosses_defeated: cues.get(Cue::BossExplosion.as_str()).copied().unwrap_or(0),
            cues,
            lore: board.current().clone(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to encode summary")?
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Web hosts drive `Session` directly from their animation frame callback
}
