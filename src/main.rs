//! Outbreak entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, PointerEvent};

    use outbreak::highscores::{Leaderboards, format_time, sanitize_name};
    use outbreak::persistence::{LocalStorageStore, MemoryStore, Store};
    use outbreak::platform::{fresh_seed, now_ms};
    use outbreak::renderer::{RenderState, VertexBatch};
    use outbreak::sim::{GamePhase, Outcome, Session};
    use outbreak::Settings;

    /// Game instance holding all state
    struct Game {
        session: Session,
        render_state: Option<RenderState>,
        batch: VertexBatch,
        settings: Settings,
        leaderboards: Leaderboards,
        store: Box<dyn Store>,
        last_time: f64,
    }

    impl Game {
        fn new(arena: Vec2, seed: u64) -> Self {
            let mut store: Box<dyn Store> = match LocalStorageStore::open() {
                Some(store) => Box::new(store),
                None => {
                    log::warn!("LocalStorage unavailable, scores will not persist");
                    Box::new(MemoryStore::default())
                }
            };
            let settings = Settings::load(store.as_ref());
            let leaderboards = Leaderboards::load(store.as_mut(), settings.leaderboard_size);

            Self {
                session: Session::new(arena, &settings, seed),
                render_state: None,
                batch: VertexBatch::new(),
                settings,
                leaderboards,
                store,
                last_time: 0.0,
            }
        }

        fn update(&mut self, dt: f32) {
            if let Some(outcome) = self.session.tick(dt) {
                self.finish(outcome);
            }
        }

        /// Record a finished game, asking for a name only if it places
        fn finish(&mut self, outcome: Outcome) {
            log::info!(
                "Game over: {}/{} saved in {}",
                outcome.survivors,
                outcome.total,
                format_time(outcome.elapsed_secs)
            );
            if !self.leaderboards.qualifies(&outcome) {
                return;
            }

            let raw = web_sys::window()
                .and_then(|w| w.prompt_with_message("New high score! Your name:").ok())
                .flatten()
                .unwrap_or_default();
            let name = sanitize_name(&raw, self.settings.strict_names);

            let placement = self
                .leaderboards
                .record_outcome(&outcome, &name, now_ms());
            log::info!("Placement: {placement:?}");
            if let Err(e) = self.leaderboards.save(self.store.as_mut()) {
                log::warn!("Failed to save leaderboards: {e}");
            }
        }

        fn render(&mut self) {
            let Some(render_state) = self.render_state.as_mut() else {
                return;
            };

            self.batch.clear();
            self.batch.arena_border(self.session.simulation().arena());
            self.session.draw(&mut self.batch);

            match render_state.render(self.batch.vertices()) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    let arena = render_state.arena;
                    render_state.resize(render_state.size.0, render_state.size.1, arena);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if let Some(el) = document.get_element_by_id("status") {
                let text = match self.session.phase() {
                    GamePhase::Attract => "Click to start".to_string(),
                    GamePhase::Playing => format_time(self.session.elapsed()),
                    GamePhase::GameOver => match self.session.outcome() {
                        Some(o) => format!(
                            "{}/{} saved in {}. Click to play again",
                            o.survivors,
                            o.total,
                            format_time(o.elapsed_secs)
                        ),
                        None => "Click to play again".to_string(),
                    },
                };
                el.set_text_content(Some(&text));
            }

            if let Some(el) = document.get_element_by_id("best") {
                let best_score = self
                    .leaderboards
                    .scores
                    .best()
                    .map(|e| format!("{} ({})", e.value, e.name));
                let best_time = self
                    .leaderboards
                    .times
                    .best()
                    .map(|e| format!("{} ({})", format_time(e.value as f32), e.name));
                let text = format!(
                    "Best: {}  Fastest: {}",
                    best_score.as_deref().unwrap_or("-"),
                    best_time.as_deref().unwrap_or("-")
                );
                el.set_text_content(Some(&text));
            }
        }
    }

    /// Size the canvas backing store to the display and return the arena size
    fn fit_canvas(canvas: &HtmlCanvasElement) -> (Vec2, u32, u32) {
        let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
        let client_w = canvas.client_width().max(1);
        let client_h = canvas.client_height().max(1);
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        (Vec2::new(client_w as f32, client_h as f32), width, height)
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Outbreak starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let (arena, width, height) = fit_canvas(&canvas);

        let seed = fresh_seed();
        let game = Rc::new(RefCell::new(Game::new(arena, seed)));
        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = RenderState::new(surface, &adapter, width, height, arena)
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        game.borrow_mut().render_state = Some(render_state);

        setup_input_handlers(&canvas, game.clone());
        setup_resize_handler(canvas, game.clone());

        request_animation_frame(game);

        log::info!("Outbreak running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Press: start a game from the backdrop, otherwise begin a line
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let _ = canvas_clone.set_pointer_capture(event.pointer_id());
                let mut g = game.borrow_mut();
                if g.session.phase() == GamePhase::Playing {
                    g.session
                        .pointer_down(event.offset_x() as f32, event.offset_y() as f32);
                } else {
                    g.session.start();
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Drag
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut g = game.borrow_mut();
                if g.session.pointer_move(event.offset_x() as f32, event.offset_y() as f32) {
                    log::debug!("Line breached while drawing");
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Release, or the pointer leaves the canvas
        for kind in ["pointerup", "pointercancel", "pointerleave"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                game.borrow_mut().session.pointer_up();
            });
            let _ = canvas.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize_handler(canvas: HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let (arena, width, height) = fit_canvas(&canvas);
            let mut g = game.borrow_mut();
            if let Some(render_state) = g.render_state.as_mut() {
                render_state.resize(width, height, arena);
            }
            g.session.resize(arena);
            log::info!("Resized arena to {}x{}", arena.x, arena.y);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Delta time in seconds; the session clamps long frames
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            g.last_time = time;

            g.update(dt);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run().await
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Outbreak (native) starting...");
    log::info!("Native mode runs a headless game - run with `trunk serve` for the web version");

    if let Err(e) = headless::run() {
        log::error!("Headless run failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Untouched game played to completion with the default settings
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use outbreak::Settings;
    use outbreak::consts::{DEFAULT_ARENA_HEIGHT, DEFAULT_ARENA_WIDTH};
    use outbreak::highscores::{Leaderboards, format_time, sanitize_name};
    use outbreak::persistence::{FileStore, StoreError};
    use outbreak::platform::{fresh_seed, now_ms};
    use outbreak::renderer::VertexBatch;
    use outbreak::sim::Session;

    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Give up after ten simulated minutes
    const MAX_FRAMES: u32 = 60 * 600;

    pub fn run() -> Result<(), StoreError> {
        let data_dir = std::env::var("OUTBREAK_DATA_DIR").unwrap_or_else(|_| ".outbreak".into());
        let mut store = FileStore::new(data_dir);
        let mut settings = Settings::load(&store);
        if let Ok(quality) = std::env::var("OUTBREAK_QUALITY") {
            settings.override_quality(&quality);
        }
        let mut leaderboards = Leaderboards::load(&mut store, settings.leaderboard_size);

        let seed = std::env::args()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(fresh_seed);
        let arena = Vec2::new(DEFAULT_ARENA_WIDTH, DEFAULT_ARENA_HEIGHT);
        let mut session = Session::new(arena, &settings, seed);
        log::info!(
            "Seed {seed}, {} balls, {} quality",
            settings.sim.entity_count,
            settings.quality.as_str()
        );

        session.start();
        let mut batch = VertexBatch::new();
        let mut outcome = None;
        for frame in 0..MAX_FRAMES {
            if let Some(o) = session.tick(FRAME_DT) {
                outcome = Some(o);
                break;
            }
            if frame % 600 == 0 {
                batch.clear();
                session.draw(&mut batch);
                log::debug!(
                    "t={} vertices={} particles={}",
                    format_time(session.elapsed()),
                    batch.len(),
                    session.particles().len()
                );
            }
        }

        let Some(outcome) = outcome else {
            log::warn!("No result after {} frames", MAX_FRAMES);
            return Ok(());
        };

        println!(
            "{}/{} saved in {}",
            outcome.survivors,
            outcome.total,
            format_time(outcome.elapsed_secs)
        );

        if leaderboards.qualifies(&outcome) {
            let name = sanitize_name(
                &std::env::var("OUTBREAK_PLAYER").unwrap_or_default(),
                settings.strict_names,
            );
            let placement = leaderboards.record_outcome(&outcome, &name, now_ms());
            log::info!("{name} placed {placement:?}");
            leaderboards.save(&mut store)?;
        }

        for (rank, entry) in leaderboards.scores.entries().iter().enumerate() {
            println!("{:>2}. {:<20} {}", rank + 1, entry.name, entry.value);
        }

        Ok(())
    }
}
