//! Skyraid entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::f64::consts::TAU;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, Response};

    use skyraid::audio::AudioManager;
    use skyraid::consts::*;
    use skyraid::render::{DrawCommand, HudSnapshot, draw_list, shake_intensity};
    use skyraid::sim::{Action, ItemKind, MapDocument, MapLibrary, TileKind};
    use skyraid::{Game, MapError, Settings};

    /// Map documents are served next to the page
    const MAP_URL_PREFIX: &str = "maps/";

    /// Fetch one map document as text and parse it
    async fn fetch_map(name: &str) -> Result<MapDocument, MapError> {
        let fetch_error = |reason: String| MapError::Fetch {
            name: name.to_string(),
            reason,
        };
        let window = web_sys::window().ok_or_else(|| fetch_error("no window".into()))?;
        let url = format!("{MAP_URL_PREFIX}{name}.json");

        let response = JsFuture::from(window.fetch_with_str(&url))
            .await
            .map_err(|e| fetch_error(format!("{e:?}")))?;
        let response: Response = response
            .dyn_into()
            .map_err(|_| fetch_error("not a Response".into()))?;
        if !response.ok() {
            return Err(fetch_error(format!("HTTP {}", response.status())));
        }
        let text = response.text().map_err(|e| fetch_error(format!("{e:?}")))?;
        let text = JsFuture::from(text)
            .await
            .map_err(|e| fetch_error(format!("{e:?}")))?
            .as_string()
            .ok_or_else(|| fetch_error("body is not text".into()))?;
        MapDocument::from_json(name, &text)
    }

    /// Fetch every map in the cycle, then build the library all-or-nothing
    async fn load_library(order: &[String]) -> MapLibrary {
        let mut fetched: HashMap<String, Result<MapDocument, MapError>> = HashMap::new();
        for name in order {
            if !fetched.contains_key(name) {
                fetched.insert(name.clone(), fetch_map(name).await);
            }
        }
        MapLibrary::load_with(order, |name| {
            fetched
                .remove(name)
                .unwrap_or_else(|| Err(MapError::UnknownMap(name.to_string())))
        })
    }

    /// Settings embedded in the page as `<script id="settings" type="application/json">`
    fn page_settings(document: &web_sys::Document) -> Settings {
        document
            .get_element_by_id("settings")
            .and_then(|el| el.text_content())
            .map(|json| Settings::from_json(&json))
            .unwrap_or_default()
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {e}").into());
        }

        log::info!("Skyraid starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document available");
            return;
        };
        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("Canvas element not found");
            return;
        };
        canvas.set_width(FIELD_WIDTH as u32);
        canvas.set_height(FIELD_HEIGHT as u32);
        let Some(ctx) = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
        else {
            log::error!("2D canvas context unavailable");
            return;
        };

        let settings = page_settings(&document);
        let library = Rc::new(load_library(&settings.map_cycle).await);
        let seed = settings.seed.unwrap_or_else(|| js_sys::Date::now() as u64);
        let game = Rc::new(RefCell::new(Game::new(
            seed,
            library,
            settings,
            Box::new(AudioManager::new()),
        )));

        setup_input_handlers(&canvas, game.clone());
        setup_auto_release(game.clone());
        request_animation_frame(game, Rc::new(ctx));

        log::info!("Skyraid running!");
    }

    fn key_action(code: &str) -> Option<Action> {
        match code {
            "ArrowLeft" | "KeyA" => Some(Action::MoveLeft),
            "ArrowRight" | "KeyD" => Some(Action::MoveRight),
            "ArrowUp" | "KeyW" => Some(Action::MoveUp),
            "ArrowDown" | "KeyS" => Some(Action::MoveDown),
            "Space" => Some(Action::Fire),
            "KeyB" => Some(Action::Bomb),
            _ => None,
        }
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Key down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let code = event.code();
                let mut g = game.borrow_mut();
                if let Some(action) = key_action(&code) {
                    event.prevent_default();
                    g.set_action(action, true);
                }
                if event.repeat() {
                    return;
                }
                match code.as_str() {
                    "KeyR" | "Space" if g.state().is_game_over() => g.request_restart(),
                    "KeyM" => {
                        g.toggle_music();
                    }
                    "Minus" | "NumpadSubtract" => {
                        g.adjust_music_volume(-1);
                    }
                    "Equal" | "NumpadAdd" => {
                        g.adjust_music_volume(1);
                    }
                    _ => {}
                }
                g.on_gesture();
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(action) = key_action(&event.code()) {
                    game.borrow_mut().set_action(action, false);
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Click / tap starts or resumes play
        for event_name in ["mousedown", "touchstart"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                event.prevent_default();
                game.borrow_mut().on_gesture();
            });
            let _ = canvas
                .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Drop held keys when the tab is hidden so the ship does not keep moving
    fn setup_auto_release(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                game.borrow_mut().release_actions();
                log::info!("Released input (tab hidden)");
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>, ctx: Rc<CanvasRenderingContext2d>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, ctx, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, ctx: Rc<CanvasRenderingContext2d>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.frame(time);
            render(&ctx, &g);
            update_hud(&g.hud());
        }

        request_animation_frame(game, ctx);
    }

    fn tile_color(kind: &TileKind) -> &'static str {
        match kind {
            TileKind::Hub => "#c0392b",
            TileKind::Turret => "#e67e22",
            TileKind::Research => "#8e44ad",
            TileKind::Fuel => "#f1c40f",
            TileKind::Sensor => "#16a085",
            TileKind::Cargo => "#7f8c8d",
            TileKind::Continent | TileKind::Other(_) => "#2c3e50",
        }
    }

    fn item_color(kind: ItemKind) -> &'static str {
        match kind {
            ItemKind::TripleFire => "#f39c12",
            ItemKind::Shield => "#3498db",
            ItemKind::BombRefill => "#e74c3c",
            ItemKind::LifeUp => "#2ecc71",
        }
    }

    const ENEMY_COLORS: [&str; 3] = ["#e74c3c", "#9b59b6", "#1abc9c"];

    fn fill_circle(ctx: &CanvasRenderingContext2d, x: f32, y: f32, r: f32) {
        ctx.begin_path();
        let _ = ctx.arc(x as f64, y as f64, r.max(0.0) as f64, 0.0, TAU);
        ctx.fill();
    }

    fn fill_box(ctx: &CanvasRenderingContext2d, x: f32, y: f32, half_w: f32, half_h: f32) {
        ctx.fill_rect(
            (x - half_w) as f64,
            (y - half_h) as f64,
            (half_w * 2.0) as f64,
            (half_h * 2.0) as f64,
        );
    }

    /// Draw the current frame
    fn render(ctx: &CanvasRenderingContext2d, game: &Game) {
        let state = game.state();
        ctx.set_fill_style_str("#05070f");
        ctx.fill_rect(0.0, 0.0, FIELD_WIDTH as f64, FIELD_HEIGHT as f64);

        ctx.save();
        let shake = if game.settings().effective_screen_shake() {
            shake_intensity(state) as f64
        } else {
            0.0
        };
        if shake > 0.0 {
            let dx = (js_sys::Math::random() - 0.5) * 2.0 * shake;
            let dy = (js_sys::Math::random() - 0.5) * 2.0 * shake;
            let _ = ctx.translate(dx, dy);
        }

        for command in draw_list(state) {
            match command {
                DrawCommand::Star { pos, radius } => {
                    ctx.set_fill_style_str("#9aa4c7");
                    fill_circle(ctx, pos.x, pos.y, radius);
                }
                DrawCommand::Tile { pos, size, kind } => {
                    ctx.set_fill_style_str(tile_color(&kind));
                    ctx.fill_rect(pos.x as f64, pos.y as f64, size as f64, size as f64);
                }
                DrawCommand::Item { pos, radius, kind } => {
                    ctx.set_fill_style_str(item_color(kind));
                    fill_circle(ctx, pos.x, pos.y, radius);
                }
                DrawCommand::Enemy { pos, half, variant } => {
                    ctx.set_fill_style_str(ENEMY_COLORS[variant as usize % ENEMY_COLORS.len()]);
                    fill_box(ctx, pos.x, pos.y, half.x, half.y);
                }
                DrawCommand::Boss {
                    pos,
                    half,
                    hp_fraction,
                } => {
                    ctx.set_fill_style_str("#6c3483");
                    fill_box(ctx, pos.x, pos.y, half.x, half.y);
                    ctx.set_fill_style_str("#e74c3c");
                    ctx.fill_rect(
                        (pos.x - half.x) as f64,
                        (pos.y - half.y - 8.0) as f64,
                        (half.x * 2.0 * hp_fraction) as f64,
                        4.0,
                    );
                }
                DrawCommand::EnemyBullet { pos, radius, .. } => {
                    ctx.set_fill_style_str("#ff6b6b");
                    fill_circle(ctx, pos.x, pos.y, radius);
                }
                DrawCommand::Bullet { pos, radius } => {
                    ctx.set_fill_style_str("#f9e79f");
                    fill_circle(ctx, pos.x, pos.y, radius);
                }
                DrawCommand::Player {
                    pos,
                    half,
                    shielded,
                    shield_flash,
                } => {
                    ctx.set_fill_style_str("#5dade2");
                    fill_box(ctx, pos.x, pos.y, half.x, half.y);
                    if shielded || shield_flash > 0 {
                        ctx.set_global_alpha(if shielded { 0.35 } else { 0.7 });
                        ctx.set_fill_style_str(if shielded { "#85c1e9" } else { "#ffffff" });
                        fill_circle(ctx, pos.x, pos.y, half.x.max(half.y) + 6.0);
                        ctx.set_global_alpha(1.0);
                    }
                }
                DrawCommand::Bomb { pos, radius } => {
                    ctx.set_global_alpha(0.3);
                    ctx.set_fill_style_str("#ffffff");
                    fill_circle(ctx, pos.x, pos.y, radius);
                    ctx.set_global_alpha(1.0);
                }
            }
        }
        ctx.restore();
    }

    fn set_text(document: &web_sys::Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &web_sys::Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    /// Update HUD elements in DOM
    fn update_hud(hud: &HudSnapshot) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        set_text(&document, "hud-score", &hud.score.to_string());
        set_text(&document, "hud-lives", &hud.lives.to_string());
        set_text(
            &document,
            "hud-bombs",
            &format!("{}/{}", hud.bomb_count, hud.bomb_max),
        );
        set_text(&document, "hud-map", &hud.map_name);
        match hud.boss {
            Some(boss) => {
                set_visible(&document, "hud-boss", true);
                set_text(&document, "hud-boss", &format!("{}/{}", boss.hp, boss.hp_max));
            }
            None => set_visible(&document, "hud-boss", false),
        }
        let warning = hud.boss_warning_ms.is_some_and(|ms| ms < 2000.0);
        set_visible(&document, "boss-warning", warning);

        set_visible(&document, "start-prompt", hud.waiting_for_gesture);
        set_visible(&document, "game-over", hud.game_over);
        if let Some(score) = hud.final_score {
            set_text(&document, "final-score", &score.to_string());
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Skyraid (native) starting...");
    log::info!("Native mode runs a headless demo - run with `trunk serve` for the web version");

    let mut args = std::env::args().skip(1);
    let map_dir = std::path::PathBuf::from(args.next().unwrap_or_else(|| "maps".into()));
    let settings = match args.next() {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => skyraid::Settings::from_json(&json),
            Err(e) => {
                log::warn!("Could not read settings {}: {}", path, e);
                skyraid::Settings::default()
            }
        },
        None => skyraid::Settings::default(),
    };

    let library = skyraid::sim::MapLibrary::load_with(&settings.map_cycle, |name| {
        let path = map_dir.join(format!("{name}.json"));
        let json = std::fs::read_to_string(&path)?;
        skyraid::sim::MapDocument::from_json(name, &json)
    });

    demo::run(settings, library);
}

/// Scripted headless run: weave, fire constantly, bomb now and then
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::rc::Rc;

    use skyraid::audio::NullAudio;
    use skyraid::consts::SIM_DT_MS;
    use skyraid::sim::{Action, MapLibrary, awaiting_gesture};
    use skyraid::{Game, Settings};

    /// Two minutes of play at 60 Hz
    const DEMO_TICKS: u32 = 60 * 120;

    pub fn run(settings: Settings, library: MapLibrary) {
        let seed = settings.seed.unwrap_or(1);
        let mut game = Game::new(seed, Rc::new(library), settings, Box::new(NullAudio));
        game.set_action(Action::Fire, true);

        let mut time = 0.0;
        for i in 0..DEMO_TICKS {
            if awaiting_gesture(game.state()) {
                game.on_gesture();
            }
            if game.state().is_game_over() {
                log::info!("Demo run ended at tick {}", i);
                break;
            }
            let left = (i / 90) % 2 == 0;
            game.set_action(Action::MoveLeft, left);
            game.set_action(Action::MoveRight, !left);
            game.set_action(Action::Bomb, i % 600 == 599);

            time += SIM_DT_MS;
            game.frame(time);
        }

        let hud = game.hud();
        log::info!(
            "Demo finished: score {}, lives {}, kills {}, map {}",
            hud.score,
            hud.lives,
            game.state().enemies_killed,
            hud.map_name
        );
        println!("{}", hud.to_json());
    }
}
