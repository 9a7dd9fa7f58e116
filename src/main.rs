//! Brickfall entry point
//!
//! Browser build drives the simulation from requestAnimationFrame while the
//! tab is visible and drops to a low-frequency interval timer when it is
//! hidden, so idle progress keeps accruing. Native build runs a short
//! headless session for profiling and sanity checks.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, MouseEvent};

    use brickfall::consts::*;
    use brickfall::platform::LocalStorage;
    use brickfall::Game;

    /// Hidden-tab tick period in milliseconds (5 Hz)
    const BACKGROUND_TICK_MS: i32 = 200;

    /// Game plus the driver bookkeeping that decides which clock runs it
    struct Driver {
        game: Game<LocalStorage>,
        last_time: f64,
        /// While true the rAF loop parks itself and the interval timer owns
        /// the simulation; exactly one of the two ever steps the game.
        background: bool,
        interval_id: Option<i32>,
    }

    impl Driver {
        fn step_by_wall_clock(&mut self, now_ms: f64) {
            let dt = if self.last_time > 0.0 {
                ((now_ms - self.last_time) / 1000.0) as f32
            } else {
                1.0 / 60.0
            };
            self.last_time = now_ms;
            self.game.step(dt);
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Brickfall starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let seed = js_sys::Date::now() as u64;
        let game = Game::new(LocalStorage::new(), seed);
        log::info!("Loaded at level {} with {} money", game.level(), game.money());

        let driver = Rc::new(RefCell::new(Driver {
            game,
            last_time: 0.0,
            background: false,
            interval_id: None,
        }));

        setup_click_handler(&canvas, driver.clone());
        setup_visibility_handler(driver.clone());

        request_animation_frame(driver);

        log::info!("Brickfall running!");
    }

    /// Map a click from CSS pixels to arena coordinates and forward it
    fn setup_click_handler(canvas: &HtmlCanvasElement, driver: Rc<RefCell<Driver>>) {
        let canvas_clone = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let rect = canvas_clone.get_bounding_client_rect();
            if rect.width() <= 0.0 || rect.height() <= 0.0 {
                return;
            }
            let x = (event.client_x() as f64 - rect.x()) / rect.width() * ARENA_WIDTH as f64;
            let y = (event.client_y() as f64 - rect.y()) / rect.height() * ARENA_HEIGHT as f64;
            driver.borrow_mut().game.click_at(x as f32, y as f32);
        });
        let _ = canvas
            .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Swap between the rAF clock and the background interval on tab hide
    fn setup_visibility_handler(driver: Rc<RefCell<Driver>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();
        let document_clone = document.clone();

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let hidden = document_clone.visibility_state() == web_sys::VisibilityState::Hidden;
            if hidden {
                enter_background(driver.clone());
            } else {
                leave_background(driver.clone());
            }
        });
        let _ = document.add_event_listener_with_callback(
            "visibilitychange",
            closure.as_ref().unchecked_ref(),
        );
        closure.forget();
    }

    fn enter_background(driver: Rc<RefCell<Driver>>) {
        {
            let mut d = driver.borrow_mut();
            if d.background {
                return;
            }
            d.background = true;
            d.game.save();
        }
        log::info!("tab hidden, switching to background ticks");

        let tick_driver = driver.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            let now = js_sys::Date::now();
            tick_driver.borrow_mut().step_by_wall_clock(now);
        });
        let window = web_sys::window().unwrap();
        let id = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                BACKGROUND_TICK_MS,
            )
            .ok();
        closure.forget();
        driver.borrow_mut().interval_id = id;
    }

    fn leave_background(driver: Rc<RefCell<Driver>>) {
        let mut d = driver.borrow_mut();
        if !d.background {
            return;
        }
        d.background = false;
        if let Some(id) = d.interval_id.take() {
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(id);
            }
        }
        // reset the clock so the first visible frame does not get a huge dt
        d.last_time = 0.0;
        drop(d);
        log::info!("tab visible, resuming animation frames");
        request_animation_frame(driver);
    }

    fn request_animation_frame(driver: Rc<RefCell<Driver>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            frame(driver, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame(driver: Rc<RefCell<Driver>>, time: f64) {
        {
            let mut d = driver.borrow_mut();
            // parked while the interval timer drives the game
            if d.background {
                return;
            }
            d.step_by_wall_clock(time);
        }
        request_animation_frame(driver);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use brickfall::platform::MemoryStore;
    use brickfall::Game;

    env_logger::init();
    log::info!("Brickfall (headless) starting...");

    let mut game = Game::new(MemoryStore::new(), 0xB41C);

    // One simulated minute at 60 Hz
    let dt = 1.0 / 60.0;
    for frame in 0..3600 {
        game.step(dt);
        if frame % 600 == 0 {
            log::info!(
                "t={:>4.1}s level={} money={} balls={}",
                frame as f32 * dt,
                game.level(),
                game.money(),
                game.state().balls.len()
            );
        }
    }

    println!(
        "after 60s: level {} with {} money and {} active balls",
        game.level(),
        game.money(),
        game.state().balls.len()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
