use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use kiln_engine::input::{InputEvent, Key, KeyState, Modifiers};
use kiln_engine::paint::Color;
use kiln_engine::render::headless::{BackendCall, CallLog, HeadlessBackend};
use kiln_engine::render::{Renderer, RendererConfig};
use kiln_engine::scene::{Engine, EngineConfig, EngineError, InitCtx, Scene, Stage, System, UpdateCtx};

type Log = Rc<RefCell<Vec<String>>>;

struct Recorder {
    name: &'static str,
    log: Log,
    /// `poll_ready` calls answered with `false` before reporting ready.
    not_ready_polls: u32,
    fail_init: bool,
    /// Requested from the first update.
    next: Option<Box<dyn Scene>>,
    clear: Color,
}

impl Recorder {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: log.clone(),
            not_ready_polls: 0,
            fail_init: false,
            next: None,
            clear: Color::BLACK,
        }
    }

    fn push(&self, what: impl AsRef<str>) {
        self.log.borrow_mut().push(format!("{}.{}", self.name, what.as_ref()));
    }
}

impl Scene for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn init(&mut self, _ctx: &mut InitCtx<'_>) -> anyhow::Result<()> {
        self.push("init");
        if self.fail_init {
            anyhow::bail!("missing map");
        }
        Ok(())
    }

    fn poll_ready(&mut self, _renderer: &Renderer) -> anyhow::Result<bool> {
        if self.not_ready_polls > 0 {
            self.not_ready_polls -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>) {
        self.push("update");
        if ctx.input.key_hit(Key::Space) {
            self.push("hit");
        }
        if let Some(next) = self.next.take() {
            ctx.change_scene(next);
        }
    }

    fn render(&mut self, r: &mut Renderer) {
        self.push("render");
        r.draw_rect(0.0, 0.0, 1.0, 1.0);
    }

    fn on_exit(&mut self, next: &dyn Scene) {
        self.push(format!("exit->{}", next.name()));
    }

    fn clear_color(&self) -> Color {
        self.clear
    }
}

struct Tagged {
    tag: &'static str,
    log: Log,
}

impl System for Tagged {
    fn update(&mut self, _dt: f32) {
        self.log.borrow_mut().push(format!("{}.update", self.tag));
    }

    fn render(&mut self, _r: &mut Renderer) {
        self.log.borrow_mut().push(format!("{}.render", self.tag));
    }
}

fn engine() -> (Engine, CallLog) {
    let (backend, calls) = HeadlessBackend::with_log();
    let renderer = Renderer::new(Box::new(backend), RendererConfig::default());
    (Engine::new(renderer, EngineConfig::default()), calls)
}

fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

fn space(state: KeyState) -> InputEvent {
    InputEvent::Key {
        key: Key::Space,
        state,
        modifiers: Modifiers::default(),
        code: 0,
        repeat: false,
    }
}

// ── lifecycle ─────────────────────────────────────────────────────────────

#[test]
fn frame_without_scene_is_an_error() {
    let (mut engine, _) = engine();
    assert!(matches!(engine.frame(), Err(EngineError::NoActiveScene)));
}

#[test]
fn scene_is_gated_until_ready() {
    let log = Log::default();
    let (mut engine, calls) = engine();
    let mut scene = Recorder::new("a", &log);
    scene.not_ready_polls = 2;
    scene.clear = Color::BLUE;
    engine.change_scene(Box::new(scene)).unwrap();
    assert_eq!(take(&log), ["a.init"]);

    engine.frame().unwrap();
    engine.frame().unwrap();
    assert!(take(&log).is_empty());
    assert!(!engine.scene_loaded());
    // the frame is still cleared with the scene's color
    assert!(calls.calls().contains(&BackendCall::BeginFrame(Color::BLUE)));
    assert!(calls.draws().is_empty());

    engine.frame().unwrap();
    assert!(engine.scene_loaded());
    assert_eq!(take(&log), ["a.update", "a.render"]);
    assert_eq!(calls.draws().len(), 1);
}

#[test]
fn change_scene_exits_once_before_next_init() {
    let log = Log::default();
    let (mut engine, _) = engine();
    engine.change_scene(Box::new(Recorder::new("a", &log))).unwrap();
    engine.frame().unwrap();
    take(&log);

    engine.change_scene(Box::new(Recorder::new("b", &log))).unwrap();
    assert_eq!(take(&log), ["a.exit->b", "b.init"]);
    assert_eq!(engine.scene_name(), Some("b"));
    assert!(!engine.scene_loaded());
}

#[test]
fn change_while_loading_renders_nothing_until_next_scene_is_ready() {
    let log = Log::default();
    let (mut engine, calls) = engine();
    let mut a = Recorder::new("a", &log);
    a.not_ready_polls = 5;
    engine.change_scene(Box::new(a)).unwrap();
    engine.frame().unwrap();
    assert!(!engine.scene_loaded());

    let mut b = Recorder::new("b", &log);
    b.not_ready_polls = 2;
    engine.change_scene(Box::new(b)).unwrap();

    engine.frame().unwrap();
    engine.frame().unwrap();
    assert!(!engine.scene_loaded());
    assert!(calls.draws().is_empty());

    engine.frame().unwrap();
    assert!(engine.scene_loaded());
    assert_eq!(calls.draws().len(), 1);

    let log = take(&log);
    assert_eq!(log, ["a.init", "a.exit->b", "b.init", "b.update", "b.render"]);
}

#[test]
fn change_requested_from_update_applies_after_update_phase() {
    let log = Log::default();
    let (mut engine, _) = engine();
    let mut a = Recorder::new("a", &log);
    a.next = Some(Box::new(Recorder::new("b", &log)));
    engine.change_scene(Box::new(a)).unwrap();
    take(&log);

    engine.frame().unwrap();
    // b is initialized but not yet ready, so nothing renders this frame
    assert_eq!(take(&log), ["a.update", "a.exit->b", "b.init"]);

    engine.frame().unwrap();
    assert_eq!(take(&log), ["b.update", "b.render"]);
}

#[test]
fn failed_init_leaves_no_scene() {
    let log = Log::default();
    let (mut engine, _) = engine();
    let mut scene = Recorder::new("broken", &log);
    scene.fail_init = true;

    let err = engine.change_scene(Box::new(scene)).unwrap_err();
    assert!(matches!(&err, EngineError::SceneInit { scene, .. } if scene == "broken"));
    assert!(!engine.has_scene());
    assert!(matches!(engine.frame(), Err(EngineError::NoActiveScene)));
}

// ── ordering ──────────────────────────────────────────────────────────────

#[test]
fn systems_wrap_the_scene() {
    let log = Log::default();
    let (mut engine, _) = engine();
    engine.add_system(Box::new(Tagged { tag: "late", log: log.clone() }), Stage::Late);
    engine.add_system(Box::new(Tagged { tag: "early", log: log.clone() }), Stage::Early);
    engine.change_scene(Box::new(Recorder::new("a", &log))).unwrap();
    take(&log);

    engine.frame().unwrap();
    assert_eq!(
        take(&log),
        ["early.update", "a.update", "late.update", "a.render", "early.render", "late.render"]
    );
}

#[test]
fn key_hit_is_seen_for_exactly_one_frame() {
    let log = Log::default();
    let (mut engine, _) = engine();
    engine.change_scene(Box::new(Recorder::new("a", &log))).unwrap();
    engine.frame().unwrap();
    take(&log);

    engine.input_mut().apply_event(space(KeyState::Pressed));
    engine.frame().unwrap();
    assert!(take(&log).contains(&"a.hit".to_string()));

    engine.frame().unwrap();
    assert!(!take(&log).contains(&"a.hit".to_string()));
    assert!(engine.input().key_down(Key::Space));
}

#[test]
fn dt_is_clamped() {
    let log = Log::default();
    let (mut engine, _) = engine();
    engine.change_scene(Box::new(Recorder::new("a", &log))).unwrap();

    let t0 = Instant::now();
    engine.frame_at(t0).unwrap();
    let ft = engine.frame_at(t0 + Duration::from_secs(10)).unwrap();
    assert!((ft.dt - 0.1).abs() < 1e-6);
    let ft = engine.frame_at(t0 + Duration::from_secs(10)).unwrap();
    assert!((ft.dt - 0.001).abs() < 1e-6);
}
