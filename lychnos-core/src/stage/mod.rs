//! Scene stack scheduler
//!
//! The stage owns a bounded stack of scenes, the request mailbox, and the
//! panel's activity/sleep state. [`Stage::step`] performs one bounded unit
//! of work per call - one transition, or one input dispatch, or one
//! sleep/wake change, or one poll, or one draw - and reports whether it
//! did anything. Hosts either call it once per outer loop tick or drain
//! it with [`Stage::run_until_idle`]; both produce the same observable
//! behavior.
//!
//! Work is drained in a strict priority order: stack transitions first
//! (no scene code may run against a stale stack), then input (so a fresh
//! keypress affects the same step's layout), then sleep/wake, then poll,
//! then the idle-timeout check, then drawing. Polling deliberately does
//! not reset the idle timer - passively watching a value must not keep
//! the panel awake.

mod canvas;
mod context;
mod scene;

pub use canvas::{Canvas, DEFAULT_DISPLAY_COLOR, DEFAULT_KNOB_COLOR};
pub use context::Context;
pub use scene::Scene;

use alloc::boxed::Box;
use heapless::Vec;

use crate::color::Rgb;
use crate::input::InputKind;
use crate::traits::panel::PanelBinding;
use crate::Millis;

/// Maximum depth of the scene stack.
pub const MAX_SCENE_STACK_DEPTH: usize = 5;

/// Minimum spacing between scene polls.
pub const POLL_INTERVAL: Millis = 20;

/// Minimum spacing between draws, however often they are requested.
pub const DRAW_INTERVAL: Millis = 20;

/// The scene stack scheduler.
pub struct Stage<B: PanelBinding> {
    binding: B,
    stack: Vec<Box<dyn Scene>, MAX_SCENE_STACK_DEPTH>,
    context: Context,
    asleep: bool,
    last_activity_time: Millis,
    last_poll_time: Millis,
    last_draw_time: Millis,
    need_poll: bool,
}

impl<B: PanelBinding> Stage<B> {
    /// Create a stage bound to the given panel hardware.
    pub fn new(binding: B) -> Self {
        Self {
            binding,
            stack: Vec::new(),
            context: Context::new(),
            asleep: false,
            last_activity_time: 0,
            last_poll_time: 0,
            last_draw_time: 0,
            need_poll: false,
        }
    }

    /// Stage the root scene. Must be called exactly once, before the
    /// first [`step`](Self::step); the scene is pushed by that step.
    pub fn begin(&mut self, scene: Box<dyn Scene>, now: Millis) {
        assert!(self.stack.is_empty(), "begin requires an empty scene stack");
        self.context.requested_push = Some(scene);
        self.record_activity(now);
    }

    /// Perform one unit of work. Returns false when there is nothing
    /// left to do for this timestamp.
    pub fn step(&mut self, now: Millis) -> bool {
        // Handle pop and home. Home keeps its flag set so each step pops
        // one scene until only the root remains.
        if self.stack.len() > 1 && (self.context.requested_pop || self.context.requested_home) {
            if let Some(scene) = self.stack.last_mut() {
                scene.exit(&mut self.context);
            }
            self.stack.pop();
            self.context.requested_pop = false;
            self.context.requested_push = None; // don't honor a push from the exited scene
            self.context.request_draw();
            self.need_poll = true;
            return true;
        } else {
            self.context.requested_home = false;
            if self.stack.len() == 1 && self.context.requested_pop {
                // Popping the root is not a legal stack operation;
                // leaving the last scene means going to sleep.
                self.context.request_sleep();
            }
            self.context.requested_pop = false;
        }

        // Handle push
        if let Some(scene) = self.context.requested_push.take() {
            if self.stack.push(scene).is_err() {
                panic!("scene stack overflow");
            }
            self.context.request_draw();
            if let Some(scene) = self.stack.last_mut() {
                scene.enter(&mut self.context);
            }
            self.need_poll = true;
            return true;
        }

        // Handle one input event
        let event = self.binding.read_event();
        if !event.is_none() {
            if self.asleep {
                // Eat events used to wake; their content is discarded.
                self.context.request_wake();
                return true;
            }

            self.record_activity(now);
            let handled = match self.stack.last_mut() {
                Some(scene) => scene.input(&mut self.context, event),
                None => false,
            };
            if !handled {
                match event.kind {
                    InputKind::Back => self.context.request_pop(),
                    InputKind::Home => self.context.request_home(),
                    _ => {}
                }
            }
            return true;
        }

        // Handle sleeping
        if self.context.requested_sleep {
            self.context.requested_sleep = false;
            if !self.asleep {
                self.asleep = true;
                self.binding.surface().set_power_save(true);
                self.binding.set_colors(Rgb::OFF, Rgb::OFF);
                return true;
            }
        }

        // Handle waking
        if self.context.requested_wake {
            self.context.requested_wake = false;
            if self.asleep {
                self.asleep = false;
                self.binding.surface().set_power_save(false);
                self.context.request_draw();
                self.record_activity(now);
                return true;
            }
        }

        // Handle polling for changes (may request wake)
        self.context.frame_time = now;
        if self.need_poll || now.wrapping_sub(self.last_poll_time) >= POLL_INTERVAL {
            self.need_poll = false;
            self.last_poll_time = now;
            if let Some(scene) = self.stack.last_mut() {
                scene.poll(&mut self.context);
            }
            return true;
        }

        // Stop here if asleep.
        if self.asleep {
            return false;
        }

        // Handle activity timeouts
        let timeout = self.binding.activity_timeout_ms();
        if timeout > 0 && now.wrapping_sub(self.last_activity_time) >= timeout {
            self.context.request_sleep();
            return true;
        }

        // Handle drawing
        if self.context.requested_draw && now.wrapping_sub(self.last_draw_time) >= DRAW_INTERVAL {
            self.context.requested_draw = false;
            self.last_draw_time = now;
            let (display_color, knob_color) = {
                let surface = self.binding.surface();
                surface.clear();
                let mut canvas = Canvas::new(surface);
                if let Some(scene) = self.stack.last_mut() {
                    scene.draw(&mut self.context, &mut canvas);
                }
                canvas.colors()
            };
            self.binding.surface().flush();
            self.binding.set_colors(display_color, knob_color);
            return true;
        }

        // All done
        false
    }

    /// Drain all pending work for this timestamp. Used by hosts with
    /// nothing else to do between ticks.
    pub fn run_until_idle(&mut self, now: Millis) {
        while self.step(now) {}
    }

    /// True if a low-power stop is safe right now: asleep, nothing
    /// pending in the mailbox, and no input line held down.
    pub fn can_sleep(&self) -> bool {
        self.asleep && !self.context.request_pending() && self.binding.input_idle()
    }

    /// True while the display is powered down.
    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    /// Current scene stack depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The bound panel hardware.
    pub fn binding(&self) -> &B {
        &self.binding
    }

    /// Mutable access to the bound panel hardware.
    pub fn binding_mut(&mut self) -> &mut B {
        &mut self.binding
    }

    fn record_activity(&mut self, now: Millis) {
        self.last_activity_time = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputEvent;
    use crate::traits::surface::DrawSurface;
    use alloc::collections::VecDeque;
    use alloc::rc::Rc;
    use alloc::vec::Vec as StdVec;
    use core::cell::RefCell;

    #[derive(Default)]
    struct TestSurface {
        clears: usize,
        flushes: usize,
        power_save: bool,
    }

    impl DrawSurface for TestSurface {
        fn clear(&mut self) {
            self.clears += 1;
        }
        fn text(&mut self, _row: u8, _col: u8, _text: &str) {}
        fn invert(&mut self, _row: u8, _start_col: u8, _end_col: u8) {}
        fn set_power_save(&mut self, on: bool) {
            self.power_save = on;
        }
        fn flush(&mut self) {
            self.flushes += 1;
        }
        fn dimensions(&self) -> (u8, u8) {
            (21, 4)
        }
    }

    #[derive(Default)]
    struct TestBinding {
        surface: TestSurface,
        events: VecDeque<InputEvent>,
        colors: StdVec<(Rgb, Rgb)>,
        pressed: bool,
        timeout_ms: Millis,
    }

    impl TestBinding {
        fn queue(&mut self, event: InputEvent) {
            self.events.push_back(event);
        }
        fn last_colors(&self) -> Option<(Rgb, Rgb)> {
            self.colors.last().copied()
        }
    }

    impl PanelBinding for TestBinding {
        fn read_event(&mut self) -> InputEvent {
            self.events.pop_front().unwrap_or_default()
        }
        fn surface(&mut self) -> &mut dyn DrawSurface {
            &mut self.surface
        }
        fn set_colors(&mut self, display: Rgb, knob: Rgb) {
            self.colors.push((display, knob));
        }
        fn play_tone(&mut self, _freq_hz: u32, _duration_ms: u32) {}
        fn input_idle(&self) -> bool {
            !self.pressed && self.events.is_empty()
        }
        fn activity_timeout_ms(&self) -> Millis {
            self.timeout_ms
        }
    }

    #[derive(Default)]
    struct Counts {
        enters: usize,
        exits: usize,
        inputs: usize,
        polls: usize,
        draws: usize,
        drops: usize,
    }

    type Probe = Rc<RefCell<Counts>>;

    /// Scene that counts its lifecycle hooks. Clicks push another probe
    /// scene; rotations are handled with a redraw request, menu-style.
    struct ProbeScene {
        probe: Probe,
    }

    impl ProbeScene {
        fn new(probe: &Probe) -> Self {
            Self {
                probe: probe.clone(),
            }
        }
    }

    impl Scene for ProbeScene {
        fn enter(&mut self, _ctx: &mut Context) {
            self.probe.borrow_mut().enters += 1;
        }
        fn exit(&mut self, _ctx: &mut Context) {
            self.probe.borrow_mut().exits += 1;
        }
        fn input(&mut self, ctx: &mut Context, event: InputEvent) -> bool {
            self.probe.borrow_mut().inputs += 1;
            match event.kind {
                InputKind::SingleClick => {
                    ctx.request_push(Box::new(ProbeScene::new(&self.probe)));
                    true
                }
                InputKind::Rotate => {
                    ctx.request_draw();
                    true
                }
                _ => false,
            }
        }
        fn poll(&mut self, _ctx: &mut Context) {
            self.probe.borrow_mut().polls += 1;
        }
        fn draw(&mut self, _ctx: &mut Context, _canvas: &mut Canvas<'_>) {
            self.probe.borrow_mut().draws += 1;
        }
    }

    impl Drop for ProbeScene {
        fn drop(&mut self) {
            self.probe.borrow_mut().drops += 1;
        }
    }

    fn probe() -> Probe {
        Rc::new(RefCell::new(Counts::default()))
    }

    fn started_stage(probe: &Probe) -> Stage<TestBinding> {
        let mut stage = Stage::new(TestBinding::default());
        stage.begin(Box::new(ProbeScene::new(probe)), 1000);
        stage.run_until_idle(1000);
        stage
    }

    #[test]
    fn test_begin_enters_polls_and_draws_once() {
        let probe = probe();
        let stage = started_stage(&probe);

        let counts = probe.borrow();
        assert_eq!(counts.enters, 1);
        assert_eq!(counts.polls, 1); // forced poll after the push
        assert_eq!(counts.draws, 1);
        assert_eq!(stage.depth(), 1);
        assert_eq!(stage.binding().surface.flushes, 1);
        // Default colors applied after the draw
        assert_eq!(
            stage.binding().last_colors(),
            Some((DEFAULT_DISPLAY_COLOR, DEFAULT_KNOB_COLOR))
        );
    }

    #[test]
    #[should_panic(expected = "begin requires an empty scene stack")]
    fn test_begin_twice_is_fatal() {
        let probe = probe();
        let mut stage = started_stage(&probe);
        stage.begin(Box::new(ProbeScene::new(&probe)), 1000);
    }

    #[test]
    fn test_push_and_pop_track_depth() {
        let probe = probe();
        let mut stage = started_stage(&probe);

        stage
            .binding_mut()
            .queue(InputEvent::new(InputKind::SingleClick));
        stage.run_until_idle(1100);
        assert_eq!(stage.depth(), 2);
        assert_eq!(probe.borrow().enters, 2);

        stage.binding_mut().queue(InputEvent::new(InputKind::Back));
        stage.run_until_idle(1200);
        assert_eq!(stage.depth(), 1);
        assert_eq!(probe.borrow().exits, 1);
        assert_eq!(probe.borrow().drops, 1);
        assert!(!stage.is_asleep());
    }

    #[test]
    fn test_home_pops_to_root() {
        let probe = probe();
        let mut stage = started_stage(&probe);

        for i in 0..3u32 {
            stage
                .binding_mut()
                .queue(InputEvent::new(InputKind::SingleClick));
            stage.run_until_idle(1100 + i * 100);
        }
        assert_eq!(stage.depth(), 4);

        stage.binding_mut().queue(InputEvent::new(InputKind::Home));
        stage.run_until_idle(2000);
        assert_eq!(stage.depth(), 1);
        assert_eq!(probe.borrow().exits, 3);
        assert!(!stage.is_asleep());
    }

    /// A push staged while another push is pending replaces it; the
    /// replaced scene is dropped without its enter hook ever firing.
    #[test]
    fn test_push_overwrite_drops_unentered_scene() {
        struct DoublePusher {
            probe: Probe,
        }
        impl Scene for DoublePusher {
            fn input(&mut self, ctx: &mut Context, _event: InputEvent) -> bool {
                ctx.request_push(Box::new(ProbeScene::new(&self.probe)));
                ctx.request_push(Box::new(ProbeScene::new(&self.probe)));
                true
            }
        }

        let probe = probe();
        let mut stage = Stage::new(TestBinding::default());
        stage.begin(
            Box::new(DoublePusher {
                probe: probe.clone(),
            }),
            1000,
        );
        stage.run_until_idle(1000);

        stage
            .binding_mut()
            .queue(InputEvent::new(InputKind::SingleClick));
        stage.run_until_idle(1100);

        assert_eq!(stage.depth(), 2);
        let counts = probe.borrow();
        assert_eq!(counts.enters, 1); // only the surviving push was entered
        assert_eq!(counts.drops, 1); // the overwritten scene was dropped
        assert_eq!(counts.exits, 0);
    }

    /// A push requested by a scene that then pops must not survive the
    /// pop: the staged child is dropped without being entered.
    #[test]
    fn test_pending_push_discarded_when_scene_pops() {
        struct PushAndPop {
            probe: Probe,
        }
        impl Scene for PushAndPop {
            fn input(&mut self, ctx: &mut Context, _event: InputEvent) -> bool {
                ctx.request_push(Box::new(ProbeScene::new(&self.probe)));
                ctx.request_pop();
                true
            }
        }

        struct Root {
            child: Option<Box<dyn Scene>>,
        }
        impl Scene for Root {
            fn input(&mut self, ctx: &mut Context, _event: InputEvent) -> bool {
                match self.child.take() {
                    Some(child) => {
                        ctx.request_push(child);
                        true
                    }
                    None => false,
                }
            }
        }

        let probe = probe();
        let mut stage = Stage::new(TestBinding::default());
        stage.begin(
            Box::new(Root {
                child: Some(Box::new(PushAndPop {
                    probe: probe.clone(),
                })),
            }),
            1000,
        );
        stage.run_until_idle(1000);

        stage
            .binding_mut()
            .queue(InputEvent::new(InputKind::SingleClick));
        stage.run_until_idle(1100);
        assert_eq!(stage.depth(), 2);

        // The conflicted scene pushes a child and pops itself; the pop
        // wins and the staged child never runs.
        stage
            .binding_mut()
            .queue(InputEvent::new(InputKind::SingleClick));
        stage.run_until_idle(1200);

        assert_eq!(stage.depth(), 1);
        let counts = probe.borrow();
        assert_eq!(counts.enters, 0);
        assert_eq!(counts.drops, 1);
    }

    #[test]
    fn test_pop_at_root_sleeps_instead_of_popping() {
        let probe = probe();
        let mut stage = started_stage(&probe);

        stage.binding_mut().queue(InputEvent::new(InputKind::Back));
        stage.run_until_idle(1100);

        assert_eq!(stage.depth(), 1);
        assert_eq!(probe.borrow().exits, 0);
        assert!(stage.is_asleep());
        assert!(stage.binding().surface.power_save);
        assert_eq!(stage.binding().last_colors(), Some((Rgb::OFF, Rgb::OFF)));
    }

    #[test]
    fn test_input_while_asleep_wakes_without_dispatch() {
        let probe = probe();
        let mut stage = started_stage(&probe);

        stage.binding_mut().queue(InputEvent::new(InputKind::Back));
        stage.run_until_idle(1100);
        assert!(stage.is_asleep());
        let inputs_before = probe.borrow().inputs;

        // The wake press is consumed, not delivered to the scene
        stage
            .binding_mut()
            .queue(InputEvent::new(InputKind::SingleClick));
        stage.run_until_idle(1200);

        assert!(!stage.is_asleep());
        assert!(!stage.binding().surface.power_save);
        assert_eq!(probe.borrow().inputs, inputs_before);
        assert_eq!(stage.depth(), 1); // the click did not push a child
    }

    #[test]
    fn test_redraw_coalescing() {
        struct DrawSpammer {
            probe: Probe,
        }
        impl Scene for DrawSpammer {
            fn input(&mut self, ctx: &mut Context, _event: InputEvent) -> bool {
                for _ in 0..5 {
                    ctx.request_draw();
                }
                true
            }
            fn draw(&mut self, _ctx: &mut Context, _canvas: &mut Canvas<'_>) {
                self.probe.borrow_mut().draws += 1;
            }
        }

        let probe = probe();
        let mut stage = Stage::new(TestBinding::default());
        stage.begin(
            Box::new(DrawSpammer {
                probe: probe.clone(),
            }),
            1000,
        );
        stage.run_until_idle(1000);
        let draws_before = probe.borrow().draws;

        stage
            .binding_mut()
            .queue(InputEvent::new(InputKind::SingleClick));
        stage.run_until_idle(1100);
        assert_eq!(probe.borrow().draws, draws_before + 1);
    }

    #[test]
    fn test_draw_interval_throttles() {
        let probe = probe();
        let mut stage = started_stage(&probe);
        let draws_before = probe.borrow().draws;

        // The rotate's redraw request lands inside the interval opened
        // by the initial draw; nothing is drawn until it elapses.
        stage.binding_mut().queue(InputEvent::rotate(1));
        stage.run_until_idle(1005);
        assert_eq!(probe.borrow().draws, draws_before);

        stage.run_until_idle(1025);
        assert_eq!(probe.borrow().draws, draws_before + 1);
    }

    #[test]
    fn test_idle_timeout_requests_sleep_once() {
        let probe = probe();
        let mut stage = started_stage(&probe);
        stage.binding_mut().timeout_ms = 500;

        stage.run_until_idle(1499);
        assert!(!stage.is_asleep());

        stage.run_until_idle(1500);
        assert!(stage.is_asleep());
    }

    #[test]
    fn test_input_postpones_idle_timeout() {
        let probe = probe();
        let mut stage = started_stage(&probe);
        stage.binding_mut().timeout_ms = 500;

        stage.binding_mut().queue(InputEvent::rotate(1));
        stage.run_until_idle(1400);
        stage.run_until_idle(1800); // 400ms after the rotate
        assert!(!stage.is_asleep());

        stage.run_until_idle(1900); // 500ms after the rotate
        assert!(stage.is_asleep());
    }

    #[test]
    fn test_zero_timeout_never_sleeps() {
        let probe = probe();
        let mut stage = started_stage(&probe);
        stage.binding_mut().timeout_ms = 0;

        stage.run_until_idle(u32::MAX / 2);
        assert!(!stage.is_asleep());
    }

    /// Polling is not activity: a scene that keeps polling still sleeps.
    #[test]
    fn test_poll_does_not_reset_idle_timer() {
        let probe = probe();
        let mut stage = started_stage(&probe);
        stage.binding_mut().timeout_ms = 500;

        let mut now = 1000;
        while now < 1500 {
            now += POLL_INTERVAL;
            stage.run_until_idle(now);
        }
        assert!(stage.is_asleep());
        assert!(probe.borrow().polls > 10);
    }

    #[test]
    fn test_timeout_is_wraparound_safe() {
        let probe = probe();
        let mut stage = Stage::new(TestBinding::default());
        stage.binding_mut().timeout_ms = 500;
        stage.begin(Box::new(ProbeScene::new(&probe)), u32::MAX - 100);
        stage.run_until_idle(u32::MAX - 100);

        // 200ms elapsed across the counter wrap: still awake
        stage.run_until_idle(99);
        assert!(!stage.is_asleep());

        // 500ms elapsed: asleep
        stage.run_until_idle(399);
        assert!(stage.is_asleep());
    }

    #[test]
    fn test_scene_polls_while_asleep() {
        let probe = probe();
        let mut stage = started_stage(&probe);
        stage.binding_mut().queue(InputEvent::new(InputKind::Back));
        stage.run_until_idle(1100);
        assert!(stage.is_asleep());

        let polls_before = probe.borrow().polls;
        let draws_before = probe.borrow().draws;
        stage.run_until_idle(1100 + POLL_INTERVAL);
        assert_eq!(probe.borrow().polls, polls_before + 1);
        // ...but nothing is drawn while asleep
        assert_eq!(probe.borrow().draws, draws_before);
        assert!(stage.is_asleep());
    }

    #[test]
    fn test_can_sleep_gating() {
        let probe = probe();
        let mut stage = started_stage(&probe);
        assert!(!stage.can_sleep()); // awake

        stage.binding_mut().queue(InputEvent::new(InputKind::Back));
        stage.run_until_idle(1100);
        assert!(stage.is_asleep());
        assert!(stage.can_sleep());

        // A held-down line vetoes the low-power stop
        stage.binding_mut().pressed = true;
        assert!(!stage.can_sleep());
        stage.binding_mut().pressed = false;
        assert!(stage.can_sleep());

        // So does a not-yet-honored wake request
        stage
            .binding_mut()
            .queue(InputEvent::new(InputKind::SingleClick));
        assert!(!stage.can_sleep());
        stage.step(1200); // consumes the event into a wake request
        assert!(!stage.can_sleep());
    }

    #[test]
    fn test_step_reports_idle() {
        let probe = probe();
        let mut stage = started_stage(&probe);
        assert!(!stage.step(1000)); // drained; same timestamp has no work
    }

    /// The single-tick driver and the drain driver observe the same
    /// event sequence identically.
    #[test]
    fn test_single_step_and_drain_agree() {
        let probe_a = probe();
        let probe_b = probe();
        let mut drained = Stage::new(TestBinding::default());
        let mut stepped = Stage::new(TestBinding::default());
        drained.begin(Box::new(ProbeScene::new(&probe_a)), 1000);
        stepped.begin(Box::new(ProbeScene::new(&probe_b)), 1000);

        let script = [
            (1000, None),
            (1100, Some(InputEvent::new(InputKind::SingleClick))),
            (1200, Some(InputEvent::rotate(2))),
            (1300, Some(InputEvent::new(InputKind::Back))),
            (1400, None),
        ];
        for (now, event) in script {
            if let Some(event) = event {
                drained.binding_mut().queue(event);
                stepped.binding_mut().queue(event);
            }
            drained.run_until_idle(now);
            let mut guard = 0;
            while stepped.step(now) {
                guard += 1;
                assert!(guard < 64, "stepped driver failed to reach idle");
            }
        }

        assert_eq!(drained.depth(), stepped.depth());
        assert_eq!(drained.is_asleep(), stepped.is_asleep());
        let a = probe_a.borrow();
        let b = probe_b.borrow();
        assert_eq!(a.enters, b.enters);
        assert_eq!(a.exits, b.exits);
        assert_eq!(a.inputs, b.inputs);
        assert_eq!(a.draws, b.draws);
    }
}
