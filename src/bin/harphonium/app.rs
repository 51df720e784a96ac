//! The running application: engine handle, output driver and UI loop.

use std::{
    io::stdout,
    time::{Duration, Instant},
};

use color_eyre::eyre::Result as EyreResult;
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use harphonium_dsp::{
    io::{cpal_output::{OutputDriver, StreamStatus}, AudioRenderer},
    synth::Param,
    SynthHandle, SynthRenderer, Waveform,
};
use ratatui::DefaultTerminal;
use rtrb::{Consumer, RingBuffer};

use crate::{
    keyboard::{Keyboard, NoteAction},
    ui::{self, params::nudge, spectrum::Spectrum, UiState},
};

/// Samples shown by the scope and analysed by the spectrum
const VIS_BUFFER_SIZE: usize = 1024;
/// Capacity of the audio → UI ring, in visualisation windows
const SCOPE_RING_WINDOWS: usize = 16;
const RECONNECT_INTERVAL: Duration = Duration::from_secs(2);
const BEND_STEP_CENTS: f32 = 10.0;

pub struct App {
    handle: SynthHandle,
    driver: OutputDriver,
    scope_rx: Consumer<f32>,
    scope: Vec<f32>,
    spectrum: Spectrum,
    keyboard: Keyboard,
    selected: usize,
    notice: Option<String>,
    last_reconnect: Instant,
    should_quit: bool,
}

impl App {
    /// Open the default output device. The renderer is reused when the
    /// device runs at the rate it was built for.
    pub fn new(mut handle: SynthHandle, renderer: SynthRenderer) -> EyreResult<Self> {
        let (tap, scope_rx) = RingBuffer::new(VIS_BUFFER_SIZE * SCOPE_RING_WINDOWS);
        let driver = OutputDriver::open(|rate| {
            let renderer = if renderer.sample_rate() == rate {
                renderer
            } else {
                handle.renderer(rate)
            };
            renderer.with_tap(tap)
        })?;

        Ok(Self {
            handle,
            spectrum: Spectrum::new(VIS_BUFFER_SIZE, driver.sample_rate()),
            driver,
            scope_rx,
            scope: vec![0.0; VIS_BUFFER_SIZE],
            keyboard: Keyboard::new(),
            selected: 0,
            notice: None,
            last_reconnect: Instant::now(),
            should_quit: false,
        })
    }

    pub fn run(mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        // Key-up events only arrive on terminals with the kitty protocol;
        // elsewhere notes sound until space or the next key.
        let key_release = supports_keyboard_enhancement().unwrap_or(false);
        if key_release {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let res = self.event_loop(terminal);

        if key_release {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
        }
        self.handle.stop();
        res
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_scope();
            self.watch_stream();

            terminal.draw(|frame| {
                let state = self.ui_state();
                ui::render(frame, &state);
            })?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    /// Pull tapped samples, keeping the last window.
    fn poll_scope(&mut self) {
        let mut fresh = false;
        while let Ok(sample) = self.scope_rx.pop() {
            self.scope.push(sample);
            fresh = true;
        }
        if self.scope.len() > VIS_BUFFER_SIZE {
            let excess = self.scope.len() - VIS_BUFFER_SIZE;
            self.scope.drain(..excess);
        }
        if fresh {
            self.spectrum.update(&self.scope);
        }
    }

    /// Retry the device every few seconds while the stream is down.
    fn watch_stream(&mut self) {
        if self.driver.status() == StreamStatus::Running
            || self.last_reconnect.elapsed() < RECONNECT_INTERVAL
        {
            return;
        }
        self.last_reconnect = Instant::now();

        let (tap, scope_rx) = RingBuffer::new(VIS_BUFFER_SIZE * SCOPE_RING_WINDOWS);
        let handle = &mut self.handle;
        match self.driver.reconnect(|rate| handle.renderer(rate).with_tap(tap)) {
            Ok(()) => {
                self.scope_rx = scope_rx;
                self.spectrum = Spectrum::new(VIS_BUFFER_SIZE, self.driver.sample_rate());
                self.keyboard.release_all();
                self.notice = Some(format!("reconnected to {}", self.driver.device_name()));
            }
            Err(err) => self.notice = Some(format!("reconnect failed: {err}")),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            if let KeyCode::Char(c) = key.code {
                if let Some(action) = self.keyboard.release(c) {
                    self.dispatch(action);
                }
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => {
                if let Some(action) = self.keyboard.release_all() {
                    self.dispatch(action);
                }
            }
            KeyCode::Backspace => {
                self.keyboard.release_all();
                self.handle.stop();
                self.notice = Some("stopped".to_string());
            }
            KeyCode::Tab => {
                if let Some(action) = self.keyboard.release_all() {
                    self.dispatch(action);
                }
                self.keyboard.toggle_mode();
            }
            KeyCode::Char('z') => self.keyboard.shift_octave(-1),
            KeyCode::Char('x') => self.keyboard.shift_octave(1),
            KeyCode::Char(',') => self.keyboard.shift_transpose(-1),
            KeyCode::Char('.') => self.keyboard.shift_transpose(1),
            KeyCode::Left => self.bend(-BEND_STEP_CENTS),
            KeyCode::Right => self.bend(BEND_STEP_CENTS),
            KeyCode::Char('0') => {
                if let Some(action) = self.keyboard.reset_bend() {
                    self.dispatch(action);
                }
            }
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                self.handle.set_waveform(Waveform::ALL[index]);
            }
            KeyCode::Up => {
                self.selected = (self.selected + Param::ALL.len() - 1) % Param::ALL.len();
            }
            KeyCode::Down => self.selected = (self.selected + 1) % Param::ALL.len(),
            KeyCode::Char('-') => self.adjust(false),
            KeyCode::Char('=') | KeyCode::Char('+') => self.adjust(true),
            KeyCode::Char(c) => {
                for action in self.keyboard.press(c) {
                    self.dispatch(action);
                }
            }
            _ => {}
        }
    }

    fn bend(&mut self, cents: f32) {
        if let Some(action) = self.keyboard.bend(cents) {
            self.dispatch(action);
        }
    }

    fn adjust(&mut self, up: bool) {
        let param = Param::ALL[self.selected];
        let value = nudge(param, self.handle.get_param(param), up);
        self.handle.set_param(param, value);
    }

    fn dispatch(&mut self, action: NoteAction) {
        let result = match action {
            NoteAction::On(frequency) => self.handle.note_on(frequency),
            NoteAction::Retune(frequency) => self.handle.set_frequency(frequency),
            NoteAction::Off => self.handle.note_off(),
        };
        if let Err(err) = result {
            self.notice = Some(err.to_string());
        }
    }

    fn ui_state(&self) -> UiState<'_> {
        UiState {
            params: self.handle.snapshot(),
            store: self.handle.params(),
            selected: Param::ALL[self.selected],
            scope: &self.scope,
            spectrum: self.spectrum.bands(),
            stream: self.driver.status(),
            device: self.driver.device_name(),
            sample_rate: self.driver.sample_rate(),
            mode: self.keyboard.mode().name(),
            octave: self.keyboard.octave(),
            transpose: self.keyboard.transpose(),
            bend_cents: self.keyboard.bend_cents(),
            sounding: self.keyboard.sounding(),
            notice: self.notice.as_deref(),
        }
    }
}
