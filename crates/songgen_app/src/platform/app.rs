use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use engine_logging::{engine_debug, engine_info};
use log::LevelFilter;
use songgen_core::{update, AppState, JobStatus, Msg};

use super::config::{AppConfig, Cli};
use super::effects::EffectRunner;
use super::logging;
use super::ui::input::InputCommand;
use super::ui::render::{render, HELP};

/// Everything the main loop reacts to.
#[derive(Debug)]
pub enum AppEvent {
    Msg(Msg),
    /// A line typed on stdin.
    Line(String),
    /// Stdin reached end of file.
    InputClosed,
}

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli)?;
    let level = if config.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(config.log, level);
    engine_info!("songgen starting");

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let runner = EffectRunner::new(config.engine_config(), event_tx.clone());

    // Queued ahead of stdin so an immediate EOF cannot overtake them.
    for event in startup_events(cli.prompt) {
        let _ = event_tx.send(event);
    }
    spawn_stdin_reader(event_tx.clone());

    // Background tick to throttle rendering.
    let tick_tx = event_tx.clone();
    thread::spawn(move || {
        let interval = Duration::from_millis(75);
        while tick_tx.send(AppEvent::Msg(Msg::Tick)).is_ok() {
            thread::sleep(interval);
        }
    });

    drop(event_tx);

    let mut out = io::stdout();
    let mut app = MainLoop::new(AppState::with_max_prompt_chars(config.max_prompt_chars));
    print_lines(&mut out, &render(&app.state.view()))?;

    while let Ok(event) = event_rx.recv() {
        let step = app.handle(event);
        print_lines(&mut out, &step.output)?;
        runner.enqueue(step.effects);
        if step.quit {
            break;
        }
    }

    engine_info!("songgen exiting");
    Ok(())
}

/// Events for `--prompt`, submitted as if typed before anything else.
fn startup_events(prompt: Option<String>) -> Vec<AppEvent> {
    match prompt {
        Some(prompt) => vec![
            AppEvent::Msg(Msg::PromptChanged(prompt)),
            AppEvent::Msg(Msg::GenerateClicked),
        ],
        None => Vec::new(),
    }
}

/// Output and effects produced by one event.
#[derive(Debug, Default)]
struct Step {
    output: Vec<String>,
    effects: Vec<songgen_core::Effect>,
    quit: bool,
}

/// Event handling without IO, so the loop can be driven from tests.
struct MainLoop {
    state: AppState,
    input_closed: bool,
}

impl MainLoop {
    fn new(state: AppState) -> Self {
        Self {
            state,
            input_closed: false,
        }
    }

    fn handle(&mut self, event: AppEvent) -> Step {
        let mut step = Step::default();
        let render_now = match event {
            AppEvent::Msg(msg) => {
                let is_tick = msg == Msg::Tick;
                self.dispatch(msg, &mut step);
                is_tick
            }
            AppEvent::Line(line) => {
                let command = InputCommand::parse(&line);
                match &command {
                    InputCommand::Help => step.output.extend(HELP.iter().map(|l| l.to_string())),
                    InputCommand::Unknown(name) => {
                        step.output.push(format!("Unknown command :{name} (try :help)"));
                    }
                    _ => {}
                }
                for msg in command.into_msgs() {
                    self.dispatch(msg, &mut step);
                }
                true
            }
            AppEvent::InputClosed => {
                engine_debug!("stdin closed");
                self.input_closed = true;
                false
            }
        };

        // Without further input, leave once nothing is generating or saving.
        if self.input_closed
            && !self.state.quit_requested()
            && self.state.job().status() != JobStatus::Running
            && self.state.downloads_in_flight() == 0
        {
            self.dispatch(Msg::QuitRequested, &mut step);
        }

        if self.state.quit_requested() {
            step.quit = true;
        }
        if (render_now || step.quit) && self.state.consume_dirty() {
            step.output.extend(render(&self.state.view()));
        }
        step
    }

    fn dispatch(&mut self, msg: Msg, step: &mut Step) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        step.effects.extend(effects);
    }
}

fn spawn_stdin_reader(event_tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if event_tx.send(AppEvent::Line(line)).is_err() {
                return;
            }
        }
        let _ = event_tx.send(AppEvent::InputClosed);
    });
}

fn print_lines(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use songgen_core::Effect;

    fn line(text: &str) -> AppEvent {
        AppEvent::Line(text.to_string())
    }

    #[test]
    fn prompt_line_starts_job_and_renders() {
        let mut app = MainLoop::new(AppState::new());
        let step = app.handle(line("lofi beat"));

        assert_eq!(
            step.effects,
            vec![Effect::StartJob {
                job_id: 1,
                prompt: "lofi beat".to_string(),
            }]
        );
        assert_eq!(step.output.len(), 1);
        assert!(step.output[0].starts_with("Creating your masterpiece..."));
        assert!(!step.quit);
    }

    #[test]
    fn engine_progress_renders_on_next_tick_only() {
        let mut app = MainLoop::new(AppState::new());
        app.handle(line("lofi beat"));

        let step = app.handle(AppEvent::Msg(Msg::JobProgress {
            job_id: 1,
            percent: 50.0,
        }));
        assert!(step.output.is_empty());

        let step = app.handle(AppEvent::Msg(Msg::Tick));
        assert_eq!(step.output.len(), 1);
        assert!(step.output[0].ends_with(" 50%"), "{}", step.output[0]);

        let step = app.handle(AppEvent::Msg(Msg::Tick));
        assert!(step.output.is_empty());
    }

    #[test]
    fn help_and_unknown_commands_print_text() {
        let mut app = MainLoop::new(AppState::new());
        let step = app.handle(line(":help"));
        assert_eq!(step.output.len(), HELP.len());
        assert!(step.effects.is_empty());

        let step = app.handle(line(":play"));
        assert_eq!(step.output, vec!["Unknown command :play (try :help)".to_string()]);
    }

    #[test]
    fn closed_input_waits_for_running_job() {
        let mut app = MainLoop::new(AppState::new());
        app.handle(line("lofi beat"));

        let step = app.handle(AppEvent::InputClosed);
        assert!(!step.quit);

        let step = app.handle(AppEvent::Msg(Msg::JobDone {
            job_id: 1,
            result: Ok("generated-song-1.mp3".to_string()),
        }));
        assert!(step.quit);
        assert_eq!(step.effects, vec![Effect::Shutdown]);
        assert_eq!(
            step.output,
            vec!["Your song is ready: generated-song-1.mp3 (:download to save it)".to_string()]
        );
    }

    #[test]
    fn closed_input_waits_for_pending_download() {
        let mut app = MainLoop::new(AppState::new());
        app.handle(line("lofi beat"));
        app.handle(AppEvent::Msg(Msg::JobDone {
            job_id: 1,
            result: Ok("generated-song-1.mp3".to_string()),
        }));

        let step = app.handle(line(":download"));
        assert_eq!(
            step.effects,
            vec![Effect::Download {
                job_id: 1,
                result_handle: "generated-song-1.mp3".to_string(),
            }]
        );

        let step = app.handle(AppEvent::InputClosed);
        assert!(!step.quit);
        assert!(step.effects.is_empty());

        let step = app.handle(AppEvent::Msg(Msg::DownloadFinished {
            job_id: 1,
            result: Ok("output/generated-song-1.mp3".to_string()),
        }));
        assert!(step.quit);
        assert_eq!(step.effects, vec![Effect::Shutdown]);
        assert_eq!(
            step.output,
            vec![
                "Your song is ready: generated-song-1.mp3 (:download to save it)".to_string(),
                "Saved to output/generated-song-1.mp3".to_string(),
            ]
        );
    }

    #[test]
    fn startup_prompt_is_handled_before_closed_input() {
        let mut app = MainLoop::new(AppState::new());
        let mut effects = Vec::new();
        for event in startup_events(Some("lofi beat".to_string())) {
            effects.extend(app.handle(event).effects);
        }
        assert_eq!(
            effects,
            vec![Effect::StartJob {
                job_id: 1,
                prompt: "lofi beat".to_string(),
            }]
        );

        let step = app.handle(AppEvent::InputClosed);
        assert!(!step.quit);
        assert_eq!(app.state.job().status(), JobStatus::Running);

        assert!(startup_events(None).is_empty());
    }

    #[test]
    fn quitting_after_a_render_prints_nothing_new() {
        let mut app = MainLoop::new(AppState::new());
        app.handle(line("lofi beat"));
        app.handle(AppEvent::Msg(Msg::JobDone {
            job_id: 1,
            result: Ok("generated-song-1.mp3".to_string()),
        }));
        let step = app.handle(AppEvent::Msg(Msg::Tick));
        assert_eq!(step.output.len(), 1);

        let step = app.handle(AppEvent::InputClosed);
        assert!(step.quit);
        assert_eq!(step.effects, vec![Effect::Shutdown]);
        assert!(step.output.is_empty(), "{:?}", step.output);
    }

    #[test]
    fn quit_command_cancels_and_stops() {
        let mut app = MainLoop::new(AppState::new());
        app.handle(line("lofi beat"));
        let step = app.handle(line(":quit"));

        assert!(step.quit);
        assert_eq!(
            step.effects,
            vec![Effect::CancelJob { job_id: 1 }, Effect::Shutdown]
        );
    }
}
