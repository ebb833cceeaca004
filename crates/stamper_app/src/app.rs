use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use stamper_core::{update, AppState, Effect, Msg, SessionPhase};
use stamper_logging::stamper_info;

use crate::config::AppConfig;
use crate::effects::EffectRunner;
use crate::input;
use crate::terminal::TerminalRenderer;

pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(config.settings.clone(), msg_tx.clone())
        .context("failed to build the HTTP client")?;

    let one_shot = config.initial_url.is_some();
    stamper_info!(
        "Starting stamper backend={} one_shot={}",
        config.settings.base_url,
        one_shot
    );

    let _ = msg_tx.send(Msg::MinuteIncrementChanged(config.minute_increment));
    if let Some(url) = config.initial_url {
        let _ = msg_tx.send(Msg::UrlInputChanged(url));
        let _ = msg_tx.send(Msg::SubmitClicked);
    }
    input::spawn_stdin_reader(msg_tx.clone(), !one_shot);

    // Background tick to throttle terminal output.
    thread::spawn(move || {
        let interval = Duration::from_millis(75);
        while msg_tx.send(Msg::Tick).is_ok() {
            thread::sleep(interval);
        }
    });

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut renderer = TerminalRenderer::new(stdout.lock(), stderr.lock(), !one_shot);
    let mut state = AppState::new();
    let mut started = false;
    renderer
        .render(&state.view())
        .context("failed to write to the terminal")?;

    for msg in msg_rx.iter() {
        let tick = matches!(msg, Msg::Tick);
        let (next, effects) = update(state, msg);
        state = next;
        started |= effects
            .iter()
            .any(|effect| matches!(effect, Effect::SubmitJob { .. }));
        runner.enqueue(effects);

        let view = state.view();
        let finished = view.exit_requested || (one_shot && started && !view.phase.is_active());
        if (tick || finished) && state.consume_dirty() {
            state.consume_scroll();
            renderer.render(&view).context("failed to write to the terminal")?;
        }
        if finished {
            break;
        }
        // One-shot input that fails validation never starts a job.
        if one_shot && !started && view.error.is_some() {
            renderer.render(&view).context("failed to write to the terminal")?;
            bail!("--url was rejected");
        }
    }

    match state.phase() {
        SessionPhase::Failed if one_shot => bail!("job failed"),
        _ => Ok(()),
    }
}
