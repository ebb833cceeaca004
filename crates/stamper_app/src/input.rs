use std::io::BufRead;
use std::sync::mpsc;
use std::thread;

use stamper_core::Msg;

/// Maps one line typed by the user to messages.
///
/// `q` quits, `c` cancels the running job, `m <n>` sets the minute
/// increment. Anything else is treated as a URL and submitted.
pub fn interpret_line(line: &str) -> Vec<Msg> {
    let line = line.trim();
    match line {
        "" => Vec::new(),
        "q" | "quit" => vec![Msg::QuitRequested],
        "c" | "cancel" => vec![Msg::CancelClicked],
        _ => match line.strip_prefix("m ") {
            Some(increment) => vec![Msg::MinuteIncrementChanged(increment.trim().to_string())],
            None => vec![Msg::UrlInputChanged(line.to_string()), Msg::SubmitClicked],
        },
    }
}

/// Reads stdin on its own thread until EOF or until the receiver goes away.
///
/// In interactive mode EOF is a quit request.
pub fn spawn_stdin_reader(msg_tx: mpsc::Sender<Msg>, quit_on_eof: bool) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            for msg in interpret_line(&line) {
                if msg_tx.send(msg).is_err() {
                    return;
                }
            }
        }
        if quit_on_eof {
            let _ = msg_tx.send(Msg::QuitRequested);
        }
    });
}
