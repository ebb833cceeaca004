use std::io::{self, Write};

use stamper_core::{AppViewModel, SessionPhase};

const PROMPT: &str = "url> ";

/// Draws view models onto a line-oriented terminal.
///
/// The view always carries the full accumulated text; only the part not yet
/// on screen is written. If the text stops extending what was printed (a new
/// job started), it is printed again from the start.
pub struct TerminalRenderer<O: Write, E: Write> {
    out: O,
    err: E,
    interactive: bool,
    printed: String,
    line_closed: bool,
    last_error: Option<String>,
    last_phase: Option<SessionPhase>,
}

impl<O: Write, E: Write> TerminalRenderer<O, E> {
    pub fn new(out: O, err: E, interactive: bool) -> Self {
        Self {
            out,
            err,
            interactive,
            printed: String::new(),
            line_closed: false,
            last_error: None,
            last_phase: None,
        }
    }

    pub fn render(&mut self, view: &AppViewModel) -> io::Result<()> {
        self.write_output(&view.output)?;
        if view.scroll_to_bottom {
            self.out.flush()?;
        }

        if view.error != self.last_error {
            if let Some(message) = &view.error {
                self.end_line()?;
                writeln!(self.err, "error: {message}")?;
            }
            self.last_error = view.error.clone();
        }

        if self.last_phase.as_ref() != Some(&view.phase) {
            self.phase_changed(view)?;
            self.last_phase = Some(view.phase.clone());
        }

        self.out.flush()?;
        self.err.flush()
    }

    fn write_output(&mut self, output: &str) -> io::Result<()> {
        if output == self.printed {
            return Ok(());
        }
        if let Some(suffix) = output.strip_prefix(self.printed.as_str()) {
            self.out.write_all(suffix.as_bytes())?;
        } else {
            self.end_line()?;
            self.out.write_all(output.as_bytes())?;
        }
        self.line_closed = false;
        self.printed.clear();
        self.printed.push_str(output);
        Ok(())
    }

    fn phase_changed(&mut self, view: &AppViewModel) -> io::Result<()> {
        match &view.phase {
            SessionPhase::Streaming { request_id, .. } => {
                writeln!(self.err, "streaming {request_id}")?;
            }
            SessionPhase::Finished => {
                self.end_line()?;
            }
            SessionPhase::Cancelled => {
                self.end_line()?;
                writeln!(self.err, "cancelled")?;
            }
            SessionPhase::Idle | SessionPhase::Submitting { .. } | SessionPhase::Failed => {}
        }
        if self.interactive && view.awaiting_input() {
            write!(self.err, "{PROMPT}")?;
        }
        Ok(())
    }

    /// Terminates a partially printed output line.
    fn end_line(&mut self) -> io::Result<()> {
        if !self.line_closed && !self.printed.is_empty() && !self.printed.ends_with('\n') {
            self.out.write_all(b"\n")?;
        }
        self.line_closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn streaming(output: &str) -> AppViewModel {
        AppViewModel {
            phase: SessionPhase::Streaming {
                job_id: 1,
                request_id: "abc123".to_string(),
            },
            output: output.to_string(),
            scroll_to_bottom: true,
            ..AppViewModel::default()
        }
    }

    fn stdout_of(renderer: TerminalRenderer<Vec<u8>, Vec<u8>>) -> (String, String) {
        (
            String::from_utf8(renderer.out).unwrap(),
            String::from_utf8(renderer.err).unwrap(),
        )
    }

    #[test]
    fn prints_only_the_new_suffix() {
        let mut renderer = TerminalRenderer::new(Vec::new(), Vec::new(), false);
        for full in ["Hel", "Hello wor", "Hello world\n"] {
            renderer.render(&streaming(full)).unwrap();
        }
        let (out, err) = stdout_of(renderer);
        assert_eq!(out, "Hello world\n");
        assert_eq!(err, "streaming abc123\n");
    }

    #[test]
    fn reprints_when_output_is_replaced() {
        let mut renderer = TerminalRenderer::new(Vec::new(), Vec::new(), false);
        renderer.render(&streaming("first job")).unwrap();
        renderer.render(&streaming("second")).unwrap();
        let (out, _) = stdout_of(renderer);
        assert_eq!(out, "first job\nsecond");
    }

    #[test]
    fn error_is_written_once_to_stderr() {
        let mut renderer = TerminalRenderer::new(Vec::new(), Vec::new(), false);
        let failed = AppViewModel {
            phase: SessionPhase::Failed,
            output: "partial".to_string(),
            error: Some("connection reset".to_string()),
            ..AppViewModel::default()
        };
        renderer.render(&failed).unwrap();
        renderer.render(&failed).unwrap();
        let (out, err) = stdout_of(renderer);
        assert_eq!(out, "partial\n");
        assert_eq!(err, "error: connection reset\n");
    }

    #[test]
    fn interactive_prompt_after_job_finishes() {
        let mut renderer = TerminalRenderer::new(Vec::new(), Vec::new(), true);
        renderer.render(&streaming("00:00 intro")).unwrap();
        renderer
            .render(&AppViewModel {
                phase: SessionPhase::Finished,
                output: "00:00 intro".to_string(),
                ..AppViewModel::default()
            })
            .unwrap();
        let (out, err) = stdout_of(renderer);
        assert_eq!(out, "00:00 intro\n");
        assert_eq!(err, "streaming abc123\nurl> ");
    }
}
