use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};
use std::fmt::Display;
use std::io::IsTerminal;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum Theme {
    /// Colour when stdout is a terminal.
    Auto,
    /// Never colour.
    Plain,
}

/// What a piece of text means on screen; each tone maps to one style.
#[derive(Clone, Copy)]
enum Tone {
    Title,
    Label,
    Value,
    Good,
    Alert,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Tone::Title => Style::new().fg(Color::Cyan).bold().underline(),
            Tone::Label => Style::new().fg(Color::Blue),
            Tone::Value => Style::new().bold(),
            Tone::Good => Style::new().fg(Color::Green).bold(),
            Tone::Alert => Style::new().fg(Color::Red).bold(),
        }
    }
}

/// Human-facing output for text mode. Results go to stdout, progress and
/// warnings to stderr.
pub struct Ui {
    colour: bool,
    quiet: bool,
}

impl Ui {
    pub fn new(theme: Theme, quiet: bool) -> Self {
        let colour = !quiet && theme == Theme::Auto && std::io::stdout().is_terminal();
        #[cfg(windows)]
        if colour {
            let _ = nu_ansi_term::enable_ansi_support();
        }
        Self { colour, quiet }
    }

    fn paint(&self, tone: Tone, text: &str) -> String {
        if self.colour {
            tone.style().paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Prints `title` followed by one `label: value` line per row, labels
    /// right-aligned. Nothing is printed for an empty table.
    pub fn section<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        let rows: Vec<(&str, String)> = rows
            .into_iter()
            .map(|(label, value)| (label, value.to_string()))
            .collect();
        let Some(width) = rows.iter().map(|(label, _)| label.len()).max() else {
            return;
        };

        println!("{}", self.paint(Tone::Title, title));
        for (label, value) in &rows {
            let label = format!("{label:>width$}:");
            println!(
                "  {} {}",
                self.paint(Tone::Label, &label),
                self.paint(Tone::Value, value)
            );
        }
    }

    pub fn success(&self, message: &str) {
        println!("{} {message}", self.paint(Tone::Good, "ok"));
    }

    pub fn warn(&self, message: &str) {
        eprintln!("{} {message}", self.paint(Tone::Alert, "warning:"));
    }

    /// Starts a timed stage. A spinner is shown only when stderr is a terminal
    /// and output is not quiet.
    pub fn task(&self, label: impl Into<String>) -> Stage<'_> {
        let label = label.into();
        let spinner = (!self.quiet && std::io::stderr().is_terminal()).then(|| {
            let bar = ProgressBar::new_spinner().with_message(label.clone());
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        Stage {
            ui: self,
            label,
            started: Instant::now(),
            spinner,
            done: false,
        }
    }
}

/// A running stage; dropping it without [`Stage::finish`] reports a failure.
pub struct Stage<'a> {
    ui: &'a Ui,
    label: String,
    started: Instant,
    spinner: Option<ProgressBar>,
    done: bool,
}

impl Stage<'_> {
    pub fn finish(mut self) -> Duration {
        self.done = true;
        if let Some(bar) = self.spinner.take() {
            bar.finish_and_clear();
        }
        self.started.elapsed()
    }
}

impl Drop for Stage<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if let Some(bar) = self.spinner.take() {
            bar.finish_and_clear();
        }
        self.ui.warn(&format!(
            "{} stopped after {}",
            self.label,
            format_duration(self.started.elapsed())
        ));
    }
}

/// Milliseconds below one second, seconds with two decimals above.
pub fn format_duration(duration: Duration) -> String {
    if duration < Duration::from_secs(1) {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}
