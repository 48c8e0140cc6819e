use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub trait ClipboardStrategy {
    fn name(&self) -> &'static str;
    fn copy(&mut self, text: &str) -> Result<()>;
}

/// Tries each strategy in order. On total failure returns every error, in order.
pub fn copy_with_fallbacks(
    text: &str,
    strategies: &mut [Box<dyn ClipboardStrategy>],
) -> Result<&'static str, Vec<String>> {
    let mut errors = Vec::new();
    for strategy in strategies.iter_mut() {
        match strategy.copy(text) {
            Ok(()) => return Ok(strategy.name()),
            Err(err) => errors.push(format!("{}: {err:#}", strategy.name())),
        }
    }
    Err(errors)
}

pub fn default_strategies(osc52: bool) -> Vec<Box<dyn ClipboardStrategy>> {
    vec![
        Box::new(SystemClipboard),
        Box::new(Osc52Clipboard { enabled: osc52 }),
    ]
}

/// Pipes into whichever desktop clipboard tool is installed.
pub struct SystemClipboard;

const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("clip.exe", &[]),
];

impl ClipboardStrategy for SystemClipboard {
    fn name(&self) -> &'static str {
        "system clipboard"
    }

    fn copy(&mut self, text: &str) -> Result<()> {
        for (program, args) in CLIPBOARD_TOOLS {
            if pipe_to(program, args, text).is_ok() {
                return Ok(());
            }
        }
        Err(anyhow!("no clipboard tool available"))
    }
}

fn pipe_to(program: &str, args: &[&str], text: &str) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("spawn {program}"))?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .with_context(|| format!("write to {program}"))?;
    }
    let status = child.wait().with_context(|| format!("wait for {program}"))?;
    if !status.success() {
        bail!("{program} exited with {status}");
    }
    Ok(())
}

/// Terminal-side copy via the OSC 52 escape sequence.
pub struct Osc52Clipboard {
    pub enabled: bool,
}

pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text.as_bytes()))
}

impl ClipboardStrategy for Osc52Clipboard {
    fn name(&self) -> &'static str {
        "osc52"
    }

    fn copy(&mut self, text: &str) -> Result<()> {
        if !self.enabled {
            bail!("disabled");
        }
        let term = std::env::var("TERM").unwrap_or_default();
        if term.is_empty() || term == "dumb" {
            bail!("terminal does not accept escape sequences");
        }
        let mut stdout = std::io::stdout();
        stdout
            .write_all(osc52_sequence(text).as_bytes())
            .context("write osc52")?;
        stdout.flush().context("flush osc52")?;
        Ok(())
    }
}
