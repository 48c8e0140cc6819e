#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use sf6_terminal::clipboard::ClipboardStrategy;
use sf6_terminal::config::AppConfig;
use sf6_terminal::dashboard::Dashboard;
use sf6_terminal::notify::Notifier;
use sf6_terminal::prefs::{PrefStore, SharedPrefs};
use sf6_terminal::state::ProviderCommand;

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Confirm(String),
    Notify(String),
    PromptCopy(String),
    Prompt(String),
    /// A command that was already queued when the next dialog opened.
    Sent(ProviderCommand),
}

/// Answers dialogs from a script and records everything it was shown.
pub struct RecordingNotifier {
    pub journal: Vec<Entry>,
    pub confirm_answer: bool,
    pub prompt_answers: VecDeque<Option<String>>,
    commands: Option<Rc<Receiver<ProviderCommand>>>,
}

impl RecordingNotifier {
    pub fn new(commands: Option<Rc<Receiver<ProviderCommand>>>) -> Self {
        Self {
            journal: Vec::new(),
            confirm_answer: true,
            prompt_answers: VecDeque::new(),
            commands,
        }
    }

    fn flush_commands(&mut self) {
        if let Some(rx) = &self.commands {
            self.journal.extend(rx.try_iter().map(Entry::Sent));
        }
    }

    pub fn notifications(&self) -> Vec<&str> {
        self.journal
            .iter()
            .filter_map(|entry| match entry {
                Entry::Notify(msg) => Some(msg.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn confirm(&mut self, message: &str) -> bool {
        self.flush_commands();
        self.journal.push(Entry::Confirm(message.to_string()));
        self.confirm_answer
    }

    fn notify(&mut self, message: &str) {
        self.flush_commands();
        self.journal.push(Entry::Notify(message.to_string()));
    }

    fn prompt_copy(&mut self, _message: &str, text: &str) {
        self.flush_commands();
        self.journal.push(Entry::PromptCopy(text.to_string()));
    }

    fn prompt_text(&mut self, title: &str, _initial: &str) -> Option<String> {
        self.flush_commands();
        self.journal.push(Entry::Prompt(title.to_string()));
        self.prompt_answers.pop_front().flatten()
    }
}

pub struct Harness {
    pub dashboard: Dashboard<RecordingNotifier>,
    pub commands: Rc<Receiver<ProviderCommand>>,
    pub prefs: SharedPrefs,
    pub start: Instant,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_clipboard(Vec::new())
    }

    pub fn with_clipboard(clipboard: Vec<Box<dyn ClipboardStrategy>>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let commands = Rc::new(cmd_rx);
        let prefs = PrefStore::in_memory().shared();
        let notifier = RecordingNotifier::new(Some(Rc::clone(&commands)));
        let dashboard = Dashboard::new(
            &AppConfig::default(),
            notifier,
            Rc::clone(&prefs),
            Some(cmd_tx),
            clipboard,
        );
        Self {
            dashboard,
            commands,
            prefs,
            start: Instant::now(),
        }
    }

    /// Commands queued since the last call (or the last dialog).
    pub fn sent(&self) -> Vec<ProviderCommand> {
        self.commands.try_iter().collect()
    }

    pub fn journal(&self) -> &[Entry] {
        &self.dashboard.notifier().journal
    }
}

pub fn count(commands: &[ProviderCommand], wanted: &ProviderCommand) -> usize {
    commands.iter().filter(|cmd| *cmd == wanted).count()
}
