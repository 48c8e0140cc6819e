use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::Backend;

use crate::ui::{Dialog, render_dialog};

/// Blocking user dialogs. Every call returns only once the user has answered.
pub trait Notifier {
    fn confirm(&mut self, message: &str) -> bool;
    fn notify(&mut self, message: &str);
    /// Last resort when nothing could copy `text` for the user.
    fn prompt_copy(&mut self, message: &str, text: &str);
    /// Single-line input; `None` when the user cancels.
    fn prompt_text(&mut self, title: &str, initial: &str) -> Option<String>;
}

/// Draws a modal over the terminal and blocks on key input, like a browser dialog
/// pauses the page's event loop.
pub struct TerminalNotifier<B: Backend> {
    terminal: Rc<RefCell<Terminal<B>>>,
}

impl<B: Backend> TerminalNotifier<B> {
    pub fn new(terminal: Rc<RefCell<Terminal<B>>>) -> Self {
        Self { terminal }
    }

    fn show(&self, dialog: &Dialog<'_>) -> io::Result<()> {
        self.terminal
            .borrow_mut()
            .draw(|frame| render_dialog(frame, dialog))?;
        Ok(())
    }

    fn next_key(&self, dialog: &Dialog<'_>) -> io::Result<KeyEvent> {
        loop {
            self.show(dialog)?;
            // Anything else (resize, mouse) just redraws.
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                return Ok(key);
            }
        }
    }

    fn run_confirm(&self, message: &str) -> io::Result<bool> {
        let dialog = Dialog {
            title: "Confirm",
            body: message,
            input: None,
            footer: "y Yes | n/Esc No",
        };
        loop {
            let key = self.next_key(&dialog)?;
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => return Ok(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => return Ok(false),
                _ => {}
            }
        }
    }

    fn run_notify(&self, title: &str, message: &str) -> io::Result<()> {
        let dialog = Dialog {
            title,
            body: message,
            input: None,
            footer: "Enter/Esc OK",
        };
        loop {
            let key = self.next_key(&dialog)?;
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                return Ok(());
            }
        }
    }

    fn run_prompt(&self, title: &str, initial: &str) -> io::Result<Option<String>> {
        let mut buffer = initial.to_string();
        loop {
            let dialog = Dialog {
                title,
                body: "",
                input: Some(&buffer),
                footer: "Enter Apply | Esc Cancel",
            };
            let key = self.next_key(&dialog)?;
            match key.code {
                KeyCode::Enter => return Ok(Some(buffer)),
                KeyCode::Esc => return Ok(None),
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
        }
    }
}

impl<B: Backend> Notifier for TerminalNotifier<B> {
    fn confirm(&mut self, message: &str) -> bool {
        self.run_confirm(message).unwrap_or(false)
    }

    fn notify(&mut self, message: &str) {
        let _ = self.run_notify("Notice", message);
    }

    fn prompt_copy(&mut self, message: &str, text: &str) {
        let body = format!("{message}\n\n{text}");
        let _ = self.run_notify("Copy", &body);
    }

    fn prompt_text(&mut self, title: &str, initial: &str) -> Option<String> {
        self.run_prompt(title, initial).unwrap_or(None)
    }
}
