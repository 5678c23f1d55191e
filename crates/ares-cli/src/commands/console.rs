//! Panels printed to stdout in place of chat messages.

use colored::{ColoredString, Colorize};

use ares_engine::markup::Span;
use ares_engine::{Color, Markup, MessageHandle, Panel, Responder, Weight};

/// Prints every panel with its message handle so edits can be followed.
pub struct ConsoleResponder {
    ansi: bool,
    last: u64,
}

impl ConsoleResponder {
    /// With `ansi`, panel markup is printed as ANSI code blocks even when
    /// stdout is not a terminal, the way the chat client receives it.
    pub fn new(ansi: bool) -> Self {
        if ansi {
            colored::control::set_override(true);
        }
        Self { ansi, last: 0 }
    }

    fn render(&self, panel: &Panel) -> String {
        if self.ansi {
            panel.render_with(ansi_block)
        } else {
            panel.render_plain()
        }
    }
}

impl Responder for ConsoleResponder {
    fn send(&mut self, panel: &Panel) -> MessageHandle {
        self.last += 1;
        let handle = MessageHandle(self.last);
        println!("{} {handle}", "posted".bold());
        println!("{}", self.render(panel));
        handle
    }

    fn edit(&mut self, handle: MessageHandle, panel: &Panel) -> MessageHandle {
        println!("{} {handle}", "edited".bold());
        println!("{}", self.render(panel));
        handle
    }

    fn delete(&mut self, handle: MessageHandle) {
        println!("{} {handle}\n", "deleted".bold());
    }
}

/// Markup as an `ansi` fenced code block.
fn ansi_block(markup: &Markup) -> String {
    let body: String = markup.spans().iter().map(styled).collect();
    format!("```ansi\n{body}\n```\n")
}

/// Blank spans stay unstyled.
fn styled(span: &Span) -> String {
    if span.text.trim().is_empty() {
        return span.text.clone();
    }
    let mut text: ColoredString = span.text.as_str().normal();
    if let Some(color) = span.color {
        text = text.color(palette(color));
    }
    let text = match span.weight {
        Weight::Normal => text,
        Weight::Bold => text.bold(),
        Weight::Underline => text.underline(),
    };
    text.to_string()
}

fn palette(color: Color) -> colored::Color {
    match color {
        Color::Gray => colored::Color::Black,
        Color::Red => colored::Color::Red,
        Color::Green => colored::Color::Green,
        Color::Yellow => colored::Color::Yellow,
        Color::Blue => colored::Color::Blue,
        Color::Pink => colored::Color::Magenta,
        Color::Cyan => colored::Color::Cyan,
        Color::White => colored::Color::White,
    }
}
