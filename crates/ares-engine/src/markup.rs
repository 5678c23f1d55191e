//! Styled text with semantic color and weight tags.
//!
//! Engines describe panel text as spans; the frontend decides how to style
//! them, as an ANSI code block (what the chat client renders) or plain text.

/// Semantic text colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Dim text.
    Gray,
    /// Danger, loss, the opponent side of a duel.
    Red,
    /// Healthy hostiles, success.
    Green,
    /// Unknown or hidden.
    Yellow,
    /// Friendly, the challenger side of a duel.
    Blue,
    /// Bosses.
    Pink,
    /// Accents.
    Cyan,
    /// Emphasis.
    White,
}

/// Text weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Weight {
    /// Regular text.
    #[default]
    Normal,
    /// Bold text.
    Bold,
    /// Underlined text.
    Underline,
}

/// One run of text sharing a style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// The text.
    pub text: String,
    /// Optional color.
    pub color: Option<Color>,
    /// Weight.
    pub weight: Weight,
}

/// A sequence of styled spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup {
    spans: Vec<Span>,
}

impl Markup {
    /// Create empty markup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unstyled text.
    pub fn push(&mut self, text: impl Into<String>) -> &mut Self {
        self.push_styled(text, None, Weight::Normal)
    }

    /// Append colored text.
    pub fn push_colored(&mut self, text: impl Into<String>, color: Color) -> &mut Self {
        self.push_styled(text, Some(color), Weight::Normal)
    }

    /// Append text with an explicit style.
    pub fn push_styled(
        &mut self,
        text: impl Into<String>,
        color: Option<Color>,
        weight: Weight,
    ) -> &mut Self {
        self.spans.push(Span {
            text: text.into(),
            color,
            weight,
        });
        self
    }

    /// Append a line break.
    pub fn newline(&mut self) -> &mut Self {
        self.push("\n")
    }

    /// The spans in order.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// The text with all styling dropped.
    pub fn to_plain(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

impl std::fmt::Display for Markup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain())
    }
}
