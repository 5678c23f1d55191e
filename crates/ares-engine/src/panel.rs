//! Rendered panels and the response channel they are sent through.
//!
//! A [`Panel`] is what a chat client shows as a rich message: a header, a
//! title, a description, inline fields and an image. Engines
//! never print; they hand panels to a [`Responder`] and keep the returned
//! [`MessageHandle`] so the same message can be edited or deleted later.

use crate::markup::Markup;

/// Identifies a message previously sent through a [`Responder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageHandle(pub u64);

impl std::fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One named block inside a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelField {
    /// Field heading.
    pub name: String,
    /// Field body.
    pub value: Markup,
    /// Whether the field may sit next to its neighbours.
    pub inline: bool,
}

/// A rich message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panel {
    /// Header name.
    pub author: Option<String>,
    /// Header icon URL.
    pub icon: Option<String>,
    /// Title line.
    pub title: Option<String>,
    /// Main body.
    pub description: Option<Markup>,
    /// Named blocks.
    pub fields: Vec<PanelField>,
    /// Image URL shown at the bottom.
    pub image: Option<String>,
}

impl Panel {
    /// An empty panel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the header.
    pub fn with_author(mut self, name: impl Into<String>, icon: Option<String>) -> Self {
        self.author = Some(name.into());
        self.icon = icon;
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the body.
    pub fn with_description(mut self, description: Markup) -> Self {
        self.description = Some(description);
        self
    }

    /// Append an inline field.
    pub fn with_field(mut self, name: impl Into<String>, value: Markup) -> Self {
        self.fields.push(PanelField {
            name: name.into(),
            value,
            inline: true,
        });
        self
    }

    /// Set the image.
    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    /// Render the panel as terminal text, styling markup with `show`.
    ///
    /// `show` must end its output with a line break.
    pub fn render_with(&self, show: impl Fn(&Markup) -> String) -> String {
        let mut out = String::new();
        match (&self.icon, &self.author) {
            (Some(icon), Some(author)) => out.push_str(&format!("[{icon}] {author}\n")),
            (None, Some(author)) => out.push_str(&format!("{author}\n")),
            _ => {}
        }
        if let Some(title) = &self.title {
            out.push_str(title);
            out.push('\n');
        }
        if let Some(description) = &self.description {
            out.push_str(&show(description));
        }
        for field in &self.fields {
            out.push_str(&field.name);
            out.push('\n');
            out.push_str(&show(&field.value));
        }
        if let Some(image) = &self.image {
            out.push_str(&format!("[image: {image}]\n"));
        }
        out
    }

    /// Render the panel as unstyled text.
    pub fn render_plain(&self) -> String {
        self.render_with(|m| format!("{}\n", m.to_plain()))
    }
}

/// The channel panels are delivered through.
///
/// Calls complete before returning, so two renders of the same message
/// never overlap. Editing returns the handle to use for the next edit.
pub trait Responder {
    /// Publish a new message.
    fn send(&mut self, panel: &Panel) -> MessageHandle;

    /// Replace the contents of a published message.
    fn edit(&mut self, handle: MessageHandle, panel: &Panel) -> MessageHandle;

    /// Remove a published message.
    fn delete(&mut self, handle: MessageHandle);
}

/// Something that happened on a [`RecordingResponder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderEvent {
    /// A new message was published.
    Sent(MessageHandle, Panel),
    /// A message was edited in place.
    Edited(MessageHandle, Panel),
    /// A message was removed.
    Deleted(MessageHandle),
}

/// A [`Responder`] that keeps every call for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingResponder {
    /// Calls in the order they were made.
    pub events: Vec<ResponderEvent>,
    next_id: u64,
}

impl RecordingResponder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently sent or edited panel.
    pub fn last_panel(&self) -> Option<&Panel> {
        self.events.iter().rev().find_map(|event| match event {
            ResponderEvent::Sent(_, panel) | ResponderEvent::Edited(_, panel) => Some(panel),
            ResponderEvent::Deleted(_) => None,
        })
    }

    /// Number of messages sent.
    pub fn sent_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ResponderEvent::Sent(..)))
            .count()
    }

    /// Number of edits made.
    pub fn edit_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ResponderEvent::Edited(..)))
            .count()
    }

    /// Handles of deleted messages.
    pub fn deleted(&self) -> Vec<MessageHandle> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ResponderEvent::Deleted(handle) => Some(*handle),
                _ => None,
            })
            .collect()
    }
}

impl Responder for RecordingResponder {
    fn send(&mut self, panel: &Panel) -> MessageHandle {
        self.next_id += 1;
        let handle = MessageHandle(self.next_id);
        self.events.push(ResponderEvent::Sent(handle, panel.clone()));
        handle
    }

    fn edit(&mut self, handle: MessageHandle, panel: &Panel) -> MessageHandle {
        self.events.push(ResponderEvent::Edited(handle, panel.clone()));
        handle
    }

    fn delete(&mut self, handle: MessageHandle) {
        self.events.push(ResponderEvent::Deleted(handle));
    }
}
