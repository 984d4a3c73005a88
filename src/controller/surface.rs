use colored::*;

use super::view::{SlotView, ViewState};

/// User-facing notices. None of them carry error detail; that goes to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    MissingInput,
    Busy,
    GenerationFailed,
    NoResultProduced,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::MissingInput => "Please upload an image and provide a prompt.",
            Notice::Busy => "A generation is already in progress.",
            Notice::GenerationFailed => {
                "An error occurred while generating the image. Please check the console for details."
            }
            Notice::NoResultProduced => "The model did not return an image for this prompt.",
        }
    }
}

/// Whatever displays the editor: a page, a terminal, a test recorder.
pub trait Surface: Send + Sync {
    fn render(&mut self, view: &ViewState);
    fn notify(&mut self, notice: Notice);
}

/// Terminal surface used by the binary.
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    last: Option<ViewState>,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

fn slot_label(slot: &SlotView) -> String {
    match slot {
        SlotView::Placeholder => "placeholder".to_string(),
        SlotView::Image(src) => format!("image ({} chars)", src.len()),
    }
}

impl Surface for ConsoleSurface {
    fn render(&mut self, view: &ViewState) {
        if self.last.as_ref() == Some(view) {
            return;
        }
        if view.busy {
            eprintln!("{}", format!("⏳ {}", view.generate_label).yellow());
        }
        log::debug!(
            "view: original={} edited={} enabled={} busy={} save={}",
            slot_label(&view.original),
            slot_label(&view.edited),
            view.generate_enabled,
            view.busy,
            view.save_visible
        );
        self.last = Some(view.clone());
    }

    fn notify(&mut self, notice: Notice) {
        eprintln!("{}", format!("⚠️  {}", notice.message()).bright_red().bold());
    }
}
