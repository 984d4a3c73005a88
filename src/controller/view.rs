use serde::Serialize;

use super::state::EditorState;

pub const GENERATE_LABEL: &str = "Generate";
pub const GENERATING_LABEL: &str = "Generating...";

/// One image slot shows either its placeholder or an image, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "src", rename_all = "snake_case")]
pub enum SlotView {
    Placeholder,
    Image(String),
}

impl SlotView {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, SlotView::Placeholder)
    }
}

/// Every visual flag of the page, derived from state in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub original: SlotView,
    pub edited: SlotView,
    pub generate_enabled: bool,
    pub generate_label: &'static str,
    pub busy: bool,
    pub save_visible: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        render(&EditorState::default())
    }
}

pub fn render(state: &EditorState) -> ViewState {
    let busy = state.is_busy();

    let original = state
        .uploaded()
        .map(|image| SlotView::Image(image.to_data_url()))
        .unwrap_or(SlotView::Placeholder);

    let edited = state
        .result()
        .map(|result| SlotView::Image(result.to_data_url()))
        .unwrap_or(SlotView::Placeholder);

    ViewState {
        save_visible: !edited.is_placeholder(),
        original,
        edited,
        generate_enabled: !busy && state.can_generate(),
        generate_label: if busy { GENERATING_LABEL } else { GENERATE_LABEL },
        busy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenerationResult;

    #[test]
    fn test_initial_view() {
        let view = ViewState::default();
        assert_eq!(view.original, SlotView::Placeholder);
        assert_eq!(view.edited, SlotView::Placeholder);
        assert!(!view.generate_enabled);
        assert!(!view.busy);
        assert!(!view.save_visible);
        assert_eq!(view.generate_label, GENERATE_LABEL);
    }

    #[test]
    fn test_busy_view_disables_trigger() {
        let mut state = EditorState::new();
        state.accept_data_url("data:image/png;base64,AAAA");
        state.set_instruction("sepia");
        assert!(render(&state).generate_enabled);

        state.begin_generation().unwrap();
        let view = render(&state);
        assert!(view.busy);
        assert!(!view.generate_enabled);
        assert_eq!(view.generate_label, GENERATING_LABEL);
        assert_eq!(view.edited, SlotView::Placeholder);
        assert_eq!(
            view.original,
            SlotView::Image("data:image/png;base64,AAAA".into())
        );
    }

    #[test]
    fn test_result_view_shows_save() {
        let mut state = EditorState::new();
        state.accept_data_url("data:image/png;base64,AAAA");
        state.set_instruction("sepia");
        state.begin_generation().unwrap();
        state.complete_generation::<()>(Ok(Some(GenerationResult::new("BBBB", None))));

        let view = render(&state);
        assert!(!view.busy);
        assert!(view.save_visible);
        assert_eq!(view.edited, SlotView::Image("data:image/png;base64,BBBB".into()));
    }
}
