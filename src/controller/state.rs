use crate::models::{GenerationRequest, GenerationResult, UploadedImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Dispatching,
}

/// How a finished cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Succeeded,
    EmptySucceeded,
    Failed,
}

/// Why a generation was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    MissingInput,
    Busy,
}

/// Everything the controller holds. Transitions are plain methods so they
/// can be exercised without a runtime or a service.
#[derive(Debug, Clone)]
pub struct EditorState {
    uploaded: Option<UploadedImage>,
    instruction: String,
    result: Option<GenerationResult>,
    phase: Phase,
    last_outcome: Option<CycleOutcome>,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            uploaded: None,
            instruction: String::new(),
            result: None,
            phase: Phase::Idle,
            last_outcome: None,
        }
    }
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uploaded(&self) -> Option<&UploadedImage> {
        self.uploaded.as_ref()
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Dispatching
    }

    pub fn last_outcome(&self) -> Option<CycleOutcome> {
        self.last_outcome
    }

    /// Gating rule: an image is held and the trimmed instruction is non-empty.
    pub fn can_generate(&self) -> bool {
        self.uploaded.is_some() && !self.instruction.trim().is_empty()
    }

    /// Replaces the held image wholesale. An unparseable data URL clears it.
    pub fn accept_data_url(&mut self, url: &str) -> bool {
        self.uploaded = UploadedImage::from_data_url(url);
        self.uploaded.is_some()
    }

    pub fn clear_upload(&mut self) {
        self.uploaded = None;
    }

    pub fn set_instruction(&mut self, text: impl Into<String>) {
        self.instruction = text.into();
    }

    /// Idle -> Dispatching. Hides any previous result.
    pub fn begin_generation(&mut self) -> Result<GenerationRequest, Refusal> {
        if self.is_busy() {
            return Err(Refusal::Busy);
        }
        let image = match (&self.uploaded, self.instruction.trim().is_empty()) {
            (Some(image), false) => image.clone(),
            _ => return Err(Refusal::MissingInput),
        };

        self.result = None;
        self.phase = Phase::Dispatching;

        Ok(GenerationRequest {
            image,
            instruction: self.instruction.clone(),
        })
    }

    /// Dispatching -> Idle, whatever the outcome.
    pub fn complete_generation<E>(
        &mut self,
        outcome: Result<Option<GenerationResult>, E>,
    ) -> CycleOutcome {
        let cycle = match outcome {
            Ok(Some(result)) => {
                self.result = Some(result);
                CycleOutcome::Succeeded
            }
            Ok(None) => CycleOutcome::EmptySucceeded,
            Err(_) => CycleOutcome::Failed,
        };

        self.phase = Phase::Idle;
        self.last_outcome = Some(cycle);
        cycle
    }
}
