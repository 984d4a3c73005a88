pub mod session;
pub mod state;
pub mod surface;
pub mod view;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    config::EditorConfig,
    download,
    error::Result,
    gemini::{ImageClient, ImageEditService},
    models::{GenerationRequest, GenerationResult},
    upload,
};

pub use session::{EditSession, SessionHandle};
pub use state::{CycleOutcome, EditorState, Phase, Refusal};
pub use surface::{ConsoleSurface, Notice, Surface};
pub use view::{render, SlotView, ViewState};

/// Owns the editor state and drives upload, generation and save.
pub struct EditController {
    state: EditorState,
    service: Arc<dyn ImageEditService>,
    surface: Box<dyn Surface>,
    download_dir: PathBuf,
}

impl EditController {
    pub fn new(
        service: Arc<dyn ImageEditService>,
        surface: Box<dyn Surface>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        let mut controller = Self {
            state: EditorState::new(),
            service,
            surface,
            download_dir: download_dir.into(),
        };
        controller.refresh();
        controller
    }

    pub fn from_config(config: &EditorConfig, surface: Box<dyn Surface>) -> Self {
        let service = Arc::new(ImageClient::new(config.gemini.clone()));
        Self::new(service, surface, config.download_dir.clone())
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn view(&self) -> ViewState {
        render(&self.state)
    }

    pub fn service(&self) -> Arc<dyn ImageEditService> {
        Arc::clone(&self.service)
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    fn refresh(&mut self) {
        let view = render(&self.state);
        self.surface.render(&view);
    }

    /// Takes a decoded file as a data URL. Returns whether an image is now held.
    pub fn accept_data_url(&mut self, url: &str) -> bool {
        let held = self.state.accept_data_url(url);
        match self.state.uploaded() {
            Some(image) => log::info!(
                "📥 Upload accepted: {} ({} base64 chars)",
                image.mime_type,
                image.data.len()
            ),
            None => log::warn!("Upload could not be parsed; cleared held image"),
        }
        self.refresh();
        held
    }

    pub fn accept_upload_bytes(&mut self, bytes: &[u8]) -> bool {
        self.accept_data_url(&upload::to_data_url(bytes))
    }

    /// Reads a local file and takes it as the held image.
    ///
    /// An I/O failure leaves the held image untouched.
    pub async fn accept_upload(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let url = upload::read_as_data_url(path).await?;
        Ok(self.accept_data_url(&url))
    }

    pub fn set_instruction(&mut self, text: impl Into<String>) {
        self.state.set_instruction(text);
        self.refresh();
    }

    /// Enters the busy state and hands back the request to send, or shows
    /// why it refused.
    pub fn begin_generation(&mut self) -> Option<GenerationRequest> {
        match self.state.begin_generation() {
            Ok(request) => {
                self.refresh();
                Some(request)
            }
            Err(refusal) => {
                let notice = match refusal {
                    Refusal::MissingInput => Notice::MissingInput,
                    Refusal::Busy => Notice::Busy,
                };
                log::warn!("Generation refused: {:?}", refusal);
                self.surface.notify(notice);
                None
            }
        }
    }

    /// Leaves the busy state. Failures are logged and turned into the generic notice.
    pub fn finish_generation(&mut self, outcome: Result<Option<GenerationResult>>) -> CycleOutcome {
        let notice = match &outcome {
            Ok(Some(_)) => None,
            Ok(None) => Some(Notice::NoResultProduced),
            Err(e) => {
                log::error!("Image generation failed: {}", e);
                Some(Notice::GenerationFailed)
            }
        };

        let cycle = self.state.complete_generation(outcome);
        self.refresh();
        if let Some(notice) = notice {
            self.surface.notify(notice);
        }
        cycle
    }

    /// Runs one remote call. Used both inline and from spawned session tasks.
    pub async fn run_edit(
        service: &dyn ImageEditService,
        request: &GenerationRequest,
    ) -> Result<Option<GenerationResult>> {
        let cycle_id = Uuid::new_v4();
        log::info!("🎨 [cycle:{}] sending edit to {}", cycle_id, service.model());
        let _timer = crate::logger::timer(&format!("cycle {}", cycle_id));

        let outcome = service.edit(request).await;
        match &outcome {
            Ok(Some(result)) => log::info!("✅ [cycle:{}] received {}", cycle_id, result.mime_type),
            Ok(None) => log::warn!("[cycle:{}] no image in response", cycle_id),
            Err(e) => log::debug!("[cycle:{}] failed: {:?}", cycle_id, e),
        }
        outcome
    }

    /// Full cycle: refuse, or dispatch, await and settle. `None` when refused.
    pub async fn request_generation(&mut self) -> Option<CycleOutcome> {
        let request = self.begin_generation()?;
        let service = self.service();
        let outcome = Self::run_edit(service.as_ref(), &request).await;
        Some(self.finish_generation(outcome))
    }

    /// Writes the displayed result into the download directory.
    ///
    /// No result on screen is a silent no-op.
    pub async fn save_result(&self) -> Result<Option<PathBuf>> {
        match self.state.result() {
            Some(result) => download::save_to_dir(result, &self.download_dir)
                .await
                .map(Some),
            None => {
                log::debug!("Save requested with no result displayed");
                Ok(None)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    const PNG_URL: &str = "data:image/png;base64,AAAA";

    fn controller(answer: Scripted) -> (EditController, Arc<ScriptedService>, RecordingSurface) {
        let service = Arc::new(ScriptedService::new(answer));
        let surface = RecordingSurface::default();
        let controller = EditController::new(service.clone(), Box::new(surface.clone()), ".");
        (controller, service, surface)
    }

    fn jpeg_result() -> GenerationResult {
        GenerationResult::new("BBBB", Some("image/jpeg"))
    }

    #[test]
    fn test_upload_shows_original() {
        let (mut controller, _, surface) = controller(Scripted::Empty);
        assert!(controller.accept_data_url(PNG_URL));

        let view = surface.views().pop().unwrap();
        assert_eq!(view.original, SlotView::Image(PNG_URL.into()));
        assert!(!view.generate_enabled);
    }

    #[test]
    fn test_bad_upload_reverts_to_placeholder() {
        let (mut controller, _, surface) = controller(Scripted::Empty);
        controller.accept_data_url(PNG_URL);
        controller.set_instruction("blur");
        assert!(controller.view().generate_enabled);

        assert!(!controller.accept_data_url("data:,"));
        let view = surface.views().pop().unwrap();
        assert_eq!(view.original, SlotView::Placeholder);
        assert!(!view.generate_enabled);
    }

    #[tokio::test]
    async fn test_refused_without_input_never_calls_service() {
        let (mut controller, service, surface) = controller(Scripted::Image(jpeg_result()));
        controller.set_instruction("make it blue");

        assert_eq!(controller.request_generation().await, None);
        assert_eq!(service.call_count(), 0);
        assert_eq!(surface.notices(), vec![Notice::MissingInput]);
    }

    #[tokio::test]
    async fn test_successful_cycle() {
        let (mut controller, service, surface) = controller(Scripted::Image(jpeg_result()));
        controller.accept_data_url(PNG_URL);
        controller.set_instruction("make it blue");

        let outcome = controller.request_generation().await;
        assert_eq!(outcome, Some(CycleOutcome::Succeeded));
        assert_eq!(service.call_count(), 1);

        let sent = service.requests.lock().unwrap()[0].clone();
        assert_eq!(sent.image.data, "AAAA");
        assert_eq!(sent.image.mime_type, "image/png");
        assert_eq!(sent.instruction, "make it blue");

        let views = surface.views();
        assert!(views.iter().any(|v| v.busy && !v.generate_enabled));
        let last = views.last().unwrap();
        assert!(!last.busy);
        assert!(last.generate_enabled);
        assert!(last.save_visible);
        assert_eq!(last.edited, SlotView::Image("data:image/jpeg;base64,BBBB".into()));
        assert!(surface.notices().is_empty());
    }

    #[tokio::test]
    async fn test_failed_cycle_notifies_and_clears_busy() {
        let (mut controller, _, surface) = controller(Scripted::Fail);
        controller.accept_data_url(PNG_URL);
        controller.set_instruction("make it blue");

        assert_eq!(
            controller.request_generation().await,
            Some(CycleOutcome::Failed)
        );
        assert_eq!(surface.notices(), vec![Notice::GenerationFailed]);

        let view = controller.view();
        assert!(!view.busy);
        assert!(view.generate_enabled);
        assert_eq!(view.edited, SlotView::Placeholder);
    }

    #[tokio::test]
    async fn test_empty_cycle_reports_no_result() {
        let (mut controller, _, surface) = controller(Scripted::Empty);
        controller.accept_data_url(PNG_URL);
        controller.set_instruction("make it blue");

        assert_eq!(
            controller.request_generation().await,
            Some(CycleOutcome::EmptySucceeded)
        );
        assert_eq!(surface.notices(), vec![Notice::NoResultProduced]);
        assert!(!controller.view().save_visible);
    }

    #[tokio::test]
    async fn test_begin_twice_is_refused_as_busy() {
        let (mut controller, _, surface) = controller(Scripted::Empty);
        controller.accept_data_url(PNG_URL);
        controller.set_instruction("make it blue");

        assert!(controller.begin_generation().is_some());
        assert!(controller.begin_generation().is_none());
        assert_eq!(surface.notices(), vec![Notice::Busy]);
    }

    #[tokio::test]
    async fn test_save_without_result_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(ScriptedService::new(Scripted::Empty));
        let controller = EditController::new(
            service,
            Box::new(RecordingSurface::default()),
            dir.path(),
        );

        assert_eq!(controller.save_result().await.unwrap(), None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_save_after_success_writes_jpg() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(ScriptedService::new(Scripted::Image(
            GenerationResult::new("aGVsbG8=", Some("image/jpeg")),
        )));
        let mut controller = EditController::new(
            service,
            Box::new(RecordingSurface::default()),
            dir.path(),
        );
        controller.accept_data_url(PNG_URL);
        controller.set_instruction("make it blue");
        controller.request_generation().await;

        let path = controller.save_result().await.unwrap().unwrap();
        assert_eq!(path.extension().unwrap(), "jpg");
        assert_eq!(std::fs::read(path).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_upload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();

        let (mut controller, _, _) = controller(Scripted::Empty);
        assert!(controller.accept_upload(&path).await.unwrap());
        assert_eq!(controller.state().uploaded().unwrap().mime_type, "image/png");

        // A failed read keeps the previous image.
        assert!(controller.accept_upload(dir.path().join("gone.png")).await.is_err());
        assert!(controller.state().uploaded().is_some());
    }
}
