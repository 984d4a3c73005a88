use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::{CycleOutcome, EditController, ViewState};
use crate::{
    error::{EditError, Result},
    models::GenerationResult,
    upload,
};

const QUEUE_DEPTH: usize = 64;

enum Command {
    Upload {
        path: PathBuf,
        reply: oneshot::Sender<Result<bool>>,
    },
    UploadBytes(Vec<u8>),
    SetInstruction(String),
    Generate {
        reply: oneshot::Sender<Option<CycleOutcome>>,
    },
    Save {
        reply: oneshot::Sender<Result<Option<PathBuf>>>,
    },
    Shutdown,
}

/// Work finished off the dispatcher, posted back to it.
enum Completion {
    UploadDecoded {
        seq: u64,
        decoded: Result<String>,
        reply: oneshot::Sender<Result<bool>>,
    },
    Generated {
        outcome: Result<Option<GenerationResult>>,
        reply: oneshot::Sender<Option<CycleOutcome>>,
    },
}

/// Single-task dispatcher around an [`EditController`].
///
/// File reads and remote calls run as separate tasks; their results come
/// back as events, so other commands keep being handled meanwhile. Only the
/// dispatcher ever touches the controller.
pub struct EditSession {
    controller: EditController,
    commands: mpsc::Receiver<Command>,
    completions: mpsc::Receiver<Completion>,
    completion_tx: mpsc::Sender<Completion>,
    views: watch::Sender<ViewState>,
    /// Sequence number of the most recent selection; older reads are stale.
    latest_upload: u64,
}

#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    views: watch::Receiver<ViewState>,
}

impl EditSession {
    /// Starts the dispatcher. The join handle yields the controller back
    /// once the session stops.
    pub fn spawn(controller: EditController) -> (SessionHandle, JoinHandle<EditController>) {
        let (session, handle) = Self::new(controller);
        (handle, tokio::spawn(session.run()))
    }

    fn new(controller: EditController) -> (Self, SessionHandle) {
        let (command_tx, commands) = mpsc::channel(QUEUE_DEPTH);
        let (completion_tx, completions) = mpsc::channel(QUEUE_DEPTH);
        let (views, view_rx) = watch::channel(controller.view());

        let session = EditSession {
            controller,
            commands,
            completions,
            completion_tx,
            views,
            latest_upload: 0,
        };

        let handle = SessionHandle {
            commands: command_tx,
            views: view_rx,
        };

        (session, handle)
    }

    async fn run(mut self) -> EditController {
        log::debug!("Edit session started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                Some(completion) = self.completions.recv() => self.handle_completion(completion),
            }
            self.views.send_replace(self.controller.view());
        }
        log::debug!("Edit session stopped");
        self.controller
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Upload { path, reply } => {
                self.latest_upload += 1;
                let seq = self.latest_upload;
                let tx = self.completion_tx.clone();
                tokio::spawn(async move {
                    let decoded = upload::read_as_data_url(&path).await;
                    let _ = tx
                        .send(Completion::UploadDecoded {
                            seq,
                            decoded,
                            reply,
                        })
                        .await;
                });
            }
            Command::UploadBytes(bytes) => {
                self.latest_upload += 1;
                self.controller.accept_upload_bytes(&bytes);
            }
            Command::SetInstruction(text) => self.controller.set_instruction(text),
            Command::Generate { reply } => match self.controller.begin_generation() {
                Some(request) => {
                    let service = self.controller.service();
                    let tx = self.completion_tx.clone();
                    tokio::spawn(async move {
                        let outcome = EditController::run_edit(service.as_ref(), &request).await;
                        let _ = tx.send(Completion::Generated { outcome, reply }).await;
                    });
                }
                None => {
                    let _ = reply.send(None);
                }
            },
            Command::Save { reply } => {
                let _ = reply.send(self.controller.save_result().await);
            }
            Command::Shutdown => {}
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::UploadDecoded {
                seq,
                decoded,
                reply,
            } => {
                if seq < self.latest_upload {
                    log::debug!("Dropping upload #{} superseded by #{}", seq, self.latest_upload);
                    let _ = reply.send(Err(EditError::SessionError(
                        "upload superseded by a later selection".into(),
                    )));
                    return;
                }
                let accepted = match decoded {
                    Ok(url) => Ok(self.controller.accept_data_url(&url)),
                    Err(e) => {
                        log::error!("Failed to read upload: {}", e);
                        Err(e)
                    }
                };
                let _ = reply.send(accepted);
            }
            Completion::Generated { outcome, reply } => {
                let cycle = self.controller.finish_generation(outcome);
                let _ = reply.send(Some(cycle));
            }
        }
    }
}

fn closed() -> EditError {
    EditError::SessionError("edit session is no longer running".into())
}

impl SessionHandle {
    async fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).await.map_err(|_| closed())
    }

    /// Reads a file and holds it. Resolves once the decode has been applied.
    pub async fn upload(&self, path: impl Into<PathBuf>) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Upload {
            path: path.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| closed())?
    }

    pub async fn upload_bytes(&self, bytes: Vec<u8>) -> Result<()> {
        self.send(Command::UploadBytes(bytes)).await
    }

    pub async fn set_instruction(&self, text: impl Into<String>) -> Result<()> {
        self.send(Command::SetInstruction(text.into())).await
    }

    /// Requests a generation and waits for its cycle to settle.
    /// `None` means the request was refused.
    pub async fn generate(&self) -> Result<Option<CycleOutcome>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Generate { reply }).await?;
        rx.await.map_err(|_| closed())
    }

    pub async fn save(&self) -> Result<Option<PathBuf>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Save { reply }).await?;
        rx.await.map_err(|_| closed())?
    }

    pub fn view(&self) -> ViewState {
        self.views.borrow().clone()
    }

    pub fn views(&self) -> watch::Receiver<ViewState> {
        self.views.clone()
    }

    /// Waits until no generation is in flight.
    pub async fn wait_idle(&self) -> Result<ViewState> {
        let mut views = self.views.clone();
        let view = views.wait_for(|view| !view.busy).await.map_err(|_| closed())?;
        Ok(view.clone())
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }
}
