use std::collections::HashMap;
use std::str::FromStr;
use std::thread::{self, ThreadId};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use global_hotkey::{
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
    hotkey::HotKey,
};
use kanal::{Receiver, Sender};
use nickscan_core::{HotkeyHandler, HotkeyService};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

enum Command {
    Register {
        hotkey: HotKey,
        handler: HotkeyHandler,
        reply: Sender<Result<()>>,
    },
    Unregister {
        hotkey: HotKey,
        reply: Option<Sender<Result<()>>>,
    },
    Shutdown,
}

/// System-wide hotkeys served from a dedicated thread.
///
/// The OS manager and its message queue are thread-affine, so every
/// registration is marshalled to the worker that created them. Handlers run
/// on that worker and must return quickly.
pub struct GlobalHotkeys {
    commands: Sender<Command>,
    worker: ThreadId,
}

impl GlobalHotkeys {
    pub fn spawn() -> Result<Self> {
        let (commands, inbox) = kanal::unbounded::<Command>();
        let (ready_tx, ready_rx) = kanal::bounded::<Result<()>>(1);

        let handle = thread::Builder::new()
            .name("nickscan-hotkeys".into())
            .spawn(move || run_worker(inbox, ready_tx))
            .context("Failed to spawn hotkey thread")?;

        ready_rx
            .recv()
            .context("Hotkey thread exited during startup")??;

        Ok(Self {
            commands,
            worker: handle.thread().id(),
        })
    }

    fn request(&self, build: impl FnOnce(Sender<Result<()>>) -> Command) -> Result<()> {
        let (reply, response) = kanal::bounded(1);
        self.commands
            .send(build(reply))
            .map_err(|_| anyhow!("hotkey thread is gone"))?;
        response.recv().context("hotkey thread dropped the request")?
    }
}

impl HotkeyService for GlobalHotkeys {
    fn register(&self, combo: &str, handler: HotkeyHandler) -> Result<()> {
        let hotkey = parse_combo(combo)?;
        self.request(|reply| Command::Register {
            hotkey,
            handler,
            reply,
        })
    }

    fn unregister(&self, combo: &str) -> Result<()> {
        let hotkey = parse_combo(combo)?;

        // A handler stopping the detector runs on the worker; waiting for a reply would deadlock
        if thread::current().id() == self.worker {
            return self
                .commands
                .send(Command::Unregister {
                    hotkey,
                    reply: None,
                })
                .map_err(|_| anyhow!("hotkey thread is gone"));
        }

        self.request(|reply| Command::Unregister {
            hotkey,
            reply: Some(reply),
        })
    }
}

impl Drop for GlobalHotkeys {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

/// Accepts the usual spellings: `alt+q`, `Ctrl+Shift+S`, `F9`
pub fn parse_combo(combo: &str) -> Result<HotKey> {
    HotKey::from_str(combo.trim()).map_err(|e| anyhow!("invalid hotkey '{combo}': {e}"))
}

fn run_worker(inbox: Receiver<Command>, ready: Sender<Result<()>>) {
    let manager = match GlobalHotKeyManager::new() {
        Ok(manager) => {
            let _ = ready.send(Ok(()));
            manager
        }
        Err(e) => {
            let _ = ready.send(Err(anyhow!("Failed to create hotkey manager: {e}")));
            return;
        }
    };

    let events = GlobalHotKeyEvent::receiver();
    let mut handlers: HashMap<u32, HotkeyHandler> = HashMap::new();

    tracing::debug!("hotkey thread started");
    loop {
        loop {
            match inbox.try_recv() {
                Ok(Some(Command::Register {
                    hotkey,
                    handler,
                    reply,
                })) => {
                    let result = manager
                        .register(hotkey)
                        .map_err(|e| anyhow!("Failed to register hotkey: {e}"));
                    if result.is_ok() {
                        handlers.insert(hotkey.id(), handler);
                    }
                    let _ = reply.send(result);
                }
                Ok(Some(Command::Unregister { hotkey, reply })) => {
                    handlers.remove(&hotkey.id());
                    let result = manager
                        .unregister(hotkey)
                        .map_err(|e| anyhow!("Failed to unregister hotkey: {e}"));
                    match reply {
                        Some(reply) => {
                            let _ = reply.send(result);
                        }
                        None => {
                            if let Err(e) = result {
                                tracing::warn!("{e:#}");
                            }
                        }
                    }
                }
                Ok(Some(Command::Shutdown)) | Err(_) => {
                    tracing::debug!("hotkey thread stopping");
                    return;
                }
                Ok(None) => break,
            }
        }

        #[cfg(windows)]
        pump_messages();

        while let Ok(event) = events.try_recv() {
            if event.state != HotKeyState::Pressed {
                continue;
            }
            match handlers.get(&event.id) {
                Some(handler) => handler(),
                None => tracing::trace!(id = event.id, "unknown hotkey event"),
            }
        }

        thread::sleep(POLL_INTERVAL);
    }
}

/// The manager's hidden window only receives WM_HOTKEY while its thread pumps
#[cfg(windows)]
fn pump_messages() {
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, MSG, PM_REMOVE, PeekMessageW, TranslateMessage,
    };

    let mut msg = MSG::default();
    unsafe {
        while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use global_hotkey::hotkey::{Code, Modifiers};

    use super::*;

    #[test]
    fn test_parse_default_combo() {
        let hotkey = parse_combo("alt+q").unwrap();
        assert_eq!(hotkey, HotKey::new(Some(Modifiers::ALT), Code::KeyQ));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let hotkey = parse_combo(" Ctrl+Shift+S ").unwrap();
        assert_eq!(
            hotkey,
            HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::KeyS)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_combo("alt+").is_err());
        assert!(parse_combo("hyper+nothing").is_err());
    }
}
