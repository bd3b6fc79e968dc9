//! Windows low-level keyboard hook.
//!
//! Installs a WH_KEYBOARD_LL hook and runs the message pump on the calling
//! thread. The [`Dispatcher`] lives in a thread-local on that same thread;
//! the expansion worker wakes the pump with a thread message when a result
//! is ready.

use crate::config::Settings;
use crate::dispatch::Dispatcher;
use crate::keymap::{
    VK_BACK, VK_CONTROL, VK_ESCAPE, VK_LWIN, VK_MENU, VK_RETURN, VK_RWIN, VK_SHIFT,
};
use crate::types::{HeldMods, HookAction, InjectOp, KeyEdge, Notification, RawKeyEvent};
use std::cell::RefCell;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{error, info};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, HHOOK, KBDLLHOOKSTRUCT,
    LLKHF_INJECTED, MSG, PM_NOREMOVE, WH_KEYBOARD_LL, WM_APP, WM_KEYDOWN, WM_KEYUP, WM_SYSKEYDOWN,
    WM_SYSKEYUP,
};

/// Marker stamped on every keystroke we synthesize, so the hook can tell
/// its own output from user input.
const INJECTED_EXTRA_INFO: usize = 0xFFC0_0DA1;

/// Posted by the expansion worker to get the pump to drain a result.
const WM_APP_PUMP: u32 = WM_APP + 1;

static HOOK_HANDLE: Mutex<Option<HHOOK>> = Mutex::new(None);

thread_local! {
    static DISPATCHER: RefCell<Option<Dispatcher>> = RefCell::new(None);
}

/// Installs the hook and blocks running the message pump. The dispatcher is
/// created here and owned by the calling thread for its whole life.
pub fn run(
    settings: Settings,
    notifier: impl Fn(Notification) + Send + 'static,
) -> anyhow::Result<()> {
    let thread_id = unsafe { GetCurrentThreadId() };
    let waker: Box<dyn Fn() + Send + Sync> = Box::new(move || unsafe {
        let _ = PostThreadMessageW(thread_id, WM_APP_PUMP, WPARAM(0), LPARAM(0));
    });

    let mut dispatcher = Dispatcher::with_waker(settings, Some(waker));
    dispatcher.set_notifier(notifier);
    DISPATCHER.with(|slot| {
        *slot.borrow_mut() = Some(dispatcher);
    });

    install_hook()?;
    run_event_loop();
    uninstall_hook();
    Ok(())
}

fn install_hook() -> anyhow::Result<()> {
    let hook =
        unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(hook_proc), HINSTANCE::default(), 0)? };
    if hook.is_invalid() {
        return Err(anyhow::anyhow!("keyboard hook installation failed"));
    }
    *HOOK_HANDLE.lock().unwrap() = Some(hook);
    info!("keyboard hook installed");
    Ok(())
}

fn uninstall_hook() {
    if let Some(hook) = HOOK_HANDLE.lock().unwrap().take() {
        unsafe {
            let _ = UnhookWindowsHookEx(hook);
        }
        info!("keyboard hook removed");
    }
}

fn run_event_loop() {
    let mut msg = MSG::default();
    unsafe {
        // Force creation of this thread's message queue before anything
        // gets posted to it.
        let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);

        info!("message pump running");
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            if msg.message == WM_APP_PUMP {
                pump_expansion();
                continue;
            }
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        info!("message pump exited");
    }
}

fn pump_expansion() {
    let (ops, delay) = DISPATCHER.with(|slot| {
        let mut slot = slot.borrow_mut();
        match slot.as_mut() {
            Some(dispatcher) => (
                dispatcher.pump(),
                dispatcher.settings().backspace_delay_ms,
            ),
            None => (None, 0),
        }
    });
    if let Some(ops) = ops {
        execute_ops(&ops, delay);
    }
}

unsafe extern "system" fn hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code < 0 {
        return CallNextHookEx(None, code, wparam, lparam);
    }

    let kbd = &*(lparam.0 as *const KBDLLHOOKSTRUCT);

    // Our own output comes back through the hook; let it straight through.
    if kbd.dwExtraInfo == INJECTED_EXTRA_INFO {
        return CallNextHookEx(None, code, wparam, lparam);
    }

    let edge = match wparam.0 as u32 {
        WM_KEYDOWN | WM_SYSKEYDOWN => KeyEdge::Down,
        WM_KEYUP | WM_SYSKEYUP => KeyEdge::Up,
        _ => return CallNextHookEx(None, code, wparam, lparam),
    };

    // Emergency stop: Ctrl+Alt+Esc ends the process no matter what.
    if kbd.vkCode == VK_ESCAPE as u32 && key_held(VK_CONTROL) && key_held(VK_MENU) {
        error!("emergency stop (Ctrl+Alt+Esc)");
        std::process::exit(1);
    }

    let event = RawKeyEvent {
        vk: kbd.vkCode as u16,
        edge,
        injected: kbd.flags.0 & LLKHF_INJECTED.0 != 0,
        mods: HeldMods {
            ctrl: key_held(VK_CONTROL),
            shift: key_held(VK_SHIFT),
            alt: key_held(VK_MENU),
            win: key_held(VK_LWIN) || key_held(VK_RWIN),
        },
    };

    let (action, delay) = DISPATCHER.with(|slot| {
        let mut slot = slot.borrow_mut();
        match slot.as_mut() {
            Some(dispatcher) => (
                dispatcher.on_event(event),
                dispatcher.settings().backspace_delay_ms,
            ),
            None => (HookAction::Pass, 0),
        }
    });

    match action {
        HookAction::Pass => CallNextHookEx(None, code, wparam, lparam),
        HookAction::Suppress => LRESULT(1),
        HookAction::Inject(ops) => {
            execute_ops(&ops, delay);
            LRESULT(1)
        }
    }
}

fn key_held(vk: u16) -> bool {
    unsafe { GetAsyncKeyState(vk as i32) as u16 & 0x8000 != 0 }
}

fn execute_ops(ops: &[InjectOp], backspace_delay_ms: u64) {
    for op in ops {
        match op {
            InjectOp::Text(text) => {
                for ch in text.chars() {
                    inject_unicode(ch, false);
                    inject_unicode(ch, true);
                }
            }
            InjectOp::Backspace(count) => {
                for _ in 0..*count {
                    inject_vk(VK_BACK, false);
                    inject_vk(VK_BACK, true);
                    std::thread::sleep(Duration::from_millis(backspace_delay_ms));
                }
            }
            InjectOp::DeleteWord => {
                inject_vk(VK_CONTROL, false);
                inject_vk(VK_BACK, false);
                inject_vk(VK_BACK, true);
                inject_vk(VK_CONTROL, true);
            }
            InjectOp::Enter => {
                inject_vk(VK_RETURN, false);
                inject_vk(VK_RETURN, true);
            }
            InjectOp::Delay(ms) => std::thread::sleep(Duration::from_millis(*ms)),
        }
    }
}

fn inject_unicode(ch: char, up: bool) {
    let mut flags = KEYEVENTF_UNICODE;
    if up {
        flags |= KEYEVENTF_KEYUP;
    }
    let mut units = [0u16; 2];
    for unit in ch.encode_utf16(&mut units) {
        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(0),
                    wScan: *unit,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: INJECTED_EXTRA_INFO,
                },
            },
        };
        unsafe {
            SendInput(&[input], std::mem::size_of::<INPUT>() as i32);
        }
    }
}

fn inject_vk(vk: u16, up: bool) {
    let flags = if up {
        KEYEVENTF_KEYUP
    } else {
        KEYBD_EVENT_FLAGS(0)
    };
    let input = INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: INJECTED_EXTRA_INFO,
            },
        },
    };
    unsafe {
        SendInput(&[input], std::mem::size_of::<INPUT>() as i32);
    }
}
