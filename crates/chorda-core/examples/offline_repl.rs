use chorda_core::config::Settings;
use chorda_core::dispatch::Dispatcher;
use chorda_core::keymap::{VK_A, VK_C, VK_K, VK_M, VK_OEM_1, VK_S, VK_SPACE};
use chorda_core::types::{HeldMods, HookAction, InjectOp, KeyEdge, Notification, RawKeyEvent};
use std::time::Duration;

fn key(vk: u16, edge: KeyEdge) -> RawKeyEvent {
    RawKeyEvent {
        vk,
        edge,
        injected: false,
        mods: HeldMods::none(),
    }
}

fn describe(ops: &[InjectOp]) -> String {
    ops.iter()
        .map(|op| match op {
            InjectOp::Text(text) => format!("type {text:?}"),
            InjectOp::Backspace(count) => format!("backspace x{count}"),
            InjectOp::DeleteWord => "delete word".to_string(),
            InjectOp::Enter => "enter".to_string(),
            InjectOp::Delay(ms) => format!("wait {ms}ms"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn press_chord(dispatcher: &mut Dispatcher, label: &str, vks: &[u16]) {
    for &vk in vks {
        dispatcher.on_event(key(vk, KeyEdge::Down));
    }
    let mut last = HookAction::Suppress;
    for &vk in vks {
        last = dispatcher.on_event(key(vk, KeyEdge::Up));
    }
    match last {
        HookAction::Inject(ops) => println!("{label:>8} -> {}", describe(&ops)),
        other => println!("{label:>8} -> {other:?}"),
    }
    println!("{:>8}    buffer: {:?}", "", dispatcher.buffer_display());
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Empty endpoint: the expansion worker echoes the buffer back, so the
    // whole loop runs offline.
    let settings = Settings {
        endpoint: String::new(),
        ..Settings::default()
    };
    let mut dispatcher = Dispatcher::new(settings);
    dispatcher.set_notifier(|note| {
        if let Notification::Reference(card) = note {
            println!("--- reference card ---\n{card}");
        }
    });

    let toggle = RawKeyEvent {
        vk: dispatcher.settings().toggle_vk,
        edge: KeyEdge::Down,
        injected: false,
        mods: HeldMods {
            alt: true,
            ..HeldMods::none()
        },
    };
    dispatcher.on_event(toggle);
    println!("capture enabled: {}", dispatcher.is_enabled());

    press_chord(&mut dispatcher, "A+;", &[VK_A, VK_OEM_1]);
    press_chord(&mut dispatcher, "S+;", &[VK_S, VK_OEM_1]);
    press_chord(&mut dispatcher, "C+M", &[VK_C, VK_M]);
    press_chord(&mut dispatcher, "S+;", &[VK_S, VK_OEM_1]);

    println!("space    -> hand the buffer to the expansion service");
    dispatcher.on_event(key(VK_SPACE, KeyEdge::Down));
    dispatcher.on_event(key(VK_SPACE, KeyEdge::Up));

    for _ in 0..200 {
        if let Some(ops) = dispatcher.pump() {
            println!("result   -> {}", describe(&ops));
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    press_chord(&mut dispatcher, "C+M+K", &[VK_C, VK_M, VK_K]);
    Ok(())
}
