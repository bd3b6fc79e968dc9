//! Virtual-key constants and the mapping from physical keys onto the two
//! five-key hand clusters.

/// Hand a cluster key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Left,
    Right,
}

/// One key of a hand cluster, identified by its bit position (0..5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterKey {
    pub hand: Hand,
    pub bit: u8,
}

impl ClusterKey {
    pub const fn new(hand: Hand, bit: u8) -> Self {
        Self { hand, bit }
    }

    pub const fn mask(self) -> u8 {
        1 << self.bit
    }
}

pub const VK_BACK: u16 = 0x08;
pub const VK_RETURN: u16 = 0x0D;
pub const VK_SHIFT: u16 = 0x10;
pub const VK_CONTROL: u16 = 0x11;
pub const VK_MENU: u16 = 0x12;
pub const VK_ESCAPE: u16 = 0x1B;
pub const VK_SPACE: u16 = 0x20;
pub const VK_A: u16 = 0x41;
pub const VK_C: u16 = 0x43;
pub const VK_D: u16 = 0x44;
pub const VK_F: u16 = 0x46;
pub const VK_J: u16 = 0x4A;
pub const VK_K: u16 = 0x4B;
pub const VK_L: u16 = 0x4C;
pub const VK_M: u16 = 0x4D;
pub const VK_Q: u16 = 0x51;
pub const VK_S: u16 = 0x53;
pub const VK_LWIN: u16 = 0x5B;
pub const VK_RWIN: u16 = 0x5C;
pub const VK_OEM_1: u16 = 0xBA; // `;` on US layouts

/// Chord cluster bindings. Left hand on the home row plus C for the thumb,
/// right hand mirrored with M as the thumb.
pub const VK_TO_CLUSTER: &[(u16, ClusterKey)] = &[
    (VK_A, ClusterKey::new(Hand::Left, 0)),     // pinky
    (VK_S, ClusterKey::new(Hand::Left, 1)),     // ring
    (VK_D, ClusterKey::new(Hand::Left, 2)),     // middle
    (VK_F, ClusterKey::new(Hand::Left, 3)),     // index
    (VK_C, ClusterKey::new(Hand::Left, 4)),     // thumb
    (VK_OEM_1, ClusterKey::new(Hand::Right, 0)), // pinky
    (VK_L, ClusterKey::new(Hand::Right, 1)),    // ring
    (VK_K, ClusterKey::new(Hand::Right, 2)),    // middle
    (VK_J, ClusterKey::new(Hand::Right, 3)),    // index
    (VK_M, ClusterKey::new(Hand::Right, 4)),    // thumb
];

/// Keys that are modifiers on their own; the dispatcher never swallows them.
pub const MODIFIER_VKS: &[u16] = &[
    0x10, 0x11, 0x12, // Shift, Ctrl, Alt
    0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, // left/right variants
    0x5B, 0x5C, // Win keys
];

/// Non-chord keys deliberately left alone while capture is active.
pub const PASSTHROUGH_VKS: &[u16] = &[
    0x1B, // Esc
    0x09, // Tab
    0x2C, // PrintScreen
    0x90, // NumLock
    0x14, // CapsLock
    0x91, // ScrollLock
    0x2D, // Insert
    0x2E, // Delete
    0x70, 0x71, 0x72, 0x73, 0x74, 0x75, // F1..F6
    0x76, 0x77, 0x78, 0x79, 0x7A, 0x7B, // F7..F12
];

pub fn vk_to_cluster(vk: u16) -> Option<ClusterKey> {
    VK_TO_CLUSTER
        .iter()
        .find(|(code, _)| *code == vk)
        .map(|(_, key)| *key)
}

pub fn is_modifier_vk(vk: u16) -> bool {
    MODIFIER_VKS.contains(&vk)
}

pub fn is_passthrough_vk(vk: u16) -> bool {
    PASSTHROUGH_VKS.contains(&vk)
}

const LEFT_LABELS: [&str; 5] = ["A", "S", "D", "F", "C"];
const RIGHT_LABELS: [&str; 5] = [";", "L", "K", "J", "M"];
const LEFT_CHARS: [char; 5] = ['a', 's', 'd', 'f', 'c'];
const RIGHT_CHARS: [char; 5] = [';', 'l', 'k', 'j', 'm'];

/// Display label for a cluster key. `bit` must be below 5.
pub fn key_label(hand: Hand, bit: u8) -> &'static str {
    match hand {
        Hand::Left => LEFT_LABELS[bit as usize],
        Hand::Right => RIGHT_LABELS[bit as usize],
    }
}

/// Literal character a cluster key types in text mode. `bit` must be below 5.
pub fn key_char(hand: Hand, bit: u8) -> char {
    match hand {
        Hand::Left => LEFT_CHARS[bit as usize],
        Hand::Right => RIGHT_CHARS[bit as usize],
    }
}

/// Bits of a left-hand mask in canonical display order (A S D F C).
pub fn left_bits(mask: u8) -> impl Iterator<Item = u8> {
    (0..5u8).filter(move |bit| mask & (1 << bit) != 0)
}

/// Bits of a right-hand mask in canonical display order (M J K L ;).
pub fn right_bits(mask: u8) -> impl Iterator<Item = u8> {
    (0..5u8).rev().filter(move |bit| mask & (1 << bit) != 0)
}
