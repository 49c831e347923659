//! Typed input records
//!
//! Raw `INPUT_RECORD`s drained from the console queue are converted into
//! [`RawInputRecord`] values before classification. Anything the event loop
//! does not care about (focus, menu, window-buffer-size records) collapses
//! into [`RawInputRecord::Other`].

use bitflags::bitflags;

/// Virtual key code for the Escape key; pressing it stops the event loop.
pub const VK_ESCAPE: u16 = 0x1B;

bitflags! {
    /// Mouse event classification flags from `MOUSE_EVENT_RECORD.dwEventFlags`.
    ///
    /// An empty flag word is a plain button press or release.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MouseEventFlags: u32 {
        /// The mouse position changed.
        const MOVED = 0x0001;
        /// The second click of a double-click.
        const DOUBLE_CLICK = 0x0002;
        /// The vertical wheel was rolled.
        const WHEELED = 0x0004;
        /// The horizontal wheel was rolled.
        const HWHEELED = 0x0008;
    }
}

/// One record drained from the console input queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInputRecord {
    Key {
        /// Translated character, if the key produced one. A NUL translation
        /// is reported as `None`.
        ch: Option<char>,
        virtual_key: u16,
        is_down: bool,
    },
    Mouse {
        x: i16,
        y: i16,
        event_flags: MouseEventFlags,
        button_state: u32,
    },
    /// Any other record kind; ignored by the event loop.
    Other,
}

/// Name of a non-printable virtual key, used when echoing key presses.
///
/// Keys not in the table are echoed through the `"VirtualKeyCode: N"`
/// fallback by the caller.
pub fn virtual_key_name(code: u16) -> Option<&'static str> {
    let name = match code {
        0x08 => "Backspace",
        0x09 => "Tab",
        0x0D => "Enter",
        0x10 => "Shift",
        0x11 => "Control",
        0x12 => "Alt",
        0x13 => "Pause",
        0x14 => "CapsLock",
        0x1B => "Escape",
        0x20 => "Space",
        0x21 => "PageUp",
        0x22 => "PageDown",
        0x23 => "End",
        0x24 => "Home",
        0x25 => "LeftArrow",
        0x26 => "UpArrow",
        0x27 => "RightArrow",
        0x28 => "DownArrow",
        0x2C => "PrintScreen",
        0x2D => "Insert",
        0x2E => "Delete",
        0x5B => "LeftWindows",
        0x5C => "RightWindows",
        0x5D => "Applications",
        0x70 => "F1",
        0x71 => "F2",
        0x72 => "F3",
        0x73 => "F4",
        0x74 => "F5",
        0x75 => "F6",
        0x76 => "F7",
        0x77 => "F8",
        0x78 => "F9",
        0x79 => "F10",
        0x7A => "F11",
        0x7B => "F12",
        0x90 => "NumLock",
        0x91 => "ScrollLock",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_key_names() {
        assert_eq!(virtual_key_name(VK_ESCAPE), Some("Escape"));
        assert_eq!(virtual_key_name(0x70), Some("F1"));
        assert_eq!(virtual_key_name(0x7B), Some("F12"));
        assert_eq!(virtual_key_name(0x26), Some("UpArrow"));
    }

    #[test]
    fn test_unknown_key_has_no_name() {
        // 'A' is printable and deliberately absent from the table
        assert_eq!(virtual_key_name(0x41), None);
        assert_eq!(virtual_key_name(0xFF), None);
    }

    #[test]
    fn test_mouse_flag_words() {
        assert!(MouseEventFlags::empty().is_empty());
        assert_eq!(MouseEventFlags::MOVED.bits(), 1);
        assert_eq!(MouseEventFlags::DOUBLE_CLICK.bits(), 2);
        assert_eq!(MouseEventFlags::WHEELED.bits(), 4);
        // Unknown bits survive a truncating construction
        let f = MouseEventFlags::from_bits_truncate(0x0005);
        assert!(f.contains(MouseEventFlags::MOVED));
        assert!(f.contains(MouseEventFlags::WHEELED));
    }
}
