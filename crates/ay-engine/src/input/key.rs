use std::hash::{Hash, Hasher};
use std::mem;

/// Keyboard key identifier.
///
/// Variants map to the native key codes (GLFW numbering). Keys without a
/// variant can be queried through `Key::Raw` with the native code.
///
/// Equality and hashing follow the native code: `Key::Raw(65) == Key::A`.
#[derive(Debug, Copy, Clone)]
pub enum Key {
    // Common control keys
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    // Left-hand modifiers
    Shift,
    Control,
    Alt,
    Meta,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Function keys
    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    /// Native key code passed through unchanged.
    Raw(i32),
}

const LETTERS: [Key; 26] = [
    Key::A, Key::B, Key::C, Key::D, Key::E, Key::F, Key::G, Key::H, Key::I,
    Key::J, Key::K, Key::L, Key::M, Key::N, Key::O, Key::P, Key::Q, Key::R,
    Key::S, Key::T, Key::U, Key::V, Key::W, Key::X, Key::Y, Key::Z,
];

const DIGITS: [Key; 10] = [
    Key::Digit0, Key::Digit1, Key::Digit2, Key::Digit3, Key::Digit4,
    Key::Digit5, Key::Digit6, Key::Digit7, Key::Digit8, Key::Digit9,
];

const FUNCTION: [Key; 12] = [
    Key::F1, Key::F2, Key::F3, Key::F4, Key::F5, Key::F6,
    Key::F7, Key::F8, Key::F9, Key::F10, Key::F11, Key::F12,
];

const LETTER_BASE: i32 = 65;
const DIGIT_BASE: i32 = 48;
const FUNCTION_BASE: i32 = 290;

fn position_in(table: &[Key], key: Key) -> Option<i32> {
    let variant = mem::discriminant(&key);
    table
        .iter()
        .position(|k| mem::discriminant(k) == variant)
        .and_then(|i| i32::try_from(i).ok())
}

impl Key {
    /// Native key code.
    pub fn code(self) -> i32 {
        if let Some(i) = position_in(&LETTERS, self) {
            return LETTER_BASE + i;
        }
        if let Some(i) = position_in(&DIGITS, self) {
            return DIGIT_BASE + i;
        }
        if let Some(i) = position_in(&FUNCTION, self) {
            return FUNCTION_BASE + i;
        }

        match self {
            Key::Space => 32,
            Key::Escape => 256,
            Key::Enter => 257,
            Key::Tab => 258,
            Key::Backspace => 259,
            Key::Insert => 260,
            Key::Delete => 261,
            Key::ArrowRight => 262,
            Key::ArrowLeft => 263,
            Key::ArrowDown => 264,
            Key::ArrowUp => 265,
            Key::PageUp => 266,
            Key::PageDown => 267,
            Key::Home => 268,
            Key::End => 269,
            Key::Shift => 340,
            Key::Control => 341,
            Key::Alt => 342,
            Key::Meta => 343,
            Key::Raw(code) => code,
            // Letters, digits and function keys are handled above.
            _ => -1,
        }
    }
}

impl From<i32> for Key {
    fn from(code: i32) -> Self {
        let index = |base: i32, len: usize| {
            code.checked_sub(base)
                .and_then(|d| usize::try_from(d).ok())
                .filter(|i| *i < len)
        };
        if let Some(i) = index(LETTER_BASE, LETTERS.len()) {
            return LETTERS[i];
        }
        if let Some(i) = index(DIGIT_BASE, DIGITS.len()) {
            return DIGITS[i];
        }
        if let Some(i) = index(FUNCTION_BASE, FUNCTION.len()) {
            return FUNCTION[i];
        }

        match code {
            32 => Key::Space,
            256 => Key::Escape,
            257 => Key::Enter,
            258 => Key::Tab,
            259 => Key::Backspace,
            260 => Key::Insert,
            261 => Key::Delete,
            262 => Key::ArrowRight,
            263 => Key::ArrowLeft,
            264 => Key::ArrowDown,
            265 => Key::ArrowUp,
            266 => Key::PageUp,
            267 => Key::PageDown,
            268 => Key::Home,
            269 => Key::End,
            340 => Key::Shift,
            341 => Key::Control,
            342 => Key::Alt,
            343 => Key::Meta,
            other => Key::Raw(other),
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

impl From<Key> for i32 {
    fn from(key: Key) -> Self {
        key.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_codes() {
        assert_eq!(Key::A.code(), 65);
        assert_eq!(Key::Z.code(), 90);
        assert_eq!(Key::Digit0.code(), 48);
        assert_eq!(Key::Escape.code(), 256);
        assert_eq!(Key::F12.code(), 301);
        assert_eq!(Key::Raw(348).code(), 348);
    }

    #[test]
    fn codes_map_back_to_keys() {
        for code in [32, 48, 57, 65, 90, 256, 265, 290, 301, 343] {
            assert_eq!(Key::from(code).code(), code);
            assert!(!matches!(Key::from(code), Key::Raw(_)), "{code}");
        }
        assert_eq!(Key::from(999), Key::Raw(999));
    }

    #[test]
    fn raw_codes_equal_named_keys() {
        use std::collections::HashSet;

        assert_eq!(Key::Raw(65), Key::A);
        assert_eq!(Key::Raw(256), Key::Escape);
        assert_ne!(Key::Raw(66), Key::A);

        let keys: HashSet<Key> = [Key::A, Key::Raw(65), Key::Raw(290), Key::F1].into_iter().collect();
        assert_eq!(keys.len(), 2);
    }
}
