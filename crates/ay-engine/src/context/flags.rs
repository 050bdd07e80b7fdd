use bitflags::bitflags;

use crate::coords::Vec2;

bitflags! {
    /// UI window flags, bit-compatible with the native UI library.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct WindowFlags: i32 {
        const NO_TITLE_BAR = 1 << 0;
        const NO_RESIZE = 1 << 1;
        const NO_MOVE = 1 << 2;
        const NO_SCROLLBAR = 1 << 3;
        const NO_SCROLL_WITH_MOUSE = 1 << 4;
        const NO_COLLAPSE = 1 << 5;
        const ALWAYS_AUTO_RESIZE = 1 << 6;
        const NO_BACKGROUND = 1 << 7;
        const NO_SAVED_SETTINGS = 1 << 8;
        const NO_MOUSE_INPUTS = 1 << 9;
        const MENU_BAR = 1 << 10;
        const HORIZONTAL_SCROLLBAR = 1 << 11;
        const NO_FOCUS_ON_APPEARING = 1 << 12;
        const NO_BRING_TO_FRONT_ON_FOCUS = 1 << 13;
        const ALWAYS_VERTICAL_SCROLLBAR = 1 << 14;
        const ALWAYS_HORIZONTAL_SCROLLBAR = 1 << 15;
        const ALWAYS_USE_WINDOW_PADDING = 1 << 16;
        // Bit 17 is reserved by the native library.
        const NO_NAV_INPUTS = 1 << 18;
        const NO_NAV_FOCUS = 1 << 19;
        const UNSAVED_DOCUMENT = 1 << 20;

        const NO_NAV = Self::NO_NAV_INPUTS.bits() | Self::NO_NAV_FOCUS.bits();
        const NO_DECORATION = Self::NO_TITLE_BAR.bits()
            | Self::NO_RESIZE.bits()
            | Self::NO_SCROLLBAR.bits()
            | Self::NO_COLLAPSE.bits();
        const NO_INPUTS = Self::NO_MOUSE_INPUTS.bits()
            | Self::NO_NAV_INPUTS.bits()
            | Self::NO_NAV_FOCUS.bits();
    }
}

/// Placement of a UI window declaration.
///
/// Defaults: no flags, position `(0, 0)`, size `(0, 0)` (auto-size).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct UiWindow {
    pub flags: WindowFlags,
    pub position: Vec2,
    pub size: Vec2,
}

impl UiWindow {
    #[inline]
    pub fn with_flags(mut self, flags: WindowFlags) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    #[inline]
    pub fn sized(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }
}

impl From<WindowFlags> for UiWindow {
    fn from(flags: WindowFlags) -> Self {
        Self::default().with_flags(flags)
    }
}
