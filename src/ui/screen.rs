//! Terminal ownership for the dashboard.

use anyhow::Result;
use ratatui::{backend::Backend, Terminal};

use super::dashboard;
use crate::app::App;

/// Wraps the ratatui terminal and remembers whether it has been restored.
///
/// Entering and leaving the alternate screen is left to the caller, which
/// owns stdout; `Screen` only draws frames and gives the cursor back.
pub struct Screen<B: Backend> {
    terminal: Terminal<B>,
    restored: bool,
}

impl<B: Backend> Screen<B> {
    pub fn new(backend: B) -> Result<Self> {
        Ok(Self {
            terminal: Terminal::new(backend)?,
            restored: false,
        })
    }

    /// Draw one full frame. Ratatui hides the cursor while drawing.
    pub fn draw(&mut self, app: &App) -> Result<()> {
        self.terminal.draw(|frame| dashboard::render(frame, app))?;
        Ok(())
    }

    /// Make the cursor visible again.
    ///
    /// Only the first call touches the terminal; it returns `Ok(true)`, every
    /// later call returns `Ok(false)`.
    pub fn restore(&mut self) -> Result<bool> {
        if self.restored {
            return Ok(false);
        }
        self.restored = true;
        self.terminal.show_cursor()?;
        Ok(true)
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use ratatui::backend::{ClearType, TestBackend, WindowSize};
    use ratatui::buffer::Cell;
    use ratatui::layout::{Position, Size};
    use std::io;

    /// Test backend that counts cursor visibility changes.
    #[derive(Debug)]
    pub(crate) struct CursorCounting {
        inner: TestBackend,
        pub shown: usize,
        pub hidden: usize,
    }

    impl CursorCounting {
        pub(crate) fn new(width: u16, height: u16) -> Self {
            Self {
                inner: TestBackend::new(width, height),
                shown: 0,
                hidden: 0,
            }
        }

        pub(crate) fn buffer(&self) -> &ratatui::buffer::Buffer {
            self.inner.buffer()
        }
    }

    impl Backend for CursorCounting {
        fn draw<'a, I>(&mut self, content: I) -> io::Result<()>
        where
            I: Iterator<Item = (u16, u16, &'a Cell)>,
        {
            self.inner.draw(content)
        }

        fn append_lines(&mut self, n: u16) -> io::Result<()> {
            self.inner.append_lines(n)
        }

        fn hide_cursor(&mut self) -> io::Result<()> {
            self.hidden += 1;
            self.inner.hide_cursor()
        }

        fn show_cursor(&mut self) -> io::Result<()> {
            self.shown += 1;
            self.inner.show_cursor()
        }

        fn get_cursor_position(&mut self) -> io::Result<Position> {
            self.inner.get_cursor_position()
        }

        fn set_cursor_position<P: Into<Position>>(&mut self, position: P) -> io::Result<()> {
            self.inner.set_cursor_position(position)
        }

        fn clear(&mut self) -> io::Result<()> {
            self.inner.clear()
        }

        fn clear_region(&mut self, clear_type: ClearType) -> io::Result<()> {
            self.inner.clear_region(clear_type)
        }

        fn size(&self) -> io::Result<Size> {
            self.inner.size()
        }

        fn window_size(&mut self) -> io::Result<WindowSize> {
            self.inner.window_size()
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    #[test]
    fn test_draw_hides_cursor() {
        let (_tx, app) = test_app();
        let mut screen = Screen::new(CursorCounting::new(72, 22)).unwrap();
        screen.draw(&app).unwrap();
        assert_eq!(screen.backend().hidden, 1);
        assert_eq!(screen.backend().shown, 0);
    }

    #[test]
    fn test_restore_is_idempotent() {
        let (_tx, app) = test_app();
        let mut screen = Screen::new(CursorCounting::new(72, 22)).unwrap();
        screen.draw(&app).unwrap();

        assert!(screen.restore().unwrap());
        assert!(!screen.restore().unwrap());
        assert_eq!(screen.backend().shown, 1);
    }
}
