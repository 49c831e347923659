//! Win32 console session
//!
//! Owns the raw input handle, the secondary screen buffer, and the saved
//! input mode. Acquisition disables quick-edit (so mouse records reach the
//! queue instead of feeding text selection) and enables window + mouse input
//! reporting. Release is idempotent and restores everything it changed; it
//! frees the console only if this session was the one that allocated it.

use std::io;

use tracing::info;

use windows::core::w;
use windows::Win32::Foundation::{CloseHandle, GENERIC_READ, GENERIC_WRITE, HANDLE};
use windows::Win32::Storage::FileSystem::{
    CreateFileW, FILE_FLAGS_AND_ATTRIBUTES, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
};
use windows::Win32::System::Console::{
    AllocConsole, CreateConsoleScreenBuffer, FillConsoleOutputAttribute,
    FillConsoleOutputCharacterW, FreeConsole, GetConsoleCursorInfo, GetConsoleMode,
    GetConsoleScreenBufferInfo, GetNumberOfConsoleInputEvents, ReadConsoleInputW,
    SetConsoleActiveScreenBuffer, SetConsoleCursorInfo, SetConsoleCursorPosition,
    SetConsoleMode, SetConsoleScreenBufferSize, SetConsoleTextAttribute, WriteConsoleW,
    CONSOLE_CHARACTER_ATTRIBUTES, CONSOLE_CURSOR_INFO, CONSOLE_MODE,
    CONSOLE_SCREEN_BUFFER_INFO, CONSOLE_TEXTMODE_BUFFER, COORD, ENABLE_EXTENDED_FLAGS,
    ENABLE_MOUSE_INPUT, ENABLE_QUICK_EDIT_MODE, ENABLE_WINDOW_INPUT, INPUT_RECORD,
};

use super::backend::{ConsoleBackend, ConsoleError, Result};
use super::input::{MouseEventFlags, RawInputRecord};

// INPUT_RECORD.EventType discriminants.
const KEY_EVENT_TYPE: u16 = 0x0001;
const MOUSE_EVENT_TYPE: u16 = 0x0002;

/// Largest batch drained from the input queue in one read call.
const READ_BATCH_CAPACITY: usize = 128;

fn os_error(e: windows::core::Error) -> io::Error {
    io::Error::from_raw_os_error(e.code().0 as i32)
}

/// An acquired Win32 console session.
pub struct ConsoleSession {
    input: HANDLE,
    output: HANDLE,
    original_mode: CONSOLE_MODE,
    owns_console: bool,
    released: bool,
}

// Safety: the handles are only ever used behind the manager's mutex.
unsafe impl Send for ConsoleSession {}

impl ConsoleSession {
    /// Acquire the console: input handle, saved mode, and an active
    /// secondary screen buffer.
    ///
    /// A failed `AllocConsole` means a console already exists; that is
    /// recorded as not owning the console and is otherwise ignored. Failure
    /// to open the input handle is fatal.
    pub fn acquire() -> Result<Self> {
        // Non-fatal: only decides whether release() frees the console.
        let owns_console = unsafe { AllocConsole().is_ok() };

        let input = unsafe {
            CreateFileW(
                w!("CONIN$"),
                (GENERIC_READ | GENERIC_WRITE).0,
                FILE_SHARE_READ,
                None,
                OPEN_EXISTING,
                FILE_FLAGS_AND_ATTRIBUTES(0),
                None,
            )
            .map_err(|e| ConsoleError::InputHandle(os_error(e)))?
        };

        let mut original_mode = CONSOLE_MODE(0);
        unsafe {
            GetConsoleMode(input, &mut original_mode)
                .map_err(|e| ConsoleError::Mode(os_error(e)))?;
            let mode = (original_mode | ENABLE_EXTENDED_FLAGS | ENABLE_WINDOW_INPUT
                | ENABLE_MOUSE_INPUT)
                & !ENABLE_QUICK_EDIT_MODE;
            SetConsoleMode(input, mode).map_err(|e| ConsoleError::Mode(os_error(e)))?;
        }

        let output = unsafe {
            CreateConsoleScreenBuffer(
                (GENERIC_READ | GENERIC_WRITE).0,
                (FILE_SHARE_READ | FILE_SHARE_WRITE).0,
                None,
                CONSOLE_TEXTMODE_BUFFER,
                None,
            )
            .map_err(|e| ConsoleError::ScreenBuffer(os_error(e)))?
        };
        unsafe {
            SetConsoleActiveScreenBuffer(output)
                .map_err(|e| ConsoleError::ScreenBuffer(os_error(e)))?;
        }

        info!("Console session acquired (owns_console: {})", owns_console);
        Ok(Self {
            input,
            output,
            original_mode,
            owns_console,
            released: false,
        })
    }

    fn buffer_info(&self) -> Result<CONSOLE_SCREEN_BUFFER_INFO> {
        let mut info = CONSOLE_SCREEN_BUFFER_INFO::default();
        unsafe {
            GetConsoleScreenBufferInfo(self.output, &mut info)
                .map_err(|e| ConsoleError::Query(os_error(e)))?;
        }
        Ok(info)
    }

    fn convert(record: &INPUT_RECORD) -> RawInputRecord {
        match record.EventType {
            KEY_EVENT_TYPE => {
                let key = unsafe { record.Event.KeyEvent };
                let unit = unsafe { key.uChar.UnicodeChar };
                RawInputRecord::Key {
                    ch: char::from_u32(u32::from(unit)).filter(|c| *c != '\0'),
                    virtual_key: key.wVirtualKeyCode,
                    is_down: key.bKeyDown.as_bool(),
                }
            }
            MOUSE_EVENT_TYPE => {
                let mouse = unsafe { record.Event.MouseEvent };
                RawInputRecord::Mouse {
                    x: mouse.dwMousePosition.X,
                    y: mouse.dwMousePosition.Y,
                    event_flags: MouseEventFlags::from_bits_retain(mouse.dwEventFlags),
                    button_state: mouse.dwButtonState,
                }
            }
            // Focus, menu, and window-buffer-size records.
            _ => RawInputRecord::Other,
        }
    }
}

impl ConsoleBackend for ConsoleSession {
    fn pending_events(&mut self) -> Result<usize> {
        let mut count: u32 = 0;
        unsafe {
            GetNumberOfConsoleInputEvents(self.input, &mut count)
                .map_err(|e| ConsoleError::Read(os_error(e)))?;
        }
        Ok(count as usize)
    }

    fn read_batch(&mut self) -> Result<Vec<RawInputRecord>> {
        let mut records = [INPUT_RECORD::default(); READ_BATCH_CAPACITY];
        let mut read: u32 = 0;
        unsafe {
            ReadConsoleInputW(self.input, &mut records, &mut read)
                .map_err(|e| ConsoleError::Read(os_error(e)))?;
        }
        Ok(records[..read as usize].iter().map(Self::convert).collect())
    }

    fn window_size(&mut self) -> Result<(u16, u16)> {
        let info = self.buffer_info()?;
        let win = info.srWindow;
        let cols = (win.Right - win.Left + 1).max(0) as u16;
        let rows = (win.Bottom - win.Top + 1).max(0) as u16;
        Ok((cols, rows))
    }

    fn resize_buffer(&mut self, cols: u16, rows: u16) -> Result<()> {
        let size = COORD {
            X: cols as i16,
            Y: rows as i16,
        };
        unsafe {
            SetConsoleScreenBufferSize(self.output, size)
                .map_err(|e| ConsoleError::Resize(os_error(e)))
        }
    }

    fn set_cursor_position(&mut self, x: u16, y: u16) -> Result<()> {
        let pos = COORD {
            X: x as i16,
            Y: y as i16,
        };
        unsafe {
            SetConsoleCursorPosition(self.output, pos)
                .map_err(|e| ConsoleError::Write(os_error(e)))
        }
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        let mut info = CONSOLE_CURSOR_INFO::default();
        unsafe {
            GetConsoleCursorInfo(self.output, &mut info)
                .map_err(|e| ConsoleError::Query(os_error(e)))?;
            info.bVisible = visible.into();
            SetConsoleCursorInfo(self.output, &info)
                .map_err(|e| ConsoleError::Write(os_error(e)))
        }
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        let wide: Vec<u16> = text.encode_utf16().collect();
        let mut written: u32 = 0;
        unsafe {
            WriteConsoleW(self.output, &wide, Some(&mut written), None)
                .map_err(|e| ConsoleError::Write(os_error(e)))
        }
    }

    fn color_attribute(&mut self) -> Result<u16> {
        Ok(self.buffer_info()?.wAttributes.0)
    }

    fn set_color_attribute(&mut self, attr: u16) -> Result<()> {
        unsafe {
            SetConsoleTextAttribute(self.output, CONSOLE_CHARACTER_ATTRIBUTES(attr))
                .map_err(|e| ConsoleError::Write(os_error(e)))
        }
    }

    fn fill_char(&mut self, x: u16, y: u16, len: u32, ch: char) -> Result<()> {
        let origin = COORD {
            X: x as i16,
            Y: y as i16,
        };
        let mut unit = [0u16; 2];
        let encoded = ch.encode_utf16(&mut unit);
        let mut written: u32 = 0;
        unsafe {
            FillConsoleOutputCharacterW(self.output, encoded[0], len, origin, &mut written)
                .map_err(|e| ConsoleError::Write(os_error(e)))
        }
    }

    fn fill_attribute(&mut self, x: u16, y: u16, len: u32, attr: u16) -> Result<()> {
        let origin = COORD {
            X: x as i16,
            Y: y as i16,
        };
        let mut written: u32 = 0;
        unsafe {
            FillConsoleOutputAttribute(self.output, attr, len, origin, &mut written)
                .map_err(|e| ConsoleError::Write(os_error(e)))
        }
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        unsafe {
            let _ = SetConsoleMode(self.input, self.original_mode);
            let _ = CloseHandle(self.output);
            let _ = CloseHandle(self.input);
            if self.owns_console {
                let _ = FreeConsole();
            }
        }
        info!("Console session released");
        Ok(())
    }
}

impl Drop for ConsoleSession {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
