// SPDX-License-Identifier: GPL-3.0-only

//! Terminal scanning station
//!
//! Renders the camera preview to the terminal using Unicode half-block
//! characters for improved vertical resolution, with a status bar showing
//! the session state and the last notice.

use crate::app::{DisplayBuffer, SessionController, SessionEvent, SessionState};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use std::time::Duration;
use tracing::{error, info, warn};

/// Input poll timeout, roughly one preview refresh
const INPUT_POLL: Duration = Duration::from_millis(16);

/// Run the scanning station until the operator quits
pub fn run(mut controller: SessionController) -> Result<(), Box<dyn std::error::Error>> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &controller);

    // Release the camera before handing the terminal back
    controller.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// What the status bar shows
#[derive(Debug, Clone, PartialEq, Eq)]
struct StationStatus {
    state: SessionState,
    awaiting_confirmation: bool,
    notice: Option<String>,
}

impl StationStatus {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            awaiting_confirmation: false,
            notice: None,
        }
    }

    /// Fold a worker event into the status; returns a new preview if any
    fn apply(&mut self, event: SessionEvent) -> Option<DisplayBuffer> {
        match event {
            SessionEvent::Preview(buffer) => return Some(buffer),
            SessionEvent::StateChanged { to, .. } => {
                self.state = to;
                if to != SessionState::Scanning {
                    self.awaiting_confirmation = false;
                }
            }
            SessionEvent::Detected { tracking_number } => {
                self.notice = Some(format!("Detected {}", tracking_number));
            }
            SessionEvent::Archived(receipt) => {
                let mut notice = format!("Saved {}", receipt.archive_path.display());
                if receipt.replaced_existing {
                    notice.push_str(" (replaced existing)");
                }
                self.notice = Some(notice);
            }
            SessionEvent::ConfirmStopRequested => self.awaiting_confirmation = true,
            SessionEvent::Notice(e) => {
                error!(error = %e, "Station notice");
                self.notice = Some(format!("Error: {}", e));
            }
            SessionEvent::ShutDown => self.notice = Some("Camera released".to_string()),
        }
        None
    }

    fn message(&self) -> String {
        if self.awaiting_confirmation {
            return "Stop recording? 'y' stop | 'c' continue".to_string();
        }

        let keys = match self.state {
            SessionState::Idle => "'s' scan | 'o' orders | 'q' quit",
            SessionState::Scanning => "'x' stop | 'o' orders | 'q' quit",
            SessionState::Finalizing => "archiving... | 'q' quit",
        };
        match &self.notice {
            Some(notice) => format!("[{}] {} | {}", self.state, notice, keys),
            None => format!("[{}] {}", self.state, keys),
        }
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &SessionController,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut frame_widget = FrameWidget::new();
    let mut status = StationStatus::new();

    loop {
        // Drain all pending events so the preview shows the latest frame
        while let Some(event) = controller.try_recv_event() {
            if let Some(buffer) = status.apply(event) {
                frame_widget.update_frame(buffer);
            }
        }

        let status_message = status.message();
        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let preview_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };
            f.render_widget(&frame_widget, preview_area);

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            f.render_widget(
                StatusBar {
                    message: &status_message,
                },
                status_area,
            );
        })?;

        if event::poll(INPUT_POLL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Ctrl+C to quit
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            if status.awaiting_confirmation {
                match key.code {
                    KeyCode::Char('y') => {
                        status.awaiting_confirmation = false;
                        controller.stop_recording();
                    }
                    KeyCode::Char('c') | KeyCode::Esc => {
                        status.awaiting_confirmation = false;
                    }
                    _ => {}
                }
                continue;
            }

            match key.code {
                KeyCode::Char('s') => {
                    status.notice = None;
                    frame_widget.clear();
                    controller.start_scanning();
                }
                KeyCode::Char('x') => controller.confirm_stop(),
                KeyCode::Char('o') => match controller.list_orders() {
                    Ok(orders) => {
                        info!(count = orders.len(), "Opening orders directory");
                        status.notice = Some(format!("{} orders", orders.len()));
                        if let Err(e) = controller.open_orders() {
                            warn!(error = %e, "Failed to open orders directory");
                            status.notice = Some(format!("Error: {}", e));
                        }
                    }
                    Err(e) => status.notice = Some(format!("Error: {}", e)),
                },
                KeyCode::Char('q') => break,
                _ => {}
            }
        }
    }

    Ok(())
}

/// Widget that renders a preview using half-block characters
struct FrameWidget {
    frame: Option<DisplayBuffer>,
}

impl FrameWidget {
    fn new() -> Self {
        Self { frame: None }
    }

    fn update_frame(&mut self, frame: DisplayBuffer) {
        self.frame = Some(frame);
    }

    fn clear(&mut self) {
        self.frame = None;
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame else {
            let msg = "Press 's' to start scanning";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, ratatui::style::Style::default());
            }
            return;
        };

        if frame.width == 0 || frame.height == 0 || area.width == 0 || area.height == 0 {
            return;
        }

        // Each terminal cell displays 2 vertical pixels using half-block characters
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }
    }
}

fn sample_pixel(frame: &DisplayBuffer, x: u32, y: u32) -> Color {
    let (r, g, b) = frame.pixel(x, y);
    Color::Rgb(r, g, b)
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppError, CameraError};
    use crate::pipelines::archive::ArchiveReceipt;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn test_idle_status_offers_scan() {
        let status = StationStatus::new();
        assert!(status.message().contains("'s' scan"));
    }

    #[test]
    fn test_confirmation_prompt_replaces_keys() {
        let mut status = StationStatus::new();
        status.apply(SessionEvent::StateChanged {
            from: SessionState::Idle,
            to: SessionState::Scanning,
        });
        status.apply(SessionEvent::ConfirmStopRequested);
        assert!(status.message().starts_with("Stop recording?"));

        // Leaving Scanning cancels a pending prompt
        status.apply(SessionEvent::StateChanged {
            from: SessionState::Scanning,
            to: SessionState::Idle,
        });
        assert!(!status.awaiting_confirmation);
    }

    #[test]
    fn test_archive_and_error_notices() {
        let mut status = StationStatus::new();
        status.apply(SessionEvent::Archived(ArchiveReceipt {
            tracking_number: "SP12345".to_string(),
            archive_path: PathBuf::from("/tmp/SP12345.zip"),
            replaced_existing: true,
            media_removed: false,
        }));
        let message = status.message();
        assert!(message.contains("SP12345.zip"));
        assert!(message.contains("replaced existing"));

        status.apply(SessionEvent::Notice(AppError::Camera(
            CameraError::DeviceUnavailable("busy".to_string()),
        )));
        assert!(status.message().contains("Error:"));
    }

    #[test]
    fn test_preview_event_yields_buffer() {
        let mut status = StationStatus::new();
        let buffer = DisplayBuffer {
            width: 1,
            height: 1,
            rgba: Arc::from(vec![1u8, 2, 3, 255]),
        };
        assert_eq!(status.apply(SessionEvent::Preview(buffer.clone())), Some(buffer));
    }

    #[test]
    fn test_frame_widget_renders_half_blocks() {
        let mut widget = FrameWidget::new();
        widget.update_frame(DisplayBuffer {
            width: 2,
            height: 2,
            rgba: Arc::from(vec![255u8; 16]),
        });
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        (&widget).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "▀");
    }
}
