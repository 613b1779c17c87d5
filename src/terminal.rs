// SPDX-License-Identifier: GPL-3.0-only

//! Terminal scanner UI
//!
//! Renders the camera feed with Unicode half-block characters (two
//! vertical pixels per cell, aspect-preserving and centered) and overlays
//! a confirmation dialog when a QR code is detected. The event loop is
//! the single consumer of camera frames, key input, and prompt state;
//! detection runs synchronously inside it.

use crate::backend::CameraFrame;
use crate::config::Config;
use crate::photo::{LoggingPhotoSink, PhotoPipeline};
use crate::prompt::{PromptChoice, PromptController, PromptOutcome, PromptState};
use crate::scanner::{BarcodeScanner, QrDetector, filter_qr};
use crate::session::{CaptureSession, FrameSource, SessionState};
use crate::{constants::timing, storage};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};
use std::io::{self, stdout};
use std::time::Duration;
use tracing::{error, info};

/// Run the terminal scanner
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = CaptureSession::new(config.capture_format());

    // Acquisition failures are logged and the UI shows a bare preview;
    // the process never exits abnormally because a camera is missing
    match session.configure(config.device_path.as_deref()) {
        Ok(()) => {
            if let Err(e) = session.start() {
                error!(error = %e, "Failed to start capture session");
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to configure capture session");
        }
    }

    if let Some(device) = session.device() {
        info!(device = %device.name, focus = ?session.focus_outcome(), "Scanning");
    }

    let detector = QrDetector::with_max_dimension(config.detector_max_dimension);
    let mut prompts = PromptController::new();
    let photo_pipeline = PhotoPipeline::new(
        config
            .save_directory
            .clone()
            .unwrap_or_else(storage::default_photo_dir),
        config.jpeg_quality,
    );
    let mut photo_sink = LoggingPhotoSink;
    let rt = tokio::runtime::Runtime::new()?;

    let mut frame_widget = FrameWidget::new();
    let mut status_message = build_status_message(&session);

    loop {
        // Drain and scan every delivered frame. Scanning continues while
        // a dialog is showing; a new detection replaces its payload.
        while let Some(frame) = session.try_frame() {
            match detector.scan(&frame) {
                Ok(observations) => {
                    for detection in filter_qr(observations) {
                        prompts.offer(detection);
                    }
                }
                Err(e) => {
                    // Frame dropped, pipeline continues on the next one
                    error!(error = %e, "Barcode detection failed");
                }
            }
            frame_widget.update_frame(frame);
        }

        // Draw
        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let camera_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };
            f.render_widget(&frame_widget, camera_area);

            if prompts.state() == PromptState::PromptShown {
                let dialog = DialogWidget {
                    title: "QR code detected",
                    message: prompts.payload().unwrap_or_default(),
                };
                f.render_widget(dialog, camera_area);
            }

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            let status = StatusBar {
                message: &status_message,
            };
            f.render_widget(status, status_area);
        })?;

        // Handle input with timeout for frame updates
        if event::poll(Duration::from_millis(timing::POLL_INTERVAL_MS))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Ctrl+C always quits
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            if prompts.state() == PromptState::PromptShown {
                let choice = match key.code {
                    KeyCode::Enter | KeyCode::Char('y') => Some(PromptChoice::Confirm),
                    KeyCode::Esc | KeyCode::Char('n') => Some(PromptChoice::Cancel),
                    _ => None,
                };

                if let Some(choice) = choice
                    && let Some(outcome) = prompts.resolve(choice)
                    && outcome == PromptOutcome::CaptureAndStop
                {
                    // Capture only while the session is still running,
                    // then stop it for good
                    if session.is_running() {
                        let frame = frame_widget.frame.clone();
                        match rt.block_on(photo_pipeline.capture_and_save(frame, &mut photo_sink))
                        {
                            Ok(path) => {
                                status_message = format!("Saved: {}", path.display());
                            }
                            Err(_) => {
                                // Already logged by the sink; nothing is
                                // surfaced to the user
                            }
                        }
                        if let Err(e) = session.stop() {
                            error!(error = %e, "Failed to stop session");
                        }
                    }
                    if session.state() == SessionState::Stopped {
                        status_message = format!("{} | stopped, 'q' quit", status_message);
                    }
                }
                continue;
            }

            // 'q' quits outside the dialog
            if key.code == KeyCode::Char('q') {
                break;
            }
        }
    }

    Ok(())
}

fn build_status_message(session: &CaptureSession) -> String {
    match session.device() {
        Some(device) => format!("Scanning on {} | 'q' quit", device.name),
        None => "No camera available | 'q' quit".to_string(),
    }
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget {
    frame: Option<CameraFrame>,
}

impl FrameWidget {
    fn new() -> Self {
        Self { frame: None }
    }

    fn update_frame(&mut self, frame: CameraFrame) {
        self.frame = Some(frame);
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame else {
            // No frame yet - show placeholder
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        if frame.width == 0 || frame.height == 0 {
            return;
        }

        // Calculate display dimensions maintaining aspect ratio
        // Each terminal cell displays 2 vertical pixels using half-blocks
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

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        // Scale factors
        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        // Each terminal cell represents 2 vertical pixels:
        // upper half (▀) colored with fg, lower half with bg
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

                let (r, g, b) = frame.sample_rgb(src_x, src_y_top);
                let top_color = Color::Rgb(r, g, b);
                let (r, g, b) = frame.sample_rgb(src_x, src_y_bottom);
                let bottom_color = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top_color);
                    cell.set_bg(bottom_color);
                }
            }
        }
    }
}

/// Confirmation dialog rendered over the preview
struct DialogWidget<'a> {
    title: &'a str,
    message: &'a str,
}

impl Widget for DialogWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        const HINT: &str = "Enter/y capture | Esc/n keep scanning";

        // Payloads are arbitrary UTF-8; size and center by chars, not bytes
        let content_width = char_count(self.title)
            .max(char_count(self.message))
            .max(char_count(HINT))
            .min(area.width.saturating_sub(4) as usize) as u16;
        let box_width = content_width + 4;
        let box_height: u16 = 5;
        if area.width < box_width || area.height < box_height {
            return;
        }

        let x0 = area.x + (area.width - box_width) / 2;
        let y0 = area.y + (area.height - box_height) / 2;

        // Solid background so the dialog reads over the video
        for y in y0..y0 + box_height {
            for x in x0..x0 + box_width {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char(' ');
                    cell.set_fg(Color::White);
                    cell.set_bg(Color::DarkGray);
                }
            }
        }

        let style = Style::default().fg(Color::White).bg(Color::DarkGray);
        let centered = |text: &str| -> u16 {
            x0 + (box_width.saturating_sub(char_count(text).min(content_width as usize) as u16))
                / 2
        };

        let title = truncate(self.title, content_width as usize);
        buf.set_string(centered(title), y0 + 1, title, style.fg(Color::Yellow));
        let message = truncate(self.message, content_width as usize);
        buf.set_string(centered(message), y0 + 2, message, style);
        let hint = truncate(HINT, content_width as usize);
        buf.set_string(centered(hint), y0 + 3, hint, style.fg(Color::Gray));
    }
}

fn char_count(text: &str) -> usize {
    text.chars().count()
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text = truncate(self.message, area.width as usize);
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
