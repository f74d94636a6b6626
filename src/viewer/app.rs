//! The egui application behind the viewer window

use std::time::Duration;

use chrono::{DateTime, Local};
use eframe::egui;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::hook::{KeyEvent, WatchedKeys};
use crate::snapshot::{FetchOutcome, Snapshot};

/// Where the background download currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchStatus {
    /// Download in flight; the status indicator spins
    Pending,
    /// Last download succeeded
    Ok,
    /// Last download failed; the stale image stays up
    Failed,
}

pub struct ViewerApp {
    watched: WatchedKeys,
    key_rx: mpsc::Receiver<KeyEvent>,
    fetch_rx: mpsc::Receiver<FetchOutcome>,
    texture: Option<egui::TextureHandle>,
    last_modified: Option<DateTime<Local>>,
    status: FetchStatus,
    dismissed: bool,
}

impl ViewerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        cached: Option<Snapshot>,
        watched: WatchedKeys,
        key_rx: mpsc::Receiver<KeyEvent>,
        fetch_rx: mpsc::Receiver<FetchOutcome>,
    ) -> Self {
        let mut app = Self {
            watched,
            key_rx,
            fetch_rx,
            texture: None,
            last_modified: None,
            status: FetchStatus::Pending,
            dismissed: false,
        };

        if let Some(snapshot) = cached {
            app.show_snapshot(&cc.egui_ctx, &snapshot);
        }

        app
    }

    /// Decode and display a snapshot. A decode failure is logged and
    /// leaves whatever was displayed before.
    fn show_snapshot(&mut self, ctx: &egui::Context, snapshot: &Snapshot) {
        if snapshot.is_empty() {
            return;
        }

        match decode(&snapshot.bytes) {
            Ok(color_image) => {
                self.texture =
                    Some(ctx.load_texture("webcam", color_image, egui::TextureOptions::LINEAR));
                if snapshot.last_modified.is_some() {
                    self.last_modified = snapshot.last_modified;
                }
            }
            Err(e) => error!(?e, "failed to decode snapshot"),
        }
    }

    fn dismiss(&mut self, ctx: &egui::Context, trigger: &str) {
        if self.dismissed {
            return;
        }
        self.dismissed = true;
        info!(trigger, "viewer dismissed");
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    /// Drain pending download outcomes without blocking the UI thread
    fn poll_fetch(&mut self, ctx: &egui::Context) {
        while let Ok(outcome) = self.fetch_rx.try_recv() {
            match outcome {
                FetchOutcome::Fetched(snapshot) => {
                    self.show_snapshot(ctx, &snapshot);
                    self.status = FetchStatus::Ok;
                }
                FetchOutcome::Failed => {
                    self.status = FetchStatus::Failed;
                }
            }
        }
    }

    /// Drain globally hooked key-downs; a watched key dismisses
    fn poll_keys(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.key_rx.try_recv() {
            if self.watched.contains(event.vk_code) {
                info!(vk_code = event.vk_code, "watched keypress");
                self.dismiss(ctx, "keypress");
            }
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_fetch(ctx);
        self.poll_keys(ctx);

        if ctx.input(|i| i.pointer.any_pressed()) {
            info!("mouse click");
            self.dismiss(ctx, "click");
        }

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                match self.status {
                    FetchStatus::Pending => {
                        ui.add(egui::Spinner::new());
                        ui.label("updating…");
                    }
                    FetchStatus::Ok => {
                        ui.colored_label(egui::Color32::GREEN, "✔");
                    }
                    FetchStatus::Failed => {
                        ui.colored_label(egui::Color32::RED, "⚠ download failed");
                    }
                }

                if let Some(ts) = self.last_modified {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(format_timestamp(ts));
                    });
                }
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                if let Some(texture) = &self.texture {
                    let size = fit_size(texture.size_vec2(), ui.available_size());
                    ui.centered_and_justified(|ui| {
                        ui.add(egui::Image::new(texture).fit_to_exact_size(size));
                    });
                }
            });

        // Keep polling the channels even when no input arrives
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

/// Decode raw image bytes into an egui texture image
fn decode(bytes: &[u8]) -> Result<egui::ColorImage, image::ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        size,
        rgba.as_flat_samples().as_slice(),
    ))
}

/// Scale `image` uniformly to fill `avail` without cropping
fn fit_size(image: egui::Vec2, avail: egui::Vec2) -> egui::Vec2 {
    if image.x <= 0.0 || image.y <= 0.0 {
        return egui::Vec2::ZERO;
    }
    let scale = (avail.x / image.x).min(avail.y / image.y);
    image * scale
}

/// Weekday, day, month and time, e.g. "Saturday 30 August 14:05"
fn format_timestamp(ts: DateTime<Local>) -> String {
    ts.format("%A %-d %B %-H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fit_size_landscape_into_window() {
        let fitted = fit_size(egui::vec2(1600.0, 1200.0), egui::vec2(800.0, 600.0));
        assert_eq!(fitted, egui::vec2(800.0, 600.0));
    }

    #[test]
    fn test_fit_size_preserves_aspect() {
        let fitted = fit_size(egui::vec2(400.0, 100.0), egui::vec2(800.0, 600.0));
        assert_eq!(fitted, egui::vec2(800.0, 200.0));
    }

    #[test]
    fn test_fit_size_degenerate_image() {
        assert_eq!(
            fit_size(egui::Vec2::ZERO, egui::vec2(800.0, 600.0)),
            egui::Vec2::ZERO
        );
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Local.with_ymd_and_hms(2024, 5, 4, 9, 5, 0).unwrap();
        let formatted = format_timestamp(ts);
        assert_eq!(formatted, "Saturday 4 May 9:05");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(&[0, 1, 2, 3]).is_err());
    }

    #[test]
    fn test_decode_accepts_png() {
        // 1x1 white pixel
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let color_image = decode(&png).unwrap();
        assert_eq!(color_image.size, [1, 1]);
    }
}
