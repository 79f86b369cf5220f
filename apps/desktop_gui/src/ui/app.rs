use std::{fs, path::Path, time::Duration};

use arboard::{Clipboard, ImageData};
use client_core::{
    project, ClientSettings, Completion, OutcomeView, ResultView, ServiceError, Tone,
    WorkflowController,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use shared::domain::Phase;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorCategory, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

const PREVIEW_MAX_EDGE: u32 = 640;
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif"];

pub struct SporecheckApp {
    controller: WorkflowController,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    status: String,
    service_url_input: String,
    timeout_ms_input: String,
    connected_service: Option<String>,
    notice: Option<UiError>,
    preview_texture: Option<TextureHandle>,
    overlay_texture: Option<TextureHandle>,
}

struct PreviewImage {
    width: usize,
    height: usize,
    rgba: Vec<u8>,
}

fn decode_preview_image(bytes: &[u8]) -> Result<PreviewImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let resized = dynamic
        .thumbnail(PREVIEW_MAX_EDGE, PREVIEW_MAX_EDGE)
        .to_rgba8();
    Ok(PreviewImage {
        width: resized.width() as usize,
        height: resized.height() as usize,
        rgba: resized.into_raw(),
    })
}

fn load_texture(ctx: &egui::Context, name: &str, bytes: &[u8]) -> Option<TextureHandle> {
    match decode_preview_image(bytes) {
        Ok(preview) => {
            let color_image = egui::ColorImage::from_rgba_unmultiplied(
                [preview.width, preview.height],
                &preview.rgba,
            );
            Some(ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR))
        }
        Err(err) => {
            tracing::warn!(name, "failed to decode image for display: {err}");
            None
        }
    }
}

fn tone_color(tone: Tone) -> egui::Color32 {
    match tone {
        Tone::Success => egui::Color32::from_rgb(25, 135, 84),
        Tone::Danger => egui::Color32::from_rgb(220, 53, 69),
        Tone::Neutral => egui::Color32::from_rgb(108, 117, 125),
    }
}

impl SporecheckApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        settings: ClientSettings,
    ) -> Self {
        Self {
            controller: WorkflowController::new(),
            cmd_tx,
            ui_rx,
            status: "Starting...".to_string(),
            service_url_input: settings.service_url,
            timeout_ms_input: settings.request_timeout.as_millis().to_string(),
            connected_service: None,
            notice: None,
            preview_texture: None,
            overlay_texture: None,
        }
    }

    fn process_ui_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => self.status = message,
                UiEvent::Error(err) => {
                    self.status = err.message().to_string();
                    self.notice = Some(err);
                }
                UiEvent::ServiceConfigured { service_url } => {
                    self.status = format!("Using classifier at {service_url}");
                    self.connected_service = Some(service_url);
                }
                UiEvent::PredictionFinished { ticket, outcome } => {
                    if let Completion::Applied(phase) =
                        self.controller.complete_prediction(ticket, outcome)
                    {
                        self.status = format!("Prediction {phase}");
                        self.sync_overlay_texture(ctx);
                    }
                }
                UiEvent::VisualizationFinished { ticket, outcome } => {
                    if let Completion::Applied(phase) =
                        self.controller.complete_visualization(ticket, outcome)
                    {
                        self.status = format!("Heatmap {phase}");
                        self.sync_overlay_texture(ctx);
                    }
                }
            }
        }
    }

    fn sync_overlay_texture(&mut self, ctx: &egui::Context) {
        self.overlay_texture = self
            .controller
            .session()
            .visualization()
            .and_then(|overlay| load_texture(ctx, "gradcam-overlay", overlay.bytes()));
    }

    fn select_bytes(&mut self, ctx: &egui::Context, bytes: Vec<u8>, file_name: Option<String>) {
        match self.controller.select_image(bytes, file_name.as_deref()) {
            Ok(()) => {
                self.notice = None;
                self.preview_texture = self
                    .controller
                    .session()
                    .selected_image()
                    .and_then(|image| load_texture(ctx, "selected-image", image.bytes()));
                self.overlay_texture = None;
                self.status = "Image selected".to_string();
            }
            Err(err) => self.reject(UiError::from_workflow(UiErrorContext::Selection, &err)),
        }
    }

    fn select_path(&mut self, ctx: &egui::Context, path: &Path) {
        match fs::read(path) {
            Ok(bytes) => {
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned());
                self.select_bytes(ctx, bytes, file_name);
            }
            Err(err) => self.reject(UiError::new(
                UiErrorCategory::Input,
                UiErrorContext::Selection,
                format!("Failed to read {}: {err}", path.display()),
            )),
        }
    }

    fn pick_image(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        {
            self.select_path(ctx, &path);
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|input| input.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        if let Some(bytes) = file.bytes {
            self.select_bytes(ctx, bytes.to_vec(), Some(file.name));
        } else if let Some(path) = file.path {
            self.select_path(ctx, &path);
        }
    }

    fn reject(&mut self, err: UiError) {
        if err.is_quiet() {
            tracing::debug!("ignored action while busy: {}", err.message());
            return;
        }
        tracing::warn!(
            category = ?err.category(),
            context = ?err.context(),
            "{}",
            err.message()
        );
        self.status = err.message().to_string();
        self.notice = Some(err);
    }

    fn submit_prediction(&mut self) {
        match self.controller.submit_prediction() {
            Ok(request) => {
                self.notice = None;
                let ticket = request.ticket;
                if let Err(reason) =
                    dispatch_backend_command(&self.cmd_tx, BackendCommand::Predict(request))
                {
                    self.controller
                        .complete_prediction(ticket, Err(ServiceError::NetworkFailure(reason)));
                }
            }
            Err(err) => self.reject(UiError::from_workflow(UiErrorContext::Predict, &err)),
        }
    }

    fn request_visualization(&mut self) {
        match self.controller.request_visualization() {
            Ok(request) => {
                self.notice = None;
                let ticket = request.ticket;
                if let Err(reason) =
                    dispatch_backend_command(&self.cmd_tx, BackendCommand::Visualize(request))
                {
                    self.controller
                        .complete_visualization(ticket, Err(ServiceError::NetworkFailure(reason)));
                }
            }
            Err(err) => self.reject(UiError::from_workflow(UiErrorContext::Visualize, &err)),
        }
    }

    fn reset(&mut self) {
        self.controller.reset();
        self.preview_texture = None;
        self.overlay_texture = None;
        self.notice = None;
        self.status = "Session cleared".to_string();
    }

    fn apply_settings(&mut self) {
        let request_timeout = match self.timeout_ms_input.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => Duration::from_millis(ms),
            _ => {
                self.status = "Timeout must be a positive number of milliseconds".to_string();
                return;
            }
        };
        let command = BackendCommand::Configure {
            service_url: self.service_url_input.trim().to_string(),
            request_timeout,
        };
        if let Err(reason) = dispatch_backend_command(&self.cmd_tx, command) {
            self.status = reason;
        }
    }

    fn check_service(&mut self) {
        match dispatch_backend_command(&self.cmd_tx, BackendCommand::CheckHealth) {
            Ok(()) => self.status = "Checking classifier service...".to_string(),
            Err(reason) => self.status = reason,
        }
    }

    fn save_overlay(&mut self) {
        let Some(overlay) = self.controller.session().visualization() else {
            return;
        };
        let suggested = format!("gradcam.{}", overlay.suggested_extension());
        let bytes = overlay.bytes().to_vec();
        if let Some(path) = rfd::FileDialog::new().set_file_name(&suggested).save_file() {
            match fs::write(&path, bytes) {
                Ok(()) => self.status = format!("Saved heatmap to {}", path.display()),
                Err(err) => {
                    self.reject(UiError::new(
                        UiErrorCategory::Input,
                        UiErrorContext::Export,
                        format!("Failed to save heatmap: {err}"),
                    ));
                }
            }
        }
    }

    fn copy_overlay(&mut self) {
        let Some(overlay) = self.controller.session().visualization() else {
            return;
        };
        let result = image::load_from_memory(overlay.bytes())
            .map_err(|err| err.to_string())
            .and_then(|decoded| {
                let rgba = decoded.to_rgba8();
                let mut clipboard = Clipboard::new().map_err(|err| err.to_string())?;
                clipboard
                    .set_image(ImageData {
                        width: rgba.width() as usize,
                        height: rgba.height() as usize,
                        bytes: std::borrow::Cow::Owned(rgba.into_raw()),
                    })
                    .map_err(|err| err.to_string())
            });
        match result {
            Ok(()) => self.status = "Copied heatmap to clipboard".to_string(),
            Err(err) => self.status = format!("Failed to copy heatmap: {err}"),
        }
    }

    fn show_settings_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("service_settings").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Service URL");
                ui.add(
                    egui::TextEdit::singleline(&mut self.service_url_input).desired_width(260.0),
                );
                ui.label("Timeout (ms)");
                ui.add(egui::TextEdit::singleline(&mut self.timeout_ms_input).desired_width(70.0));
                if ui.button("Apply").clicked() {
                    self.apply_settings();
                }
                if ui.button("Check service").clicked() {
                    self.check_service();
                }
            });
        });
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                if let Some(service) = &self.connected_service {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.weak(service);
                    });
                }
            });
        });
    }

    fn show_actions(&mut self, ctx: &egui::Context, ui: &mut egui::Ui, view: &ResultView) {
        ui.horizontal_wrapped(|ui| {
            if ui
                .add_enabled(view.can_select, egui::Button::new("Choose image…"))
                .clicked()
            {
                self.pick_image(ctx);
            }

            let submit_label = match view.phase {
                Phase::Predicting => "Predicting…",
                _ => "Upload & Predict",
            };
            if ui
                .add_enabled(view.can_submit, egui::Button::new(submit_label))
                .clicked()
            {
                self.submit_prediction();
            }
            if view.outcome.is_some()
                && ui
                    .add_enabled(view.can_visualize, egui::Button::new("Grad-CAM Heatmap"))
                    .clicked()
            {
                self.request_visualization();
            }
            if ui
                .add_enabled(view.can_reset, egui::Button::new("Reset"))
                .clicked()
            {
                self.reset();
            }
            if let Some(busy) = view.busy_label {
                ui.spinner();
                ui.label(busy);
            }
        });
    }

    fn show_outcome(ui: &mut egui::Ui, outcome: &OutcomeView) {
        let color = tone_color(outcome.tone);
        egui::Frame::group(ui.style())
            .stroke(egui::Stroke::new(1.5, color))
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&outcome.verdict_headline)
                            .size(26.0)
                            .strong()
                            .color(color),
                    );
                    ui.weak("Confidence Score");
                    ui.add(
                        egui::ProgressBar::new(outcome.confidence_fraction)
                            .fill(color)
                            .text(outcome.confidence_text.as_str()),
                    );
                    ui.label(format!("Edible: {}", outcome.edible_text));
                    ui.label(format!("Poisonous: {}", outcome.poisonous_text));
                    if let Some(note) = &outcome.note {
                        ui.colored_label(egui::Color32::from_rgb(255, 193, 7), note);
                    }
                });
                ui.separator();
                egui::Grid::new("metrics").num_columns(3).show(ui, |ui| {
                    ui.strong("Entropy");
                    ui.strong("Margin");
                    ui.strong("Inference Time");
                    ui.end_row();
                    ui.label(&outcome.entropy_text);
                    ui.label(&outcome.margin_text);
                    ui.label(&outcome.inference_time_text);
                    ui.end_row();
                });
            });
    }

    fn show_workspace(&mut self, ctx: &egui::Context, view: &ResultView) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("🍄 Mushroom Classifier");
                ui.weak("Choose or drop a mushroom image to identify whether it is edible or poisonous.");
                ui.add_space(8.0);

                self.show_actions(ctx, ui, view);

                if let Some(notice) = &self.notice {
                    let text = if notice.is_retryable() {
                        format!("{} (try again)", notice.message())
                    } else {
                        notice.message().to_string()
                    };
                    ui.colored_label(tone_color(Tone::Danger), text);
                }
                if let Some(error) = &view.error_text {
                    ui.colored_label(
                        tone_color(Tone::Danger),
                        format!("{error}. Retry or reset to continue."),
                    );
                }

                if let Some(texture) = &self.preview_texture {
                    ui.add_space(12.0);
                    ui.strong("Image Preview");
                    if let Some(caption) = &view.image_caption {
                        ui.weak(caption);
                    }
                    ui.add(egui::Image::new(texture).max_size(egui::vec2(480.0, 320.0)));
                } else if view.phase == Phase::Idle {
                    ui.add_space(12.0);
                    ui.weak(view.status_text);
                }

                if let Some(outcome) = &view.outcome {
                    ui.add_space(12.0);
                    Self::show_outcome(ui, outcome);
                }

                if let Some(texture) = &self.overlay_texture {
                    ui.add_space(12.0);
                    ui.strong("Model Attention Heatmap");
                    ui.add(egui::Image::new(texture).max_size(egui::vec2(480.0, 420.0)));
                }
                if view.overlay_available {
                    ui.horizontal(|ui| {
                        if ui.button("Save heatmap…").clicked() {
                            self.save_overlay();
                        }
                        if ui.button("Copy heatmap").clicked() {
                            self.copy_overlay();
                        }
                    });
                }
            });
        });
    }
}

impl eframe::App for SporecheckApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events(ctx);
        self.handle_dropped_files(ctx);

        let view = project(self.controller.session());
        self.show_settings_bar(ctx);
        self.show_workspace(ctx, &view);

        if view.busy_label.is_some() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
