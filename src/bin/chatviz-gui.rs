/*!
 * Desktop chat front-end for chatviz
 *
 * - Upload a .csv/.xlsx table to the backend
 * - Ask questions about it and read the answers as a chat transcript
 * - Explore each answer's chart: switch kind, toggle series, stack bars, download CSV
 */

use ahash::AHashMap;
use chatviz::export::{self, EXPORT_FILE_NAME};
use chatviz::session::Role;
use chatviz::viz::{self, ChartKind};
use chatviz::{Client, ClientError, ControlPanel, QueryResponse, Session, UploadResponse};
use eframe::egui;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

const CHART_W: u32 = 760;
const CHART_H: u32 = viz::types::CHART_HEIGHT_PX;
const WORKER_LOST: &str = "The background operation stopped unexpectedly";

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 760.0])
            .with_min_inner_size([600.0, 400.0])
            .with_title("chatviz"),
        ..Default::default()
    };

    eframe::run_native(
        "chatviz",
        options,
        Box::new(|_cc| Ok(Box::new(ChatApp::new()))),
    )
}

#[derive(Debug)]
enum OperationResult {
    Uploaded(Result<UploadResponse, ClientError>),
    Answered(Result<QueryResponse, ClientError>),
}

/// Cached chart image of one message; dropped whenever its controls change.
#[derive(Default)]
struct ChartView {
    texture: Option<egui::TextureHandle>,
}

struct ChatApp {
    client: Client,
    session: Session,
    query: String,
    charts: AHashMap<u64, ChartView>,

    is_uploading: bool,
    status_message: String,
    error_message: String,

    operation_receiver: Option<mpsc::Receiver<OperationResult>>,
}

impl ChatApp {
    fn new() -> Self {
        Self {
            client: Client::default(),
            session: Session::new(),
            query: String::new(),
            charts: AHashMap::new(),
            is_uploading: false,
            status_message: String::new(),
            error_message: String::new(),
            operation_receiver: None,
        }
    }

    fn busy(&self) -> bool {
        self.is_uploading || self.session.is_processing()
    }

    fn spawn<F>(&mut self, job: F)
    where
        F: FnOnce() -> OperationResult + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        self.operation_receiver = Some(receiver);
        thread::spawn(move || {
            let _ = sender.send(job());
        });
    }

    fn start_upload(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Tables", &["csv", "xlsx"])
            .pick_file()
        else {
            return;
        };
        self.is_uploading = true;
        self.error_message.clear();
        self.status_message = format!("Uploading {}...", path.display());
        let client = self.client.clone();
        self.spawn(move || OperationResult::Uploaded(client.upload(&path)));
    }

    fn submit_query(&mut self) {
        let question = self.query.trim().to_string();
        if question.is_empty() {
            return;
        }
        match self.session.begin_query(&question) {
            Ok(table_id) => {
                self.query.clear();
                self.error_message.clear();
                let client = self.client.clone();
                self.spawn(move || OperationResult::Answered(client.query(&question, &table_id)));
            }
            Err(e) => self.error_message = e.to_string(),
        }
    }

    fn check_operation_result(&mut self) {
        let Some(receiver) = &self.operation_receiver else {
            return;
        };
        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => return,
            Err(mpsc::TryRecvError::Disconnected) => {
                log::warn!("background operation ended without a result");
                self.operation_receiver = None;
                self.is_uploading = false;
                self.status_message.clear();
                self.error_message = WORKER_LOST.to_string();
                if self.session.is_processing() {
                    self.session
                        .finish_query(Err(ClientError::Query(WORKER_LOST.to_string())));
                }
                return;
            }
        };
        self.operation_receiver = None;

        match result {
            OperationResult::Uploaded(Ok(table)) => {
                self.is_uploading = false;
                self.status_message = format!(
                    "Loaded {} rows into {}",
                    table.rows_loaded, table.table_name
                );
                self.session.set_table(table.into());
            }
            OperationResult::Uploaded(Err(e)) => {
                self.is_uploading = false;
                self.status_message.clear();
                self.error_message = e.to_string();
            }
            OperationResult::Answered(res) => {
                if let Err(e) = &res {
                    self.error_message = e.to_string();
                }
                self.session.finish_query(res);
            }
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_operation_result();

        if self.busy() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("table").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading("chatviz");
                ui.separator();
                if ui
                    .add_enabled(!self.busy(), egui::Button::new("Upload table"))
                    .clicked()
                {
                    self.start_upload();
                }
                match self.session.table() {
                    Some(t) => ui.label(format!("{} ({} rows)", t.table_name, t.rows_loaded)),
                    None => ui.weak("No table loaded"),
                };
            });
            if !self.status_message.is_empty() {
                ui.colored_label(egui::Color32::DARK_GREEN, &self.status_message);
            }
            if !self.error_message.is_empty() {
                ui.colored_label(egui::Color32::RED, &self.error_message);
            }
            ui.add_space(6.0);
        });

        egui::TopBottomPanel::bottom("query").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                let enabled = !self.busy();
                let input = ui.add_enabled(
                    enabled,
                    egui::TextEdit::singleline(&mut self.query)
                        .hint_text("Ask a question about your data")
                        .desired_width(ui.available_width() - 80.0),
                );
                let enter = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                let send = ui.add_enabled(enabled, egui::Button::new("Send")).clicked();
                if enabled && (enter || send) {
                    self.submit_query();
                }
            });
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    let charts = &mut self.charts;
                    let error_message = &mut self.error_message;
                    for msg in self.session.messages_mut() {
                        ui.group(|ui| {
                            ui.set_width(ui.available_width());
                            let who = match msg.role {
                                Role::Human => "You",
                                Role::Agent => "Assistant",
                            };
                            ui.horizontal(|ui| {
                                ui.strong(who);
                                ui.weak(msg.created_at.format("%H:%M").to_string());
                            });
                            ui.label(&msg.content);
                            if let Some(reason) = &msg.visualization_reason {
                                ui.weak(reason);
                            }
                            if let Some(panel) = msg.visualization.as_mut() {
                                let view = charts.entry(msg.id).or_default();
                                if draw_controls(ui, msg.id, panel, error_message) {
                                    view.texture = None;
                                }
                                draw_chart(ui, msg.id, panel, view, error_message);
                            }
                        });
                        ui.add_space(8.0);
                    }
                    if self.session.is_processing() {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Thinking...");
                        });
                    }
                });
        });
    }
}

fn swatch_color(hex: &str) -> egui::Color32 {
    egui::Color32::from_hex(hex).unwrap_or(egui::Color32::GRAY)
}

/// Kind selector, stacked checkbox, download button and series picker. Returns true when the
/// view changed.
fn draw_controls(
    ui: &mut egui::Ui,
    id: u64,
    panel: &mut ControlPanel,
    error_message: &mut String,
) -> bool {
    let mut changed = false;

    ui.horizontal(|ui| {
        let mut kind = panel.chart_kind();
        egui::ComboBox::from_id_salt(("kind", id))
            .selected_text(kind.display_name())
            .show_ui(ui, |ui| {
                for k in ChartKind::ALL {
                    ui.selectable_value(&mut kind, k, k.display_name());
                }
            });
        if kind != panel.chart_kind() {
            panel.select_chart_kind(kind);
            changed = true;
        }

        if panel.stacked_available() {
            let mut stacked = panel.stacked();
            if ui.checkbox(&mut stacked, "Stacked").changed() {
                panel.toggle_stacked();
                changed = true;
            }
        }

        if ui.button("Download CSV").clicked() {
            let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
            if let Some(path) = rfd::FileDialog::new()
                .set_directory(home)
                .set_file_name(EXPORT_FILE_NAME)
                .add_filter("CSV", &["csv"])
                .save_file()
                && let Err(e) = export::save_csv_to(panel.raw(), &path)
            {
                *error_message = format!("Failed to save CSV: {e}");
            }
        }
    });

    ui.horizontal_wrapped(|ui| {
        for entry in panel.legend_entries() {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
            ui.painter()
                .rect_filled(rect, 2.0, swatch_color(entry.swatch));
            let mut visible = entry.visible;
            if ui.checkbox(&mut visible, &entry.label).changed() {
                panel.toggle_series(&entry.label);
                changed = true;
            }
        }
    });

    changed
}

fn draw_chart(
    ui: &mut egui::Ui,
    id: u64,
    panel: &ControlPanel,
    view: &mut ChartView,
    error_message: &mut String,
) {
    if let Some(notice) = panel.rendered().notice() {
        ui.weak(notice);
        return;
    }
    if view.texture.is_none() {
        match viz::draw_rgb(panel.rendered(), CHART_W, CHART_H) {
            Ok(buf) => {
                let image =
                    egui::ColorImage::from_rgb([CHART_W as usize, CHART_H as usize], &buf);
                view.texture = Some(ui.ctx().load_texture(
                    format!("chart-{id}"),
                    image,
                    egui::TextureOptions::LINEAR,
                ));
            }
            Err(e) => {
                *error_message = format!("Failed to draw chart: {e}");
                return;
            }
        }
    }
    if let Some(texture) = &view.texture {
        let w = ui.available_width().min(CHART_W as f32);
        let size = egui::vec2(w, w * CHART_H as f32 / CHART_W as f32);
        ui.image((texture.id(), size));
    }
}
