use std::sync::mpsc::{Receiver, TryRecvError};

use eframe::egui::{self, Align, Context, Layout, Pos2, Rect, vec2};

use page_graph::graph::RawGraph;
use page_graph::source::{LoadRequest, spawn_load};
use page_graph::{DataFetchError, GraphConfig, GraphView, ViewStatus};

mod canvas;
mod panels;

use canvas::CanvasInput;

pub struct PageGraphApp {
    request: LoadRequest,
    view: GraphView,
    load_rx: Option<Receiver<Result<RawGraph, DataFetchError>>>,
    search: String,
    tag_filter: String,
    canvas_input: CanvasInput,
    viewport: Rect,
}

impl PageGraphApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        request: LoadRequest,
        config: GraphConfig,
    ) -> Self {
        let mut view = GraphView::new(config);
        view.set_on_node_activated(|id| tracing::info!(page = id, "open page"));

        let mut app = Self {
            request,
            view,
            load_rx: None,
            search: String::new(),
            tag_filter: String::new(),
            canvas_input: CanvasInput::default(),
            viewport: Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0)),
        };
        app.start_load();
        app
    }

    fn start_load(&mut self) {
        self.view.begin_loading();
        self.load_rx = Some(spawn_load(self.request.clone()));
    }

    fn poll_load(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };
        match rx.try_recv() {
            Ok(result) => self.view.load(result),
            Err(TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(TryRecvError::Disconnected) => self.view.load(Err(DataFetchError::Disconnected)),
        }
    }
}

impl eframe::App for PageGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_load();
        let is_loading = self.load_rx.is_some();
        if is_loading {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("page-graph");
                    ui.separator();
                    ui.label(format!("workspace: {}", self.request.workspace_id));
                    ui.label(format!("pages: {}", self.view.graph().node_count()));
                    ui.label(format!("links: {}", self.view.graph().edge_count()));
                    let reload = ui.add_enabled(!is_loading, egui::Button::new("Reload"));
                    if reload.clicked() {
                        self.start_load();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let visible = self.view.visible();
                        ui.label(format!(
                            "visible: {} pages, {} links",
                            visible.node_count(),
                            visible.edge_count()
                        ));
                    });
                });
            });

        let mut retry = false;
        match self.view.status().clone() {
            ViewStatus::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading workspace graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            ViewStatus::Failed(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the workspace graph");
                    ui.add_space(6.0);
                    ui.label(error.to_string());
                    ui.add_space(10.0);
                    if ui.add_enabled(!is_loading, egui::Button::new("Retry")).clicked() {
                        retry = true;
                    }
                });
            }
            ViewStatus::Ready => {
                egui::SidePanel::left("controls")
                    .resizable(true)
                    .default_width(300.0)
                    .show(ctx, |ui| self.draw_controls(ui));

                egui::SidePanel::right("details")
                    .resizable(true)
                    .default_width(280.0)
                    .show(ctx, |ui| self.draw_details(ui));

                egui::CentralPanel::default().show(ctx, |ui| self.draw_canvas(ui));
            }
        }

        if retry {
            self.start_load();
        }
    }
}
