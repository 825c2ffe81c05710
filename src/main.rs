#![cfg_attr(all(target_os = "windows", not(debug_assertions)), windows_subsystem = "windows")]
use anyhow::{bail, Result};
use eframe::egui::{CentralPanel, Layout, SidePanel, TopBottomPanel};
use eframe::App;
use egui::{Context, TextureHandle};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use modlist::archive::ExportDirArchive;
use modlist::logging;
use modlist::modding::ManifestModding;
use modlist::settings::{project_dirs, SettingsModel};
use modlist::view_model::ModListViewModel;

mod ui;

use ui::{
    buttons_ui, game_dir_ui, info_grid_ui, list_options_ui, notices_ui, preview_table_ui,
    progress_ui, settings_window_ui, tree_ui,
};

struct ModListApp {
    settings: SettingsModel,
    view: Option<ModListViewModel>,
    thumbnails: HashMap<String, TextureHandle>,
    show_settings: bool,
    move_dir_data: bool,
    error_msg: Option<String>,
    status_msg: String,
    warning_msg: String,
    initialized: bool,
}

impl Default for ModListApp {
    fn default() -> Self {
        Self {
            settings: SettingsModel::load(),
            view: None,
            thumbnails: HashMap::new(),
            show_settings: false,
            move_dir_data: true,
            error_msg: None,
            status_msg: String::new(),
            warning_msg: String::new(),
            initialized: false,
        }
    }
}

impl ModListApp {
    fn initialize(&mut self, ctx: &Context) {
        self.warning_msg.clear();
        self.error_msg = None;
        self.thumbnails.clear();

        if let Err(e) = self.open_view(ctx) {
            self.view = None;
            self.warning_msg = format!("{e:#}");
        }
    }

    fn open_view(&mut self, ctx: &Context) -> Result<()> {
        let settings = self.settings.settings();
        let Some(manifest_path) = settings.manifest_path() else {
            bail!("Select the game's ffxiv data directory to load the mod list.");
        };
        if !manifest_path.exists() {
            bail!("No mod list found at {}", manifest_path.display());
        }

        info!("Opening mod list {}", manifest_path.display());
        let archive = ExportDirArchive::new(settings.save_dir.clone(), settings.export_formats);
        let modding = ManifestModding::new(manifest_path.clone());

        let mut view = ModListViewModel::new(
            manifest_path,
            Arc::new(archive),
            Arc::new(modding),
            settings.filter_mode(),
            settings.sort_mode(),
        );
        let repaint = ctx.clone();
        view.set_waker(move || repaint.request_repaint());
        view.refresh();

        self.view = Some(view);
        self.status_msg = "Loading mod list...".to_string();
        Ok(())
    }

    /// Called after settings that feed the view changed.
    fn reopen(&mut self) {
        self.save_view_settings();
        self.view = None;
        self.initialized = false;
    }

    fn save_view_settings(&mut self) {
        if let Some(view) = &self.view {
            if let Err(e) = view.save_view_settings(&mut self.settings) {
                warn!("Failed to save list settings: {e:#}");
            }
        }
    }
}

impl Drop for ModListApp {
    fn drop(&mut self) {
        self.save_view_settings();
        if let Err(e) = self.settings.commit_author() {
            warn!("Failed to save default author: {e:#}");
        }
    }
}

impl App for ModListApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        if !self.initialized {
            self.initialize(ctx);
            self.initialized = true;
        }

        if let Some(view) = &mut self.view {
            if view.pump() > 0 && !view.is_busy() {
                self.status_msg.clear();
            }
            if view.rows().is_empty() && !self.thumbnails.is_empty() {
                self.thumbnails.clear();
            }
        }

        TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Mod List");
                ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Settings").clicked() {
                        self.show_settings = !self.show_settings;
                    }
                    if ui.button("Reload").clicked() {
                        self.reopen();
                    }
                });
            });

            if let Some(err) = &self.error_msg {
                ui.label(egui::RichText::new(err).color(egui::Color32::RED));
            }
            if let Some(fatal) = self.view.as_ref().and_then(|v| v.fatal_error()) {
                ui.label(egui::RichText::new(fatal).color(egui::Color32::RED));
            }
            if !self.warning_msg.is_empty() {
                ui.label(egui::RichText::new(&self.warning_msg).color(egui::Color32::ORANGE));
            }
            if !self.status_msg.is_empty() {
                ui.label(egui::RichText::new(&self.status_msg).color(egui::Color32::LIGHT_GREEN));
            }

            game_dir_ui(self, ui);
            list_options_ui(self, ui);
        });

        SidePanel::left("categories")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    tree_ui(self, ui);
                });
            });

        CentralPanel::default().show(ctx, |ui| {
            progress_ui(self, ui);
            buttons_ui(self, ui);
            notices_ui(self, ui);
            ui.separator();
            info_grid_ui(self, ui);
            preview_table_ui(self, ui);
        });

        settings_window_ui(self, ctx);
    }
}

fn main() -> eframe::Result<()> {
    let log_dir = project_dirs().map(|p| p.data_dir().join("logs"));
    let _log_guard = logging::init(log_dir.as_deref());

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1100.0, 700.0])
        .with_title("Mod List");

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Mod List",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_theme(eframe::egui::Theme::Dark);

            Ok(Box::new(ModListApp::default()))
        }),
    )
}
