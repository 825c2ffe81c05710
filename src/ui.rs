use egui::{Color32, ColorImage, RichText, TextureOptions, Ui};
use egui_extras::{Column, TableBuilder};

use modlist::item::{PrimaryCategory, HAIR};
use modlist::settings::{ColorSlot, ExportFormat, ManagedDir};
use modlist::thumbnail::Thumbnail;
use modlist::tree::{CategoryTree, FilterMode, NodeId, SortMode};
use modlist::view_model::Panel;

use crate::ModListApp;

const MODEL_THUMBNAIL: &str = "::model";
const THUMBNAIL_EDGE: f32 = 48.0;

fn report(error_msg: &mut Option<String>, result: anyhow::Result<()>) {
    if let Err(e) = result {
        tracing::warn!("{e:#}");
        *error_msg = Some(format!("{e:#}"));
    }
}

pub fn game_dir_ui(app: &mut ModListApp, ui: &mut Ui) {
    ui.horizontal(|ui| {
        ui.label("Game Dir:");

        let game_dir = &app.settings.settings().game_dir;
        let button_text = if game_dir.as_os_str().is_empty() {
            "Select ffxiv Directory".to_string()
        } else {
            game_dir.display().to_string()
        };

        if ui.button(button_text).clicked() {
            if let Some(path) = rfd::FileDialog::new().pick_folder() {
                let result = app.settings.set_game_dir(path);
                report(&mut app.error_msg, result);
                app.reopen();
            }
        }
    });
}

pub fn list_options_ui(app: &mut ModListApp, ui: &mut Ui) {
    let Some(view) = app.view.as_mut() else {
        return;
    };

    let mut filter = view.filter();
    let mut sort = view.sort();
    ui.horizontal(|ui| {
        ui.label("Filter:");
        ui.radio_value(&mut filter, FilterMode::Item, "Item");
        ui.radio_value(&mut filter, FilterMode::ModPack, "Mod Pack");
        ui.separator();
        ui.label("Sort:");
        ui.radio_value(&mut sort, SortMode::Name, "Name");
        ui.radio_value(&mut sort, SortMode::Date, "Date");
    });

    if filter != view.filter() || sort != view.sort() {
        view.set_filter(filter);
        view.set_sort(sort);
        app.thumbnails.clear();
    }
}

fn node_ui(tree: &CategoryTree, id: NodeId, selected: Option<NodeId>, ui: &mut Ui, clicked: &mut Option<NodeId>) {
    let node = tree.node(id);
    let children = tree.children(id);

    if node.is_leaf() || children.is_empty() {
        if ui.selectable_label(selected == Some(id), &node.name).clicked() {
            *clicked = Some(id);
        }
        return;
    }

    let response = egui::CollapsingHeader::new(&node.name)
        .id_salt(id)
        .show(ui, |ui| {
            for child in children {
                node_ui(tree, *child, selected, ui, clicked);
            }
        });
    if response.header_response.clicked() {
        *clicked = Some(id);
    }
}

pub fn tree_ui(app: &mut ModListApp, ui: &mut Ui) {
    let Some(view) = app.view.as_mut() else {
        ui.label("No mod list loaded.");
        return;
    };
    let Some(tree) = view.tree() else {
        if view.is_busy() {
            ui.spinner();
        }
        return;
    };

    let mut clicked = None;
    for root in tree.roots() {
        node_ui(tree, *root, view.selected_node(), ui, &mut clicked);
    }

    if let Some(id) = clicked {
        view.select_node(id);
        app.thumbnails.clear();
    }
}

pub fn progress_ui(app: &mut ModListApp, ui: &mut Ui) {
    let Some(view) = app.view.as_ref() else {
        return;
    };
    let progress = view.progress();
    if progress.total == 0 {
        return;
    }
    ui.add(
        egui::ProgressBar::new(progress.percent() as f32 / 100.0)
            .text(progress.text()),
    );
}

pub fn buttons_ui(app: &mut ModListApp, ui: &mut Ui) {
    let Some(view) = app.view.as_mut() else {
        return;
    };

    let mut result = Ok(());
    ui.horizontal(|ui| {
        let toggle = egui::Button::new(view.toggle_label().as_str());
        if ui.add_enabled(view.can_toggle(), toggle).clicked() {
            result = view.toggle();
        }
        if ui.add_enabled(view.can_delete(), egui::Button::new("Delete")).clicked() {
            result = view.delete();
        }
    });

    if let Err(e) = result {
        tracing::error!("{e}");
        app.error_msg = Some(e.to_string());
    }
}

pub fn notices_ui(app: &mut ModListApp, ui: &mut Ui) {
    let Some(view) = app.view.as_mut() else {
        return;
    };
    if view.notices().is_empty() {
        return;
    }

    let mut clear = false;
    egui::CollapsingHeader::new(format!("Notices ({})", view.notices().len()))
        .id_salt("notices")
        .show(ui, |ui| {
            egui::ScrollArea::vertical()
                .max_height(120.0)
                .show(ui, |ui| {
                    for notice in view.notices() {
                        ui.label(RichText::new(notice).color(Color32::ORANGE));
                    }
                });
            clear = ui.button("Clear").clicked();
        });

    if clear {
        view.clear_notices();
    }
}

pub fn info_grid_ui(app: &mut ModListApp, ui: &mut Ui) {
    let Some(view) = app.view.as_ref() else {
        return;
    };
    if view.panel() != Panel::Info {
        return;
    }
    let Some(summary) = view.summary() else {
        return;
    };

    egui::Grid::new("mod_pack_info")
        .num_columns(2)
        .striped(true)
        .spacing([24.0, 6.0])
        .show(ui, |ui| {
            ui.strong("Mod Pack");
            ui.label(&summary.title);
            ui.end_row();
            ui.strong("Author");
            ui.label(&summary.author);
            ui.end_row();
            ui.strong("Version");
            ui.label(&summary.version);
            ui.end_row();
            ui.strong("Mods");
            ui.label(summary.mod_count.to_string());
            ui.end_row();
            ui.strong("Enabled");
            ui.label(summary.enabled.to_string());
            ui.end_row();
            ui.strong("Disabled");
            ui.label(summary.disabled.to_string());
            ui.end_row();
        });

    ui.separator();
    egui::ScrollArea::vertical().show(ui, |ui| {
        ui.label(&summary.contents);
    });
}

pub fn preview_table_ui(app: &mut ModListApp, ui: &mut Ui) {
    let Some(view) = app.view.as_mut() else {
        return;
    };
    if view.panel() != Panel::Preview {
        return;
    }

    for row in view.rows() {
        let key = match row.thumbnail {
            Thumbnail::ModelPlaceholder => MODEL_THUMBNAIL.to_string(),
            _ => row.entry.full_path.clone(),
        };
        if app.thumbnails.contains_key(&key) {
            continue;
        }
        if let Some(img) = row.thumbnail.image() {
            let size = [img.width() as usize, img.height() as usize];
            let color = ColorImage::from_rgba_unmultiplied(size, img.as_raw());
            let texture = ui.ctx().load_texture(&key, color, TextureOptions::LINEAR);
            app.thumbnails.insert(key, texture);
        }
    }

    let mut selection: Vec<usize> = view.selected_rows().to_vec();
    let mut selection_changed = false;

    egui::ScrollArea::horizontal().show(ui, |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(false)
            .sense(egui::Sense::click())
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::exact(THUMBNAIL_EDGE + 8.0))
            .column(Column::initial(140.0).at_least(80.0))
            .column(Column::initial(100.0).at_least(60.0))
            .column(Column::initial(60.0).at_least(40.0))
            .column(Column::initial(60.0).at_least(40.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("");
                });
                header.col(|ui| {
                    ui.strong("Race");
                });
                header.col(|ui| {
                    ui.strong("Map");
                });
                header.col(|ui| {
                    ui.strong("Part");
                });
                header.col(|ui| {
                    ui.strong("Num");
                });
                header.col(|ui| {
                    ui.strong("Active");
                });
            })
            .body(|mut body| {
                for (i, row) in view.rows().iter().enumerate() {
                    let key = match row.thumbnail {
                        Thumbnail::ModelPlaceholder => MODEL_THUMBNAIL,
                        _ => row.entry.full_path.as_str(),
                    };
                    let texture = app.thumbnails.get(key);
                    let opacity = row.active.opacity();

                    body.row(THUMBNAIL_EDGE + 4.0, |mut table_row| {
                        table_row.set_selected(selection.contains(&i));

                        table_row.col(|ui| {
                            ui.set_opacity(opacity);
                            if let Some(texture) = texture {
                                let sized = egui::load::SizedTexture::from_handle(texture);
                                ui.add(
                                    egui::Image::from_texture(sized)
                                        .fit_to_exact_size(egui::vec2(THUMBNAIL_EDGE, THUMBNAIL_EDGE)),
                                );
                            }
                        });
                        table_row.col(|ui| {
                            ui.set_opacity(opacity);
                            ui.label(&row.race);
                        });
                        table_row.col(|ui| {
                            ui.set_opacity(opacity);
                            ui.label(&row.map);
                        });
                        table_row.col(|ui| {
                            ui.set_opacity(opacity);
                            ui.label(&row.part);
                        });
                        table_row.col(|ui| {
                            ui.set_opacity(opacity);
                            ui.label(&row.number);
                        });
                        table_row.col(|ui| {
                            let (text, color) = if row.active.is_enabled() {
                                ("Enabled", Color32::LIGHT_GREEN)
                            } else {
                                ("Disabled", Color32::LIGHT_RED)
                            };
                            ui.label(RichText::new(text).color(color));
                        });

                        if table_row.response().clicked() {
                            if let Some(pos) = selection.iter().position(|s| *s == i) {
                                selection.remove(pos);
                            } else {
                                selection.push(i);
                            }
                            selection_changed = true;
                        }
                    });
                }
            });
    });

    if selection_changed {
        view.select_rows(selection);
    }

    if view.rows().is_empty() && !view.is_busy() && view.progress().total > 0 {
        ui.label("Nothing could be previewed for this item.");
    }
}

fn dir_row(app: &mut ModListApp, ui: &mut Ui, label: &str, which: ManagedDir) {
    ui.label(label);
    ui.label(app.settings.dir(which).display().to_string());
    if ui.button("Change").clicked() {
        if let Some(path) = rfd::FileDialog::new().pick_folder() {
            let result = app.settings.set_dir(which, path, app.move_dir_data);
            report(&mut app.error_msg, result);
            if which == ManagedDir::Save {
                app.reopen();
            }
        }
    }
    ui.end_row();
}

fn choice_ui(ui: &mut Ui, label: &str, current: &str, options: &[&str]) -> Option<String> {
    let mut chosen = None;
    egui::ComboBox::from_label(label)
        .selected_text(current)
        .show_ui(ui, |ui| {
            for option in options {
                if ui.selectable_label(current == *option, *option).clicked() {
                    chosen = Some(option.to_string());
                }
            }
        });
    chosen
}

pub fn settings_window_ui(app: &mut ModListApp, ctx: &egui::Context) {
    let was_open = app.show_settings;
    let mut open = app.show_settings;

    egui::Window::new("Customize")
        .open(&mut open)
        .resizable(true)
        .default_width(520.0)
        .show(ctx, |ui| {
            ui.heading("Directories");
            egui::Grid::new("settings_dirs").num_columns(3).show(ui, |ui| {
                dir_row(app, ui, "Save", ManagedDir::Save);
                dir_row(app, ui, "Index Backups", ManagedDir::Backup);
                dir_row(app, ui, "Mod Packs", ManagedDir::ModPack);
            });
            ui.checkbox(&mut app.move_dir_data, "Move existing files when changing a directory");

            ui.separator();
            ui.horizontal(|ui| {
                ui.label("Default author:");
                let response = ui.text_edit_singleline(app.settings.author_draft_mut());
                if response.lost_focus() {
                    let result = app.settings.commit_author();
                    report(&mut app.error_msg, result);
                }
            });

            ui.separator();
            ui.heading("Colors");
            egui::Grid::new("settings_colors").num_columns(2).show(ui, |ui| {
                for slot in ColorSlot::ALL {
                    ui.label(slot.label());
                    let mut rgba = app.settings.color(slot);
                    if ui.color_edit_button_srgba_unmultiplied(&mut rgba).changed() {
                        let result = app.settings.set_color(slot, rgba);
                        report(&mut app.error_msg, result);
                    }
                    ui.end_row();
                }
            });
            if ui.button("Reset colors").clicked() {
                let result = app.settings.reset_colors();
                report(&mut app.error_msg, result);
            }

            ui.separator();
            ui.heading("Model");
            let current = app.settings.settings().skin_type.clone();
            if let Some(value) = choice_ui(ui, "Skin type", &current, app.settings.skin_types()) {
                let result = app.settings.set_skin_type(&value);
                report(&mut app.error_msg, result);
            }
            let current = app.settings.settings().default_race.clone();
            let races = app.settings.default_races();
            if let Some(value) = choice_ui(ui, "Default race", &current, &races) {
                let result = app.settings.set_default_race(&value);
                report(&mut app.error_msg, result);
            }
            let current = app.settings.settings().importer.clone();
            if let Some(value) = choice_ui(ui, "Importer", &current, app.settings.importers()) {
                let result = app.settings.set_importer(&value);
                report(&mut app.error_msg, result);
            }

            let mut force_uv1 = app.settings.settings().force_uv1_quadrant;
            if ui.checkbox(&mut force_uv1, "Force UV1 into the first quadrant (gear)").changed() {
                let result = app.settings.set_force_uv1_quadrant(Some(PrimaryCategory::Gear), force_uv1);
                report(&mut app.error_msg, result);
            }
            let mut clone_uv = app.settings.settings().clone_uv1_to_uv2;
            if ui.checkbox(&mut clone_uv, "Clone UV1 to UV2 (hair)").changed() {
                let result = app.settings.set_clone_uv1_to_uv2(HAIR, clone_uv);
                report(&mut app.error_msg, result);
            }

            ui.separator();
            ui.heading("Export");
            let mut formats_changed = false;
            ui.horizontal(|ui| {
                for format in ExportFormat::ALL {
                    let mut on = app.settings.settings().export_formats.get(format);
                    if ui.checkbox(&mut on, format.label()).changed() {
                        let result = app.settings.set_export_format(format, on);
                        report(&mut app.error_msg, result);
                        formats_changed = true;
                    }
                }
            });
            ui.label(format!("Exporting: {}", app.settings.export_display()));
            if formats_changed {
                app.reopen();
            }
        });

    if was_open && !open {
        let result = app.settings.commit_author();
        report(&mut app.error_msg, result);
    }
    app.show_settings = open;
}
