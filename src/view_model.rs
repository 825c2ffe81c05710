//! UI-thread state of the mod list window.
//!
//! Tree and preview builds run on worker threads and report back over one
//! channel. [`ModListViewModel::pump`] applies those messages on the UI
//! thread; results from superseded builds are dropped by generation.

use crate::archive::ArchiveReader;
use crate::error::{ManifestError, ServiceError};
use crate::item::GenericItem;
use crate::mod_model::Manifest;
use crate::modding::ModdingService;
use crate::notify::Notifier;
use crate::preview::{build_preview_rows, select_entries, EntryScope, PreviewEvent, PreviewRow};
use crate::settings::SettingsModel;
use crate::summary::{summarize, ModPackSummary, ToggleLabel};
use crate::tree::{build_tree, CategoryTree, FilterMode, NodeId, SortMode, TreeBuild};
use indexmap::IndexSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewProperty {
    Filter,
    Sort,
    Tree,
    Selection,
    Panel,
    Rows,
    RowSelection,
    Summary,
    Progress,
    Buttons,
    Notices,
    FatalError,
}

/// What the right-hand side shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Empty,
    Preview,
    Info,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            (self.current * 100 / self.total) as u32
        }
    }

    pub fn text(&self) -> String {
        if self.total == 0 {
            String::new()
        } else {
            format!("{} / {}", self.current, self.total)
        }
    }
}

enum WorkerMessage {
    Tree {
        generation: u64,
        result: Result<TreeBuild, ManifestError>,
    },
    Preview {
        generation: u64,
        event: PreviewEvent,
    },
    PreviewFailed {
        generation: u64,
        error: ManifestError,
    },
    PreviewDone {
        generation: u64,
    },
}

type Waker = Arc<dyn Fn() + Send + Sync>;

pub struct ModListViewModel {
    manifest_path: PathBuf,
    archive: Arc<dyn ArchiveReader>,
    modding: Arc<dyn ModdingService>,

    filter: FilterMode,
    sort: SortMode,
    tree: Option<CategoryTree>,
    selected_node: Option<NodeId>,
    panel: Panel,
    rows: Vec<PreviewRow>,
    selected_rows: Vec<usize>,
    summary: Option<ModPackSummary>,
    progress: Progress,
    toggle_label: ToggleLabel,
    can_toggle: bool,
    can_delete: bool,
    notices: Vec<String>,
    fatal_error: Option<String>,

    tx: Sender<WorkerMessage>,
    rx: Receiver<WorkerMessage>,
    tree_generation: u64,
    preview_generation: u64,
    tree_pending: bool,
    preview_pending: bool,
    preview_cancel: Option<Arc<AtomicBool>>,
    waker: Option<Waker>,
    notifier: Notifier<ViewProperty>,
}

impl ModListViewModel {
    pub fn new(
        manifest_path: PathBuf,
        archive: Arc<dyn ArchiveReader>,
        modding: Arc<dyn ModdingService>,
        filter: FilterMode,
        sort: SortMode,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            manifest_path,
            archive,
            modding,
            filter,
            sort,
            tree: None,
            selected_node: None,
            panel: Panel::Empty,
            rows: Vec::new(),
            selected_rows: Vec::new(),
            summary: None,
            progress: Progress::default(),
            toggle_label: ToggleLabel::Enable,
            can_toggle: false,
            can_delete: false,
            notices: Vec::new(),
            fatal_error: None,
            tx,
            rx,
            tree_generation: 0,
            preview_generation: 0,
            tree_pending: false,
            preview_pending: false,
            preview_cancel: None,
            waker: None,
            notifier: Notifier::default(),
        }
    }

    /// Called from worker threads after each message, e.g. to request a repaint.
    pub fn set_waker(&mut self, waker: impl Fn() + Send + Sync + 'static) {
        self.waker = Some(Arc::new(waker));
    }

    pub fn notifier(&mut self) -> &mut Notifier<ViewProperty> {
        &mut self.notifier
    }

    fn changed(&mut self, property: ViewProperty) {
        self.notifier.notify(&property);
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn tree(&self) -> Option<&CategoryTree> {
        self.tree.as_ref()
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.selected_node
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn rows(&self) -> &[PreviewRow] {
        &self.rows
    }

    pub fn selected_rows(&self) -> &[usize] {
        &self.selected_rows
    }

    pub fn summary(&self) -> Option<&ModPackSummary> {
        self.summary.as_ref()
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn toggle_label(&self) -> ToggleLabel {
        self.toggle_label
    }

    pub fn can_toggle(&self) -> bool {
        self.can_toggle
    }

    pub fn can_delete(&self) -> bool {
        self.can_delete
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn clear_notices(&mut self) {
        self.notices.clear();
        self.changed(ViewProperty::Notices);
    }

    pub fn fatal_error(&self) -> Option<&str> {
        self.fatal_error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.tree_pending || self.preview_pending
    }

    pub fn set_filter(&mut self, filter: FilterMode) {
        if self.filter == filter {
            return;
        }
        self.filter = filter;
        self.changed(ViewProperty::Filter);
        self.refresh();
    }

    pub fn set_sort(&mut self, sort: SortMode) {
        if self.sort == sort {
            return;
        }
        self.sort = sort;
        self.changed(ViewProperty::Sort);
        self.refresh();
    }

    /// Rebuilds the tree from a freshly loaded manifest.
    pub fn refresh(&mut self) {
        self.cancel_preview();
        self.tree_generation += 1;
        self.tree_pending = true;
        self.tree = None;
        self.selected_node = None;
        self.fatal_error = None;
        self.clear_panel(Panel::Empty);
        self.set_buttons(false, false);
        self.changed(ViewProperty::Tree);
        self.changed(ViewProperty::Selection);

        let generation = self.tree_generation;
        let path = self.manifest_path.clone();
        let (filter, sort) = (self.filter, self.sort);
        let tx = self.tx.clone();
        let waker = self.waker.clone();

        debug!("Starting tree build {generation} ({filter:?}, {sort:?})");
        thread::spawn(move || {
            let result = Manifest::load(&path).map(|manifest| build_tree(&manifest, filter, sort));
            tx.send(WorkerMessage::Tree { generation, result }).ok();
            if let Some(wake) = waker {
                wake();
            }
        });
    }

    /// Applies every pending worker message. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.rx.try_recv() {
            if self.apply(message) {
                applied += 1;
            }
        }
        applied
    }

    /// Blocks until no build is in flight or `timeout` passes. Returns true
    /// when everything finished.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_busy() {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(left) {
                Ok(message) => {
                    self.apply(message);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return false;
                }
            }
        }
        self.pump();
        true
    }

    fn apply(&mut self, message: WorkerMessage) -> bool {
        match message {
            WorkerMessage::Tree { generation, result } => {
                if generation != self.tree_generation {
                    return false;
                }
                self.tree_pending = false;
                match result {
                    Ok(TreeBuild { tree, errors }) => {
                        info!("Mod list loaded: {} items", tree.leaf_count());
                        self.tree = Some(tree);
                        if !errors.is_empty() {
                            self.notices.extend(errors.iter().map(ToString::to_string));
                            self.changed(ViewProperty::Notices);
                        }
                    }
                    Err(e) => {
                        error!("{e}");
                        self.tree = None;
                        self.fatal_error = Some(e.to_string());
                        self.changed(ViewProperty::FatalError);
                    }
                }
                self.changed(ViewProperty::Tree);
            }
            WorkerMessage::Preview { generation, event } => {
                if generation != self.preview_generation {
                    return false;
                }
                match event {
                    PreviewEvent::Row(row) => {
                        self.rows.push(row);
                        self.changed(ViewProperty::Rows);
                    }
                    PreviewEvent::Progress { current, total } => {
                        self.progress = Progress { current, total };
                        self.changed(ViewProperty::Progress);
                    }
                    PreviewEvent::Error(e) => {
                        self.notices.push(e.to_string());
                        self.changed(ViewProperty::Notices);
                    }
                }
            }
            WorkerMessage::PreviewFailed { generation, error } => {
                if generation != self.preview_generation {
                    return false;
                }
                error!("{error}");
                self.fatal_error = Some(error.to_string());
                self.changed(ViewProperty::FatalError);
            }
            WorkerMessage::PreviewDone { generation } => {
                if generation != self.preview_generation {
                    return false;
                }
                self.preview_pending = false;
                self.preview_cancel = None;
            }
        }
        true
    }

    fn cancel_preview(&mut self) {
        if let Some(cancel) = self.preview_cancel.take() {
            cancel.store(true, Ordering::SeqCst);
        }
        // Anything still queued for the old build is dropped by generation.
        self.preview_generation += 1;
        self.preview_pending = false;
    }

    fn clear_panel(&mut self, panel: Panel) {
        self.panel = panel;
        self.rows.clear();
        self.selected_rows.clear();
        self.summary = None;
        self.progress = Progress::default();
        self.changed(ViewProperty::Panel);
        self.changed(ViewProperty::Rows);
        self.changed(ViewProperty::Progress);
    }

    fn set_buttons(&mut self, can_toggle: bool, can_delete: bool) {
        self.can_toggle = can_toggle;
        self.can_delete = can_delete;
        self.changed(ViewProperty::Buttons);
    }

    pub fn select_node(&mut self, id: NodeId) {
        self.cancel_preview();
        let Some(tree) = &self.tree else {
            return;
        };
        if tree.get(id).is_none() {
            return;
        }

        let is_pack = tree.is_mod_pack_node(id);
        let is_root = tree.is_root(id) || tree.parent(id).is_none();
        let item = tree.node(id).item().cloned();
        let scope = match tree.filter() {
            FilterMode::Item => None,
            FilterMode::ModPack => tree
                .enclosing_pack(id)
                .and_then(|pack| tree.pack_name(pack))
                .map(|name| name.map(str::to_string)),
        };

        self.selected_node = Some(id);
        self.changed(ViewProperty::Selection);

        if is_pack {
            self.clear_panel(Panel::Info);
            self.refresh_summary();
            self.set_buttons(true, true);
        } else if is_root {
            self.clear_panel(Panel::Empty);
            self.set_buttons(false, false);
        } else {
            self.clear_panel(Panel::Preview);
            self.set_buttons(false, false);
            if let Some(item) = item {
                self.start_preview(item, scope);
            }
        }
    }

    fn start_preview(&mut self, item: GenericItem, scope: Option<Option<String>>) {
        let generation = self.preview_generation;
        let cancel = Arc::new(AtomicBool::new(false));
        self.preview_cancel = Some(Arc::clone(&cancel));
        self.preview_pending = true;

        let path = self.manifest_path.clone();
        let archive = Arc::clone(&self.archive);
        let tx = self.tx.clone();
        let waker = self.waker.clone();

        debug!("Starting preview build {generation} for {}", item.name);
        thread::spawn(move || {
            let wake = || {
                if let Some(wake) = &waker {
                    wake();
                }
            };

            match Manifest::load(&path) {
                Ok(manifest) => {
                    let scope = match &scope {
                        None => EntryScope::AnyPack,
                        Some(pack) => EntryScope::Pack(pack.as_deref()),
                    };
                    let entries = select_entries(&manifest, &item.name, scope);
                    build_preview_rows(&item, &entries, archive.as_ref(), &cancel, |event| {
                        tx.send(WorkerMessage::Preview { generation, event }).ok();
                        wake();
                    });
                }
                Err(error) => {
                    tx.send(WorkerMessage::PreviewFailed { generation, error }).ok();
                }
            }
            tx.send(WorkerMessage::PreviewDone { generation }).ok();
            wake();
        });
    }

    fn selected_pack(&self) -> Option<Option<String>> {
        let tree = self.tree.as_ref()?;
        let id = self.selected_node?;
        tree.pack_name(id).map(|name| name.map(str::to_string))
    }

    fn refresh_summary(&mut self) {
        let (Some(tree), Some(id)) = (&self.tree, self.selected_node) else {
            return;
        };
        let title = tree.node(id).name.clone();
        let Some(pack) = self.selected_pack() else {
            return;
        };

        match Manifest::load(&self.manifest_path) {
            Ok(manifest) => {
                let summary = summarize(&manifest, &title, pack.as_deref());
                self.toggle_label = summary.toggle;
                self.summary = Some(summary);
            }
            Err(e) => {
                error!("{e}");
                self.summary = None;
                self.fatal_error = Some(e.to_string());
                self.changed(ViewProperty::FatalError);
            }
        }
        self.changed(ViewProperty::Summary);
        self.changed(ViewProperty::Buttons);
    }

    /// Row indices in display order. The first selected row drives the
    /// toggle label and whether toggling is possible.
    pub fn select_rows(&mut self, indices: Vec<usize>) {
        let unique: IndexSet<usize> = indices.into_iter().filter(|i| *i < self.rows.len()).collect();
        self.selected_rows = unique.into_iter().collect();
        self.changed(ViewProperty::RowSelection);

        match self.selected_rows.first().map(|i| &self.rows[*i]) {
            Some(row) => {
                self.toggle_label = ToggleLabel::for_state(row.active.is_enabled());
                let toggleable = row.toggleable;
                self.set_buttons(toggleable, true);
            }
            None => self.set_buttons(false, false),
        }
    }

    /// Toggles the selected pack, or every selected row that can be toggled.
    pub fn toggle(&mut self) -> Result<(), ServiceError> {
        if let Some(pack) = self.selected_pack() {
            let enable = self.toggle_label == ToggleLabel::Enable;
            self.modding.toggle_mod_pack(pack.as_deref(), enable)?;
            self.refresh_summary();
            return Ok(());
        }

        let selected = self.selected_rows.clone();
        for index in selected {
            let Some(row) = self.rows.get(index) else {
                continue;
            };
            if !row.toggleable {
                continue;
            }
            let enable = !row.entry.enabled;
            self.modding.toggle_mod(&row.entry.full_path, enable)?;

            self.rows[index].set_enabled(enable);
            self.toggle_label = ToggleLabel::for_state(enable);
            self.changed(ViewProperty::Rows);
            self.changed(ViewProperty::Buttons);
        }
        Ok(())
    }

    /// Deletes the selected pack and rebuilds the tree, or deletes the
    /// selected rows one by one.
    pub fn delete(&mut self) -> Result<(), ServiceError> {
        if let Some(pack) = self.selected_pack() {
            self.modding.delete_mod_pack(pack.as_deref())?;
            self.refresh();
            return Ok(());
        }

        let mut selected = std::mem::take(&mut self.selected_rows);
        // Highest index first so earlier indices stay valid.
        selected.sort_unstable_by(|a, b| b.cmp(a));
        selected.dedup();

        let result = self.delete_rows(&selected);
        // The selection is gone whether or not every row made it.
        self.set_buttons(false, false);
        self.changed(ViewProperty::RowSelection);
        result
    }

    fn delete_rows(&mut self, descending: &[usize]) -> Result<(), ServiceError> {
        for &index in descending {
            if index >= self.rows.len() {
                continue;
            }
            let entry = self.rows[index].entry.clone();
            self.modding.delete_mod(&entry.full_path)?;
            self.rows.remove(index);
            self.changed(ViewProperty::Rows);

            let manifest = Manifest::load(&self.manifest_path)?;
            if manifest.mods_named(&entry.name).next().is_none() {
                self.remove_selected_leaf();
                break;
            }
        }
        Ok(())
    }

    fn remove_selected_leaf(&mut self) {
        let (Some(tree), Some(id)) = (&mut self.tree, self.selected_node) else {
            return;
        };
        if tree.remove_leaf(id) {
            info!("Removed {} from the tree", tree.node(id).name);
            self.selected_node = None;
            self.cancel_preview();
            self.clear_panel(Panel::Empty);
            self.changed(ViewProperty::Tree);
            self.changed(ViewProperty::Selection);
        } else {
            warn!("Selected node was not a removable leaf");
        }
    }

    /// Remembers filter and sort for the next session.
    pub fn save_view_settings(&self, settings: &mut SettingsModel) -> anyhow::Result<()> {
        settings.set_filter(self.filter)?;
        settings.set_sort(self.sort)?;
        Ok(())
    }
}

impl Drop for ModListViewModel {
    fn drop(&mut self) {
        if let Some(cancel) = self.preview_cancel.take() {
            cancel.store(true, Ordering::SeqCst);
        }
    }
}
