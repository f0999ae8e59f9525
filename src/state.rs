use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rusty_fluo::data::loader::load_datasets;
use rusty_fluo::data::model::{CellId, Dataset};
use rusty_fluo::export::save_figure;
use rusty_fluo::figure::Figure;
use rusty_fluo::settings::PlotSettings;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which screen is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    FileSelection,
    CellPlot,
    AveragePlot,
}

/// The full session state, independent of rendering.
pub struct AppState {
    pub screen: Screen,

    /// Files chosen for the next load, in selection order.
    pub file_paths: Vec<PathBuf>,

    /// Indices into `file_paths` ticked for removal.
    pub selected_files: BTreeSet<usize>,

    /// Datasets of the last successful load.
    pub datasets: Vec<Dataset>,

    /// Cell shown on the per-cell screen.
    pub selected_cell: Option<CellId>,

    /// Display options shared by both plot screens.
    pub settings: PlotSettings,

    /// Figure computed by the last "Plot" click.
    pub figure: Option<Figure>,

    /// Error message shown in the UI.
    pub status_message: Option<String>,

    /// Non-error notice (e.g. replaced cell IDs, saved file).
    pub notice: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(PlotSettings::default())
    }
}

impl AppState {
    pub fn new(settings: PlotSettings) -> Self {
        Self {
            screen: Screen::FileSelection,
            file_paths: Vec::new(),
            selected_files: BTreeSet::new(),
            datasets: Vec::new(),
            selected_cell: None,
            settings,
            figure: None,
            status_message: None,
            notice: None,
        }
    }

    // -- File selection --

    /// Append files, skipping ones already listed.
    pub fn add_files(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        for path in paths {
            if !self.file_paths.contains(&path) {
                self.file_paths.push(path);
            }
        }
    }

    pub fn toggle_file_selection(&mut self, index: usize) {
        if !self.selected_files.remove(&index) {
            self.selected_files.insert(index);
        }
    }

    /// Drop every ticked file from the list.
    pub fn remove_selected_files(&mut self) {
        for &index in self.selected_files.iter().rev() {
            if index < self.file_paths.len() {
                self.file_paths.remove(index);
            }
        }
        self.selected_files.clear();
    }

    // -- Navigation --

    /// Load every listed file and open `screen`.
    ///
    /// On failure the previous datasets are kept and the screen does not
    /// change.
    pub fn proceed_to(&mut self, screen: Screen) {
        if self.file_paths.is_empty() {
            self.status_message = Some("Select at least one file first.".to_string());
            return;
        }
        match load_datasets(&self.file_paths, self.settings.resample_length) {
            Ok(datasets) => {
                self.set_datasets(datasets);
                self.screen = screen;
            }
            Err(e) => {
                log::error!("Failed to load files: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Replace the session's datasets with a fresh load.
    pub fn set_datasets(&mut self, datasets: Vec<Dataset>) {
        let invalid: usize = datasets.iter().map(|d| d.invalid_ids).sum();
        self.notice = (invalid > 0).then(|| {
            format!("{invalid} cell ID(s) could not be converted to int and were replaced with -1")
        });
        for ds in &datasets {
            log::info!("Loaded {} from {}", ds.summary(), ds.path.display());
        }
        self.status_message = (!datasets.is_empty()).then(|| {
            let parts: Vec<String> = datasets.iter().map(Dataset::summary).collect();
            format!("Loaded {}", parts.join("; "))
        });
        self.selected_cell = datasets.first().and_then(|d| d.cell_ids.first().copied());
        self.datasets = datasets;
        self.figure = None;
    }

    pub fn back_to_file_selection(&mut self) {
        self.screen = Screen::FileSelection;
        self.figure = None;
    }

    /// Swap between the two plot screens.
    pub fn switch_plot(&mut self) {
        self.screen = match self.screen {
            Screen::CellPlot => Screen::AveragePlot,
            Screen::AveragePlot => Screen::CellPlot,
            Screen::FileSelection => return,
        };
        self.figure = None;
    }

    // -- Plotting --

    /// Identifiers offered by the cell selector (first dataset is authoritative).
    pub fn cell_ids(&self) -> &[CellId] {
        self.datasets
            .first()
            .map(|d| d.cell_ids.as_slice())
            .unwrap_or_default()
    }

    /// Compute the figure for the current screen.
    pub fn plot(&mut self) {
        let result = match self.screen {
            Screen::CellPlot => match self.selected_cell {
                Some(id) => Figure::cell(id, &self.datasets, &self.settings).map_err(|e| e.to_string()),
                None => Err("No cell selected.".to_string()),
            },
            Screen::AveragePlot => Ok(Figure::average(&self.datasets, &self.settings)),
            Screen::FileSelection => return,
        };
        match result {
            Ok(figure) => {
                self.figure = Some(figure);
                self.status_message = None;
            }
            Err(msg) => {
                log::error!("Cannot plot: {msg}");
                self.figure = None;
                self.status_message = Some(format!("Error: {msg}"));
            }
        }
    }

    /// Export the current figure to `path`.
    pub fn save_plot(&mut self, path: &Path) {
        let Some(figure) = &self.figure else {
            self.status_message = Some("Nothing to save yet, press Plot first.".to_string());
            return;
        };
        match save_figure(figure, &self.settings, path) {
            Ok(()) => {
                self.notice = Some(format!("Saved {}", path.display()));
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to save plot: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
