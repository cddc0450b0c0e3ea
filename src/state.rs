use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::color::ColorMap;
use crate::config::Settings;
use crate::data::aggregate::DashboardReport;
use crate::data::cache::DatasetCache;
use crate::data::export::{export_csv, export_report_json};
use crate::data::filter::{FilterCriteria, FilteredView, filter};
use crate::data::model::Dataset;
use crate::insights::{HeuristicInsights, InsightProvider, describe_report};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub settings: Settings,

    /// Loaded dataset (None until a file loads successfully).
    pub dataset: Option<Arc<Dataset>>,

    /// Current filter selections.
    pub criteria: FilterCriteria,

    /// Indices of bookings passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Aggregation tables for the current selection.
    pub report: Option<DashboardReport>,

    /// Commentary for the current report, if a provider produced any.
    pub insights: Option<String>,

    /// Optional commentary source.
    pub provider: Option<Box<dyn InsightProvider>>,

    /// Bar colours, stable across filter changes.
    pub origin_colors: ColorMap,
    pub airline_colors: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let provider: Option<Box<dyn InsightProvider>> = if settings.insights {
            Some(Box::new(HeuristicInsights))
        } else {
            None
        };
        Self {
            settings,
            dataset: None,
            criteria: FilterCriteria::default(),
            visible_indices: Vec::new(),
            report: None,
            insights: None,
            provider,
            origin_colors: ColorMap::default(),
            airline_colors: ColorMap::default(),
            status_message: None,
        }
    }

    /// Load `path` through the process-wide cache.
    /// On failure the previous dataset (if any) stays on screen.
    pub fn open_path(&mut self, path: &Path) {
        match DatasetCache::global().load(path) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Drop the cached copy of the current file and read it again.
    pub fn reload(&mut self) {
        let Some(path) = self.dataset.as_ref().and_then(|ds| ds.source.clone()) else {
            return;
        };
        DatasetCache::global().invalidate(&path);
        self.open_path(&path);
    }

    /// Ingest a newly loaded dataset; keeps filters that still make sense.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        if let Some(origin) = &self.criteria.origin {
            if !dataset.origins.contains(origin) {
                self.criteria.origin = None;
            }
        }
        if let Some(destination) = &self.criteria.destination {
            if !dataset.destinations.contains(destination) {
                self.criteria.destination = None;
            }
        }

        self.origin_colors = ColorMap::new(&dataset.origins);
        self.airline_colors = ColorMap::new(&dataset.airlines);
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Replace the criteria; recomputes only when something changed.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        if criteria != self.criteria {
            self.criteria = criteria;
            self.refilter();
        }
    }

    pub fn reset_filters(&mut self) {
        self.set_criteria(FilterCriteria::default());
    }

    /// Recompute `visible_indices`, the report and the insights.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            self.visible_indices.clear();
            self.report = None;
            self.insights = None;
            return;
        };

        let view = filter(ds, &self.criteria);
        let report = DashboardReport::compute(&view, self.settings.trend_granularity);
        self.insights = match (&self.provider, report.is_empty()) {
            (Some(provider), false) => describe_report(provider.as_ref(), &report),
            _ => None,
        };
        self.visible_indices = view.indices().to_vec();
        self.report = Some(report);
    }

    /// Fresh view over the current selection.
    pub fn current_view(&self) -> Option<FilteredView<'_>> {
        self.dataset.as_deref().map(|ds| filter(ds, &self.criteria))
    }

    pub fn export_filtered(&self, path: &Path) -> Result<()> {
        let view = self.current_view().context("no dataset loaded")?;
        export_csv(&view, path)
    }

    pub fn export_report(&self, path: &Path) -> Result<()> {
        let report = self.report.as_ref().context("no dataset loaded")?;
        export_report_json(report, path)
    }
}
