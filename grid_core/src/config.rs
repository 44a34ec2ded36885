//! `GridConfig`: validated construction-time options.
//!
//! A single validated builder rather than a handful of loose constructor
//! parameters, into one
//! validated builder, the way `ConfigError` variants in `error.rs` expect:
//! every invalid combination is caught at `build()` rather than surfacing
//! later as a panic or silently-wrong geometry.

use crate::cell::ColId;
use crate::error::ConfigError;
use crate::filter::FilterMode;
use crate::sort::SortMode;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RowHeightModeConfig {
    Uniform,
    ContentAware,
}

#[derive(Copy, Clone, Debug)]
pub struct RowHeightConfig {
    pub default_height: f32,
    pub min: f32,
    pub max: f32,
    pub debounce_ms: u32,
}

impl Default for RowHeightConfig {
    fn default() -> Self {
        RowHeightConfig {
            default_height: 24.0,
            min: 16.0,
            max: 512.0,
            debounce_ms: 0,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct RendererCacheConfig {
    pub enabled: bool,
    pub capacity: usize,
    pub track_stats: bool,
}

impl Default for RendererCacheConfig {
    fn default() -> Self {
        RendererCacheConfig {
            enabled: true,
            capacity: crate::renderer_cache::DEFAULT_CAPACITY,
            track_stats: true,
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct InfiniteScrollingConfig {
    pub enabled: bool,
    pub threshold: usize,
    pub enable_sliding_window: bool,
    pub window_size: usize,
    pub prune_threshold: usize,
}

#[derive(Copy, Clone, Debug)]
pub struct ColumnResizeConfig {
    pub resize_zone_width: f32,
    pub default_min: f32,
    pub default_max: f32,
    pub auto_fit_sample_size: usize,
    pub auto_fit_padding: f32,
    pub auto_fit_on_load: bool,
}

impl Default for ColumnResizeConfig {
    fn default() -> Self {
        ColumnResizeConfig {
            resize_zone_width: 6.0,
            default_min: 24.0,
            default_max: 4096.0,
            auto_fit_sample_size: 50,
            auto_fit_padding: 8.0,
            auto_fit_on_load: false,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SelectionType {
    Cell,
    Row,
    Column,
    Range,
}

pub struct GridConfig {
    pub row_count: i64,
    pub col_count: usize,
    pub row_height: f32,
    pub col_width: f32,
    pub col_widths: Option<Vec<f32>>,
    pub overscan_rows: i64,
    pub overscan_cols: i64,
    pub row_height_mode: RowHeightModeConfig,
    pub row_height_config: RowHeightConfig,
    pub renderer_cache: RendererCacheConfig,
    pub sort_mode: SortMode,
    pub filter_mode: FilterMode,
    pub infinite_scrolling: InfiniteScrollingConfig,
    pub column_resize: ColumnResizeConfig,
    pub selection_type: Option<SelectionType>,
    pub enable_multi_selection: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            row_count: 0,
            col_count: 0,
            row_height: 24.0,
            col_width: 120.0,
            col_widths: None,
            overscan_rows: 5,
            overscan_cols: 2,
            row_height_mode: RowHeightModeConfig::Uniform,
            row_height_config: RowHeightConfig::default(),
            renderer_cache: RendererCacheConfig::default(),
            sort_mode: SortMode::Auto,
            filter_mode: FilterMode::Auto,
            infinite_scrolling: InfiniteScrollingConfig::default(),
            column_resize: ColumnResizeConfig::default(),
            selection_type: None,
            enable_multi_selection: false,
        }
    }
}

impl GridConfig {
    pub fn builder() -> GridConfigBuilder {
        GridConfigBuilder::default()
    }

    /// Validates cross-field invariants the builder cannot check at
    /// individual setter time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.row_count < 0 {
            return Err(ConfigError::NegativeRowCount(self.row_count));
        }
        if self.renderer_cache.enabled && self.renderer_cache.capacity == 0 {
            return Err(ConfigError::CapacityZero);
        }
        if self.overscan_rows < 0 || self.overscan_cols < 0 {
            return Err(ConfigError::InvalidOverscan(self.overscan_rows.min(self.overscan_cols)));
        }
        if let Some(widths) = &self.col_widths {
            for (i, &w) in widths.iter().enumerate() {
                if w < self.column_resize.default_min || w > self.column_resize.default_max {
                    return Err(ConfigError::InvalidWidthBounds {
                        col: ColId(i as u32),
                        min: self.column_resize.default_min as f64,
                        max: self.column_resize.default_max as f64,
                    });
                }
            }
        }
        if self.infinite_scrolling.enabled && self.infinite_scrolling.enable_sliding_window {
            let w = self.infinite_scrolling;
            if w.prune_threshold < w.window_size {
                return Err(ConfigError::InvalidWindowBounds {
                    window: w.window_size,
                    prune: w.prune_threshold,
                });
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct GridConfigBuilder {
    config: GridConfig,
}

macro_rules! setter {
    ($name:ident, $field:ident, $ty:ty) => {
        pub fn $name(mut self, value: $ty) -> Self {
            self.config.$field = value;
            self
        }
    };
}

impl GridConfigBuilder {
    setter!(row_count, row_count, i64);
    setter!(col_count, col_count, usize);
    setter!(row_height, row_height, f32);
    setter!(col_width, col_width, f32);
    setter!(overscan_rows, overscan_rows, i64);
    setter!(overscan_cols, overscan_cols, i64);
    setter!(row_height_mode, row_height_mode, RowHeightModeConfig);
    setter!(row_height_config, row_height_config, RowHeightConfig);
    setter!(renderer_cache, renderer_cache, RendererCacheConfig);
    setter!(sort_mode, sort_mode, SortMode);
    setter!(filter_mode, filter_mode, FilterMode);
    setter!(infinite_scrolling, infinite_scrolling, InfiniteScrollingConfig);
    setter!(column_resize, column_resize, ColumnResizeConfig);
    setter!(enable_multi_selection, enable_multi_selection, bool);

    pub fn col_widths(mut self, widths: Vec<f32>) -> Self {
        self.config.col_widths = Some(widths);
        self
    }

    pub fn selection_type(mut self, selection_type: SelectionType) -> Self {
        self.config.selection_type = Some(selection_type);
        self
    }

    pub fn build(self) -> Result<GridConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_row_count_is_rejected() {
        let result = GridConfig::builder().row_count(-1).build();
        assert!(matches!(result, Err(ConfigError::NegativeRowCount(-1))));
    }

    #[test]
    fn zero_cache_capacity_is_rejected_when_cache_enabled() {
        let result = GridConfig::builder()
            .renderer_cache(RendererCacheConfig { enabled: true, capacity: 0, track_stats: false })
            .build();
        assert!(matches!(result, Err(ConfigError::CapacityZero)));
    }

    #[test]
    fn sliding_window_prune_below_size_is_rejected() {
        let result = GridConfig::builder()
            .infinite_scrolling(InfiniteScrollingConfig {
                enabled: true,
                threshold: 10,
                enable_sliding_window: true,
                window_size: 100,
                prune_threshold: 50,
            })
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidWindowBounds { .. })));
    }

    #[test]
    fn valid_config_builds() {
        let result = GridConfig::builder().row_count(100).col_count(5).build();
        assert!(result.is_ok());
    }
}
