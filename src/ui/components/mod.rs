mod usage_panel;

pub use usage_panel::{band_color, format_count, status_color, UsagePanel};
