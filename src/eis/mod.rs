// Core EIS pipeline: load sweep CSVs, aggregate per frequency, transform to
// the complex plane, render charts.
pub mod aggregate;
pub mod complex;
pub mod error;
pub mod loader;
pub mod plot;
pub mod record;
pub mod writer;
pub use aggregate::{aggregate_sweeps, combine_channels, BinStats, ChannelAggregate};
pub use complex::{aggregate_complex, combine_complex, to_cartesian, NyquistAggregate};
pub use error::EisError;
pub use loader::{
    load_plating_table, load_sweep, load_sweep_set, FieldFormat, MissingFilePolicy, PlatingTable,
};
pub use plot::{
    render_bode_png, render_nyquist_png, render_overlay_png, render_plating_png, write_png,
    BodeAxes, BodeSeries, Marker, NyquistSeries, OverlayKind, PlotStyle,
};
pub use record::{ImpedanceRecord, Sweep};
pub use writer::{write_aggregate_csv, write_sweep_csv, PlatingLog};
