use std::fs;
use std::io::Cursor;
use std::path::Path;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::element::{Drawable, PointCollection};
use plotters::prelude::*;
use plotters_backend::{BackendCoord, DrawingErrorKind};
use crate::eis::aggregate::{BinStats, ChannelAggregate};
use crate::eis::complex::NyquistAggregate;
use crate::eis::error::EisError;
const ERROR_BAR: RGBColor = RGBColor(211, 211, 211);
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Square,
    Triangle,
    Cross,
}
const MARKERS: [Marker; 4] = [Marker::Circle, Marker::Square, Marker::Triangle, Marker::Cross];
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
    /// Free-form text block drawn in the lower-left corner, one entry per line.
    pub annotation: Vec<String>,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 960,
            height: 640,
            background: WHITE,
            // matplotlib "tab" colors, same order the lab charts used.
            palette: vec![
                RGBColor(214, 39, 40),   // red
                RGBColor(31, 119, 180),  // blue
                RGBColor(44, 160, 44),   // green
                RGBColor(255, 127, 14),  // orange
                RGBColor(148, 103, 189), // purple
                RGBColor(140, 86, 75),   // brown
                RGBColor(227, 119, 194), // pink
                RGBColor(127, 127, 127), // gray
                RGBColor(188, 189, 34),  // olive
                RGBColor(23, 190, 207),  // cyan
            ],
            annotation: Vec::new(),
        }
    }
}
impl PlotStyle {
    /// Palette entry for a series index; cycles instead of running out.
    pub fn color(&self, idx: usize) -> RGBColor {
        self.palette[idx % self.palette.len()]
    }
    pub fn marker(&self, idx: usize) -> Marker {
        MARKERS[idx % MARKERS.len()]
    }
}
/// Fixed axis bounds shared by the Bode-style charts.
#[derive(Clone, Copy, Debug)]
pub struct BodeAxes {
    pub frequency_hz: (f64, f64),
    pub magnitude_ohm: (f64, f64),
    pub phase_deg: (f64, f64),
}
impl Default for BodeAxes {
    fn default() -> Self {
        Self {
            frequency_hz: (40.0, 1400.0),
            magnitude_ohm: (1e3, 1e8),
            phase_deg: (-100.0, 10.0),
        }
    }
}
/// One labelled curve on a Bode chart.
pub struct BodeSeries<'a> {
    pub label: String,
    pub aggregate: &'a ChannelAggregate,
}
/// One labelled curve on a Nyquist chart.
pub struct NyquistSeries<'a> {
    pub label: String,
    pub aggregate: &'a NyquistAggregate,
}
/// Dual-axis Bode chart: magnitude on a log/log left axis, phase on a linear
/// right axis, SEM error bars on both.
pub fn render_bode_png(
    series: &[BodeSeries<'_>],
    axes: &BodeAxes,
    caption: &str,
    style: &PlotStyle,
) -> Result<Vec<u8>, EisError> {
    if series.iter().all(|s| s.aggregate.is_empty()) {
        return Err(EisError::Plot("bode chart has no data".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let (f0, f1) = axes.frequency_hz;
        let (m0, m1) = axes.magnitude_ohm;
        let (p0, p1) = axes.phase_deg;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(caption, ("sans-serif", 22).into_font())
            .set_label_area_size(LabelAreaPosition::Left, 65)
            .set_label_area_size(LabelAreaPosition::Bottom, 45)
            .right_y_label_area_size(55)
            .build_cartesian_2d((f0..f1).log_scale(), (m0..m1).log_scale())?
            .set_secondary_coord((f0..f1).log_scale(), p0..p1);
        chart
            .configure_mesh()
            .x_desc("Frequency (Hz)")
            .y_desc("Magnitude (Ohm)")
            .light_line_style(&BLACK.mix(0.08))
            .draw()?;
        chart
            .configure_secondary_axes()
            .y_desc("Phase (Degrees)")
            .draw()?;
        let single = series.len() == 1;
        for (idx, entry) in series.iter().enumerate() {
            let aggregate = entry.aggregate;
            // A lone channel keeps the classic red-magnitude / blue-phase look;
            // overlays color magnitude and phase alike per series.
            let mag_color = if single { style.color(0) } else { style.color(idx) };
            let phase_color = if single { style.color(1) } else { style.color(idx) };
            chart.draw_series(
                error_bars(&aggregate.frequencies_hz, &aggregate.magnitude)
                    .map(|(f, low, mid, high)| {
                        ErrorBar::new_vertical(f, low.max(m0), mid, high, ERROR_BAR.stroke_width(2), 6)
                    }),
            )?;
            chart
                .draw_series(LineSeries::new(
                    aggregate
                        .frequencies_hz
                        .iter()
                        .zip(&aggregate.magnitude)
                        .map(|(&f, bin)| (f, bin.mean)),
                    mag_color.stroke_width(2),
                ))?
                .label(format!("{} magnitude", entry.label))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], mag_color.stroke_width(2)));
            chart.draw_secondary_series(
                error_bars(&aggregate.frequencies_hz, &aggregate.phase)
                    .map(|(f, low, mid, high)| {
                        ErrorBar::new_vertical(f, low, mid, high, ERROR_BAR.stroke_width(2), 6)
                    }),
            )?;
            chart
                .draw_secondary_series(LineSeries::new(
                    aggregate
                        .frequencies_hz
                        .iter()
                        .zip(&aggregate.phase)
                        .map(|(&f, bin)| (f, bin.mean)),
                    phase_color.stroke_width(2),
                ))?
                .label(format!("{} phase", entry.label))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], phase_color.stroke_width(2)));
        }
        if !single {
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK.mix(0.3))
                .draw()?;
        }
        draw_annotation(&root, style)?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// Which quantity a single-axis overlay chart shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayKind {
    Magnitude,
    Phase,
}
/// Multi-series single-axis chart (one marker series per channel), linear
/// frequency axis; magnitude gets a log value axis, phase a linear one.
pub fn render_overlay_png(
    series: &[BodeSeries<'_>],
    axes: &BodeAxes,
    kind: OverlayKind,
    caption: &str,
    style: &PlotStyle,
) -> Result<Vec<u8>, EisError> {
    if series.iter().all(|s| s.aggregate.is_empty()) {
        return Err(EisError::Plot("overlay chart has no data".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let (f0, f1) = axes.frequency_hz;
        match kind {
            OverlayKind::Magnitude => {
                let (y0, y1) = axes.magnitude_ohm;
                let mut chart = ChartBuilder::on(&root)
                    .margin(10)
                    .caption(caption, ("sans-serif", 22).into_font())
                    .set_label_area_size(LabelAreaPosition::Left, 65)
                    .set_label_area_size(LabelAreaPosition::Bottom, 45)
                    .build_cartesian_2d(f0..f1, (y0..y1).log_scale())?;
                chart
                    .configure_mesh()
                    .x_desc("Frequency (Hz)")
                    .y_desc("Impedance (Ohm)")
                    .light_line_style(&BLACK.mix(0.08))
                    .draw()?;
                for (idx, entry) in series.iter().enumerate() {
                    let color = style.color(idx);
                    let marker = style.marker(idx);
                    let points = mean_points(entry.aggregate, kind);
                    chart.draw_series(
                        error_bars_of(&points).map(|(f, low, mid, high)| {
                            ErrorBar::new_vertical(f, low.max(y0), mid, high, ERROR_BAR.stroke_width(2), 6)
                        }),
                    )?;
                    chart
                        .draw_series(
                            points
                                .iter()
                                .map(|&(f, mean, _)| marker_element(marker, (f, mean), color)),
                        )?
                        .label(entry.label.clone())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
                }
                chart
                    .configure_series_labels()
                    .background_style(&WHITE.mix(0.8))
                    .border_style(&BLACK.mix(0.3))
                    .draw()?;
            }
            OverlayKind::Phase => {
                let (y0, y1) = axes.phase_deg;
                let mut chart = ChartBuilder::on(&root)
                    .margin(10)
                    .caption(caption, ("sans-serif", 22).into_font())
                    .set_label_area_size(LabelAreaPosition::Left, 65)
                    .set_label_area_size(LabelAreaPosition::Bottom, 45)
                    .build_cartesian_2d(f0..f1, y0..y1)?;
                chart
                    .configure_mesh()
                    .x_desc("Frequency (Hz)")
                    .y_desc("Phase (Degrees)")
                    .light_line_style(&BLACK.mix(0.08))
                    .draw()?;
                for (idx, entry) in series.iter().enumerate() {
                    let color = style.color(idx);
                    let marker = style.marker(idx);
                    let points = mean_points(entry.aggregate, kind);
                    chart.draw_series(
                        error_bars_of(&points).map(|(f, low, mid, high)| {
                            ErrorBar::new_vertical(f, low, mid, high, ERROR_BAR.stroke_width(2), 6)
                        }),
                    )?;
                    chart
                        .draw_series(
                            points
                                .iter()
                                .map(|&(f, mean, _)| marker_element(marker, (f, mean), color)),
                        )?
                        .label(entry.label.clone())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
                }
                chart
                    .configure_series_labels()
                    .background_style(&WHITE.mix(0.8))
                    .border_style(&BLACK.mix(0.3))
                    .draw()?;
            }
        }
        draw_annotation(&root, style)?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
const NYQUIST_MARGIN: u32 = 10;
const NYQUIST_Y_LABEL: u32 = 75;
const NYQUIST_X_LABEL: u32 = 45;
// Caption strip the builder reserves for a 22 px title.
const NYQUIST_CAPTION: u32 = 32;
/// Nyquist chart: Re(Z) against -Im(Z), SEM bars in both directions. Drawn
/// on a square canvas, with the data window widened by the plot-box aspect
/// so both axes share one visual scale and a semicircle renders round.
pub fn render_nyquist_png(
    series: &[NyquistSeries<'_>],
    caption: &str,
    style: &PlotStyle,
) -> Result<Vec<u8>, EisError> {
    if series.iter().all(|s| s.aggregate.is_empty()) {
        return Err(EisError::Plot("nyquist chart has no data".into()));
    }
    let side = style.width.min(style.height);
    let plot_w = side.saturating_sub(2 * NYQUIST_MARGIN + NYQUIST_Y_LABEL).max(1);
    let plot_h = side
        .saturating_sub(2 * NYQUIST_MARGIN + NYQUIST_X_LABEL + NYQUIST_CAPTION)
        .max(1);
    let (x_range, y_range) = nyquist_bounds(series, plot_w as f64 / plot_h as f64);
    let mut buffer = vec![0u8; (side * side * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (side, side)).into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(NYQUIST_MARGIN)
            .caption(caption, ("sans-serif", 22).into_font())
            .set_label_area_size(LabelAreaPosition::Left, NYQUIST_Y_LABEL)
            .set_label_area_size(LabelAreaPosition::Bottom, NYQUIST_X_LABEL)
            .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)?;
        chart
            .configure_mesh()
            .x_desc("Re|Z| (Ohm)")
            .y_desc("-Im|Z| (Ohm)")
            .draw()?;
        for (idx, entry) in series.iter().enumerate() {
            let color = style.color(idx);
            let marker = style.marker(idx);
            let aggregate = entry.aggregate;
            let points: Vec<(f64, f64, f64, f64)> = aggregate
                .real
                .iter()
                .zip(&aggregate.imag)
                .map(|(re, im)| (re.mean, -im.mean, re.sem, im.sem))
                .collect();
            chart.draw_series(points.iter().filter(|p| p.3.is_finite()).map(
                |&(x, y, _, y_sem)| {
                    ErrorBar::new_vertical(x, y - y_sem, y, y + y_sem, ERROR_BAR.stroke_width(2), 6)
                },
            ))?;
            chart.draw_series(points.iter().filter(|p| p.2.is_finite()).map(
                |&(x, y, x_sem, _)| {
                    ErrorBar::new_horizontal(y, x - x_sem, x, x + x_sem, ERROR_BAR.stroke_width(2), 6)
                },
            ))?;
            chart
                .draw_series(LineSeries::new(
                    points.iter().map(|&(x, y, _, _)| (x, y)),
                    color.stroke_width(1),
                ))?
                .label(entry.label.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y, _, _)| marker_element(marker, (x, y), color)),
            )?;
        }
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK.mix(0.3))
            .draw()?;
        draw_annotation(&root, style)?;
        root.present()?;
    }
    encode_png(&buffer, side, side)
}
/// Impedance of one measured channel against the ordered stimulation labels,
/// log value axis, one marker+line series.
pub fn render_plating_png(
    labels: &[String],
    values_ohm: &[f64],
    marker: Marker,
    caption: &str,
    style: &PlotStyle,
) -> Result<Vec<u8>, EisError> {
    if values_ohm.is_empty() {
        return Err(EisError::Plot("plating chart has no data".into()));
    }
    let (y0, y1) = (1e2, 1e7);
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let owned: Vec<String> = labels.to_vec();
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(caption, ("sans-serif", 22).into_font())
            .set_label_area_size(LabelAreaPosition::Left, 65)
            .set_label_area_size(LabelAreaPosition::Bottom, 45)
            .build_cartesian_2d(-0.5..(labels.len() as f64 - 0.5), (y0..y1).log_scale())?;
        chart
            .configure_mesh()
            .x_desc("Stimulated Channel")
            .y_desc("Impedance (Ohm)")
            .x_labels(labels.len())
            .x_label_formatter(&move |v| {
                let idx = v.round() as isize;
                if idx < 0 {
                    return String::new();
                }
                owned.get(idx as usize).cloned().unwrap_or_default()
            })
            .light_line_style(&BLACK.mix(0.08))
            .draw()?;
        let color = style.color(0);
        let points: Vec<(f64, f64)> = values_ohm
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| (i as f64, v.max(y0)))
            .collect();
        chart.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(1)))?;
        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| marker_element(marker, (x, y), color)),
        )?;
        draw_annotation(&root, style)?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// Writes an encoded PNG through a sibling temp file and an atomic rename so
/// an interrupted run never leaves a truncated image behind.
pub fn write_png(path: &Path, png: &[u8]) -> Result<(), EisError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("png.partial");
    fs::write(&tmp, png)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
fn mean_points(aggregate: &ChannelAggregate, kind: OverlayKind) -> Vec<(f64, f64, f64)> {
    let bins = match kind {
        OverlayKind::Magnitude => &aggregate.magnitude,
        OverlayKind::Phase => &aggregate.phase,
    };
    aggregate
        .frequencies_hz
        .iter()
        .zip(bins)
        .map(|(&f, bin)| (f, bin.mean, bin.sem))
        .collect()
}
fn error_bars<'a>(
    frequencies: &'a [f64],
    bins: &'a [BinStats],
) -> impl Iterator<Item = (f64, f64, f64, f64)> + 'a {
    frequencies
        .iter()
        .zip(bins)
        .filter(|(_, bin)| bin.sem.is_finite())
        .map(|(&f, bin)| (f, bin.mean - bin.sem, bin.mean, bin.mean + bin.sem))
}
fn error_bars_of<'a>(
    points: &'a [(f64, f64, f64)],
) -> impl Iterator<Item = (f64, f64, f64, f64)> + 'a {
    points
        .iter()
        .filter(|(_, _, sem)| sem.is_finite())
        .map(|&(f, mean, sem)| (f, mean - sem, mean, mean + sem))
}
enum MarkerElement {
    Circle(Circle<(f64, f64), i32>),
    Triangle(TriangleMarker<(f64, f64), i32>),
    Cross(Cross<(f64, f64), i32>),
    Square { point: (f64, f64), color: RGBColor },
}
impl<'a> PointCollection<'a, (f64, f64)> for &'a MarkerElement {
    type Point = &'a (f64, f64);
    type IntoIter = std::iter::Once<&'a (f64, f64)>;
    fn point_iter(self) -> Self::IntoIter {
        match self {
            MarkerElement::Circle(c) => c.point_iter(),
            MarkerElement::Triangle(t) => t.point_iter(),
            MarkerElement::Cross(c) => c.point_iter(),
            MarkerElement::Square { point, .. } => std::iter::once(point),
        }
    }
}
impl<DB: DrawingBackend> Drawable<DB> for MarkerElement {
    fn draw<I: Iterator<Item = BackendCoord>>(
        &self,
        mut points: I,
        backend: &mut DB,
        parent_dim: (u32, u32),
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        match self {
            MarkerElement::Circle(c) => c.draw(points, backend, parent_dim),
            MarkerElement::Triangle(t) => t.draw(points, backend, parent_dim),
            MarkerElement::Cross(c) => c.draw(points, backend, parent_dim),
            MarkerElement::Square { color, .. } => {
                if let Some((x0, y0)) = points.next() {
                    backend.draw_rect((x0 - 3, y0 - 3), (x0 + 3, y0 + 3), &color.filled(), true)
                } else {
                    Ok(())
                }
            }
        }
    }
}
fn marker_element(marker: Marker, point: (f64, f64), color: RGBColor) -> MarkerElement {
    match marker {
        Marker::Circle => MarkerElement::Circle(Circle::new(point, 3, color.filled())),
        Marker::Triangle => MarkerElement::Triangle(TriangleMarker::new(point, 4, color.filled())),
        Marker::Cross => MarkerElement::Cross(Cross::new(point, 3, color.stroke_width(2))),
        Marker::Square => MarkerElement::Square { point, color },
    }
}
/// Data window with a small pad, equal spans up to `aspect` (plot-box width
/// over height) so the rendered axes share one visual scale.
fn nyquist_bounds(series: &[NyquistSeries<'_>], aspect: f64) -> ((f64, f64), (f64, f64)) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for entry in series {
        for (re, im) in entry.aggregate.real.iter().zip(&entry.aggregate.imag) {
            let x_sem = if re.sem.is_finite() { re.sem } else { 0.0 };
            let y_sem = if im.sem.is_finite() { im.sem } else { 0.0 };
            x_min = x_min.min(re.mean - x_sem);
            x_max = x_max.max(re.mean + x_sem);
            y_min = y_min.min(-im.mean - y_sem);
            y_max = y_max.max(-im.mean + y_sem);
        }
    }
    if !(x_min.is_finite() && x_max.is_finite() && y_min.is_finite() && y_max.is_finite()) {
        return ((0.0, aspect.max(1e-9)), (0.0, 1.0));
    }
    let x_mid = (x_min + x_max) / 2.0;
    let y_mid = (y_min + y_max) / 2.0;
    // x half-span: wide enough for the x data and for the y data once it is
    // stretched to the same units-per-pixel; the y half-span follows from it.
    let x_half = ((x_max - x_min).max((y_max - y_min) * aspect) / 2.0).max(1e-9) * 1.05;
    let y_half = x_half / aspect;
    ((x_mid - x_half, x_mid + x_half), (y_mid - y_half, y_mid + y_half))
}
fn draw_annotation(
    root: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    style: &PlotStyle,
) -> Result<(), EisError> {
    if style.annotation.is_empty() {
        return Ok(());
    }
    let (_, height) = root.dim_in_pixel();
    let base = height as i32 - 30 - 16 * style.annotation.len() as i32;
    for (i, line) in style.annotation.iter().enumerate() {
        root.draw(&Text::new(
            line.clone(),
            (80, base + 16 * i as i32),
            ("sans-serif", 14).into_font().color(&BLACK),
        ))?;
    }
    Ok(())
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EisError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| EisError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::eis::aggregate::aggregate_sweeps;
    use crate::eis::complex::aggregate_complex;
    use crate::eis::record::Sweep;
    fn sample_sweeps() -> Vec<Sweep> {
        let frequencies = [50.0, 150.0, 250.0, 350.0, 450.0];
        vec![
            Sweep::from_columns(
                &frequencies,
                &[1.2e6, 8.0e5, 5.0e5, 3.0e5, 2.0e5],
                &[-85.0, -82.0, -78.0, -74.0, -70.0],
            ),
            Sweep::from_columns(
                &frequencies,
                &[1.3e6, 8.5e5, 5.5e5, 3.2e5, 2.2e5],
                &[-84.0, -81.0, -77.0, -73.0, -69.0],
            ),
        ]
    }
    #[test]
    fn bode_chart_renders_png() {
        let aggregate = aggregate_sweeps(&sample_sweeps(), "test").unwrap();
        let series = [BodeSeries {
            label: "channel 0".into(),
            aggregate: &aggregate,
        }];
        let mut style = PlotStyle::default();
        style.annotation = vec!["SEM error bars".into(), "N = 1 channel, 2 sweeps".into()];
        let png = render_bode_png(&series, &BodeAxes::default(), "Bode Plot", &style).unwrap();
        assert!(!png.is_empty());
        let magic: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        assert_eq!(png[..8], magic);
    }
    #[test]
    fn nyquist_chart_renders_square_png() {
        let aggregate = aggregate_complex(&sample_sweeps(), "test").unwrap();
        let series = [NyquistSeries {
            label: "channel 0".into(),
            aggregate: &aggregate,
        }];
        let png = render_nyquist_png(&series, "Nyquist Plot", &PlotStyle::default()).unwrap();
        assert!(!png.is_empty());
        use image::GenericImageView;
        let (width, height) = image::load_from_memory(&png).unwrap().dimensions();
        assert_eq!(width, height);
    }
    #[test]
    fn nyquist_bounds_match_the_plot_aspect() {
        let aggregate = aggregate_complex(&sample_sweeps(), "test").unwrap();
        let series = [NyquistSeries {
            label: "channel 0".into(),
            aggregate: &aggregate,
        }];
        for aspect in [0.8, 1.0, 1.5] {
            let ((x0, x1), (y0, y1)) = nyquist_bounds(&series, aspect);
            assert!(((x1 - x0) / (y1 - y0) - aspect).abs() < 1e-9);
        }
    }
    #[test]
    fn palette_and_markers_cycle() {
        let style = PlotStyle::default();
        let n = style.palette.len();
        assert_eq!(style.color(0), style.color(n));
        assert_eq!(style.color(n + 3), style.color(3));
        assert_eq!(style.marker(1), style.marker(1 + MARKERS.len()));
    }
    #[test]
    fn empty_series_is_a_plot_error() {
        let err = render_nyquist_png(&[], "empty", &PlotStyle::default()).unwrap_err();
        assert!(matches!(err, EisError::Plot(_)));
    }
}
