use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use log::{debug, info};
use plotters::coord::Shift;
use plotters::prelude::*;
use crate::drivers::codec::Reading;
use crate::drivers::loader::{HandSeries, LoadedGesture};
use crate::drivers::GloveError;
use crate::types::{Component, Hand, SensorClass, SensorUnit};
use crate::waveform::{FingerSnapshot, LiveSnapshot, RedrawTarget, WindowView};
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1400,
            height: 1000,
            background: RGBColor(10, 10, 10),
            palette: vec![RED, GREEN, BLUE, CYAN, MAGENTA, YELLOW, WHITE],
        }
    }
}
impl PlotStyle {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}
/// One labelled line. `None` values are gaps: the line breaks there.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotSeries {
    pub label: String,
    pub points: Vec<(f64, Option<f64>)>,
}
impl PlotSeries {
    /// Runs of consecutive present values.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for &(x, y) in &self.points {
            match y {
                Some(y) => current.push((x, y)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
    fn extent(&self) -> Option<(f64, f64)> {
        let mut values = self.points.iter().filter_map(|(_, y)| *y);
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}
#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Fixed axis ranges; derived from the data when `None`.
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
    pub series: Vec<PlotSeries>,
}
impl Panel {
    fn data_x_range(&self) -> (f64, f64) {
        let len = self.series.iter().map(|s| s.points.len()).max().unwrap_or(0);
        (0.0, (len.max(2) - 1) as f64)
    }
    fn data_y_extent(&self) -> Option<(f64, f64)> {
        self.series
            .iter()
            .filter_map(PlotSeries::extent)
            .reduce(|(a, b), (c, d)| (a.min(c), b.max(d)))
    }
}
/// A grid of panels rendered into one image.
#[derive(Clone, Debug, PartialEq)]
pub struct Figure {
    pub caption: String,
    pub rows: usize,
    pub cols: usize,
    /// All panels without a fixed y-range use the union of their data.
    pub shared_y: bool,
    pub panels: Vec<Panel>,
}
fn padded(extent: Option<(f64, f64)>) -> (f64, f64) {
    match extent {
        None => (-1.0, 1.0),
        Some((lo, hi)) if (hi - lo).abs() < f64::EPSILON => (lo - 1.0, hi + 1.0),
        Some((lo, hi)) => {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        }
    }
}
pub fn render_figure_png(figure: &Figure, style: &PlotStyle) -> Result<Vec<u8>, GloveError> {
    if figure.panels.is_empty() || figure.panels.len() > figure.rows * figure.cols {
        return Err(GloveError::Plot(format!(
            "{} panels do not fit a {}x{} grid",
            figure.panels.len(),
            figure.rows,
            figure.cols
        )));
    }
    let shared = figure.shared_y.then(|| {
        padded(
            figure
                .panels
                .iter()
                .filter_map(Panel::data_y_extent)
                .reduce(|(a, b), (c, d)| (a.min(c), b.max(d))),
        )
    });
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let root = root.titled(&figure.caption, ("sans-serif", 22).into_font().color(&WHITE))?;
        let areas = root.split_evenly((figure.rows, figure.cols));
        for (area, panel) in areas.iter().zip(&figure.panels) {
            let y_range = panel
                .y_range
                .or(shared)
                .unwrap_or_else(|| padded(panel.data_y_extent()));
            draw_panel(area, panel, y_range, style)?;
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    panel: &Panel,
    y_range: (f64, f64),
    style: &PlotStyle,
) -> Result<(), GloveError> {
    let x_range = panel.x_range.unwrap_or_else(|| panel.data_x_range());
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(&panel.title, ("sans-serif", 16).into_font().color(&WHITE))
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)?;
    chart
        .configure_mesh()
        .x_desc(panel.x_label.as_str())
        .y_desc(panel.y_label.as_str())
        .label_style(("sans-serif", 12).into_font().color(&WHITE))
        .axis_desc_style(("sans-serif", 13).into_font().color(&WHITE))
        .axis_style(&WHITE.mix(0.5))
        .bold_line_style(&WHITE.mix(0.2))
        .light_line_style(&WHITE.mix(0.1))
        .draw()?;
    for (idx, series) in panel.series.iter().enumerate() {
        let color = style.palette[idx % style.palette.len()];
        chart
            .draw_series(LineSeries::new(std::iter::empty::<(f64, f64)>(), &color))?
            .label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        for segment in series.segments() {
            chart.draw_series(LineSeries::new(segment, color.stroke_width(2)))?;
        }
    }
    if !panel.series.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font(("sans-serif", 12).into_font().color(&WHITE))
            .border_style(&WHITE.mix(0.2))
            .background_style(&style.background)
            .draw()?;
    }
    Ok(())
}
pub fn write_png(path: &Path, png: &[u8]) -> Result<(), GloveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, png)?;
    Ok(())
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, GloveError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| GloveError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
fn panel_title(hand: Hand, class: SensorClass) -> String {
    format!("{hand} Hand - {}", class.title())
}
fn recorded_panel(series: &HandSeries, unit: SensorUnit, hand: Hand, class: SensorClass) -> Panel {
    let triples = series.unit(unit).triples(class);
    let series = Component::for_class(class)
        .iter()
        .map(|component| {
            let axis: Vec<Reading> = triples.iter().map(|t| t[component.axis()]).collect();
            PlotSeries {
                label: component.name().to_owned(),
                points: reading_points(&axis),
            }
        })
        .collect();
    Panel {
        title: panel_title(hand, class),
        x_label: "Frame".into(),
        y_label: class.axis_label().into(),
        x_range: None,
        y_range: None,
        series,
    }
}
/// 2x2 figure of one finger: left acc, left gyro, right acc, right gyro.
pub fn finger_figure(gesture: &LoadedGesture, unit: SensorUnit) -> Figure {
    let mut panels = Vec::with_capacity(4);
    for hand in Hand::ALL {
        for class in SensorClass::ALL {
            panels.push(recorded_panel(gesture.hand(hand), unit, hand, class));
        }
    }
    Figure {
        caption: format!(
            "{unit} - {} (User: {})",
            gesture.metadata.gesture_name, gesture.metadata.user_name
        ),
        rows: 2,
        cols: 2,
        shared_y: false,
        panels,
    }
}
/// Writes `<Finger>.png` for every sensor unit into `folder`.
pub fn render_gesture_plots(
    gesture: &LoadedGesture,
    folder: &Path,
    style: &PlotStyle,
) -> Result<Vec<PathBuf>, GloveError> {
    fs::create_dir_all(folder)?;
    let mut written = Vec::with_capacity(SensorUnit::ALL.len());
    for unit in SensorUnit::ALL {
        let png = render_figure_png(&finger_figure(gesture, unit), style)?;
        let path = folder.join(format!("{}.png", unit.name()));
        write_png(&path, &png)?;
        written.push(path);
    }
    info!("saved {} plots to {}", written.len(), folder.display());
    Ok(written)
}
fn live_panel(hand: Hand, view: &WindowView) -> Panel {
    let series = Component::for_class(view.class)
        .iter()
        .map(|component| PlotSeries {
            label: component.name().to_owned(),
            points: view
                .points(component.axis())
                .into_iter()
                .map(|(x, y)| (x, Some(y)))
                .collect(),
        })
        .collect();
    Panel {
        title: panel_title(hand, view.class),
        x_label: "Frame".into(),
        y_label: view.class.axis_label().into(),
        x_range: Some(view.x_range),
        y_range: Some(view.y_range),
        series,
    }
}
pub fn live_finger_figure(finger: &FingerSnapshot) -> Figure {
    Figure {
        caption: format!("{} - Live", finger.unit),
        rows: 2,
        cols: 2,
        shared_y: false,
        panels: finger
            .panels
            .iter()
            .map(|(hand, view)| live_panel(*hand, view))
            .collect(),
    }
}
/// Redraw target that keeps one PNG per finger up to date in a directory.
pub struct LivePngWriter {
    dir: PathBuf,
    style: PlotStyle,
    // Both hand consumers may trigger a redraw; files are written one snapshot at a time.
    write_lock: Mutex<()>,
}
impl LivePngWriter {
    pub fn new(dir: impl Into<PathBuf>, style: PlotStyle) -> Result<Self, GloveError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            style,
            write_lock: Mutex::new(()),
        })
    }
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
impl RedrawTarget for LivePngWriter {
    fn redraw(&self, snapshot: &LiveSnapshot) -> Result<(), GloveError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for finger in &snapshot.fingers {
            let png = render_figure_png(&live_finger_figure(finger), &self.style)?;
            write_png(&self.dir.join(format!("{}.png", finger.unit.name())), &png)?;
        }
        debug!("live snapshot written to {}", self.dir.display());
        Ok(())
    }
}
/// Missing readings become gaps.
pub fn reading_points(readings: &[Reading]) -> Vec<(f64, Option<f64>)> {
    readings
        .iter()
        .enumerate()
        .map(|(i, r)| (i as f64, r.value()))
        .collect()
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::loader::GestureMetadata;
    use crate::waveform::{LiveDisplay, WindowConfig};
    fn series(values: &[Option<f64>]) -> PlotSeries {
        PlotSeries {
            label: "s".into(),
            points: values.iter().enumerate().map(|(i, v)| (i as f64, *v)).collect(),
        }
    }
    #[test]
    fn gaps_split_lines() {
        let s = series(&[Some(1.0), Some(2.0), None, None, Some(3.0), None]);
        assert_eq!(
            s.segments(),
            vec![vec![(0.0, 1.0), (1.0, 2.0)], vec![(4.0, 3.0)]]
        );
        assert!(series(&[None, None]).segments().is_empty());
    }
    #[test]
    fn reading_points_mark_invalid_as_gaps() {
        let points = reading_points(&[Reading::Valid(0.5), Reading::Invalid]);
        assert_eq!(points, vec![(0.0, Some(0.5)), (1.0, None)]);
    }
    #[test]
    fn grid_must_hold_every_panel() {
        let figure = Figure {
            caption: "x".into(),
            rows: 1,
            cols: 1,
            shared_y: false,
            panels: vec![],
        };
        assert!(render_figure_png(&figure, &PlotStyle::with_size(200, 100)).is_err());
    }
    fn gesture() -> LoadedGesture {
        let mut frame = [0.0; 36];
        frame[0] = 4096.0;
        let mut broken = frame;
        broken[1] = 1e9;
        LoadedGesture {
            path: PathBuf::from("wave.json"),
            metadata: GestureMetadata {
                session_name: "s".into(),
                user_name: "u".into(),
                gesture_name: "wave".into(),
                timestamp: "t".into(),
                left_device: "l".into(),
                right_device: "r".into(),
            },
            left: HandSeries::from_frames(vec![frame, broken, frame]).unwrap(),
            right: HandSeries::default(),
        }
    }
    #[test]
    fn finger_figure_has_four_labelled_panels() {
        let figure = finger_figure(&gesture(), SensorUnit::Index);
        assert_eq!(figure.panels.len(), 4);
        assert_eq!(figure.panels[0].title, "Left Hand - Accelerometer (g)");
        assert_eq!(figure.panels[3].title, "Right Hand - Gyroscope (°/s)");
        let acc_y = &figure.panels[0].series[1];
        assert_eq!(acc_y.label, "AccY");
        assert_eq!(acc_y.points[1], (1.0, None));
        assert!(figure.panels[2].series[0].points.is_empty());
    }
    #[test]
    fn gesture_plots_are_written_per_finger() {
        let dir = tempfile::tempdir().unwrap();
        let written =
            render_gesture_plots(&gesture(), dir.path(), &PlotStyle::with_size(400, 300)).unwrap();
        assert_eq!(written.len(), 6);
        assert!(dir.path().join("IndexFinger.png").is_file());
        assert!(fs::metadata(dir.path().join("Palm.png")).unwrap().len() > 0);
    }
    #[test]
    fn live_writer_renders_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let display = LiveDisplay::new(WindowConfig::default());
        display.start();
        display.add_frame(Hand::Left, &[4096u16; 36]);
        let writer = LivePngWriter::new(dir.path().join("live"), PlotStyle::with_size(400, 300))
            .unwrap();
        writer.redraw(&display.snapshot()).unwrap();
        assert!(writer.dir().join("Thumb.png").is_file());
        let figure = live_finger_figure(&display.snapshot().fingers[0]);
        assert_eq!(figure.panels[0].x_range, Some((0.0, 200.0)));
        assert_eq!(figure.panels[3].y_range, Some((-200.0, 200.0)));
    }
}
