//! Bar charts

// Imports
use {
	anyhow::Context,
	gnuplot::{
		AlignType::{AlignLeft, AlignRight, AlignTop},
		AutoOption::{Auto, Fix},
		AxesCommon,
		Coordinate::Graph,
		Axes2D,
		Figure,
		LabelOption::{self, Font, Rotate, TextAlign},
		LegendOption::{self, Placement, Title as LegendTitle},
		PlotOption::{self, BorderColor, Caption, Color, FillAlpha},
		Tick::Major,
	},
	palette::Srgb,
	simstat::aggregate::{GroupedSeries, Series, SparseSeries},
	std::path::{Path, PathBuf},
};

/// Colors of stacked bars
pub const STACKED_COLORS: [Srgb<u8>; 3] = [
	Srgb::new(0x80, 0x00, 0x00),
	Srgb::new(0x43, 0x63, 0xd8),
	Srgb::new(0xf5, 0x82, 0x31),
];

/// Colors of each miss type in grouped stacked bars
pub const GROUPED_STACKED_COLORS: [Srgb<u8>; 3] = [
	Srgb::new(0x00, 0x00, 0xff),
	Srgb::new(0xff, 0x00, 0x00),
	Srgb::new(0x00, 0x80, 0x00),
];

/// Colors of grouped bars
pub const GROUPED_COLORS: [Srgb<u8>; 17] = [
	Srgb::new(0x80, 0x00, 0x00),
	Srgb::new(0x91, 0x1e, 0xb4),
	Srgb::new(0x43, 0x63, 0xd8),
	Srgb::new(0xf5, 0x82, 0x31),
	Srgb::new(0x3c, 0xb4, 0x4b),
	Srgb::new(0x46, 0xf0, 0xf0),
	Srgb::new(0xf0, 0x32, 0xe6),
	Srgb::new(0xbc, 0xf6, 0x0c),
	Srgb::new(0xfa, 0xbe, 0xbe),
	Srgb::new(0xe6, 0xbe, 0xff),
	Srgb::new(0xe6, 0x19, 0x4b),
	Srgb::new(0x00, 0x00, 0x75),
	Srgb::new(0x80, 0x00, 0x00),
	Srgb::new(0x9a, 0x63, 0x24),
	Srgb::new(0x80, 0x80, 0x80),
	Srgb::new(0xff, 0xff, 0xff),
	Srgb::new(0x00, 0x00, 0x00),
];

/// Chart output kind
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ChartOutput {
	/// Render a pdf with `gnuplot`
	Pdf,

	/// Write the `gnuplot` script that renders the pdf
	Script,
}

impl ChartOutput {
	/// Returns the path of chart `name` within `output_dir`
	pub fn path(self, output_dir: &Path, name: &str) -> PathBuf {
		match self {
			Self::Pdf => output_dir.join(format!("{name}.pdf")),
			Self::Script => output_dir.join(format!("{name}.gp")),
		}
	}
}

/// Legend corner
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum LegendCorner {
	TopLeft,
	TopRight,
}

/// Chart style
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct ChartStyle {
	/// Figure width, in inches
	pub width_in: f32,

	/// Figure height, in inches
	pub height_in: f32,

	/// Width of each bar
	pub bar_width: f64,

	/// Rotation of the x tick labels, in degrees
	pub tick_rotation: f64,

	/// Font size
	pub font_size: f64,

	/// Whether the x tick labels end at their tick
	pub tick_align_right: bool,

	/// Legend corner
	pub legend_corner: LegendCorner,

	/// Legend title
	pub legend_title: Option<&'static str>,
}

impl ChartStyle {
	/// Style for stacked charts
	pub const fn stacked() -> Self {
		Self {
			width_in:         19.0,
			height_in:        4.4,
			bar_width:        0.5,
			tick_rotation:    27.0,
			font_size:        14.0,
			tick_align_right: true,
			legend_corner:    LegendCorner::TopLeft,
			legend_title:     None,
		}
	}

	/// Style for grouped stacked charts
	pub const fn grouped_stacked() -> Self {
		Self {
			width_in:         19.0,
			height_in:        6.0,
			bar_width:        0.12,
			tick_rotation:    90.0,
			font_size:        14.0,
			tick_align_right: false,
			legend_corner:    LegendCorner::TopRight,
			legend_title:     Some("Cache Miss Types"),
		}
	}

	/// Style for grouped charts
	pub const fn grouped() -> Self {
		Self {
			width_in:         14.0,
			height_in:        4.4,
			bar_width:        0.1,
			tick_rotation:    27.0,
			font_size:        14.0,
			tick_align_right: true,
			legend_corner:    LegendCorner::TopLeft,
			legend_title:     None,
		}
	}
}

/// Chart
#[derive(Clone, Debug)]
pub struct Chart<'a> {
	/// Title
	pub title: Option<&'a str>,

	/// Y axis label
	pub y_label: &'a str,

	/// Y axis range
	pub y_range: Option<(f64, f64)>,

	/// Style
	pub style: ChartStyle,

	/// Output kind
	pub output: ChartOutput,
}

impl Chart<'_> {
	/// Renders a stacked bar chart, with one bar per label.
	///
	/// Each series is stacked on top of the previous ones.
	pub fn render_stacked(&self, labels: &[String], series: &[Series], path: &Path) -> Result<(), anyhow::Error> {
		for series in series {
			anyhow::ensure!(
				series.values.len() == labels.len(),
				"Series {:?} has {} values, but there are {} labels",
				series.name,
				series.values.len(),
				labels.len()
			);
		}

		let xs = (0..labels.len()).map(|idx| idx as f64).collect::<Vec<_>>();
		let bounds = stack_bounds(series.iter().map(|series| series.values.as_slice()));

		let mut fg = Figure::new();
		let axes = self.setup_axes(&mut fg, labels.iter().enumerate().map(|(idx, label)| (idx as f64, label)));

		for (series_idx, (series, bounds)) in series.iter().zip(&bounds).enumerate() {
			let color = gnuplot_color(STACKED_COLORS[series_idx % STACKED_COLORS.len()]);
			draw_segments(axes, &xs, bounds, self.style.bar_width, &[
				Caption(series.name.as_str()),
				Color(color.as_str().into()),
				BorderColor("black".into()),
			]);
		}

		self.save(&mut fg, path)
	}

	/// Renders a grouped, stacked bar chart.
	///
	/// Each label has one stacked bar per configuration, offset by the bar width.
	pub fn render_grouped_stacked(
		&self,
		labels: &[String],
		configurations: &[String],
		series: &[GroupedSeries],
		path: &Path,
	) -> Result<(), anyhow::Error> {
		for series in series {
			anyhow::ensure!(
				series.groups.len() == labels.len(),
				"Series {:?} has {} groups, but there are {} labels",
				series.name,
				series.groups.len(),
				labels.len()
			);
			anyhow::ensure!(
				series.groups.iter().all(|group| group.len() == configurations.len()),
				"Series {:?} has a group without exactly {} configurations",
				series.name,
				configurations.len()
			);
		}

		let bar_width = self.style.bar_width;
		let tick_offset = bar_width * (configurations.len() as f64 / 2.0 - 0.5);

		let mut fg = Figure::new();
		let axes = self.setup_axes(
			&mut fg,
			labels
				.iter()
				.enumerate()
				.map(|(idx, label)| (idx as f64 + tick_offset, label)),
		);

		for config_idx in 0..configurations.len() {
			let xs = (0..labels.len())
				.map(|idx| idx as f64 + config_idx as f64 * bar_width)
				.collect::<Vec<_>>();
			let values = series
				.iter()
				.map(|series| series.configuration(config_idx).collect::<Vec<_>>())
				.collect::<Vec<_>>();
			let bounds = stack_bounds(values.iter().map(Vec::as_slice));

			for (series_idx, (series, bounds)) in series.iter().zip(&bounds).enumerate() {
				let color = gnuplot_color(GROUPED_STACKED_COLORS[series_idx % GROUPED_STACKED_COLORS.len()]);
				let mut options: Vec<PlotOption<&str>> =
					vec![Color(color.as_str().into()), BorderColor("black".into())];

				// Note: Only caption the first configuration, so each miss type shows up once
				if config_idx == 0 {
					options.push(Caption(series.name.as_str()));
				}

				draw_segments(axes, &xs, bounds, bar_width, &options);
			}
		}

		self.save(&mut fg, path)
	}

	/// Renders a grouped bar chart.
	///
	/// Each series has one bar per label, offset from the other series by the bar width.
	/// Missing values are left out.
	pub fn render_grouped(&self, labels: &[String], series: &[SparseSeries], path: &Path) -> Result<(), anyhow::Error> {
		for series in series {
			anyhow::ensure!(
				series.values.len() == labels.len(),
				"Series {:?} has {} values, but there are {} labels",
				series.name,
				series.values.len(),
				labels.len()
			);
		}

		let bar_width = self.style.bar_width;
		let offsets = group_offsets(series.len(), bar_width);

		let mut fg = Figure::new();
		let axes = self.setup_axes(&mut fg, labels.iter().enumerate().map(|(idx, label)| (idx as f64, label)));

		for (series_idx, ((series, offset), color)) in series
			.iter()
			.zip(offsets)
			.zip(GROUPED_COLORS.iter().cycle())
			.enumerate()
		{
			let (xs, ys): (Vec<_>, Vec<_>) = series
				.values
				.iter()
				.enumerate()
				.filter_map(|(idx, value)| value.map(|value| (idx as f64 + offset, value)))
				.unzip();
			if xs.is_empty() {
				tracing::debug!(series = ?series.name, "Series has no values, skipping");
				continue;
			}

			// Note: Alternate the fill so neighbouring bars are distinguishable
			//       even with similar colors.
			let fill_alpha = if series_idx % 2 == 0 { 0.35 } else { 0.7 };

			let color = gnuplot_color(*color);
			axes.boxes_set_width(xs.iter().copied(), ys, xs.iter().map(|_| bar_width), &[
				Caption(series.name.as_str()),
				Color(color.as_str().into()),
				BorderColor(color.as_str().into()),
				FillAlpha(fill_alpha),
			]);
		}

		self.save(&mut fg, path)
	}

	/// Sets up the axes of `fg`, with a tick for each label
	fn setup_axes<'fg, 'l>(
		&self,
		fg: &'fg mut Figure,
		ticks: impl IntoIterator<Item = (f64, &'l String)>,
	) -> &'fg mut Axes2D {
		if let Some(title) = self.title {
			fg.set_title(title);
		}

		let font_size = self.style.font_size;
		let text_options = [Font("", font_size)];
		let mut tick_label_options: Vec<LabelOption<&str>> = vec![Font("", font_size), Rotate(self.style.tick_rotation)];
		if self.style.tick_align_right {
			tick_label_options.push(TextAlign(AlignRight));
		}

		let (legend_x, legend_align) = match self.style.legend_corner {
			LegendCorner::TopLeft => (0.0, AlignLeft),
			LegendCorner::TopRight => (1.0, AlignRight),
		};
		let mut legend_options: Vec<LegendOption<&str>> = vec![Placement(legend_align, AlignTop)];
		if let Some(title) = self.style.legend_title {
			legend_options.push(LegendTitle(title));
		}

		let ticks = ticks
			.into_iter()
			.map(|(pos, label)| Major(pos, Fix(label.clone())))
			.collect::<Vec<_>>();
		let ticks_len = ticks.len();

		let axes = fg.axes2d();
		axes.set_x_label("Benchmarks", &text_options)
			.set_y_label(self.y_label, &text_options)
			.set_x_ticks_custom(ticks, &[], &tick_label_options)
			.set_x_range(Fix(-1.0), Fix(ticks_len as f64))
			.set_x_grid(true)
			.set_legend(Graph(legend_x), Graph(1.0), &legend_options, &text_options);

		match self.y_range {
			Some((min, max)) => axes.set_y_range(Fix(min), Fix(max)),
			None => axes.set_y_range(Auto, Auto),
		};

		axes
	}

	/// Saves `fg` to `path`
	fn save(&self, fg: &mut Figure, path: &Path) -> Result<(), anyhow::Error> {
		match self.output {
			ChartOutput::Pdf => {
				fg.save_to_pdf(path, self.style.width_in, self.style.height_in)
					.map_err(|err| anyhow::anyhow!("Unable to save chart to {path:?}: {err:?}"))?;

				// Note: `gnuplot` writes the file in the background, wait for it to finish
				fg.close();
			},
			ChartOutput::Script => {
				// Note: `echo_to_file` panics if it can't create the file, so check that first.
				std::fs::File::create(path).with_context(|| format!("Unable to create chart script {path:?}"))?;

				let pdf_path = path.with_extension("pdf");
				fg.set_terminal(
					&format!("pdfcairo size {}in,{}in", self.style.width_in, self.style.height_in),
					&pdf_path.to_string_lossy(),
				);
				fg.echo_to_file(path);
			},
		}
		tracing::info!(?path, "Saved chart");

		Ok(())
	}
}

/// Returns the `(bottom, top)` of each value of each series when stacking them in order.
///
/// Each value starts at the sum of the values below it, so negative values
/// extend downwards from there.
pub fn stack_bounds<'a>(series: impl IntoIterator<Item = &'a [f64]>) -> Vec<Vec<(f64, f64)>> {
	let mut bounds: Vec<Vec<(f64, f64)>> = vec![];
	for values in series {
		let segments = match bounds.last() {
			Some(below) => values
				.iter()
				.zip(below)
				.map(|(value, &(_, bottom))| (bottom, bottom + value))
				.collect(),
			None => values.iter().map(|&value| (0.0, value)).collect(),
		};
		bounds.push(segments);
	}

	bounds
}

/// Draws one box per `(bottom, top)` segment, centered on each x
fn draw_segments(
	axes: &mut Axes2D,
	xs: &[f64],
	bounds: &[(f64, f64)],
	bar_width: f64,
	options: &[PlotOption<&str>],
) {
	axes.box_xy_error_delta(
		xs.iter().copied(),
		bounds.iter().map(|&(bottom, top)| (bottom + top) / 2.0),
		xs.iter().map(|_| bar_width / 2.0),
		bounds.iter().map(|&(bottom, top)| (top - bottom).abs() / 2.0),
		options,
	);
}

/// Returns the x offset of each of `len` grouped series
pub fn group_offsets(len: usize, bar_width: f64) -> impl Iterator<Item = f64> {
	let start = -((len / 2) as f64);
	(0..len).map(move |idx| (start + idx as f64) * bar_width)
}

/// Formats a color for `gnuplot`
fn gnuplot_color(color: Srgb<u8>) -> String {
	format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

#[cfg(test)]
mod tests {
	use {super::*, std::fs};

	fn series(name: &str, values: &[f64]) -> Series {
		Series {
			name:   name.to_owned(),
			values: values.to_vec(),
		}
	}

	/// Reads a chart script.
	///
	/// `gnuplot` inlines the plot data as binary, so the script isn't valid utf-8.
	fn read_script(path: &Path) -> String {
		let script = fs::read(path).expect("Unable to read script");
		String::from_utf8_lossy(&script).into_owned()
	}

	fn script_chart(style: ChartStyle) -> Chart<'static> {
		Chart {
			title: None,
			y_label: "Misses",
			y_range: None,
			style,
			output: ChartOutput::Script,
		}
	}

	#[test]
	fn stack_bounds_accumulate() {
		let bounds = stack_bounds([[40.0, 1.0].as_slice(), &[30.0, 2.0], &[30.0, 3.0]]);
		assert_eq!(bounds, [
			vec![(0.0, 40.0), (0.0, 1.0)],
			vec![(40.0, 70.0), (1.0, 3.0)],
			vec![(70.0, 100.0), (3.0, 6.0)],
		]);
	}

	#[test]
	fn stack_bounds_negative_extend_below_baseline() {
		// Conflict misses are negative when the total is missing
		let bounds = stack_bounds([[40.0].as_slice(), &[30.0], &[-70.0]]);
		assert_eq!(bounds[2], [(70.0, 0.0)]);

		let bounds = stack_bounds([[0.0].as_slice(), &[0.0], &[-5.0]]);
		assert_eq!(bounds[2], [(0.0, -5.0)]);
	}

	#[test]
	fn group_offsets_center_on_tick() {
		assert_eq!(group_offsets(1, 0.1).collect::<Vec<_>>(), [0.0]);
		assert_eq!(group_offsets(2, 0.5).collect::<Vec<_>>(), [-0.5, 0.0]);
		assert_eq!(group_offsets(3, 0.5).collect::<Vec<_>>(), [-0.5, 0.0, 0.5]);
	}

	#[test]
	fn colors_formatted_as_hex() {
		assert_eq!(gnuplot_color(STACKED_COLORS[0]), "#800000");
		assert_eq!(gnuplot_color(STACKED_COLORS[1]), "#4363d8");
		assert_eq!(gnuplot_color(GROUPED_COLORS[16]), "#000000");
	}

	#[test]
	fn output_paths() {
		let dir = Path::new("plots");
		assert_eq!(ChartOutput::Pdf.path(dir, "IPC_plot_1"), Path::new("plots/IPC_plot_1.pdf"));
		assert_eq!(ChartOutput::Script.path(dir, "IPC_plot_1"), Path::new("plots/IPC_plot_1.gp"));
	}

	#[test]
	fn stacked_rejects_length_mismatch() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		let labels = ["gcc-base".to_owned(), "mcf-base".to_owned()];
		let err = script_chart(ChartStyle::stacked())
			.render_stacked(&labels, &[series("Capacity Miss", &[1.0])], &dir.path().join("chart.gp"))
			.expect_err("Rendered mismatched series");
		assert!(err.to_string().contains("Capacity Miss"), "Unexpected error: {err}");
	}

	#[test]
	fn grouped_rejects_length_mismatch() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		let labels = ["gcc".to_owned(), "Avg".to_owned()];
		let series = [SparseSeries {
			name:   "base".to_owned(),
			values: vec![Some(1.0), None, Some(2.0)],
		}];
		script_chart(ChartStyle::grouped())
			.render_grouped(&labels, &series, &dir.path().join("chart.gp"))
			.expect_err("Rendered mismatched series");
	}

	#[test]
	fn stacked_script_has_every_series() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		let path = dir.path().join("DCACHE_MISS_STACKED.gp");
		let labels = ["gcc-base".to_owned()];
		script_chart(ChartStyle::stacked())
			.render_stacked(
				&labels,
				&[
					series("Capacity Miss", &[40.0]),
					series("Compulsory Miss", &[30.0]),
					series("Conflict Miss", &[30.0]),
				],
				&path,
			)
			.expect("Unable to render chart");

		let script = read_script(&path);
		for needle in ["Capacity Miss", "Compulsory Miss", "Conflict Miss", "Benchmarks", "gcc-base"] {
			assert!(script.contains(needle), "Script is missing {needle:?}:\n{script}");
		}
	}

	#[test]
	fn stacked_script_draws_negative_segment() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		let path = dir.path().join("DCACHE_MISS_STACKED.gp");
		let labels = ["gcc-base".to_owned()];
		script_chart(ChartStyle::stacked())
			.render_stacked(
				&labels,
				&[
					series("Capacity Miss", &[40.0]),
					series("Compulsory Miss", &[30.0]),
					series("Conflict Miss", &[-70.0]),
				],
				&path,
			)
			.expect("Unable to render chart");

		let script = read_script(&path);
		assert!(script.contains("boxxyerror"), "Script:\n{script}");
		assert!(script.contains("Conflict Miss"), "Script:\n{script}");
		assert!(!script.contains("Cache Miss Types"), "Script:\n{script}");
	}

	#[test]
	fn grouped_stacked_script_captions_once() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		let path = dir.path().join("DCACHE_MISS_STACKED_RATIO.gp");
		let labels = ["gcc/ref".to_owned(), "mcf/ref".to_owned()];
		let configurations = ["small".to_owned(), "big".to_owned()];
		let series = ["Capacity Miss", "Conflict Miss", "Compulsory Miss"].map(|name| GroupedSeries {
			name:   name.to_owned(),
			groups: vec![vec![30.0, 40.0], vec![50.0, 20.0]],
		});

		Chart {
			title: Some("DCache Miss Type Ratios (Stacked)"),
			..script_chart(ChartStyle::grouped_stacked())
		}
		.render_grouped_stacked(&labels, &configurations, &series, &path)
		.expect("Unable to render chart");

		let script = read_script(&path);
		assert_eq!(script.matches("Capacity Miss").count(), 1, "Script:\n{script}");
		assert!(script.contains("DCache Miss Type Ratios (Stacked)"));
		assert!(script.contains("Cache Miss Types"), "Script:\n{script}");
	}
}
