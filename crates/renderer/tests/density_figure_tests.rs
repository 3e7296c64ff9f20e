//! Rendering of the four-panel density figure from synthetic eddies.

use eddy_grid::{grid_count, Bins, CountOptions, DensityComposite};
use eddy_obs::Polarity;
use renderer::png::PNG_SIGNATURE;
use renderer::{render_density_figure, Color, Colormap, FigureConfig, Norm};
use test_utils::{concat, eddies_at, require_test_file, synthetic_tracks};

fn small_config() -> FigureConfig {
    FigureConfig {
        width: 240,
        height: 370,
        ..Default::default()
    }
}

fn composite() -> DensityComposite {
    let bins = Bins::regular((-10.0, 37.0), (30.0, 46.0), 0.5).unwrap();
    let options = CountOptions::default();
    let a = grid_count(
        &synthetic_tracks(Polarity::Anticyclonic, 40, 30, 11),
        &bins,
        &options,
    )
    .unwrap();
    let c = grid_count(&synthetic_tracks(Polarity::Cyclonic, 40, 30, 12), &bins, &options).unwrap();
    DensityComposite::build(&a, &c, "count").unwrap()
}

#[test]
fn test_figure_size_and_titles() {
    let figure = render_density_figure(&composite(), &small_config()).unwrap();
    assert_eq!((figure.width(), figure.height()), (240, 370));
    assert_eq!(
        figure.panel_titles(),
        &[
            "Anticyclonic frequency",
            "Cyclonic frequency",
            "All eddies frequency",
            "Ratio cyclonic / Anticyclonic",
        ]
    );
    let text = figure.text_metadata();
    assert!(text.iter().any(|(k, v)| k == "Colorbar 2" && v == "Ratio cyclonic / Anticyclonic"));
}

#[test]
fn test_masked_cells_stay_background() {
    // one anticyclone, one cyclone in distinct cells: everything else masked
    let bins = Bins::regular((0.0, 4.0), (0.0, 2.0), 1.0).unwrap();
    let options = CountOptions::default();
    let a = grid_count(&eddies_at(Polarity::Anticyclonic, 0.5, 0.5, 1), &bins, &options).unwrap();
    let c = grid_count(&eddies_at(Polarity::Cyclonic, 3.5, 1.5, 1), &bins, &options).unwrap();
    let composite = DensityComposite::build(&a, &c, "count").unwrap();
    assert_eq!(composite.ratio.count_valid(), 0);

    let config = FigureConfig {
        width: 400,
        height: 400,
        grid_step: 10.0,
        ..Default::default()
    };
    let figure = render_density_figure(&composite, &config).unwrap();

    // ratio panel (bottom quarter): its centre falls in a masked cell
    let centre = figure.canvas().pixel(200, 350).unwrap();
    assert_eq!(centre, Color::WHITE);
}

#[test]
fn test_count_panel_uses_count_colormap() {
    // four eddies over four days in a 1 degree cell: density 1 per deg2 per day
    let bins = Bins::regular((0.0, 2.0), (0.0, 1.0), 1.0).unwrap();
    let a = concat(&[eddies_at(Polarity::Anticyclonic, 0.5, 0.5, 4)]);
    let ga = eddy_grid::density(&a, &bins, "count").unwrap();
    let gc = grid_count(
        &eddies_at(Polarity::Cyclonic, 1.5, 0.5, 1),
        &bins,
        &CountOptions::default(),
    )
    .unwrap();
    let composite = DensityComposite::build(&ga, &gc, "count").unwrap();
    assert_eq!(composite.anticyclonic.get(0, 0), Some(1.0));

    let config = FigureConfig {
        width: 400,
        height: 800,
        grid_step: 10.0,
        ..Default::default()
    };
    let figure = render_density_figure(&composite, &config).unwrap();

    // anticyclonic panel spans the top quarter; its plot box is 2:1
    let cmap = Colormap::by_name("terrain_r").unwrap();
    let norm = Norm::Linear { vmin: 0.0, vmax: 2.0 };
    let expected = cmap.at(norm.normalize(1.0).unwrap());
    let left_cell_centre = (12 + 90, 100);
    assert_eq!(
        figure.canvas().pixel(left_cell_centre.0, left_cell_centre.1),
        Some(expected)
    );
}

#[test]
fn test_save_writes_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("density.png");
    let figure = render_density_figure(&composite(), &small_config()).unwrap();
    figure.save(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..8], &PNG_SIGNATURE);
}

#[test]
fn test_unknown_colormap_is_error() {
    let config = FigureConfig {
        count_colormap: "rainbow".to_string(),
        ..small_config()
    };
    assert!(render_density_figure(&composite(), &config).is_err());
}

#[test]
fn test_masked_color_fills_masked_cells() {
    let bins = Bins::regular((0.0, 4.0), (0.0, 2.0), 1.0).unwrap();
    let options = CountOptions::default();
    let a = grid_count(&eddies_at(Polarity::Anticyclonic, 0.5, 0.5, 1), &bins, &options).unwrap();
    let c = grid_count(&eddies_at(Polarity::Cyclonic, 3.5, 1.5, 1), &bins, &options).unwrap();
    let composite = DensityComposite::build(&a, &c, "count").unwrap();

    let grey = Color::rgb(0xc0, 0xc0, 0xc0);
    let config = FigureConfig {
        width: 400,
        height: 400,
        grid_step: 10.0,
        masked_color: Some("#c0c0c0".to_string()),
        ..Default::default()
    };
    let figure = render_density_figure(&composite, &config).unwrap();
    assert_eq!(figure.canvas().pixel(200, 350), Some(grey));
}

/// Pixels strictly above the first panel's plot box, inside its frame.
fn above_first_panel(figure: &renderer::Figure) -> Vec<Color> {
    let mut pixels = Vec::new();
    for y in 0..30 {
        for x in 12..372 {
            pixels.extend(figure.canvas().pixel(x, y));
        }
    }
    pixels
}

#[test]
fn test_titles_drawn_when_font_available() {
    let font = require_test_file!("DejaVuSans.ttf");
    let config = FigureConfig {
        width: 400,
        height: 800,
        ..Default::default()
    };
    let plain = render_density_figure(&composite(), &config).unwrap();
    assert!(above_first_panel(&plain).iter().all(|&c| c == Color::WHITE));

    let config = FigureConfig {
        font: Some(font),
        ..config
    };
    let titled = render_density_figure(&composite(), &config).unwrap();
    assert!(above_first_panel(&titled).iter().any(|c| c.r < 128));
    assert_eq!(titled.panel_titles().len(), 4);
}

#[test]
fn test_missing_font_is_error() {
    let config = FigureConfig {
        font: Some("/nonexistent/DejaVuSans.ttf".into()),
        ..small_config()
    };
    assert!(render_density_figure(&composite(), &config).is_err());
}
