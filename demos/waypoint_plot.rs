use std::error::Error;

use gnuplot::*;
use log::{info, warn, LevelFilter};
use scurve_wpnav::{params, KinematicLog, Params, PosControl, Vector3, WPNav, WaypointMission};

fn main() -> Result<(), Box<dyn Error>> {
    // -----------------------
    // 1. Logging and parameters
    // -----------------------
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{:5}] {}: {}", record.level(), record.target(), message))
        })
        .level(LevelFilter::Debug)
        .chain(std::io::stdout())
        .apply()?;

    // Optional TOML parameter file as the first argument
    let params: Params = match std::env::args().nth(1) {
        Some(path) => params::load(path)?,
        None => Params::default(),
    };

    // -----------------------
    // 2. Mission, in cm
    // -----------------------
    let waypoints = [
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(2000.0, 0.0, 500.0),
        Vector3::new(2000.0, 2000.0, 500.0),
        Vector3::new(0.0, 3000.0, 0.0),
    ];

    let pos_control = PosControl::from_params(&params.pos_control, &params.attitude);
    let wpnav = WPNav::new(&params.wpnav, params.attitude.clone(), pos_control);

    let sampling_rate = 400;
    let mut log = KinematicLog::new();
    let samples = {
        let mut mission =
            WaypointMission::new(wpnav, &waypoints, sampling_rate)?.with_observer(&mut log);
        let samples = mission.run(1000.0)?;
        if !mission.is_complete() {
            warn!("Mission did not complete within the time limit");
        }
        samples
    };

    let last = samples.last().ok_or("mission produced no samples")?;
    info!(
        "Mission took {:.3} s, final position error {:.3} cm",
        last.time,
        (last.target.pos - waypoints[waypoints.len() - 1]).length()
    );

    // --------------
    // 3. Plot data
    // --------------
    let time: Vec<f64> = samples.iter().map(|s| s.time).collect();
    let speed: Vec<f64> = samples.iter().map(|s| s.target.vel.length()).collect();
    let accel: Vec<f64> = samples.iter().map(|s| s.target.accel.length()).collect();
    let jerk: Vec<f64> = samples.iter().map(|s| s.target.jerk.length()).collect();

    let mut fg = Figure::new();
    fg.set_multiplot_layout(2, 2);

    // ----- Ground track -----
    {
        let x: Vec<f64> = samples.iter().map(|s| s.target.pos.x * 0.01).collect();
        let y: Vec<f64> = samples.iter().map(|s| s.target.pos.y * 0.01).collect();
        let wp_x: Vec<f64> = waypoints.iter().map(|w| w.x * 0.01).collect();
        let wp_y: Vec<f64> = waypoints.iter().map(|w| w.y * 0.01).collect();

        let axes = fg.axes2d();
        axes.set_title("Ground track", &[]);
        axes.set_x_label("x (m)", &[]);
        axes.set_y_label("y (m)", &[]);
        axes.lines(&x, &y, &[Color("blue"), Caption("Target")]);
        axes.points(&wp_x, &wp_y, &[Color("black"), PointSymbol('O'), Caption("Waypoints")]);
    }

    // ----- Target magnitudes -----
    {
        let axes = fg.axes2d();
        axes.set_title("Target magnitudes", &[]);
        axes.set_x_label("Time (s)", &[]);
        axes.lines(&time, &speed, &[Color("red"), Caption("Speed (cm/s)")]);
        axes.lines(&time, &accel, &[Color("green"), Caption("Accel (cm/s/s)")]);
        axes.lines(&time, &jerk, &[Color("purple"), Caption("Jerk (cm/s/s/s)")]);
    }

    // ----- Per leg speed along track -----
    {
        let axes = fg.axes2d();
        axes.set_title("Leg speed along track", &[]);
        axes.set_x_label("Leg time (s)", &[]);
        axes.set_y_label("cm/s", &[]);
        for (id, leg) in log.legs() {
            axes.lines(&leg.time, &leg.vel, &[Caption(&format!("Leg {}", id))]);
        }
    }

    // ----- Per leg snap -----
    {
        let axes = fg.axes2d();
        axes.set_title("Leg snap", &[]);
        axes.set_x_label("Leg time (s)", &[]);
        axes.set_y_label("cm/s/s/s/s", &[]);
        for (id, leg) in log.legs() {
            axes.lines(&leg.time, &leg.snap, &[Caption(&format!("Leg {}", id))]);
        }
    }

    fg.show().map_err(|e| format!("Failed to display plot: {e}"))?;

    println!("Plot generated. Mission time: {:.3} seconds.", last.time);
    Ok(())
}
